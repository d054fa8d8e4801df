//! The shard index.
//!
//! A shard index has one entry per chunk slot of a shard, in row-major order of the chunk-within-shard indices.
//! Each entry is a pair of little-endian `u64` values `(offset, length)`, where the offset is absolute within the shard.
//! An absent chunk has the entry `(u64::MAX, u64::MAX)`.
//! The entries are followed by a little-endian CRC32C checksum of the entry bytes.
//!
//! This is the layout of a `sharding_indexed` shard index encoded with the `bytes` (little endian) and `crc32c` codecs.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::byte_range::ByteRange;

/// The sentinel offset and length of an absent chunk.
pub const SHARD_INDEX_SENTINEL: u64 = u64::MAX;

const ENTRY_SIZE: u64 = 2 * core::mem::size_of::<u64>() as u64;
const CHECKSUM_SIZE: u64 = core::mem::size_of::<u32>() as u64;

/// The location of the shard index within a shard.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug, Display, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShardIndexLocation {
    /// The index is at the start of the shard, before the chunks.
    #[display("start")]
    Start,
    /// The index is at the end of the shard, after the chunks.
    #[default]
    #[display("end")]
    End,
}

impl ShardIndexLocation {
    /// Return the byte range of an index with `num_chunks` entries within a shard.
    ///
    /// The range is known without reading the shard.
    #[must_use]
    pub fn byte_range(self, num_chunks: u64) -> ByteRange {
        let size = ShardIndex::encoded_size(num_chunks);
        match self {
            Self::Start => ByteRange::FromStart(0, Some(size)),
            Self::End => ByteRange::FromEnd(0, Some(size)),
        }
    }
}

/// The location of a chunk payload within a shard.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Display)]
#[display("offset {offset} length {length}")]
pub struct ShardIndexEntry {
    /// The offset of the chunk payload from the start of the shard.
    pub offset: u64,
    /// The length of the chunk payload.
    pub length: u64,
}

impl ShardIndexEntry {
    /// Return the byte range of the chunk payload within the shard.
    #[must_use]
    pub const fn byte_range(&self) -> ByteRange {
        ByteRange::FromStart(self.offset, Some(self.length))
    }
}

/// A shard index error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShardIndexError {
    /// The encoded index has the wrong size.
    #[error("shard index has size {0}, expected {1}")]
    InvalidSize(u64, u64),
    /// The index checksum does not match its entries.
    #[error("shard index checksum is invalid")]
    InvalidChecksum,
    /// An entry has exactly one of its offset and length set to the sentinel.
    #[error("shard index entry {0} is partially absent")]
    HalfSentinel(u64),
    /// An entry extends beyond the addressable range.
    #[error("shard index entry {0} overflows")]
    EntryOverflow(u64),
    /// Two entries overlap.
    #[error("shard index entries {0} and {1} overlap")]
    OverlappingEntries(u64, u64),
    /// A local chunk index is not a slot of the index.
    #[error("local chunk index {0} is out of range for a shard index with {1} entries")]
    LocalIndexOutOfRange(u64, u64),
    /// An entry lies outside of the chunk data region of the shard.
    #[error("shard index entry {0} lies outside of the shard data")]
    EntryOutOfBounds(u64),
    /// The shard is too short to hold its index.
    #[error("shard has size {0}, which is smaller than its index size {1}")]
    ShardTooShort(u64, u64),
}

/// A shard index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardIndex {
    entries: Vec<Option<ShardIndexEntry>>,
}

impl ShardIndex {
    /// Create a shard index with `num_chunks` absent entries.
    ///
    /// # Panics
    /// Panics if `num_chunks` exceeds [`usize::MAX`].
    #[must_use]
    pub fn new_empty(num_chunks: u64) -> Self {
        Self {
            entries: vec![None; usize::try_from(num_chunks).unwrap()],
        }
    }

    /// Return the size of an encoded shard index with `num_chunks` entries.
    #[must_use]
    pub const fn encoded_size(num_chunks: u64) -> u64 {
        ENTRY_SIZE * num_chunks + CHECKSUM_SIZE
    }

    /// Return the number of entries.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Returns true if every entry is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Return the entry of the chunk at `local_index`, or [`None`] if it is absent or out of range.
    #[must_use]
    pub fn entry(&self, local_index: u64) -> Option<ShardIndexEntry> {
        usize::try_from(local_index)
            .ok()
            .and_then(|i| self.entries.get(i).copied().flatten())
    }

    /// Set the entry of the chunk at `local_index`. [`None`] marks the chunk as absent.
    ///
    /// # Errors
    /// Returns [`ShardIndexError::LocalIndexOutOfRange`] if `local_index` is not a slot of the index.
    pub fn set_entry(
        &mut self,
        local_index: u64,
        entry: Option<ShardIndexEntry>,
    ) -> Result<(), ShardIndexError> {
        let num_chunks = self.num_chunks();
        let slot = usize::try_from(local_index)
            .ok()
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(ShardIndexError::LocalIndexOutOfRange(local_index, num_chunks))?;
        *slot = entry;
        Ok(())
    }

    /// Iterate over the local chunk indices and entries of present chunks.
    pub fn iter_present(&self) -> impl Iterator<Item = (u64, ShardIndexEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.map(|entry| (i as u64, entry)))
    }

    /// Return the end of the last chunk payload, or zero if every entry is absent.
    #[must_use]
    pub fn data_end(&self) -> u64 {
        self.iter_present()
            .map(|(_, entry)| entry.offset + entry.length)
            .max()
            .unwrap_or_default()
    }

    /// Encode the shard index.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(
            usize::try_from(Self::encoded_size(self.num_chunks())).unwrap_or_default(),
        );
        for entry in &self.entries {
            let (offset, length) = entry.map_or((SHARD_INDEX_SENTINEL, SHARD_INDEX_SENTINEL), |e| {
                (e.offset, e.length)
            });
            encoded.extend_from_slice(&offset.to_le_bytes());
            encoded.extend_from_slice(&length.to_le_bytes());
        }
        let checksum = crc32c::crc32c(&encoded);
        encoded.extend_from_slice(&checksum.to_le_bytes());
        encoded
    }

    /// Decode a shard index with `num_chunks` entries.
    ///
    /// The checksum is always validated.
    ///
    /// # Errors
    /// Returns [`ShardIndexError`] if
    ///  - `encoded` is not [`encoded_size`](Self::encoded_size) bytes,
    ///  - the checksum does not match,
    ///  - an entry is half absent or overflows, or
    ///  - any two present entries overlap.
    pub fn decode(encoded: &[u8], num_chunks: u64) -> Result<Self, ShardIndexError> {
        let expected_size = Self::encoded_size(num_chunks);
        if encoded.len() as u64 != expected_size {
            return Err(ShardIndexError::InvalidSize(
                encoded.len() as u64,
                expected_size,
            ));
        }
        let (entries_bytes, checksum) = encoded.split_at(encoded.len() - CHECKSUM_SIZE as usize);
        if crc32c::crc32c(entries_bytes).to_le_bytes() != checksum {
            return Err(ShardIndexError::InvalidChecksum);
        }

        let entries = entries_bytes
            .chunks_exact(ENTRY_SIZE as usize)
            .enumerate()
            .map(|(i, entry)| {
                let (offset, length) = entry.split_at(core::mem::size_of::<u64>());
                let offset = u64::from_le_bytes(offset.try_into().unwrap_or_default());
                let length = u64::from_le_bytes(length.try_into().unwrap_or_default());
                match (offset, length) {
                    (SHARD_INDEX_SENTINEL, SHARD_INDEX_SENTINEL) => Ok(None),
                    (SHARD_INDEX_SENTINEL, _) | (_, SHARD_INDEX_SENTINEL) => {
                        Err(ShardIndexError::HalfSentinel(i as u64))
                    }
                    (offset, length) if offset.checked_add(length).is_none() => {
                        Err(ShardIndexError::EntryOverflow(i as u64))
                    }
                    (offset, length) => Ok(Some(ShardIndexEntry { offset, length })),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let index = Self { entries };
        index.validate_no_overlap()?;
        Ok(index)
    }

    /// Check that every present entry lies within `data`, the chunk data region of the shard.
    ///
    /// # Errors
    /// Returns [`ShardIndexError::EntryOutOfBounds`] for the first entry outside of `data`.
    pub fn validate_bounds(&self, data: core::ops::Range<u64>) -> Result<(), ShardIndexError> {
        match self.iter_present().find(|(_, entry)| {
            entry.length > 0
                && (entry.offset < data.start || entry.offset + entry.length > data.end)
        }) {
            Some((local_index, _)) => Err(ShardIndexError::EntryOutOfBounds(local_index)),
            None => Ok(()),
        }
    }

    fn validate_no_overlap(&self) -> Result<(), ShardIndexError> {
        let mut present: Vec<(u64, ShardIndexEntry)> = self
            .iter_present()
            .filter(|(_, entry)| entry.length > 0)
            .collect();
        present.sort_unstable_by_key(|(_, entry)| entry.offset);
        for pair in present.windows(2) {
            let (index_a, a) = pair[0];
            let (index_b, b) = pair[1];
            if a.offset + a.length > b.offset {
                return Err(ShardIndexError::OverlappingEntries(index_a, index_b));
            }
        }
        Ok(())
    }
}
