use crate::array::shard_index::{ShardIndex, ShardIndexEntry, ShardIndexError, ShardIndexLocation};

use super::{data_offset, ShardError};

/// Assembles an encoded shard in memory.
///
/// Chunk payloads are appended to a contiguous data region in the order they are stored, and their entries are recorded in the shard index.
/// Each chunk slot may be stored or erased at most once per writer (a shard "generation").
/// [`finalize`](ShardWriter::finalize) serializes the index after all payloads have been placed.
///
/// A writer created [from an existing shard](ShardWriter::from_existing) keeps the existing payloads in place.
/// Rewritten chunks are appended and the superseded bytes are left unreferenced.
#[derive(Debug)]
pub struct ShardWriter {
    location: ShardIndexLocation,
    index: ShardIndex,
    data: Vec<u8>,
    data_offset: u64,
    written: Vec<bool>,
}

impl ShardWriter {
    /// Create a writer for a new shard with `num_chunks` chunk slots.
    ///
    /// # Panics
    /// Panics if `num_chunks` exceeds [`usize::MAX`].
    #[must_use]
    pub fn new(num_chunks: u64, location: ShardIndexLocation) -> Self {
        Self {
            location,
            index: ShardIndex::new_empty(num_chunks),
            data: Vec::new(),
            data_offset: data_offset(location, num_chunks),
            written: vec![false; usize::try_from(num_chunks).unwrap()],
        }
    }

    /// Create a writer that appends to the finalized shard `encoded_shard`.
    ///
    /// # Errors
    /// Returns [`ShardError::IndexError`] if the shard is too short to hold its index, the index is corrupt, or an entry lies outside of the shard data.
    ///
    /// # Panics
    /// Panics if `num_chunks` exceeds [`usize::MAX`].
    pub fn from_existing(
        mut encoded_shard: Vec<u8>,
        num_chunks: u64,
        location: ShardIndexLocation,
    ) -> Result<Self, ShardError> {
        let shard_size = encoded_shard.len() as u64;
        let index_size = ShardIndex::encoded_size(num_chunks);
        if shard_size < index_size {
            return Err(ShardIndexError::ShardTooShort(shard_size, index_size).into());
        }
        let index_range = location.byte_range(num_chunks).to_range_usize(shard_size);
        let index = ShardIndex::decode(&encoded_shard[index_range.clone()], num_chunks)?;

        let data_offset = data_offset(location, num_chunks);
        let data = match location {
            ShardIndexLocation::Start => encoded_shard.split_off(index_range.end),
            ShardIndexLocation::End => {
                encoded_shard.truncate(index_range.start);
                encoded_shard
            }
        };
        index.validate_bounds(data_offset..data_offset + data.len() as u64)?;

        Ok(Self {
            location,
            index,
            data,
            data_offset,
            written: vec![false; usize::try_from(num_chunks).unwrap()],
        })
    }

    /// Return the shard index as it stands.
    #[must_use]
    pub fn index(&self) -> &ShardIndex {
        &self.index
    }

    /// Return the number of chunk slots stored or erased by this writer.
    #[must_use]
    pub fn num_written(&self) -> usize {
        self.written.iter().filter(|written| **written).count()
    }

    fn claim_slot(&mut self, local_index: u64) -> Result<(), ShardError> {
        let num_chunks = self.index.num_chunks();
        let written = usize::try_from(local_index)
            .ok()
            .and_then(|i| self.written.get_mut(i))
            .ok_or(ShardError::LocalIndexOutOfRange(local_index, num_chunks))?;
        if *written {
            return Err(ShardError::ChunkAlreadyWritten(local_index));
        }
        *written = true;
        Ok(())
    }

    /// Append the encoded chunk `payload` for the chunk slot `local_index`.
    ///
    /// # Errors
    /// Returns [`ShardError::LocalIndexOutOfRange`] if `local_index` is not a slot of the shard, or [`ShardError::ChunkAlreadyWritten`] if the slot has already been written by this writer.
    pub fn store_chunk(&mut self, local_index: u64, payload: &[u8]) -> Result<(), ShardError> {
        self.claim_slot(local_index)?;
        let entry = ShardIndexEntry {
            offset: self.data_offset + self.data.len() as u64,
            length: payload.len() as u64,
        };
        self.data.extend_from_slice(payload);
        self.index.set_entry(local_index, Some(entry))?;
        Ok(())
    }

    /// Mark the chunk slot `local_index` as absent.
    ///
    /// # Errors
    /// Returns [`ShardError::LocalIndexOutOfRange`] if `local_index` is not a slot of the shard, or [`ShardError::ChunkAlreadyWritten`] if the slot has already been written by this writer.
    pub fn erase_chunk(&mut self, local_index: u64) -> Result<(), ShardError> {
        self.claim_slot(local_index)?;
        self.index.set_entry(local_index, None)?;
        Ok(())
    }

    /// Serialize the shard, returning the encoded shard and its index.
    #[must_use]
    pub fn finalize(self) -> (Vec<u8>, ShardIndex) {
        let encoded_index = self.index.encode();
        let shard = match self.location {
            ShardIndexLocation::Start => {
                let mut shard = encoded_index;
                shard.extend_from_slice(&self.data);
                shard
            }
            ShardIndexLocation::End => {
                let mut shard = self.data;
                shard.extend_from_slice(&encoded_index);
                shard
            }
        };
        (shard, self.index)
    }
}
