use std::sync::Arc;

use crate::{
    array::shard_index::{ShardIndex, ShardIndexError, ShardIndexLocation},
    storage::{ReadableStorageTraits, StorageError, StoreKey},
};

use super::ShardError;

/// Reads the chunk payloads of a shard with ranged gets.
///
/// Opening a reader retrieves the shard index, and the shard size if the index is at the end.
/// Chunk payloads are retrieved on request.
pub struct ShardReader<'a, TStorage: ?Sized + ReadableStorageTraits> {
    storage: &'a TStorage,
    key: StoreKey,
    num_chunks: u64,
    index: Option<Arc<ShardIndex>>,
}

impl<'a, TStorage: ?Sized + ReadableStorageTraits> ShardReader<'a, TStorage> {
    /// Open the shard at `key`, retrieving its index.
    ///
    /// A missing key is an absent shard, every chunk of which is absent.
    ///
    /// # Errors
    /// Returns [`ShardError::IndexError`] if
    ///  - the index is corrupt,
    ///  - the shard is too short to hold it, or
    ///  - an entry lies outside of the chunk data of the shard.
    ///
    /// Returns [`ShardError::StorageError`] if there is an underlying store error.
    pub fn open(
        storage: &'a TStorage,
        key: &StoreKey,
        num_chunks: u64,
        location: ShardIndexLocation,
    ) -> Result<Self, ShardError> {
        let index_size = ShardIndex::encoded_size(num_chunks);
        log::trace!("retrieving shard index of {key} ({index_size} bytes at the {location})");
        let index = match storage.get_partial_values_key(key, &[location.byte_range(num_chunks)])
        {
            Ok(Some(mut encoded_index)) => {
                let encoded_index = encoded_index.remove(0);
                let index = ShardIndex::decode(&encoded_index, num_chunks)?;
                // Entries must not reach into the index
                match location {
                    ShardIndexLocation::Start => index.validate_bounds(index_size..u64::MAX)?,
                    ShardIndexLocation::End => {
                        let shard_size = storage.size_key(key)?.unwrap_or_default();
                        index.validate_bounds(0..shard_size.saturating_sub(index_size))?;
                    }
                }
                Some(Arc::new(index))
            }
            Ok(None) => None,
            Err(StorageError::InvalidByteRangeError(_)) => {
                let shard_size = storage.size_key(key)?.unwrap_or_default();
                return Err(ShardIndexError::ShardTooShort(shard_size, index_size).into());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            storage,
            key: key.clone(),
            num_chunks,
            index,
        })
    }

    /// Return the shard index, or [`None`] if the shard is absent.
    #[must_use]
    pub fn index(&self) -> Option<&Arc<ShardIndex>> {
        self.index.as_ref()
    }

    /// Return the shard key.
    #[must_use]
    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Retrieve the encoded payload of the chunk at `local_index`.
    ///
    /// Returns [`None`] if the chunk is absent.
    ///
    /// # Errors
    /// See [`retrieve_chunks`](ShardReader::retrieve_chunks).
    pub fn retrieve_chunk(&self, local_index: u64) -> Result<Option<Vec<u8>>, ShardError> {
        Ok(self.retrieve_chunks(&[local_index])?.remove(0))
    }

    /// Retrieve the encoded payloads of the chunks at `local_indices` with a single ranged get.
    ///
    /// Absent chunks are [`None`].
    ///
    /// # Errors
    /// Returns [`ShardError::LocalIndexOutOfRange`] if a local index is not a slot of the shard.
    /// Returns [`ShardError::IndexError`] if an index entry extends beyond the end of the shard.
    /// Returns [`ShardError::StorageError`] if there is an underlying store error.
    pub fn retrieve_chunks(&self, local_indices: &[u64]) -> Result<Vec<Option<Vec<u8>>>, ShardError> {
        if let Some(local_index) = local_indices
            .iter()
            .find(|local_index| **local_index >= self.num_chunks)
        {
            return Err(ShardError::LocalIndexOutOfRange(
                *local_index,
                self.num_chunks,
            ));
        }
        let Some(index) = &self.index else {
            return Ok(vec![None; local_indices.len()]);
        };

        let entries: Vec<_> = local_indices
            .iter()
            .map(|local_index| index.entry(*local_index))
            .collect();
        let byte_ranges: Vec<_> = entries
            .iter()
            .flatten()
            .map(|entry| entry.byte_range())
            .collect();
        if byte_ranges.is_empty() {
            return Ok(vec![None; local_indices.len()]);
        }

        let payloads = match self.storage.get_partial_values_key(&self.key, &byte_ranges) {
            Ok(payloads) => payloads,
            Err(StorageError::InvalidByteRangeError(_)) => {
                let local_index = self.first_out_of_bounds(index, local_indices)?;
                return Err(ShardIndexError::EntryOutOfBounds(local_index).into());
            }
            Err(err) => return Err(err.into()),
        };
        // The shard was erased after its index was retrieved
        let Some(payloads) = payloads else {
            return Ok(vec![None; local_indices.len()]);
        };

        let mut payloads = payloads.into_iter();
        Ok(entries
            .iter()
            .map(|entry| entry.and_then(|_| payloads.next()))
            .collect())
    }

    fn first_out_of_bounds(
        &self,
        index: &ShardIndex,
        local_indices: &[u64],
    ) -> Result<u64, ShardError> {
        let shard_size = self.storage.size_key(&self.key)?.unwrap_or_default();
        Ok(local_indices
            .iter()
            .copied()
            .find(|local_index| {
                index
                    .entry(*local_index)
                    .is_some_and(|entry| entry.offset + entry.length > shard_size)
            })
            .unwrap_or_default())
    }
}
