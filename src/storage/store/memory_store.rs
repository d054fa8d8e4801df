//! An in-memory store.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;

use crate::{
    byte_range::{extract_byte_ranges, ByteRange},
    storage::{
        Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
        StoreKeys, StorePrefix, WritableStorageTraits,
    },
};

/// An in-memory store.
///
/// Values are immutable once stored, a [`set`](WritableStorageTraits::set) swaps in a new value atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: Mutex<BTreeMap<StoreKey, Arc<Bytes>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn value(&self, key: &StoreKey) -> Option<Arc<Bytes>> {
        self.data_map.lock().get(key).cloned()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        Ok(self.value(key).map(|data| data.as_ref().clone()))
    }

    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        match self.value(key) {
            Some(data) => Ok(Some(extract_byte_ranges(&data, byte_ranges)?)),
            None => Ok(None),
        }
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.value(key).map(|data| data.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.data_map.lock().insert(key.clone(), Arc::new(value));
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.data_map.lock().remove(key);
        Ok(())
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.data_map.lock().retain(|key, _| !key.has_prefix(prefix));
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        Ok(self.data_map.lock().keys().cloned().collect())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .data_map
            .lock()
            .keys()
            .filter(|&key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }
}
