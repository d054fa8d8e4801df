//! A storage adapter which logs function calls.

use std::sync::Arc;

use itertools::Itertools;

use crate::{
    byte_range::ByteRange,
    storage::{
        Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
        StoreKeys, StorePrefix, WritableStorageTraits,
    },
};

/// The usage log storage adapter. Logs storage method calls at [`log::Level::Info`] with the `shardstore::usage` target.
///
/// It is intended to aid in debugging and optimising performance by revealing storage access patterns.
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// # use shardstore::storage::store::MemoryStore;
/// # use shardstore::storage::storage_adapter::UsageLogStorageAdapter;
/// let store = Arc::new(MemoryStore::new());
/// let store = Arc::new(UsageLogStorageAdapter::new(store));
/// ```
///
/// Committing and reading back a sharded array through the above adapter logs lines like:
/// ```text
/// set(volume/c/0/0, len=172) -> Ok(())
/// get_partial_values_key(volume/c/0/0, [-36..]) -> len=Ok([36])
/// get_partial_values_key(volume/c/0/0, [0..16, 16..32]) -> len=Ok([16, 16])
/// ```
pub struct UsageLogStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
}

impl<TStorage: ?Sized> core::fmt::Debug for UsageLogStorageAdapter<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "usage log")
    }
}

impl<TStorage: ?Sized> UsageLogStorageAdapter<TStorage> {
    /// Create a new usage log storage adapter.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self { storage }
    }
}

const TARGET: &str = "shardstore::usage";

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let result = self.storage.get(key);
        log::info!(
            target: TARGET,
            "get({key}) -> len={:?}",
            result.as_ref().map(|v| v.as_ref().map_or(0, Bytes::len))
        );
        result
    }

    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let result = self.storage.get_partial_values_key(key, byte_ranges);
        log::info!(
            target: TARGET,
            "get_partial_values_key({key}, [{}]) -> len={:?}",
            byte_ranges.iter().format(", "),
            result.as_ref().map(|v| {
                v.as_ref()
                    .map_or(vec![], |v| v.iter().map(Bytes::len).collect_vec())
            })
        );
        result
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let result = self.storage.size_key(key);
        log::info!(target: TARGET, "size_key({key}) -> {result:?}");
        result
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> ListableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn list(&self) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list();
        log::info!(target: TARGET, "list() -> {result:?}");
        result
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let result = self.storage.list_prefix(prefix);
        log::info!(target: TARGET, "list_prefix({prefix}) -> {result:?}");
        result
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> WritableStorageTraits
    for UsageLogStorageAdapter<TStorage>
{
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let len = value.len();
        let result = self.storage.set(key, value);
        log::info!(target: TARGET, "set({key}, len={len}) -> {result:?}");
        result
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let result = self.storage.erase(key);
        log::info!(target: TARGET, "erase({key}) -> {result:?}");
        result
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        let result = self.storage.erase_prefix(prefix);
        log::info!(target: TARGET, "erase_prefix({prefix}) -> {result:?}");
        result
    }
}
