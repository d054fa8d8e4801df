//! Key-value storage ([stores](store) and [storage adapters](storage_adapter)).
//!
//! A [store] is a system that can be used to store and retrieve values by [`StoreKey`], such as memory or a filesystem.
//! A [storage adapter](storage_adapter) wraps a store and has the same interface as a store.
//!
//! Every shard of an [`ArrayStore`](crate::array::ArrayStore) is one value in a store.
//! Readers use ranged gets ([`ReadableStorageTraits::get_partial_values_key`]) so that only the shard index and requested chunks are transferred.
//! Writers replace an entire shard with a single [`WritableStorageTraits::set`].

pub mod storage_adapter;
mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;

use std::sync::Arc;

use thiserror::Error;

use crate::byte_range::InvalidByteRangeError;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError};

pub use self::storage_sync::{
    ListableStorageTraits, ReadableStorageTraits, ReadableWritableListableStorageTraits,
    ReadableWritableStorageTraits, WritableStorageTraits,
};

/// Owned bytes of a store value.
pub type Bytes = Vec<u8>;

/// An optional store value. [`None`] if the key does not exist.
pub type MaybeBytes = Option<Bytes>;

/// [`Arc`] wrapped readable storage.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// [`Arc`] wrapped readable and writable storage.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// [`Arc`] wrapped readable, writable, and listable storage.
pub type ReadableWritableListableStorage = Arc<dyn ReadableWritableListableStorageTraits>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid byte range.
    #[error("invalid byte range {0}")]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// The requested method is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The name of the array metadata document under an array prefix.
pub const ARRAY_METADATA_NAME: &str = "array.json";

/// Return the array metadata key (`array.json`) for the array at `prefix`.
#[must_use]
pub fn meta_key(prefix: &StorePrefix) -> StoreKey {
    StoreKey::from_prefix_and_name(prefix, ARRAY_METADATA_NAME)
}

/// Return the shard key for the shard at `shard_indices` of the array at `prefix`.
///
/// Shard keys are `<prefix>c/<i0>/<i1>/...`, for example `volume/c/1/0`.
#[must_use]
pub fn shard_key(prefix: &StorePrefix, shard_indices: &[u64]) -> StoreKey {
    let mut name = String::from("c");
    for index in shard_indices {
        name.push('/');
        name.push_str(&index.to_string());
    }
    StoreKey::from_prefix_and_name(prefix, &name)
}
