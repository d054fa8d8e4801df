//! Shardstore global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the shardstore crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Validate Checksums
///  > default: [`true`]
///
/// If enabled, the `crc32c` codec will validate that encoded chunk data matches its stored checksum, otherwise validation is skipped.
/// The checksum of a shard index is always validated regardless of this option.
///
/// ## Chunk Concurrent Limit
/// > default: [`std::thread::available_parallelism`]`()`
///
/// The maximum number of chunks encoded or decoded concurrently within a single region read or write, and the maximum number of shards flushed concurrently on commit.
/// The concurrent limit is disabled if set to zero.
///
/// ## Store Empty Chunks
/// > default: [`false`]
///
/// The default for [`ArrayStoreBuilder::store_empty_chunks`](crate::array::ArrayStoreBuilder::store_empty_chunks).
/// If disabled, a chunk that is entirely the fill value is recorded as absent in its shard index rather than stored.
#[derive(Debug)]
pub struct Config {
    validate_checksums: bool,
    chunk_concurrent_limit: usize,
    store_empty_chunks: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            validate_checksums: true,
            chunk_concurrent_limit: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
            store_empty_chunks: false,
        }
    }
}

impl Config {
    /// Get the [validate checksums](#validate-checksums) configuration.
    #[must_use]
    pub fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set the [validate checksums](#validate-checksums) configuration.
    pub fn set_validate_checksums(&mut self, validate_checksums: bool) {
        self.validate_checksums = validate_checksums;
    }

    /// Get the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    #[must_use]
    pub fn chunk_concurrent_limit(&self) -> usize {
        self.chunk_concurrent_limit
    }

    /// Set the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    pub fn set_chunk_concurrent_limit(&mut self, concurrent_limit: usize) {
        self.chunk_concurrent_limit = concurrent_limit;
    }

    /// Get the [store empty chunks](#store-empty-chunks) configuration.
    #[must_use]
    pub fn store_empty_chunks(&self) -> bool {
        self.store_empty_chunks
    }

    /// Set the [store empty chunks](#store-empty-chunks) configuration.
    pub fn set_store_empty_chunks(&mut self, store_empty_chunks: bool) {
        self.store_empty_chunks = store_empty_chunks;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global shardstore configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global shardstore configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_chunk_concurrent_limit() {
        let limit = global_config().chunk_concurrent_limit();
        assert!(limit > 0);
        global_config_mut().set_chunk_concurrent_limit(1);
        assert_eq!(global_config().chunk_concurrent_limit(), 1);
        global_config_mut().set_chunk_concurrent_limit(limit);
    }
}
