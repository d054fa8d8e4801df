//! A rust library for chunked and sharded N-dimensional array storage.
//!
//! An [`ArrayStore`](array::ArrayStore) maps a logical N-dimensional array onto fixed-size chunks, and groups chunks into shards.
//! Each shard is a single value in a key-value [store](storage) holding the encoded chunk payloads and a fixed-size [shard index](array::shard_index) with a CRC32C checksum.
//! The on-disk layout of a shard matches the Zarr V3 `sharding_indexed` codec with `bytes` + `crc32c` index codecs.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use shardstore::array::{ArrayStoreBuilder, DataType, FillValue};
//! use shardstore::array_subset::ArraySubset;
//! use shardstore::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayStoreBuilder::new(
//!     vec![8, 8],                     // volume shape
//!     DataType::UInt8,
//!     vec![4, 4].try_into()?,         // chunk shape
//!     vec![8, 4].try_into()?,         // shard shape
//!     FillValue::from(0u8),
//! )
//! .build(store, "/volume")?;
//!
//! array.write_region_elements::<u8>(&ArraySubset::new_with_ranges(&[0..2, 0..2]), &[5; 4])?;
//! array.commit()?;
//!
//! let block = array.read_region_elements::<u8>(&ArraySubset::new_with_ranges(&[0..4, 0..4]))?;
//! assert_eq!(&block[..4], &[5, 5, 0, 0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: [`ndarray`] utility functions for [`ArrayStore`](crate::array::ArrayStore).
//!  - `gzip`: the `gzip` codec.
//!
//! ## Logging
//! This crate logs through the [`log`] facade and does not install a logger.
//!
//! ## Licence
//! `shardstore` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod config;
pub mod metadata;
pub mod plugin;
pub mod storage;
