//! Chunked and sharded arrays.
//!
//! An [`ArrayStore`] is an N-dimensional array of fixed-size elements held in a key-value [store](crate::storage).
//! The array is split into a regular grid of chunks and chunks are grouped into shards, see [`geometry`].
//! Each shard is one store value holding its encoded chunks and a [shard index](shard_index).
//!
//! Use [`ArrayStoreBuilder`] to setup a new array, or [`ArrayStore::open`] for an array whose configuration was written with [`ArrayStore::store_metadata`].

mod array_builder;
mod array_config;
mod array_errors;
mod array_store_readable;
mod array_store_writable;
mod bytes_representation;
mod chunk_representation;
mod chunk_shape;
pub mod codec;
pub mod data_type;
mod element;
mod fill_value;
pub mod geometry;
pub mod shard;
pub mod shard_index;

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

pub use self::{
    array_builder::ArrayStoreBuilder,
    array_config::ArrayConfig,
    array_errors::{ArrayCreateError, ArrayError},
    bytes_representation::BytesRepresentation,
    chunk_representation::ChunkRepresentation,
    chunk_shape::{chunk_shape_to_array_shape, ChunkShape, NonZeroError},
    codec::CodecChain,
    data_type::DataType,
    element::{transmute_from_bytes_vec, transmute_to_bytes, Element},
    fill_value::FillValue,
    geometry::{ArrayGeometry, ChunkIntersection, ChunkLocation, InvalidGeometryError},
    shard_index::{ShardIndex, ShardIndexLocation},
};

use parking_lot::Mutex;

use crate::{
    config::global_config,
    plugin::PluginCreateError,
    storage::{meta_key, shard_key, StorageError, StoreKey, StorePrefix, WritableStorageTraits},
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// Encoded chunks awaiting commit, keyed by local chunk index. [`None`] marks an erased chunk.
type PendingShard = BTreeMap<u64, Option<Vec<u8>>>;

/// A chunked and sharded array.
///
/// ### Configuration
///
/// An array is defined by the following parameters, persisted as an [`ArrayConfig`]:
///  - **volume shape**: the length of each array dimension,
///  - **chunk shape**: the shape of each chunk, no larger than the volume shape,
///  - **shard shape**: the shape of each shard, a multiple of the chunk shape,
///  - **data type**: the numerical representation of array elements,
///  - **fill value**: the element value of unwritten portions of the array,
///  - **index location**: whether the index is at the start or end of each shard, and
///  - **codecs**: used to encode and decode chunks, all lossless.
///
/// ### Writing
///
/// Writes are buffered in memory per shard, and are visible to reads of the same [`ArrayStore`] immediately.
/// [`commit`](ArrayStore::commit) writes each shard with pending chunks to the store with a single `set`, so many chunk writes to a shard are coalesced into one store operation.
/// Writes which have not been committed are lost if the [`ArrayStore`] is dropped.
///
/// A write which covers part of a chunk reads the existing chunk and updates it (copy-on-write at chunk granularity).
/// If two threads write overlapping parts of the same chunk concurrently, the chunk holds the result of whichever finished last.
///
/// A shard must have at most one writer at a time.
/// Multiple [`ArrayStore`]s writing to the same shard will lose each other's chunks.
///
/// ### Reading
///
/// Each read retrieves the index of each intersected shard and then the intersected chunks with a single ranged get per shard.
/// Absent chunks, absent shards, and positions outside of the array read as the fill value.
/// A corrupt shard index fails reads of that shard with [`ArrayError::CorruptIndex`], other shards are unaffected.
///
/// ### Methods
///  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits)
///    - [`read_region`](ArrayStore::read_region) / [`read_region_elements`](ArrayStore::read_region_elements) / [`read_region_ndarray`](ArrayStore::read_region_ndarray)
///    - [`retrieve_chunk`](ArrayStore::retrieve_chunk) / [`retrieve_chunk_if_exists`](ArrayStore::retrieve_chunk_if_exists)
///  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits)
///    - [`write_region`](ArrayStore::write_region) / [`write_region_elements`](ArrayStore::write_region_elements) / [`write_region_ndarray`](ArrayStore::write_region_ndarray)
///    - [`store_chunk`](ArrayStore::store_chunk) / [`erase_chunk`](ArrayStore::erase_chunk)
///    - [`commit`](ArrayStore::commit)
pub struct ArrayStore<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The prefix of the array in the storage.
    prefix: StorePrefix,
    /// The persisted configuration.
    config: ArrayConfig,
    /// The chunk and shard grids.
    geometry: ArrayGeometry,
    /// The representation of every chunk.
    chunk_representation: ChunkRepresentation,
    /// The chunk codecs.
    codecs: CodecChain,
    /// Store chunks equal to the fill value.
    store_empty_chunks: bool,
    /// Encoded chunks awaiting commit, keyed by shard indices.
    pending: Mutex<HashMap<ArrayIndices, PendingShard>>,
}

impl<TStorage: ?Sized> core::fmt::Debug for ArrayStore<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArrayStore")
            .field("prefix", &self.prefix)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<TStorage: ?Sized> ArrayStore<TStorage> {
    /// Create an array at `path` of `storage` from `config`.
    ///
    /// This does not write to the store, use [`store_metadata`](ArrayStore::store_metadata) to persist the configuration.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - `path` is not an absolute path,
    ///  - the volume, chunk, and shard shapes are incompatible,
    ///  - the fill value is incompatible with the data type, or
    ///  - a codec is unsupported, lossy, or incompatible with the data type.
    pub fn new_with_config(
        storage: Arc<TStorage>,
        path: &str,
        config: &ArrayConfig,
    ) -> Result<Self, ArrayCreateError> {
        let prefix = StorePrefix::from_path(path)?;
        let geometry = ArrayGeometry::new(
            config.volume_shape.clone(),
            config.chunk_shape.clone(),
            config.shard_shape.clone(),
        )?;
        let fill_value = config.data_type.fill_value_from_metadata(&config.fill_value)?;
        let chunk_representation =
            ChunkRepresentation::new(config.chunk_shape.clone(), config.data_type, fill_value)?;
        let codecs = CodecChain::from_metadata(&config.codecs)?;
        codecs
            .compute_encoded_size(&chunk_representation)
            .map_err(|err| PluginCreateError::Other(err.to_string()))?;

        let config = ArrayConfig {
            codecs: codecs.create_metadatas(),
            ..config.clone()
        };
        Ok(Self {
            storage,
            prefix,
            config,
            geometry,
            chunk_representation,
            codecs,
            store_empty_chunks: global_config().store_empty_chunks(),
            pending: Mutex::default(),
        })
    }

    /// Return the persisted configuration of the array.
    ///
    /// An empty codec list is expanded to the default codec chain.
    #[must_use]
    pub const fn config(&self) -> &ArrayConfig {
        &self.config
    }

    /// Return the underlying storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Return the prefix of the array in the storage.
    #[must_use]
    pub const fn prefix(&self) -> &StorePrefix {
        &self.prefix
    }

    /// Return the array geometry.
    #[must_use]
    pub const fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    /// Return the volume shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.geometry.shape()
    }

    /// Return the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.geometry.dimensionality()
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        self.geometry.chunk_shape()
    }

    /// Return the shard shape.
    #[must_use]
    pub fn shard_shape(&self) -> &ChunkShape {
        self.geometry.shard_shape()
    }

    /// Return the data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        *self.chunk_representation.data_type()
    }

    /// Return the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &FillValue {
        self.chunk_representation.fill_value()
    }

    /// Return the representation of every chunk.
    #[must_use]
    pub const fn chunk_representation(&self) -> &ChunkRepresentation {
        &self.chunk_representation
    }

    /// Return the chunk codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Return the shard index location.
    #[must_use]
    pub const fn index_location(&self) -> ShardIndexLocation {
        self.config.index_location
    }

    /// Returns true if chunks equal to the fill value are stored rather than recorded as absent.
    #[must_use]
    pub const fn store_empty_chunks(&self) -> bool {
        self.store_empty_chunks
    }

    /// Set whether chunks equal to the fill value are stored rather than recorded as absent.
    pub fn set_store_empty_chunks(&mut self, store_empty_chunks: bool) {
        self.store_empty_chunks = store_empty_chunks;
    }

    /// Return the store key of the shard at `shard_indices`.
    #[must_use]
    pub fn shard_key(&self, shard_indices: &[u64]) -> StoreKey {
        shard_key(&self.prefix, shard_indices)
    }

    /// Return the store key of the array configuration.
    #[must_use]
    pub fn metadata_key(&self) -> StoreKey {
        meta_key(&self.prefix)
    }

    /// Returns true if there are writes which have not been committed.
    #[must_use]
    pub fn has_pending_writes(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Discard every write which has not been committed.
    pub fn discard_pending(&self) {
        self.pending.lock().clear();
    }

    /// Return the shard location of the chunk at `chunk_indices`.
    fn chunk_location(&self, chunk_indices: &[u64]) -> Result<ChunkLocation, ArrayError> {
        self.geometry
            .chunk_location(chunk_indices)
            .ok_or_else(|| ArrayError::InvalidChunkIndices(chunk_indices.to_vec()))
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> ArrayStore<TStorage> {
    /// Store the array configuration as JSON under `array.json` in the array prefix.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let config = serde_json::to_vec_pretty(&self.config)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&self.metadata_key(), config)
    }
}

impl<TStorage: ?Sized + crate::storage::ReadableStorageTraits> ArrayStore<TStorage> {
    /// Open the array at `path` of `storage` from its stored configuration.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::MissingMetadata`] if there is no array configuration at `path`, or another [`ArrayCreateError`] if it is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let prefix = StorePrefix::from_path(path)?;
        let config = storage
            .get(&meta_key(&prefix))?
            .ok_or(ArrayCreateError::MissingMetadata)?;
        let config: ArrayConfig = serde_json::from_slice(&config)?;
        Self::new_with_config(storage, path, &config)
    }
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}

/// Return the concurrent limit for processing `num_items` chunks or shards.
fn chunk_concurrent_limit(num_items: usize) -> usize {
    match global_config().chunk_concurrent_limit() {
        0 => num_items.max(1),
        limit => limit,
    }
}

#[cfg(feature = "ndarray")]
fn iter_u64_to_usize<'a, I: Iterator<Item = &'a u64>>(iter: I) -> Vec<usize> {
    iter.map(|v| usize::try_from(*v).unwrap())
        .collect::<Vec<_>>()
}
