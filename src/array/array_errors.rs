use thiserror::Error;

use crate::{
    array_subset::{
        ArrayExtractBytesError, ArraySubset, ArrayStoreBytesError, IncompatibleDimensionalityError,
    },
    plugin::PluginCreateError,
    storage::{StorageError, StoreKey, StorePrefixError},
};

use super::{
    codec::CodecError,
    data_type::{IncompatibleFillValueError, IncompatibleFillValueMetadataError, UnsupportedDataTypeError},
    geometry::InvalidGeometryError,
    shard::ShardError,
    shard_index::ShardIndexError,
    ArrayIndices, ArrayShape, DataType,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// The array, chunk, and shard shapes are incompatible.
    #[error(transparent)]
    InvalidGeometry(#[from] InvalidGeometryError),
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// The fill value is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// The fill value metadata is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// Error creating codecs.
    #[error(transparent)]
    CodecsCreateError(#[from] PluginCreateError),
    /// An invalid array path.
    #[error("invalid array path: {0}")]
    InvalidPath(#[from] StorePrefixError),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An error serializing or deserializing the array configuration.
    #[error(transparent)]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// The supplied data does not match the shape of the region.
    #[error("got {0} bytes for region {1}, expected {2}")]
    ShapeMismatch(usize, ArraySubset, u64),
    /// The region extends beyond the array.
    #[error("array subset {0} is out of bounds of the array with shape {1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// The chunk indices are outside of the chunk grid.
    #[error("invalid chunk indices {0:?}")]
    InvalidChunkIndices(ArrayIndices),
    /// The dimensionality of a region does not match the array.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An element type incompatible with the data type of the array.
    #[error("the element type {1} is incompatible with data type {0}")]
    IncompatibleElementType(DataType, &'static str),
    /// The index of a shard is corrupt.
    #[error("the index of shard {key} is corrupt: {source}")]
    CorruptIndex {
        /// The shard key.
        key: StoreKey,
        /// The index error.
        source: ShardIndexError,
    },
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A shard error.
    #[error(transparent)]
    ShardError(ShardError),
    /// An error extracting bytes from a chunk.
    #[error(transparent)]
    ArrayExtractBytesError(#[from] ArrayExtractBytesError),
    /// An error scattering bytes into a chunk.
    #[error(transparent)]
    ArrayStoreBytesError(#[from] ArrayStoreBytesError),
}

impl ArrayError {
    /// Convert a [`ShardError`] for the shard at `key`.
    ///
    /// A shard index error is a [`CorruptIndex`](ArrayError::CorruptIndex) error, store errors pass through unchanged.
    pub(crate) fn from_shard_error(key: &StoreKey, err: ShardError) -> Self {
        match err {
            ShardError::IndexError(source) => Self::CorruptIndex {
                key: key.clone(),
                source,
            },
            ShardError::StorageError(err) => Self::StorageError(err),
            err => Self::ShardError(err),
        }
    }
}
