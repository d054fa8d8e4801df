//! Chunk codecs.
//!
//! A chunk is encoded by one array to bytes codec followed by any number of bytes to bytes codecs.
//! Decoding applies the codecs in reverse.
//! A [`CodecChain`] holds such a sequence, and is the codec pipeline of an [`ArrayStore`](crate::array::ArrayStore).
//!
//! Codecs are created from [`Metadata`] through [`CodecPlugin`]s registered with the [inventory] crate.
//! Every codec must be lossless, a lossy codec is rejected when a [`CodecChain`] is created.
//!
//! Supported codecs:
//!  - `bytes` ([`BytesCodec`]): array to bytes, sets the stored endianness of elements.
//!  - `crc32c` ([`Crc32cCodec`]): bytes to bytes, appends a CRC32C checksum.
//!  - `gzip` ([`GzipCodec`], feature `gzip`): bytes to bytes, gzip compression.

pub mod array_to_bytes;
pub mod bytes_to_bytes;

pub use array_to_bytes::{
    bytes::{BytesCodec, BytesCodecConfiguration, Endianness, NATIVE_ENDIAN},
    codec_chain::CodecChain,
};
pub use bytes_to_bytes::crc32c::Crc32cCodec;
#[cfg(feature = "gzip")]
pub use bytes_to_bytes::gzip::{GzipCodec, GzipCodecConfiguration, GzipCompressionLevel};

use thiserror::Error;

use crate::{
    metadata::Metadata,
    plugin::{Plugin, PluginCreateError},
};

use super::{BytesRepresentation, ChunkRepresentation, DataType};

/// A codec plugin.
pub type CodecPlugin = Plugin<Codec>;
inventory::collect!(CodecPlugin);

/// An array to bytes or bytes to bytes codec.
#[derive(Debug)]
pub enum Codec {
    /// An array to bytes codec.
    ArrayToBytes(Box<dyn ArrayToBytesCodecTraits>),
    /// A bytes to bytes codec.
    BytesToBytes(Box<dyn BytesToBytesCodecTraits>),
}

impl Codec {
    /// Create a codec from metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PluginCreateError`] if the metadata is invalid or not associated with a registered codec plugin.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, PluginCreateError> {
        for plugin in inventory::iter::<CodecPlugin> {
            if plugin.match_name(metadata.name()) {
                return plugin.create(metadata);
            }
        }
        Err(PluginCreateError::Unsupported {
            name: metadata.name().to_string(),
            plugin_type: "codec".to_string(),
        })
    }

    /// Returns true if the codec is lossless.
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        match self {
            Self::ArrayToBytes(codec) => codec.is_lossless(),
            Self::BytesToBytes(codec) => codec.is_lossless(),
        }
    }
}

/// Codec traits.
pub trait CodecTraits: Send + Sync {
    /// Create metadata.
    fn create_metadata(&self) -> Metadata;

    /// Returns true if decoding recovers the exact bytes that were encoded.
    fn is_lossless(&self) -> bool;
}

/// Traits for array to bytes codecs.
pub trait ArrayToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Encode the native endian bytes of a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with `decoded_representation`.
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode a chunk to native endian bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns the size of the encoded representation given a size of the decoded representation.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the decoded representation is not supported by this codec.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToBytesCodecTraits);

/// Traits for bytes to bytes codecs.
pub trait BytesToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns the size of the encoded representation given a size of the decoded representation.
    fn compute_encoded_size(&self, decoded_representation: &BytesRepresentation)
        -> BytesRepresentation;
}

dyn_clone::clone_trait_object!(BytesToBytesCodecTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {0}, expected {1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// Unsupported data type
    #[error("unsupported data type {0} for codec {1}")]
    UnsupportedDataType(DataType, String),
    /// Other
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
