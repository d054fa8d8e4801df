//! The `bytes` array to bytes codec.
//!
//! Encodes the elements of a chunk as little endian or big endian in row-major order.
//! Elements are held in memory in native endianness, so encoding and decoding are a no-op if the configured endianness is native.
//!
//! The endianness may be omitted only for data types with a one byte element size.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits},
        BytesRepresentation, ChunkRepresentation,
    },
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_bytes, create_codec_bytes)
}

fn is_name_bytes(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_bytes(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: BytesCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(BytesCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}

/// The endianness of each element in an array, either `big` or `little`.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little endian.
    #[display("little")]
    Little,
    /// Big endian.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

/// Configuration parameters for the `bytes` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct BytesCodecConfiguration {
    /// The target endianness.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endian: Option<Endianness>,
}

/// A `bytes` codec implementation.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::little()
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional because an 8-bit type has no endianness.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        Self::new(configuration.endian)
    }

    fn validate_endianness(&self, element_size: usize) -> Result<(), CodecError> {
        if element_size > 1 && self.endian.is_none() {
            Err(CodecError::Other(format!(
                "tried to encode an array with element size {element_size} with endianness None"
            )))
        } else {
            Ok(())
        }
    }

    fn do_encode_or_decode(
        &self,
        mut value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let element_size = decoded_representation.element_size();
        if value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                decoded_representation.size(),
            ));
        }
        self.validate_endianness(element_size)?;

        if let Some(endian) = &self.endian {
            if !endian.is_native() {
                reverse_endianness(&mut value, element_size);
            }
        }
        Ok(value)
    }
}

fn reverse_endianness(v: &mut [u8], element_size: usize) {
    if element_size > 1 {
        v.chunks_exact_mut(element_size).for_each(<[u8]>::reverse);
    }
}

impl CodecTraits for BytesCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = BytesCodecConfiguration {
            endian: self.endian,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| Metadata::new(IDENTIFIER))
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

impl ArrayToBytesCodecTraits for BytesCodec {
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(decoded_value, decoded_representation)
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(encoded_value, decoded_representation)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.validate_endianness(decoded_representation.element_size())?;
        Ok(BytesRepresentation::FixedSize(decoded_representation.size()))
    }
}
