//! The `crc32c` (CRC32C checksum) bytes to bytes codec.
//!
//! Appends a little endian CRC32C checksum of the input bytestream.
//! The checksum is validated on decode if [`Config::validate_checksums`](crate::config::Config::validate_checksums) is enabled.

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits},
        BytesRepresentation,
    },
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `crc32c` codec.
pub const IDENTIFIER: &str = "crc32c";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_crc32c, create_codec_crc32c)
}

fn is_name_crc32c(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

pub(crate) fn create_codec_crc32c(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    if metadata.configuration().is_some_and(|c| !c.is_empty()) {
        return Err(PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()).into());
    }
    Ok(Codec::BytesToBytes(Box::new(Crc32cCodec::new())))
}

const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();

/// A `crc32c` codec implementation.
#[derive(Clone, Debug, Default)]
pub struct Crc32cCodec;

impl Crc32cCodec {
    /// Create a new `crc32c` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }
}

impl CodecTraits for Crc32cCodec {
    fn create_metadata(&self) -> Metadata {
        Metadata::new(IDENTIFIER)
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

impl BytesToBytesCodecTraits for Crc32cCodec {
    fn encode(&self, mut decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let checksum = crc32c::crc32c(&decoded_value).to_le_bytes();
        decoded_value.reserve_exact(checksum.len());
        decoded_value.extend(&checksum);
        Ok(decoded_value)
    }

    fn decode(
        &self,
        mut encoded_value: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if encoded_value.len() >= CHECKSUM_SIZE {
            let decoded_len = encoded_value.len() - CHECKSUM_SIZE;
            if crate::config::global_config().validate_checksums() {
                let (decoded_value, checksum) = encoded_value.split_at(decoded_len);
                if crc32c::crc32c(decoded_value).to_le_bytes() != checksum {
                    return Err(CodecError::InvalidChecksum);
                }
            }
            encoded_value.truncate(decoded_len);
            Ok(encoded_value)
        } else {
            Err(CodecError::Other(
                "CRC32C checksum decoder expects a 32 bit input".to_string(),
            ))
        }
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation.map_size(|size| size + CHECKSUM_SIZE as u64)
    }
}
