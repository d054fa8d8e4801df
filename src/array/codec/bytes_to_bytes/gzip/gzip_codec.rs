use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation,
    },
    metadata::Metadata,
};

use super::{GzipCodecConfiguration, GzipCompressionLevel, GzipCompressionLevelError, IDENTIFIER};

/// A `gzip` codec implementation.
#[derive(Clone, Debug)]
pub struct GzipCodec {
    compression_level: GzipCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`GzipCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, GzipCompressionLevelError> {
        let compression_level: GzipCompressionLevel = compression_level.try_into()?;
        Ok(Self { compression_level })
    }

    /// Create a new `gzip` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &GzipCodecConfiguration) -> Self {
        Self {
            compression_level: configuration.level,
        }
    }
}

impl CodecTraits for GzipCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = GzipCodecConfiguration {
            level: self.compression_level,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .unwrap_or_else(|_| Metadata::new(IDENTIFIER))
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

impl BytesToBytesCodecTraits for GzipCodec {
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let capacity = decoded_representation
            .size()
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or_default();
        let mut out: Vec<u8> = Vec::with_capacity(capacity);
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // https://www.gnu.org/software/gzip/manual/gzip.pdf
                const HEADER_TRAILER_OVERHEAD: u64 = 10 + 8;
                const BLOCK_SIZE: u64 = 32768;
                const BLOCK_OVERHEAD: u64 = 5;
                let blocks_overhead = BLOCK_OVERHEAD * size.div_ceil(BLOCK_SIZE).max(1);
                BytesRepresentation::BoundedSize(size + HEADER_TRAILER_OVERHEAD + blocks_overhead)
            })
    }
}
