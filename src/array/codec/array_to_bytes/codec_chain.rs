//! An array to bytes codec formed by joining an array to bytes codec and a sequence of bytes to bytes codecs.

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, BytesToBytesCodecTraits, Codec, CodecError},
        BytesRepresentation, ChunkRepresentation,
    },
    metadata::Metadata,
    plugin::PluginCreateError,
};

use super::bytes::BytesCodec;

/// A codec chain is an array to bytes codec followed by a sequence of bytes to bytes codecs.
///
/// Encoding applies the codecs in order, decoding applies them in reverse.
/// Every codec in a chain is lossless.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
}

impl Default for CodecChain {
    /// A chain with just the little endian `bytes` codec.
    fn default() -> Self {
        Self {
            array_to_bytes: Box::new(BytesCodec::little()),
            bytes_to_bytes: vec![],
        }
    }
}

impl CodecChain {
    /// Create a new codec chain.
    ///
    /// # Errors
    /// Returns [`PluginCreateError::LossyCodec`] if any codec is lossy.
    pub fn new(
        array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> Result<Self, PluginCreateError> {
        let lossy = std::iter::once(array_to_bytes.create_metadata())
            .filter(|_| !array_to_bytes.is_lossless())
            .chain(
                bytes_to_bytes
                    .iter()
                    .filter(|codec| !codec.is_lossless())
                    .map(|codec| codec.create_metadata()),
            )
            .next();
        if let Some(metadata) = lossy {
            return Err(PluginCreateError::LossyCodec {
                name: metadata.name().to_string(),
            });
        }
        Ok(Self {
            array_to_bytes,
            bytes_to_bytes,
        })
    }

    /// Create a new codec chain from a list of metadata.
    ///
    /// An empty list creates the [default](CodecChain::default) codec chain.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginCreateError`] if:
    ///  - a codec could not be created,
    ///  - a codec is lossy,
    ///  - a bytes to bytes codec precedes the array to bytes codec,
    ///  - no array to bytes codec is supplied, or
    ///  - more than one array to bytes codec is supplied.
    pub fn from_metadata(metadatas: &[Metadata]) -> Result<Self, PluginCreateError> {
        if metadatas.is_empty() {
            return Ok(Self::default());
        }
        let mut array_to_bytes: Option<Box<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>> = vec![];
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToBytes(_) if array_to_bytes.is_some() => {
                    return Err("multiple array to bytes codecs".into());
                }
                Codec::ArrayToBytes(codec) => {
                    array_to_bytes = Some(codec);
                }
                Codec::BytesToBytes(_) if array_to_bytes.is_none() => {
                    return Err(format!(
                        "bytes to bytes codec {} precedes the array to bytes codec",
                        metadata.name()
                    )
                    .into());
                }
                Codec::BytesToBytes(codec) => {
                    bytes_to_bytes.push(codec);
                }
            }
        }

        let array_to_bytes = array_to_bytes.ok_or("missing array to bytes codec")?;
        Self::new(array_to_bytes, bytes_to_bytes)
    }

    /// Create codec chain metadata.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<Metadata> {
        std::iter::once(self.array_to_bytes.create_metadata())
            .chain(self.bytes_to_bytes.iter().map(|codec| codec.create_metadata()))
            .collect()
    }

    /// Return the array to bytes codec.
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &dyn ArrayToBytesCodecTraits {
        self.array_to_bytes.as_ref()
    }

    /// Return the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Box<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes
    }

    fn get_bytes_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut bytes_representations = Vec::with_capacity(self.bytes_to_bytes.len() + 1);
        let mut bytes_representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            bytes_representations.push(bytes_representation);
            bytes_representation = codec.compute_encoded_size(&bytes_representation);
        }
        bytes_representations.push(bytes_representation);
        Ok(bytes_representations)
    }

    /// Encode the native endian bytes of a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` does not match the size of `decoded_representation`.
    pub fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if decoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                decoded_representation.size(),
            ));
        }
        let mut value = self
            .array_to_bytes
            .encode(decoded_value, decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            value = codec.encode(value)?;
        }
        Ok(value)
    }

    /// Decode a chunk to native endian bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output does not match the size of `decoded_representation`.
    pub fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let bytes_representations = self.get_bytes_representations(decoded_representation)?;
        let mut value = encoded_value;
        for (codec, bytes_representation) in
            std::iter::zip(self.bytes_to_bytes.iter().rev(), bytes_representations.iter().rev().skip(1))
        {
            value = codec.decode(value, bytes_representation)?;
        }
        let value = self.array_to_bytes.decode(value, decoded_representation)?;
        if value.len() as u64 == decoded_representation.size() {
            Ok(value)
        } else {
            Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                decoded_representation.size(),
            ))
        }
    }

    /// Returns the size of an encoded chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the decoded representation is not supported by a codec.
    pub fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let bytes_representations = self.get_bytes_representations(decoded_representation)?;
        Ok(bytes_representations
            .last()
            .copied()
            .unwrap_or(BytesRepresentation::UnboundedSize))
    }
}
