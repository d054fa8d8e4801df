//! A lossy bytes to bytes codec used to test that lossy codecs are rejected.

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, Codec, CodecError, CodecPlugin, CodecTraits},
        BytesRepresentation,
    },
    metadata::Metadata,
    plugin::PluginCreateError,
};

pub(crate) const IDENTIFIER: &str = "test_lossy";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_test_lossy, create_codec_test_lossy)
}

fn is_name_test_lossy(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_test_lossy(_metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    Ok(Codec::BytesToBytes(Box::new(TestLossyCodec)))
}

/// Zeroes the low bit of every byte.
#[derive(Clone, Debug)]
pub(crate) struct TestLossyCodec;

impl CodecTraits for TestLossyCodec {
    fn create_metadata(&self) -> Metadata {
        Metadata::new(IDENTIFIER)
    }

    fn is_lossless(&self) -> bool {
        false
    }
}

impl BytesToBytesCodecTraits for TestLossyCodec {
    fn encode(&self, mut decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        decoded_value.iter_mut().for_each(|byte| *byte &= !1);
        Ok(decoded_value)
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(encoded_value)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        *decoded_representation
    }
}
