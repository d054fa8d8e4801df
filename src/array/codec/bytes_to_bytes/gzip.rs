//! The `gzip` bytes to bytes codec.
//!
//! Applies gzip compression with [`flate2`].
//!
//! This codec requires the `gzip` feature, which is enabled by default.
//!
//! ### Example configuration
//! ```json
//! {
//!     "name": "gzip",
//!     "configuration": {
//!         "level": 5
//!     }
//! }
//! ```

mod gzip_codec;
mod gzip_compression_level;

pub use gzip_codec::GzipCodec;
pub use gzip_compression_level::{GzipCompressionLevel, GzipCompressionLevelError};

use serde::{Deserialize, Serialize};

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::Metadata,
    plugin::PluginCreateError,
};

/// The identifier for the `gzip` codec.
pub const IDENTIFIER: &str = "gzip";

// Register the codec.
inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_gzip, create_codec_gzip)
}

fn is_name_gzip(name: &str) -> bool {
    name.eq(IDENTIFIER)
}

fn create_codec_gzip(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: GzipCodecConfiguration = metadata.to_configuration()?;
    let codec = Box::new(GzipCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

/// Configuration parameters for the `gzip` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct GzipCodecConfiguration {
    /// The compression level.
    pub level: GzipCompressionLevel,
}
