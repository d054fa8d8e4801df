//! Array to bytes codecs.

pub mod bytes;
pub mod codec_chain;
