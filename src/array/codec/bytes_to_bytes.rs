//! Bytes to bytes codecs.

pub mod crc32c;
#[cfg(feature = "gzip")]
pub mod gzip;

#[cfg(test)]
pub(crate) mod test_lossy;
