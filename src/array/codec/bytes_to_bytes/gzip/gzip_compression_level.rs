use derive_more::Display;
use serde::{de::Error as _, Deserialize};

/// A gzip compression level.
///
/// An integer from 0 to 9 which controls the speed and level of compression.
/// Level 1 is the fastest and compresses least, level 9 is the slowest and compresses most.
/// Level 0 stores the input uncompressed.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct GzipCompressionLevel(u32);

/// An invalid gzip compression level.
#[derive(Debug, thiserror::Error)]
#[error("invalid compression level {0}, must be 0-9")]
pub struct GzipCompressionLevelError(u32);

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = GzipCompressionLevelError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value < 10 {
            Ok(Self(value))
        } else {
            Err(GzipCompressionLevelError(value))
        }
    }
}

impl serde::Serialize for GzipCompressionLevel {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = i64::deserialize(d)?;
        u32::try_from(level)
            .ok()
            .and_then(|level| Self::try_from(level).ok())
            .ok_or_else(|| D::Error::custom("compression level must be an integer between 0 and 9"))
    }
}

impl GzipCompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}
