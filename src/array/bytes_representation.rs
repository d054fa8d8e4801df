use derive_more::Display;

/// The size of an encoded byte stream, as far as it can be known before encoding.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum BytesRepresentation {
    /// The output size is fixed.
    #[display("fixed size: {_0}")]
    FixedSize(u64),
    /// The output size is at most the given size.
    #[display("bounded size: {_0}")]
    BoundedSize(u64),
    /// The output size is unbounded/indeterminate.
    #[display("unbounded size")]
    UnboundedSize,
}

impl BytesRepresentation {
    /// Return the fixed or bounded size of the bytes representations, or [`None`] if the size is unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }

    /// Map the size of a fixed or bounded representation, keeping its kind.
    #[must_use]
    pub fn map_size(self, f: impl FnOnce(u64) -> u64) -> Self {
        match self {
            Self::FixedSize(size) => Self::FixedSize(f(size)),
            Self::BoundedSize(size) => Self::BoundedSize(f(size)),
            Self::UnboundedSize => Self::UnboundedSize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_representation() {
        let fixed = BytesRepresentation::FixedSize(10);
        assert_eq!(fixed.size(), Some(10));
        assert_eq!(fixed.map_size(|s| s + 4), BytesRepresentation::FixedSize(14));
        let bounded = BytesRepresentation::BoundedSize(10);
        assert_eq!(bounded.size(), Some(10));
        assert_ne!(fixed, bounded);
        assert_eq!(
            BytesRepresentation::UnboundedSize.map_size(|s| s + 4),
            BytesRepresentation::UnboundedSize
        );
        assert_eq!(BytesRepresentation::UnboundedSize.size(), None);
        assert_eq!(bounded.to_string(), "bounded size: 10");
    }
}
