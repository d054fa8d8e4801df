//! Array fill values.

/// The fill value of an array.
///
/// Provides an element value to use for uninitialised portions of the array.
/// The bytes are in native endianness.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

macro_rules! fill_value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

fill_value_from_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    ///
    /// An empty slice or a slice whose length is not a multiple of the fill value size is never equal.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        if self.0.is_empty() || bytes.is_empty() || bytes.len() % self.0.len() != 0 {
            return false;
        }
        if let Some(&first) = self.0.first() {
            if self.0.iter().all(|&byte| byte == first) {
                return bytes.iter().all(|&byte| byte == first);
            }
        }
        bytes
            .chunks_exact(self.0.len())
            .all(|element| element == self.0.as_slice())
    }

    /// Return `num_elements` repetitions of the fill value.
    #[must_use]
    pub fn repeat(&self, num_elements: usize) -> Vec<u8> {
        self.0.repeat(num_elements)
    }
}
