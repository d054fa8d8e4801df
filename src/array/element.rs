use super::{ArrayError, DataType};

/// A Rust scalar type that can be read from or written to an array of a compatible [`DataType`].
///
/// `u8` elements are also accepted for [`DataType::Bool`] arrays, holding `0` or `1`.
pub trait Element: bytemuck::Pod + Send + Sync {
    /// The data types compatible with this element type.
    const DATA_TYPES: &'static [DataType];

    /// Validate that the element type is compatible with `data_type`.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if the element type is incompatible with `data_type`.
    fn validate_data_type(data_type: DataType) -> Result<(), ArrayError> {
        if Self::DATA_TYPES.contains(&data_type) {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementType(
                data_type,
                std::any::type_name::<Self>(),
            ))
        }
    }
}

macro_rules! impl_element {
    ($t:ty, $($data_type:ident),+) => {
        impl Element for $t {
            const DATA_TYPES: &'static [DataType] = &[$(DataType::$data_type),+];
        }
    };
}

impl_element!(u8, UInt8, Bool);
impl_element!(u16, UInt16);
impl_element!(u32, UInt32);
impl_element!(u64, UInt64);
impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

/// Transmute from `Vec<u8>` to `Vec<T>`, copying only if the allocation is misaligned.
#[must_use]
pub fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::allocation::pod_collect_to_vec(&from))
}

/// Transmute from `&[T]` to `&[u8]`.
#[must_use]
pub fn transmute_to_bytes<T: bytemuck::NoUninit>(from: &[T]) -> &[u8] {
    bytemuck::must_cast_slice(from)
}
