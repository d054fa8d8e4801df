use derive_more::Display;

use super::{
    data_type::IncompatibleFillValueError, ArrayShape, ChunkShape, DataType, FillValue,
};

/// The shape, data type, and fill value of a chunk.
///
/// Codecs receive the chunk representation to validate and interpret the bytes they transform.
#[derive(Clone, Debug, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ChunkRepresentation {
    shape: ChunkShape,
    data_type: DataType,
    fill_value: FillValue,
}

impl ChunkRepresentation {
    /// Create a new [`ChunkRepresentation`].
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleFillValueError`] if the `data_type` and `fill_value` are incompatible.
    pub fn new(
        shape: ChunkShape,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        if data_type.size() == fill_value.size() {
            Ok(Self {
                shape,
                data_type,
                fill_value,
            })
        } else {
            Err(IncompatibleFillValueError::new(data_type, fill_value))
        }
    }

    /// Return the shape of the chunk.
    #[must_use]
    pub fn shape(&self) -> &ChunkShape {
        &self.shape
    }

    /// Return the shape as an [`ArrayShape`] ([`Vec<u64>`]).
    #[must_use]
    pub fn shape_u64(&self) -> ArrayShape {
        self.shape.to_array_shape()
    }

    /// Return the data type of the chunk.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the chunk.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the number of elements in the chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.num_elements()
    }

    /// Return the element size in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.data_type.size()
    }

    /// Return the total size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.num_elements() * self.element_size() as u64
    }

    /// Return the total size in bytes as a [`usize`].
    ///
    /// # Panics
    ///
    /// Panics if [`size()`](Self::size()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn size_usize(&self) -> usize {
        usize::try_from(self.size()).unwrap()
    }

    /// Return the bytes of a chunk filled entirely with the fill value.
    #[must_use]
    pub fn fill_bytes(&self) -> Vec<u8> {
        self.fill_value.repeat(self.shape.num_elements_usize())
    }
}
