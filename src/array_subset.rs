//! Array subsets.
//!
//! An [`ArraySubset`] is a hyperrectangle of element indices `[start, start + shape)` used throughout this library.
//! Array regions passed to [`ArrayStore`](crate::array::ArrayStore) reads and writes are array subsets, as are the parts of chunks they intersect.
//!
//! This module also provides convenience functions for:
//!  - iterating over the [indices](ArraySubset::indices) or [chunks](ArraySubset::chunks) of an array subset,
//!  - computing the contiguous runs of an array subset within an enclosing array, and
//!  - extracting and storing the bytes of a subset of an array.

pub mod iterators;

use std::{num::NonZeroU64, ops::Range};

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

use iterators::{Chunks, ContiguousLinearisedIndices, Indices};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new empty array subset with dimensionality `dimensionality`.
    #[must_use]
    pub fn new_empty(dimensionality: usize) -> Self {
        Self {
            start: vec![0; dimensionality],
            shape: vec![0; dimensionality],
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                shape.len(),
            ))
        }
    }

    /// Create a new array subset from a start and end (exclusive).
    ///
    /// An end before the start in any dimension produces an empty extent in that dimension.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `end` do not match.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: ArrayIndices,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, end)| end.saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(start.len(), end.len()))
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (inclusive) of the array subset.
    ///
    /// Returns [`None`] if the array subset is empty.
    #[must_use]
    pub fn end_inc(&self) -> Option<ArrayIndices> {
        if self.is_empty() {
            None
        } else {
            Some(
                std::iter::zip(&self.start, &self.shape)
                    .map(|(start, size)| start + size - 1)
                    .collect(),
            )
        }
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the array subset as a list of [`Range`]s.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a `usize`.
    ///
    /// # Panics
    ///
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if the array subset contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&size| size == 0)
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        if self.dimensionality() != array_shape.len() {
            return false;
        }

        for (subset_start, subset_shape, shape) in izip!(self.start(), self.shape(), array_shape) {
            match subset_start.checked_add(*subset_shape) {
                Some(end) if end <= *shape => {}
                _ => return false,
            }
        }
        true
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns an error if `end` does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() == self.dimensionality() {
            let start: ArrayIndices = std::iter::zip(self.start(), end)
                .map(|(&a, &b)| std::cmp::min(a, b))
                .collect();
            let end: ArrayIndices = std::iter::zip(self.end_exc(), end)
                .map(|(a, &b)| std::cmp::min(a, b))
                .collect();
            Self::new_with_start_end_exc(start, end)
        } else {
            Err(IncompatibleDimensionalityError::new(
                end.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return the overlapping subset between this array subset and `subset_other`.
    ///
    /// The overlap is empty if the subsets are disjoint.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does not match the dimensionality of this array subset.
    pub fn overlap(&self, subset_other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let mut start = Vec::with_capacity(self.dimensionality());
        let mut shape = Vec::with_capacity(self.dimensionality());
        for (start_a, size_a, start_b, size_b) in izip!(
            &self.start,
            &self.shape,
            subset_other.start(),
            subset_other.shape(),
        ) {
            let overlap_start = std::cmp::max(*start_a, *start_b);
            let overlap_end = std::cmp::min(start_a + size_a, start_b + size_b);
            start.push(overlap_start);
            shape.push(overlap_end.saturating_sub(overlap_start));
        }
        Ok(Self { start, shape })
    }

    /// Return this array subset relative to `start`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleStartError`] if `start` does not match the dimensionality of this array subset or exceeds its start.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleStartError> {
        if start.len() != self.dimensionality()
            || std::iter::zip(self.start(), start).any(|(a, b)| a < b)
        {
            return Err(IncompatibleStartError::new(start.to_vec(), self.clone()));
        }
        Ok(Self {
            start: std::iter::zip(self.start(), start)
                .map(|(a, b)| a - b)
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Returns an iterator over the linearised indices of contiguous elements within the subset in an array of shape `array_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the `array_shape` does not encapsulate this array subset.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndices, IncompatibleArraySubsetAndShapeError> {
        ContiguousLinearisedIndices::new(self, array_shape.to_vec())
    }

    /// Returns an iterator over chunks with shape `chunk_shape` in the array subset.
    ///
    /// All chunks overlapping the array subset are returned, and they all have the same shape `chunk_shape`.
    /// Thus, the subsets of the chunks may extend out over the subset.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_shape` does not match the array subset dimensionality.
    pub fn chunks(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Chunks, IncompatibleDimensionalityError> {
        Chunks::new(self, chunk_shape)
    }

    /// Return the bytes in this array subset from an array with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayExtractBytesError`] if the length of `array_shape` does not match the array subset dimensionality, the array subset is outside of the bounds of `array_shape`, or `bytes` does not match the size of the array.
    ///
    /// # Panics
    ///
    /// Panics if attempting to access a byte index beyond [`usize::MAX`].
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, ArrayExtractBytesError> {
        let element_size_u64 = element_size as u64;
        if bytes.len() as u64 != array_shape.iter().product::<u64>() * element_size_u64
            || !self.inbounds(array_shape)
        {
            return Err(ArrayExtractBytesError(
                self.clone(),
                array_shape.to_vec(),
                element_size,
            ));
        }
        let contiguous_indices = self
            .contiguous_linearised_indices(array_shape)
            .map_err(|_| ArrayExtractBytesError(self.clone(), array_shape.to_vec(), element_size))?;
        let byte_length =
            usize::try_from(contiguous_indices.contiguous_elements() * element_size_u64).unwrap();
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        for array_index in &contiguous_indices {
            let byte_offset = usize::try_from(array_index * element_size_u64).unwrap();
            bytes_subset.extend_from_slice(&bytes[byte_offset..byte_offset + byte_length]);
        }
        Ok(bytes_subset)
    }

    /// Store `bytes_subset` corresponding to the bytes of an array (`bytes_array`) with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayStoreBytesError`] if:
    ///  - the length of `array_shape` does not match the array subset dimensionality or the array subset is outside of the bounds of `array_shape`,
    ///  - the length of `bytes_array` is not compatible with the `array_shape` and `element size`, or
    ///  - the length of `bytes_subset` is not compatible with the shape of this subset and `element_size`.
    ///
    /// # Panics
    ///
    /// Panics if attempting to reference a byte beyond `usize::MAX`.
    pub fn store_bytes(
        &self,
        bytes_subset: &[u8],
        bytes_array: &mut [u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<(), ArrayStoreBytesError> {
        let element_size_u64 = element_size as u64;
        let expected_subset_size = self.num_elements() * element_size_u64;
        let expected_array_size = array_shape.iter().product::<u64>() * element_size_u64;
        if bytes_subset.len() as u64 != expected_subset_size {
            return Err(ArrayStoreBytesError::InvalidSubsetBytes(
                bytes_subset.len(),
                usize::try_from(expected_subset_size).unwrap(),
            ));
        }
        if bytes_array.len() as u64 != expected_array_size {
            return Err(ArrayStoreBytesError::InvalidArrayBytes(
                bytes_array.len(),
                usize::try_from(expected_array_size).unwrap(),
            ));
        }
        let contiguous_indices = self
            .contiguous_linearised_indices(array_shape)
            .map_err(|err| ArrayStoreBytesError::InvalidArrayShape(err.0, err.1))?;
        let byte_length =
            usize::try_from(contiguous_indices.contiguous_elements() * element_size_u64).unwrap();
        let mut offset = 0;
        for array_index in &contiguous_indices {
            let byte_index = usize::try_from(array_index * element_size_u64).unwrap();
            bytes_array[byte_index..byte_index + byte_length]
                .copy_from_slice(&bytes_subset[offset..offset + byte_length]);
            offset += byte_length;
        }
        Ok(())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An incompatible array subset and array shape error.
#[derive(Clone, Debug, Error)]
#[error("incompatible array subset {0} with array shape {1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, ArrayShape);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new incompatible array subset and shape error.
    #[must_use]
    pub fn new(array_subset: ArraySubset, array_shape: ArrayShape) -> Self {
        Self(array_subset, array_shape)
    }
}

/// An incompatible start error.
#[derive(Clone, Debug, Error)]
#[error("incompatible start {0:?} with array subset {1}")]
pub struct IncompatibleStartError(ArrayIndices, ArraySubset);

impl IncompatibleStartError {
    /// Create a new incompatible start error.
    #[must_use]
    pub fn new(start: ArrayIndices, array_subset: ArraySubset) -> Self {
        Self(start, array_subset)
    }
}

/// An array extract bytes error.
#[derive(Debug, Error)]
#[error("array subset {0} is incompatible with array of shape {1:?} and element size {2}")]
pub struct ArrayExtractBytesError(ArraySubset, ArrayShape, usize);

/// An array store bytes error.
#[derive(Debug, Error)]
pub enum ArrayStoreBytesError {
    /// Invalid array shape.
    #[error("array subset {0} is incompatible with array shape {1:?}")]
    InvalidArrayShape(ArraySubset, ArrayShape),
    /// Invalid subset bytes.
    #[error("expected subset bytes to have length {1}, got {0}")]
    InvalidSubsetBytes(usize, usize),
    /// Invalid array bytes.
    #[error("expected array bytes to have length {1}, got {0}")]
    InvalidArrayBytes(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset() {
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10, 10]).is_ok());
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![10]).is_err());
        assert!(ArraySubset::new_with_start_end_exc(vec![0, 0], vec![10]).is_err());
        let array_subset = ArraySubset::new_with_ranges(&[1..5, 2..4]);
        assert_eq!(array_subset.start(), &[1, 2]);
        assert_eq!(array_subset.shape(), &[4, 2]);
        assert_eq!(array_subset.end_exc(), vec![5, 4]);
        assert_eq!(array_subset.end_inc(), Some(vec![4, 3]));
        assert_eq!(array_subset.num_elements(), 8);
        assert_eq!(array_subset.to_ranges(), vec![1..5, 2..4]);
        assert_eq!(array_subset.to_string(), "start [1, 2] shape [4, 2]");
        assert!(array_subset.inbounds(&[5, 4]));
        assert!(!array_subset.inbounds(&[5, 3]));
        assert!(!array_subset.inbounds(&[5]));
    }

    #[test]
    fn array_subset_empty() {
        let array_subset = ArraySubset::new_empty(2);
        assert!(array_subset.is_empty());
        assert_eq!(array_subset.end_inc(), None);
        assert_eq!(array_subset.num_elements(), 0);
        assert!(ArraySubset::new_with_ranges(&[3..1, 0..2]).is_empty());
    }

    #[test]
    fn array_subset_bound_overlap() {
        let array_subset = ArraySubset::new_with_ranges(&[2..6, 1..5]);
        assert_eq!(
            array_subset.bound(&[4, 8]).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 1..5])
        );
        assert!(array_subset.bound(&[4]).is_err());
        let other = ArraySubset::new_with_ranges(&[0..4, 4..8]);
        assert_eq!(
            array_subset.overlap(&other).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 4..5])
        );
        let disjoint = ArraySubset::new_with_ranges(&[8..9, 0..1]);
        assert!(array_subset.overlap(&disjoint).unwrap().is_empty());
        assert!(array_subset
            .overlap(&ArraySubset::new_with_ranges(&[0..1]))
            .is_err());
    }

    #[test]
    fn array_subset_relative_to() {
        let array_subset = ArraySubset::new_with_ranges(&[2..6, 1..5]);
        assert_eq!(
            array_subset.relative_to(&[2, 0]).unwrap(),
            ArraySubset::new_with_ranges(&[0..4, 1..5])
        );
        assert!(array_subset.relative_to(&[3, 0]).is_err());
        assert!(array_subset.relative_to(&[0]).is_err());
    }

    #[test]
    fn array_subset_bytes() {
        let array_subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        //  0  1  2  3
        //  4  5  6  7
        //  8  9 10 11
        // 12 13 14 15
        let bytes_array: Vec<u8> = (0..16).collect();
        let bytes = array_subset.extract_bytes(&bytes_array, &[4, 4], 1).unwrap();
        assert_eq!(bytes, vec![5, 6, 9, 10]);
        assert!(array_subset.extract_bytes(&bytes_array, &[4, 2], 1).is_err());
        assert!(array_subset.extract_bytes(&bytes_array, &[2, 2], 1).is_err());

        let mut bytes_array = vec![0u8; 16];
        array_subset
            .store_bytes(&[1, 2, 3, 4], &mut bytes_array, &[4, 4], 1)
            .unwrap();
        assert_eq!(
            bytes_array,
            vec![0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0, 0]
        );
        assert!(array_subset
            .store_bytes(&[1, 2, 3], &mut bytes_array, &[4, 4], 1)
            .is_err());
        assert!(array_subset
            .store_bytes(&[1, 2, 3, 4], &mut bytes_array, &[4, 3], 1)
            .is_err());
    }

    #[test]
    fn array_subset_bytes_multibyte_elements() {
        let array_subset = ArraySubset::new_with_ranges(&[0..2, 1..2]);
        let bytes_array: Vec<u8> = (0..8).collect();
        let bytes = array_subset.extract_bytes(&bytes_array, &[2, 2], 2).unwrap();
        assert_eq!(bytes, vec![2, 3, 6, 7]);
    }
}
