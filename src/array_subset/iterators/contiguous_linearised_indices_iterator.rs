use std::iter::FusedIterator;

use crate::{
    array::{ravel_indices, ArrayShape},
    array_subset::{ArraySubset, IncompatibleArraySubsetAndShapeError},
};

use super::{Indices, IndicesIterator};

/// Contiguous runs of elements of an array subset within an enclosing array.
///
/// Trailing dimensions where the subset spans the whole array are merged, so each run is as long as possible.
/// Every run has the same number of elements, see [`contiguous_elements`](Self::contiguous_elements).
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndices {
    outer: Indices,
    inner_start: Vec<u64>,
    array_shape: ArrayShape,
    contiguous_elements: u64,
}

impl ContiguousLinearisedIndices {
    /// Return a new contiguous linearised indices iterator.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(
        subset: &ArraySubset,
        array_shape: ArrayShape,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if !subset.inbounds(&array_shape) {
            return Err(IncompatibleArraySubsetAndShapeError::new(
                subset.clone(),
                array_shape,
            ));
        }
        if subset.is_empty() {
            return Ok(Self {
                outer: Indices::new(ArraySubset::new_empty(1)),
                inner_start: vec![],
                array_shape,
                contiguous_elements: 0,
            });
        }

        let mut contiguous_elements = 1;
        let mut split = 0;
        for dim in (0..subset.dimensionality()).rev() {
            contiguous_elements *= subset.shape()[dim];
            if subset.shape()[dim] != array_shape[dim] {
                split = dim;
                break;
            }
        }
        let outer = ArraySubset {
            start: subset.start()[..split].to_vec(),
            shape: subset.shape()[..split].to_vec(),
        };
        Ok(Self {
            outer: Indices::new(outer),
            inner_start: subset.start()[split..].to_vec(),
            array_shape,
            contiguous_elements,
        })
    }

    /// Return the number of contiguous elements (fixed on each iteration).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Return the number of contiguous runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    /// Returns true if there are no contiguous runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ContiguousLinearisedIndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a ContiguousLinearisedIndices {
    type Item = u64;
    type IntoIter = ContiguousLinearisedIndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        ContiguousLinearisedIndicesIterator {
            inner: self.outer.iter(),
            inner_start: &self.inner_start,
            array_shape: &self.array_shape,
        }
    }
}

/// Iterates over contiguous linearised element indices in an array subset.
///
/// The iterator item is the linearised index of the first element of each run.
pub struct ContiguousLinearisedIndicesIterator<'a> {
    inner: IndicesIterator<'a>,
    inner_start: &'a [u64],
    array_shape: &'a [u64],
}

impl ContiguousLinearisedIndicesIterator<'_> {
    fn linearise(&self, mut indices: Vec<u64>) -> u64 {
        indices.extend_from_slice(self.inner_start);
        ravel_indices(&indices, self.array_shape)
    }
}

impl Iterator for ContiguousLinearisedIndicesIterator<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|indices| self.linearise(indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for ContiguousLinearisedIndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|indices| self.linearise(indices))
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator<'_> {}

impl FusedIterator for ContiguousLinearisedIndicesIterator<'_> {}
