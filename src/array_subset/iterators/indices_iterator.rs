use std::iter::FusedIterator;

use crate::{
    array::{unravel_index, ArrayIndices},
    array_subset::ArraySubset,
};

/// The indices in an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// An iterator with an array subset corresponding to the lower right 2x2 region will produce `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
#[derive(Clone, Debug)]
pub struct Indices {
    subset: ArraySubset,
    length: usize,
}

impl Indices {
    /// Create a new indices struct.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements_usize();
        Self { subset, length }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator {
            subset: &self.subset,
            index_front: 0,
            index_back: self.length as u64,
        }
    }
}

/// Serial indices iterator.
///
/// See [`Indices`].
pub struct IndicesIterator<'a> {
    subset: &'a ArraySubset,
    index_front: u64,
    index_back: u64,
}

impl IndicesIterator<'_> {
    fn indices(&self, index: u64) -> ArrayIndices {
        let mut indices = unravel_index(index, self.subset.shape());
        std::iter::zip(indices.iter_mut(), self.subset.start())
            .for_each(|(index, start)| *index += start);
        indices
    }
}

impl Iterator for IndicesIterator<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let indices = self.indices(self.index_front);
            self.index_front += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = usize::try_from(self.index_back - self.index_front).unwrap_or(usize::MAX);
        (length, Some(length))
    }
}

impl DoubleEndedIterator for IndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(self.indices(self.index_back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for IndicesIterator<'_> {}

impl FusedIterator for IndicesIterator<'_> {}
