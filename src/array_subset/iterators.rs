//! Array subset iterators.
//!
//! The iterators are:
//!  - [`Indices`]: iterate over the multidimensional indices of the elements in the subset.
//!  - [`ContiguousLinearisedIndices`]: iterate over contiguous runs of elements in the subset with the start a linearised index.
//!  - [`Chunks`]: iterate over regular sized chunks in the array subset.
//!
//! These can be created with the appropriate [`ArraySubset`](super::ArraySubset) methods including
//! [`indices`](super::ArraySubset::indices),
//! [`contiguous_linearised_indices`](super::ArraySubset::contiguous_linearised_indices), and
//! [`chunks`](super::ArraySubset::chunks).
//!
//! All iterators support [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]) on a reference.

mod chunks_iterator;
mod contiguous_linearised_indices_iterator;
mod indices_iterator;

pub use chunks_iterator::{Chunks, ChunksIterator};
pub use contiguous_linearised_indices_iterator::{
    ContiguousLinearisedIndices, ContiguousLinearisedIndicesIterator,
};
pub use indices_iterator::{Indices, IndicesIterator};
