//! Array geometry.
//!
//! An array of shape `shape` is split into a regular grid of chunks of `chunk_shape`, and the chunk grid is grouped into a regular grid of shards of `shard_shape`.
//! Chunks on the upper boundary of the array may extend beyond the array, and are padded with the fill value.
//!
//! Chunks within a shard are numbered in row-major (C) order, the last dimension varying fastest.
//! This local index is the slot of the chunk in the shard index.

use std::ops::Range;

use itertools::izip;
use thiserror::Error;

use crate::array_subset::{iterators::Chunks, ArraySubset, IncompatibleDimensionalityError};

use super::{ravel_indices, unravel_index, ArrayIndices, ArrayShape, ChunkShape};

/// An invalid array geometry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidGeometryError {
    /// The array has no dimensions.
    #[error("array shape must have at least one dimension")]
    ZeroDimensional,
    /// An array dimension has zero extent.
    #[error("array shape {0:?} has a zero extent")]
    ZeroExtent(ArrayShape),
    /// The shapes have different dimensionality.
    #[error("array shape {0:?}, chunk shape {1:?} and shard shape {2:?} have different dimensionality")]
    IncompatibleDimensionality(ArrayShape, ArrayShape, ArrayShape),
    /// The chunk shape exceeds the array shape.
    #[error("chunk shape {0:?} exceeds array shape {1:?}")]
    ChunkExceedsArray(ArrayShape, ArrayShape),
    /// The shard shape is not a multiple of the chunk shape.
    #[error("shard shape {0:?} is not a multiple of chunk shape {1:?}")]
    ShardNotMultipleOfChunk(ArrayShape, ArrayShape),
}

/// The shard and slot of a chunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkLocation {
    /// The indices of the shard in the shard grid.
    pub shard_indices: ArrayIndices,
    /// The row-major index of the chunk within the shard.
    pub local_index: u64,
}

/// The intersection of a region with a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkIntersection {
    /// The indices of the chunk in the chunk grid.
    pub chunk_indices: ArrayIndices,
    /// The full extent of the chunk in array coordinates.
    pub chunk_subset: ArraySubset,
    /// The overlap of the region and the chunk in array coordinates.
    pub array_subset: ArraySubset,
    /// The overlap of the region and the chunk relative to the chunk origin.
    pub chunk_local_subset: ArraySubset,
}

impl ChunkIntersection {
    /// Returns true if the intersection covers the entire chunk.
    #[must_use]
    pub fn is_whole_chunk(&self) -> bool {
        self.array_subset == self.chunk_subset
    }
}

/// The validated geometry of a sharded array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayGeometry {
    shape: ArrayShape,
    chunk_shape: ChunkShape,
    shard_shape: ChunkShape,
    chunks_per_shard: ArrayShape,
}

impl ArrayGeometry {
    /// Create a new array geometry.
    ///
    /// # Errors
    /// Returns [`InvalidGeometryError`] if
    ///  - the shapes differ in dimensionality or have no dimensions,
    ///  - any dimension of `shape` is zero,
    ///  - `chunk_shape` exceeds `shape` in any dimension, or
    ///  - `shard_shape` is not an exact multiple of `chunk_shape`.
    pub fn new(
        shape: ArrayShape,
        chunk_shape: ChunkShape,
        shard_shape: ChunkShape,
    ) -> Result<Self, InvalidGeometryError> {
        if shape.len() != chunk_shape.len() || shape.len() != shard_shape.len() {
            return Err(InvalidGeometryError::IncompatibleDimensionality(
                shape,
                chunk_shape.to_array_shape(),
                shard_shape.to_array_shape(),
            ));
        }
        if shape.is_empty() {
            return Err(InvalidGeometryError::ZeroDimensional);
        }
        if shape.contains(&0) {
            return Err(InvalidGeometryError::ZeroExtent(shape));
        }
        if std::iter::zip(&shape, chunk_shape.iter()).any(|(&s, c)| c.get() > s) {
            return Err(InvalidGeometryError::ChunkExceedsArray(
                chunk_shape.to_array_shape(),
                shape,
            ));
        }
        let chunks_per_shard = std::iter::zip(shard_shape.iter(), chunk_shape.iter())
            .map(|(s, c)| {
                let (s, c) = (s.get(), c.get());
                num::Integer::is_multiple_of(&s, &c).then_some(s / c)
            })
            .collect::<Option<ArrayShape>>()
            .ok_or_else(|| {
                InvalidGeometryError::ShardNotMultipleOfChunk(
                    shard_shape.to_array_shape(),
                    chunk_shape.to_array_shape(),
                )
            })?;
        Ok(Self {
            shape,
            chunk_shape,
            shard_shape,
            chunks_per_shard,
        })
    }

    /// Return the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// Return the shard shape.
    #[must_use]
    pub fn shard_shape(&self) -> &ChunkShape {
        &self.shard_shape
    }

    /// Return the dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the number of chunks in each dimension of the array, rounding up.
    #[must_use]
    pub fn grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, self.chunk_shape.iter())
            .map(|(&s, c)| s.div_ceil(c.get()))
            .collect()
    }

    /// Return the number of shards in each dimension of the array, rounding up.
    #[must_use]
    pub fn shard_grid_shape(&self) -> ArrayShape {
        std::iter::zip(self.grid_shape(), &self.chunks_per_shard)
            .map(|(g, &c)| g.div_ceil(c))
            .collect()
    }

    /// Return the number of chunks in each dimension of a shard.
    #[must_use]
    pub fn chunks_per_shard(&self) -> &[u64] {
        &self.chunks_per_shard
    }

    /// Return the number of chunks in a shard, and the number of entries in a shard index.
    #[must_use]
    pub fn num_chunks_per_shard(&self) -> u64 {
        self.chunks_per_shard.iter().product()
    }

    /// Returns true if `chunk_indices` is within the chunk grid.
    #[must_use]
    pub fn chunk_indices_inbounds(&self, chunk_indices: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && std::iter::zip(chunk_indices, self.grid_shape()).all(|(&i, g)| i < g)
    }

    /// Locate the shard and slot of the chunk at `chunk_indices`.
    ///
    /// Returns [`None`] if `chunk_indices` is outside of the chunk grid.
    #[must_use]
    pub fn chunk_location(&self, chunk_indices: &[u64]) -> Option<ChunkLocation> {
        if !self.chunk_indices_inbounds(chunk_indices) {
            return None;
        }
        let shard_indices = std::iter::zip(chunk_indices, &self.chunks_per_shard)
            .map(|(i, c)| i / c)
            .collect();
        let local_indices: ArrayIndices = std::iter::zip(chunk_indices, &self.chunks_per_shard)
            .map(|(i, c)| i % c)
            .collect();
        Some(ChunkLocation {
            shard_indices,
            local_index: ravel_indices(&local_indices, &self.chunks_per_shard),
        })
    }

    /// Return the chunk-within-shard indices of the slot `local_index`.
    ///
    /// Returns [`None`] if `local_index` is not a slot of a shard.
    #[must_use]
    pub fn local_chunk_indices(&self, local_index: u64) -> Option<ArrayIndices> {
        (local_index < self.num_chunks_per_shard())
            .then(|| unravel_index(local_index, &self.chunks_per_shard))
    }

    /// Return the full extent of the chunk at `chunk_indices` in array coordinates.
    ///
    /// The extent of a boundary chunk can exceed the array shape.
    #[must_use]
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> ArraySubset {
        let ranges: Vec<Range<u64>> = std::iter::zip(chunk_indices, self.chunk_shape.iter())
            .map(|(&i, c)| i * c.get()..(i + 1) * c.get())
            .collect();
        ArraySubset::new_with_ranges(&ranges)
    }

    /// Return the chunks intersecting `region` after clipping it to the array bounds.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `region` does not match the array.
    pub fn chunk_intersections(
        &self,
        region: &ArraySubset,
    ) -> Result<ChunkIntersections, IncompatibleDimensionalityError> {
        let region = region.bound(&self.shape)?;
        let chunks = region.chunks(&self.chunk_shape)?;
        Ok(ChunkIntersections { chunks, region })
    }
}

/// The chunks intersecting a region of an array, in row-major chunk order.
///
/// See [`ArrayGeometry::chunk_intersections`].
#[derive(Clone, Debug)]
pub struct ChunkIntersections {
    chunks: Chunks,
    region: ArraySubset,
}

impl ChunkIntersections {
    /// Return the region clipped to the array bounds.
    #[must_use]
    pub fn region(&self) -> &ArraySubset {
        &self.region
    }

    /// Return the number of intersected chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if no chunks are intersected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over the intersected chunks.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ChunkIntersection> + '_ {
        self.chunks.iter().map(|(chunk_indices, chunk_subset)| {
            let (overlap, local): (Vec<_>, Vec<_>) = izip!(
                self.region.start(),
                self.region.end_exc(),
                chunk_subset.start(),
                chunk_subset.end_exc()
            )
            .map(|(&region_start, region_end, &chunk_start, chunk_end)| {
                let start = region_start.max(chunk_start);
                let end = region_end.min(chunk_end).max(start);
                (start..end, start - chunk_start..end - chunk_start)
            })
            .unzip();
            ChunkIntersection {
                chunk_indices,
                chunk_subset,
                array_subset: ArraySubset::new_with_ranges(&overlap),
                chunk_local_subset: ArraySubset::new_with_ranges(&local),
            }
        })
    }
}
