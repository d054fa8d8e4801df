use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    storage::ReadableWritableStorageTraits,
};

use super::{
    chunk_concurrent_limit, shard::ShardWriter, transmute_to_bytes, ArrayError, ArrayIndices,
    ArrayStore, ChunkIntersection, ChunkLocation, Element, PendingShard,
};

impl<TStorage: ?Sized + ReadableWritableStorageTraits> ArrayStore<TStorage> {
    /// Encode a whole chunk, or return [`None`] if it should be recorded as absent.
    fn encode_chunk(&self, chunk: Vec<u8>) -> Result<Option<Vec<u8>>, ArrayError> {
        if !self.store_empty_chunks && self.fill_value().equals_all(&chunk) {
            Ok(None)
        } else {
            Ok(Some(self.codecs.encode(chunk, &self.chunk_representation)?))
        }
    }

    fn insert_pending(&self, chunks: Vec<(ChunkLocation, Option<Vec<u8>>)>) {
        let mut pending = self.pending.lock();
        for (location, encoded) in chunks {
            pending
                .entry(location.shard_indices)
                .or_default()
                .insert(location.local_index, encoded);
        }
    }

    /// Write the native endian bytes of the whole chunk at `chunk_indices`.
    ///
    /// The write is visible to reads of this array immediately, and is written to the store on [`commit`](ArrayStore::commit).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are outside of the chunk grid,
    ///  - the length of `chunk_bytes` does not match the chunk size, or
    ///  - there is a codec encoding error.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk_bytes: &[u8]) -> Result<(), ArrayError> {
        let location = self.chunk_location(chunk_indices)?;
        if chunk_bytes.len() as u64 != self.chunk_representation.size() {
            return Err(ArrayError::ShapeMismatch(
                chunk_bytes.len(),
                self.geometry.chunk_subset(chunk_indices),
                self.chunk_representation.size(),
            ));
        }
        let encoded = self.encode_chunk(chunk_bytes.to_vec())?;
        self.insert_pending(vec![(location, encoded)]);
        Ok(())
    }

    /// Write the elements of the whole chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if `T` is incompatible with the data type, otherwise see [`store_chunk`](ArrayStore::store_chunk).
    pub fn store_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        T::validate_data_type(self.data_type())?;
        self.store_chunk(chunk_indices, transmute_to_bytes(chunk_elements))
    }

    /// Erase the chunk at `chunk_indices`, so that it reads as the fill value.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkIndices`] if `chunk_indices` are outside of the chunk grid.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        let location = self.chunk_location(chunk_indices)?;
        self.insert_pending(vec![(location, None)]);
        Ok(())
    }

    /// Write the native endian bytes of `region` in row-major order.
    ///
    /// Chunks partially covered by `region` are read and updated.
    /// The write is visible to reads of this array immediately, and is written to the store on [`commit`](ArrayStore::commit).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the dimensionality of `region` does not match the array,
    ///  - `region` extends beyond the array,
    ///  - the length of `region_bytes` does not match the size of `region`,
    ///  - the index of a shard holding a partially covered chunk is corrupt,
    ///  - there is a codec encoding or decoding error, or
    ///  - there is an underlying store error.
    pub fn write_region(&self, region: &ArraySubset, region_bytes: &[u8]) -> Result<(), ArrayError> {
        if region.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                region.dimensionality(),
                self.dimensionality(),
            )
            .into());
        }
        let element_size = self.chunk_representation.element_size();
        let expected_size = region.num_elements() * element_size as u64;
        if region_bytes.len() as u64 != expected_size {
            return Err(ArrayError::ShapeMismatch(
                region_bytes.len(),
                region.clone(),
                expected_size,
            ));
        }
        if !region.inbounds(self.shape()) {
            return Err(ArrayError::InvalidArraySubset(
                region.clone(),
                self.shape().to_vec(),
            ));
        }
        if region.is_empty() {
            return Ok(());
        }

        let intersections: Vec<ChunkIntersection> =
            self.geometry.chunk_intersections(region)?.iter().collect();
        let chunk_shape = self.chunk_representation.shape_u64();
        let encode_intersection = |intersection: ChunkIntersection| {
            let location = self.chunk_location(&intersection.chunk_indices)?;
            let region_subset = intersection
                .array_subset
                .relative_to(region.start())
                .map_err(|_| {
                    ArrayError::InvalidArraySubset(region.clone(), self.shape().to_vec())
                })?;
            let bytes = region_subset.extract_bytes(region_bytes, region.shape(), element_size)?;
            let chunk = if intersection.is_whole_chunk() {
                bytes
            } else {
                let mut chunk = self.retrieve_chunk(&intersection.chunk_indices)?;
                intersection.chunk_local_subset.store_bytes(
                    &bytes,
                    &mut chunk,
                    &chunk_shape,
                    element_size,
                )?;
                chunk
            };
            Ok::<_, ArrayError>((location, self.encode_chunk(chunk)?))
        };
        let encoded = iter_concurrent_limit!(
            chunk_concurrent_limit(intersections.len()),
            intersections,
            map,
            encode_intersection
        )
        .collect::<Result<Vec<_>, _>>()?;

        self.insert_pending(encoded);
        Ok(())
    }

    /// Write the elements of `region` in row-major order.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if `T` is incompatible with the data type, otherwise see [`write_region`](ArrayStore::write_region).
    pub fn write_region_elements<T: Element>(
        &self,
        region: &ArraySubset,
        region_elements: &[T],
    ) -> Result<(), ArrayError> {
        T::validate_data_type(self.data_type())?;
        self.write_region(region, transmute_to_bytes(region_elements))
    }

    #[cfg(feature = "ndarray")]
    /// Write an [`ndarray::ArrayViewD`] to the region of the array starting at `region_start`.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleDimensionality`] if `region_start` does not match the dimensionality of `region_array`, otherwise see [`write_region_elements`](ArrayStore::write_region_elements).
    pub fn write_region_ndarray<T: Element>(
        &self,
        region_start: &[u64],
        region_array: &ndarray::ArrayViewD<T>,
    ) -> Result<(), ArrayError> {
        if region_start.len() != region_array.ndim() {
            return Err(IncompatibleDimensionalityError::new(
                region_start.len(),
                region_array.ndim(),
            )
            .into());
        }
        let region_shape: Vec<u64> = region_array.shape().iter().map(|s| *s as u64).collect();
        let region = ArraySubset::new_with_start_shape(region_start.to_vec(), region_shape)?;
        let region_array = region_array.as_standard_layout();
        let elements = region_array.as_slice().unwrap_or_default();
        self.write_region_elements(&region, elements)
    }

    /// Write every shard with pending chunks to the store.
    ///
    /// Each shard is written with a single `set`, or erased if none of its chunks are present.
    /// Chunks of an existing shard which were not rewritten are retained, rewritten chunks are appended and their superseded bytes are left in the shard.
    /// Independent shards are written in parallel.
    ///
    /// Pending writes are taken before any shard is written, so a failed commit loses the pending chunks of every shard which was not written.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the index of an existing shard is corrupt, or
    ///  - there is an underlying store error.
    pub fn commit(&self) -> Result<(), ArrayError> {
        let pending: Vec<(ArrayIndices, PendingShard)> =
            std::mem::take(&mut *self.pending.lock()).into_iter().collect();
        if pending.is_empty() {
            return Ok(());
        }
        log::debug!("committing {} shards of {}", pending.len(), self.prefix);
        iter_concurrent_limit!(
            chunk_concurrent_limit(pending.len()),
            pending,
            try_for_each,
            |(shard_indices, chunks): (ArrayIndices, PendingShard)| {
                self.commit_shard(&shard_indices, chunks)
            }
        )
    }

    fn commit_shard(&self, shard_indices: &[u64], chunks: PendingShard) -> Result<(), ArrayError> {
        let key = self.shard_key(shard_indices);
        let num_chunks = self.geometry.num_chunks_per_shard();
        let mut writer = match self.storage.get(&key)? {
            Some(existing) => {
                let writer = ShardWriter::from_existing(existing, num_chunks, self.index_location())
                    .map_err(|err| ArrayError::from_shard_error(&key, err))?;
                let superseded = chunks
                    .keys()
                    .filter(|local_index| writer.index().entry(**local_index).is_some())
                    .count();
                if superseded > 0 {
                    log::warn!(
                        "shard {key}: {superseded} chunks are superseded, their bytes are retained in the shard"
                    );
                }
                writer
            }
            None => ShardWriter::new(num_chunks, self.index_location()),
        };

        for (local_index, encoded) in &chunks {
            match encoded {
                Some(encoded) => writer.store_chunk(*local_index, encoded),
                None => writer.erase_chunk(*local_index),
            }
            .map_err(|err| ArrayError::from_shard_error(&key, err))?;
        }
        let (shard, index) = writer.finalize();

        if index.is_empty() {
            log::debug!("erasing shard {key}, no chunks are present");
            self.storage.erase(&key)?;
        } else {
            log::debug!(
                "writing shard {key}: {} chunks written, {} bytes",
                chunks.len(),
                shard.len()
            );
            self.storage.set(&key, shard)?;
        }
        Ok(())
    }
}
