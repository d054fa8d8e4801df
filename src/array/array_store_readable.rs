use std::collections::BTreeMap;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    storage::ReadableStorageTraits,
};

use super::{
    chunk_concurrent_limit, shard::ShardReader, transmute_from_bytes_vec, ArrayError,
    ArrayIndices, ArrayStore, ChunkIntersection, Element,
};

impl<TStorage: ?Sized + ReadableStorageTraits> ArrayStore<TStorage> {
    /// Retrieve the encoded chunks at `local_indices` of the shard at `shard_indices`.
    ///
    /// Pending writes take precedence over the store.
    /// The shard index is retrieved afresh, then chunks in the store are retrieved with a single ranged get.
    fn retrieve_encoded_chunks(
        &self,
        shard_indices: &[u64],
        local_indices: &[u64],
    ) -> Result<Vec<Option<Vec<u8>>>, ArrayError> {
        let pending: Vec<Option<Option<Vec<u8>>>> = {
            let pending = self.pending.lock();
            let shard = pending.get(shard_indices);
            local_indices
                .iter()
                .map(|local_index| shard.and_then(|shard| shard.get(local_index)).cloned())
                .collect()
        };
        let stored_indices: Vec<u64> = std::iter::zip(local_indices, &pending)
            .filter(|(_, pending)| pending.is_none())
            .map(|(local_index, _)| *local_index)
            .collect();

        let stored = if stored_indices.is_empty() {
            vec![]
        } else {
            let key = self.shard_key(shard_indices);
            ShardReader::open(
                &*self.storage,
                &key,
                self.geometry.num_chunks_per_shard(),
                self.index_location(),
            )
            .and_then(|reader| reader.retrieve_chunks(&stored_indices))
            .map_err(|err| ArrayError::from_shard_error(&key, err))?
        };

        let mut stored = stored.into_iter();
        Ok(pending
            .into_iter()
            .map(|pending| pending.unwrap_or_else(|| stored.next().flatten()))
            .collect())
    }

    /// Read the chunk at `chunk_indices` into its native endian bytes.
    ///
    /// Returns [`None`] if the chunk is absent.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are outside of the chunk grid,
    ///  - the index of its shard is corrupt,
    ///  - there is a codec decoding error, or
    ///  - there is an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        let location = self.chunk_location(chunk_indices)?;
        let encoded = self
            .retrieve_encoded_chunks(&location.shard_indices, &[location.local_index])?
            .remove(0);
        match encoded {
            Some(encoded) => Ok(Some(
                self.codecs.decode(encoded, &self.chunk_representation)?,
            )),
            None => Ok(None),
        }
    }

    /// Read the chunk at `chunk_indices` into its native endian bytes.
    ///
    /// An absent chunk is filled with the fill value.
    ///
    /// # Errors
    /// See [`retrieve_chunk_if_exists`](ArrayStore::retrieve_chunk_if_exists).
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        Ok(self
            .retrieve_chunk_if_exists(chunk_indices)?
            .unwrap_or_else(|| self.chunk_representation.fill_bytes()))
    }

    /// Read the chunk at `chunk_indices` into a vector of its elements.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if `T` is incompatible with the data type, otherwise see [`retrieve_chunk`](ArrayStore::retrieve_chunk).
    pub fn retrieve_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        Ok(transmute_from_bytes_vec(self.retrieve_chunk(chunk_indices)?))
    }

    /// Read `region` of the array into its native endian bytes in row-major order.
    ///
    /// Positions that are absent or outside of the array read as the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the dimensionality of `region` does not match the array,
    ///  - the index of an intersected shard is corrupt,
    ///  - there is a codec decoding error, or
    ///  - there is an underlying store error.
    ///
    /// # Panics
    /// Panics if the region size exceeds [`usize::MAX`].
    pub fn read_region(&self, region: &ArraySubset) -> Result<Vec<u8>, ArrayError> {
        if region.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                region.dimensionality(),
                self.dimensionality(),
            )
            .into());
        }
        let element_size = self.chunk_representation.element_size();
        let mut output = self.fill_value().repeat(region.num_elements_usize());
        if region.is_empty() {
            return Ok(output);
        }

        // Group the intersected chunks by shard
        let mut shards: BTreeMap<ArrayIndices, Vec<(u64, ChunkIntersection)>> = BTreeMap::new();
        for intersection in self.geometry.chunk_intersections(region)?.iter() {
            let location = self.chunk_location(&intersection.chunk_indices)?;
            shards
                .entry(location.shard_indices)
                .or_default()
                .push((location.local_index, intersection));
        }

        // Retrieve the encoded chunks of each shard
        let shards: Vec<_> = shards.into_iter().collect();
        let encoded_chunks: Vec<(ChunkIntersection, Option<Vec<u8>>)> = iter_concurrent_limit!(
            chunk_concurrent_limit(shards.len()),
            shards,
            map,
            |(shard_indices, chunks): (ArrayIndices, Vec<(u64, ChunkIntersection)>)| {
                let local_indices: Vec<u64> =
                    chunks.iter().map(|(local_index, _)| *local_index).collect();
                let encoded = self.retrieve_encoded_chunks(&shard_indices, &local_indices)?;
                Ok::<_, ArrayError>(
                    std::iter::zip(chunks.into_iter().map(|(_, intersection)| intersection), encoded)
                        .collect::<Vec<_>>(),
                )
            }
        )
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();

        // Decode the chunks and extract the intersected bytes
        let chunk_shape = self.chunk_representation.shape_u64();
        let decode_intersection = |(intersection, encoded): (ChunkIntersection, Option<Vec<u8>>)| {
            let Some(encoded) = encoded else {
                return Ok(None);
            };
            let chunk = self.codecs.decode(encoded, &self.chunk_representation)?;
            let bytes = intersection.chunk_local_subset.extract_bytes(
                &chunk,
                &chunk_shape,
                element_size,
            )?;
            let output_subset = intersection
                .array_subset
                .relative_to(region.start())
                .map_err(|_| {
                    ArrayError::InvalidArraySubset(region.clone(), self.shape().to_vec())
                })?;
            Ok::<_, ArrayError>(Some((output_subset, bytes)))
        };
        let decoded: Vec<_> = iter_concurrent_limit!(
            chunk_concurrent_limit(encoded_chunks.len()),
            encoded_chunks,
            map,
            decode_intersection
        )
        .collect::<Result<Vec<_>, _>>()?;

        for (output_subset, bytes) in decoded.into_iter().flatten() {
            output_subset.store_bytes(&bytes, &mut output, region.shape(), element_size)?;
        }
        Ok(output)
    }

    /// Read `region` of the array into a vector of its elements in row-major order.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleElementType`] if `T` is incompatible with the data type, otherwise see [`read_region`](ArrayStore::read_region).
    ///
    /// # Panics
    /// Panics if the region size exceeds [`usize::MAX`].
    pub fn read_region_elements<T: Element>(
        &self,
        region: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        Ok(transmute_from_bytes_vec(self.read_region(region)?))
    }

    #[cfg(feature = "ndarray")]
    /// Read `region` of the array into an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// See [`read_region_elements`](ArrayStore::read_region_elements).
    ///
    /// # Panics
    /// Panics if any dimension of the region exceeds [`usize::MAX`].
    pub fn read_region_ndarray<T: Element>(
        &self,
        region: &ArraySubset,
    ) -> Result<ndarray::ArrayD<T>, ArrayError> {
        let elements = self.read_region_elements::<T>(region)?;
        let length = elements.len();
        ndarray::ArrayD::<T>::from_shape_vec(super::iter_u64_to_usize(region.shape().iter()), elements)
            .map_err(|_| {
                ArrayError::ShapeMismatch(
                    length * std::mem::size_of::<T>(),
                    region.clone(),
                    region.num_elements() * std::mem::size_of::<T>() as u64,
                )
            })
    }
}
