use std::sync::Arc;

use super::{
    shard_index::ShardIndexLocation, ArrayConfig, ArrayCreateError, ArrayShape, ArrayStore,
    ChunkShape, CodecChain, DataType, FillValue,
};

/// An [`ArrayStore`] builder.
///
/// The array builder is initialised from an array shape, data type, chunk shape, shard shape, and fill value.
///  - The default codec chain is just the `bytes` codec with little endian encoding, so chunks are uncompressed.
///  - The shard index is at the end of each shard.
///  - Whether chunks equal to the fill value are stored defaults to [`Config::store_empty_chunks`](crate::config::Config::store_empty_chunks).
///
/// Note that [`build`](ArrayStoreBuilder::build) does not modify the store; the array configuration has to be explicitly written with [`ArrayStore::store_metadata`] for the array to be [opened](ArrayStore::open) later.
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use shardstore::array::{codec::{BytesCodec, Crc32cCodec}, shard_index::ShardIndexLocation, ArrayStoreBuilder, CodecChain, DataType, FillValue};
/// # let store = Arc::new(shardstore::storage::store::MemoryStore::new());
/// let array = ArrayStoreBuilder::new(
///     vec![64, 64], // volume shape
///     DataType::Float32,
///     vec![16, 16].try_into()?, // chunk shape (elements must be non-zero)
///     vec![32, 64].try_into()?, // shard shape (a multiple of the chunk shape)
///     FillValue::from(f32::NAN),
/// )
/// .codecs(CodecChain::new(
///     Box::new(BytesCodec::little()),
///     vec![Box::new(Crc32cCodec::new())],
/// )?)
/// .index_location(ShardIndexLocation::Start)
/// .build(store.clone(), "/volume")?;
/// array.store_metadata()?; // write the array configuration to the store
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArrayStoreBuilder {
    /// Volume shape.
    pub shape: ArrayShape,
    /// Data type.
    pub data_type: DataType,
    /// Chunk shape.
    pub chunk_shape: ChunkShape,
    /// Shard shape.
    pub shard_shape: ChunkShape,
    /// Fill value.
    pub fill_value: FillValue,
    /// Chunk codecs.
    pub codecs: CodecChain,
    /// Shard index location.
    pub index_location: ShardIndexLocation,
    /// Store chunks equal to the fill value.
    pub store_empty_chunks: Option<bool>,
}

impl ArrayStoreBuilder {
    /// Create a new array store builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ChunkShape,
        shard_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            shard_shape,
            fill_value,
            codecs: CodecChain::default(),
            index_location: ShardIndexLocation::default(),
            store_empty_chunks: None,
        }
    }

    /// Set the chunk codecs.
    ///
    /// If left unmodified, the codec chain is just the `bytes` codec with little endian encoding.
    pub fn codecs(&mut self, codecs: CodecChain) -> &mut Self {
        self.codecs = codecs;
        self
    }

    /// Set the shard index location.
    ///
    /// If left unmodified, the shard index is at the end of each shard.
    pub fn index_location(&mut self, index_location: ShardIndexLocation) -> &mut Self {
        self.index_location = index_location;
        self
    }

    /// Set whether chunks equal to the fill value are stored.
    ///
    /// If left unmodified, this is [`Config::store_empty_chunks`](crate::config::Config::store_empty_chunks).
    pub fn store_empty_chunks(&mut self, store_empty_chunks: bool) -> &mut Self {
        self.store_empty_chunks = Some(store_empty_chunks);
        self
    }

    /// Return the [`ArrayConfig`] of the array.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidFillValue`] if the fill value is incompatible with the data type.
    pub fn config(&self) -> Result<ArrayConfig, ArrayCreateError> {
        Ok(ArrayConfig {
            volume_shape: self.shape.clone(),
            chunk_shape: self.chunk_shape.clone(),
            shard_shape: self.shard_shape.clone(),
            data_type: self.data_type,
            fill_value: self.data_type.metadata_fill_value(&self.fill_value)?,
            index_location: self.index_location,
            codecs: self.codecs.create_metadatas(),
        })
    }

    /// Build into an [`ArrayStore`] at `path` of `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the geometry, fill value, codecs, or path are invalid.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<ArrayStore<TStorage>, ArrayCreateError> {
        let mut array = ArrayStore::new_with_config(storage, path, &self.config()?)?;
        if let Some(store_empty_chunks) = self.store_empty_chunks {
            array.set_store_empty_chunks(store_empty_chunks);
        }
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array::codec::{BytesCodec, Crc32cCodec},
        storage::store::MemoryStore,
    };

    use super::*;

    #[test]
    fn array_builder() {
        let storage = Arc::new(MemoryStore::new());
        let mut builder = ArrayStoreBuilder::new(
            vec![8, 8],
            DataType::Int16,
            vec![2, 2].try_into().unwrap(),
            vec![4, 4].try_into().unwrap(),
            FillValue::from(-1i16),
        );
        builder
            .codecs(
                CodecChain::new(
                    Box::new(BytesCodec::big()),
                    vec![Box::new(Crc32cCodec::new())],
                )
                .unwrap(),
            )
            .index_location(ShardIndexLocation::Start)
            .store_empty_chunks(true);

        let config = builder.config().unwrap();
        assert_eq!(config.fill_value, serde_json::json!(-1));
        assert_eq!(config.codecs.len(), 2);

        let array = builder.build(storage.clone(), "/array").unwrap();
        assert_eq!(array.shape(), &[8, 8]);
        assert_eq!(array.data_type(), DataType::Int16);
        assert_eq!(array.index_location(), ShardIndexLocation::Start);
        assert!(array.store_empty_chunks());
        assert_eq!(array.config(), &config);

        assert!(builder.build(storage.clone(), "array").is_err());
    }

    #[test]
    fn array_builder_invalid() {
        let storage = Arc::new(MemoryStore::new());
        let builder = ArrayStoreBuilder::new(
            vec![8, 8],
            DataType::UInt8,
            vec![3, 3].try_into().unwrap(),
            vec![4, 4].try_into().unwrap(),
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.build(storage.clone(), "/"),
            Err(ArrayCreateError::InvalidGeometry(_))
        ));

        let builder = ArrayStoreBuilder::new(
            vec![8],
            DataType::UInt8,
            vec![4].try_into().unwrap(),
            vec![4].try_into().unwrap(),
            FillValue::from(0u16),
        );
        assert!(matches!(
            builder.build(storage, "/"),
            Err(ArrayCreateError::InvalidFillValue(_))
        ));
    }
}
