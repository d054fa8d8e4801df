use std::sync::Arc;

use shardstore::array::codec::{BytesCodec, Crc32cCodec, GzipCodec};
use shardstore::array::shard_index::{
    ShardIndex, ShardIndexEntry, ShardIndexError, ShardIndexLocation,
};
use shardstore::array::{ArrayError, ArrayStore, ArrayStoreBuilder, CodecChain, DataType, FillValue};
use shardstore::array_subset::ArraySubset;
use shardstore::storage::storage_adapter::PerformanceMetricsStorageAdapter;
use shardstore::storage::store::MemoryStore;
use shardstore::storage::{ListableStorageTraits, ReadableStorageTraits, StoreKey, WritableStorageTraits};

/// An 8x8 `uint16` array with 4x4 chunks and 8x4 shards, so 2 shards of 2 chunks each.
fn array_8x8<TStorage: ?Sized>(
    store: Arc<TStorage>,
    index_location: ShardIndexLocation,
) -> ArrayStore<TStorage> {
    ArrayStoreBuilder::new(
        vec![8, 8],
        DataType::UInt16,
        vec![4, 4].try_into().unwrap(),
        vec![8, 4].try_into().unwrap(),
        FillValue::from(0u16),
    )
    .index_location(index_location)
    .build(store, "/volume")
    .unwrap()
}

fn iota(len: u16) -> Vec<u16> {
    (0..len).collect()
}

#[test]
fn array_store_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);

    let all = ArraySubset::new_with_shape(vec![8, 8]);
    array.write_region_elements::<u16>(&all, &iota(64))?;
    array.commit()?;
    assert!(!array.has_pending_writes());
    assert_eq!(array.read_region_elements::<u16>(&all)?, iota(64));

    // A region spanning both shards and all four chunks
    let centre = ArraySubset::new_with_ranges(&[3..5, 3..5]);
    assert_eq!(
        array.read_region_elements::<u16>(&centre)?,
        vec![27, 28, 35, 36]
    );
    assert_eq!(
        array.retrieve_chunk_elements::<u16>(&[1, 1])?[..4],
        [36, 37, 38, 39]
    );
    assert!(array.read_region_elements::<u8>(&all).is_err());

    let mut keys = store.list()?;
    keys.sort();
    assert_eq!(
        keys,
        vec![
            StoreKey::new("volume/c/0/0")?,
            StoreKey::new("volume/c/0/1")?
        ]
    );
    Ok(())
}

#[test]
fn array_store_scenario_8x8() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);
    assert_eq!(array.geometry().chunks_per_shard(), &[2, 1]);
    assert_eq!(array.geometry().shard_grid_shape(), vec![1, 2]);

    // Chunk [1, 0] is local index 1 of shard [0, 0]
    let chunk: Vec<u16> = (100..116).collect();
    array.store_chunk_elements::<u16>(&[1, 0], &chunk)?;
    array.commit()?;

    let shard = store.get(&StoreKey::new("volume/c/0/0")?)?.unwrap();
    let index_size = ShardIndex::encoded_size(2) as usize;
    assert_eq!(index_size, 36);
    assert_eq!(shard.len(), 32 + index_size);
    let index = ShardIndex::decode(&shard[shard.len() - index_size..], 2)?;
    assert_eq!(index.entry(0), None);
    assert_eq!(index.entry(1).map(|entry| (entry.offset, entry.length)), Some((0, 32)));
    assert!(store.get(&StoreKey::new("volume/c/0/1")?)?.is_none());

    let region = array.read_region_elements::<u16>(&ArraySubset::new_with_ranges(&[3..5, 0..2]))?;
    assert_eq!(region, vec![0, 0, 100, 101]);

    // [0:2, 0:2] = 5, then read [0:4, 0:4]
    array.write_region_elements::<u16>(&ArraySubset::new_with_ranges(&[0..2, 0..2]), &[5; 4])?;
    array.commit()?;
    let block = array.read_region_elements::<u16>(&ArraySubset::new_with_ranges(&[0..4, 0..4]))?;
    #[rustfmt::skip]
    assert_eq!(block, vec![
        5, 5, 0, 0,
        5, 5, 0, 0,
        0, 0, 0, 0,
        0, 0, 0, 0,
    ]);

    // A shard shape which is not a multiple of the chunk shape fails before any I/O
    let store = Arc::new(MemoryStore::new());
    assert!(matches!(
        ArrayStoreBuilder::new(
            vec![8, 8],
            DataType::UInt16,
            vec![4, 4].try_into()?,
            vec![6, 4].try_into()?,
            FillValue::from(0u16),
        )
        .build(store.clone(), "/volume"),
        Err(shardstore::array::ArrayCreateError::InvalidGeometry(_))
    ));
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn array_store_fill() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayStoreBuilder::new(
        vec![8, 8],
        DataType::Int32,
        vec![4, 4].try_into()?,
        vec![8, 4].try_into()?,
        FillValue::from(-5i32),
    )
    .build(store.clone(), "/")?;

    assert_eq!(
        array.read_region_elements::<i32>(&ArraySubset::new_with_shape(vec![8, 8]))?,
        vec![-5; 64]
    );
    assert_eq!(array.retrieve_chunk_if_exists(&[0, 0])?, None);

    array.write_region_elements::<i32>(&ArraySubset::new_with_ranges(&[7..8, 7..8]), &[1])?;
    array.commit()?;

    // Positions outside of the array read as the fill value
    let region = array.read_region_elements::<i32>(&ArraySubset::new_with_ranges(&[6..10, 6..9]))?;
    assert_eq!(
        region,
        vec![-5, -5, -5, -5, 1, -5, -5, -5, -5, -5, -5, -5]
    );
    assert!(array
        .read_region(&ArraySubset::new_with_ranges(&[0..0, 0..8]))?
        .is_empty());
    assert!(array.read_region(&ArraySubset::new_with_ranges(&[0..1])).is_err());
    Ok(())
}

#[test]
fn array_store_partial_update() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);
    let all = ArraySubset::new_with_shape(vec![8, 8]);
    array.write_region_elements::<u16>(&all, &iota(64))?;
    array.commit()?;

    // Copy-on-write of part of each of the four chunks
    let update = ArraySubset::new_with_ranges(&[3..5, 3..5]);
    array.write_region_elements::<u16>(&update, &[1000; 4])?;
    array.commit()?;

    let mut expected = iota(64);
    for (i, j) in [(3, 3), (3, 4), (4, 3), (4, 4)] {
        expected[i * 8 + j] = 1000;
    }
    assert_eq!(array.read_region_elements::<u16>(&all)?, expected);

    let reopened = array_8x8(store, ShardIndexLocation::End);
    assert_eq!(reopened.read_region_elements::<u16>(&all)?, expected);
    Ok(())
}

#[test]
fn array_store_pending() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);
    let region = ArraySubset::new_with_ranges(&[0..2, 0..2]);
    array.write_region_elements::<u16>(&region, &[1, 2, 3, 4])?;
    assert!(array.has_pending_writes());
    assert!(store.list()?.is_empty());
    assert_eq!(array.read_region_elements::<u16>(&region)?, vec![1, 2, 3, 4]);

    array.discard_pending();
    assert!(!array.has_pending_writes());
    assert_eq!(array.read_region_elements::<u16>(&region)?, vec![0; 4]);
    array.commit()?;
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn array_store_write_invalid() {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store, ShardIndexLocation::End);
    assert!(matches!(
        array.write_region(&ArraySubset::new_with_ranges(&[0..2, 0..2]), &[0u8; 7]),
        Err(ArrayError::ShapeMismatch(7, _, 8))
    ));
    assert!(matches!(
        array.write_region(&ArraySubset::new_with_ranges(&[6..10, 0..2]), &[0u8; 16]),
        Err(ArrayError::InvalidArraySubset(..))
    ));
    assert!(matches!(
        array.write_region(&ArraySubset::new_with_ranges(&[0..2]), &[0u8; 4]),
        Err(ArrayError::IncompatibleDimensionality(_))
    ));
    assert!(matches!(
        array.store_chunk(&[2, 0], &[0u8; 32]),
        Err(ArrayError::InvalidChunkIndices(_))
    ));
    assert!(matches!(
        array.store_chunk(&[0, 0], &[0u8; 31]),
        Err(ArrayError::ShapeMismatch(31, _, 32))
    ));
    assert!(matches!(
        array.write_region_elements::<u32>(&ArraySubset::new_with_ranges(&[0..1, 0..1]), &[0]),
        Err(ArrayError::IncompatibleElementType(..))
    ));
    assert!(!array.has_pending_writes());
}

#[test]
fn array_store_corrupt_index_isolated() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);
    let all = ArraySubset::new_with_shape(vec![8, 8]);
    array.write_region_elements::<u16>(&all, &iota(64))?;
    array.commit()?;

    let left = ArraySubset::new_with_ranges(&[0..8, 0..4]);
    let right = ArraySubset::new_with_ranges(&[0..8, 4..8]);
    assert!(array.read_region(&left).is_ok());

    // Flip a bit of the index checksum of shard [0, 0]
    let key = StoreKey::new("volume/c/0/0")?;
    let mut shard = store.get(&key)?.unwrap();
    *shard.last_mut().unwrap() ^= 1;
    store.set(&key, shard)?;

    // Every later read of the shard fails, including by the store that wrote it
    for _ in 0..2 {
        match array.read_region(&left) {
            Err(ArrayError::CorruptIndex { key: corrupt_key, source }) => {
                assert_eq!(corrupt_key, key);
                assert_eq!(source, ShardIndexError::InvalidChecksum);
            }
            other => panic!("expected a corrupt index, got {other:?}"),
        }
    }
    assert!(array.read_region(&all).is_err());
    assert!(matches!(
        array.retrieve_chunk(&[1, 0]),
        Err(ArrayError::CorruptIndex { .. })
    ));

    let expected: Vec<u16> = iota(64)
        .into_iter()
        .filter(|i| i % 8 >= 4)
        .collect();
    assert_eq!(array.read_region_elements::<u16>(&right)?, expected);

    // Writing to the corrupt shard fails on commit and leaves it untouched
    array.store_chunk_elements::<u16>(&[0, 0], &[9; 16])?;
    assert!(matches!(
        array.commit(),
        Err(ArrayError::CorruptIndex { .. })
    ));
    Ok(())
}

#[test]
fn array_store_entry_into_index() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);

    // A bare index whose chunk 0 entry covers the index bytes themselves
    let mut index = ShardIndex::new_empty(2);
    index.set_entry(
        0,
        Some(ShardIndexEntry {
            offset: 0,
            length: ShardIndex::encoded_size(2),
        }),
    )?;
    store.set(&StoreKey::new("volume/c/0/0")?, index.encode())?;
    assert!(matches!(
        array.read_region(&ArraySubset::new_with_ranges(&[0..4, 0..4])),
        Err(ArrayError::CorruptIndex {
            source: ShardIndexError::EntryOutOfBounds(0),
            ..
        })
    ));

    // Likewise an entry starting inside a leading index
    let array = array_8x8(store.clone(), ShardIndexLocation::Start);
    let mut index = ShardIndex::new_empty(2);
    index.set_entry(
        1,
        Some(ShardIndexEntry {
            offset: 4,
            length: 32,
        }),
    )?;
    let mut shard = index.encode();
    shard.extend([0u8; 32]);
    store.set(&StoreKey::new("volume/c/0/1")?, shard)?;
    assert!(matches!(
        array.retrieve_chunk(&[1, 1]),
        Err(ArrayError::CorruptIndex {
            source: ShardIndexError::EntryOutOfBounds(1),
            ..
        })
    ));
    Ok(())
}

#[test]
fn array_store_truncated_shard() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::Start);
    store.set(&StoreKey::new("volume/c/0/1")?, vec![0u8; 10])?;
    assert!(matches!(
        array.read_region(&ArraySubset::new_with_ranges(&[0..1, 4..5])),
        Err(ArrayError::CorruptIndex {
            source: ShardIndexError::ShardTooShort(10, 36),
            ..
        })
    ));
    assert_eq!(
        array.read_region_elements::<u16>(&ArraySubset::new_with_ranges(&[0..1, 0..1]))?,
        vec![0]
    );
    Ok(())
}

#[test]
fn array_store_one_set_per_shard() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
        MemoryStore::new(),
    )));
    let array = array_8x8(store.clone(), ShardIndexLocation::End);

    // Many small writes to the chunks of shard [0, 0]
    for i in 0..8 {
        array.write_region_elements::<u16>(&ArraySubset::new_with_ranges(&[i..i + 1, 0..4]), &[i as u16; 4])?;
    }
    array.commit()?;
    assert_eq!(store.writes(), 1);

    store.reset();
    array.write_region_elements::<u16>(&ArraySubset::new_with_shape(vec![8, 8]), &iota(64))?;
    array.commit()?;
    assert_eq!(store.writes(), 2);
    Ok(())
}

#[test]
fn array_store_index_location() -> Result<(), Box<dyn std::error::Error>> {
    for location in [ShardIndexLocation::Start, ShardIndexLocation::End] {
        let store = Arc::new(MemoryStore::new());
        let array = array_8x8(store.clone(), location);
        let all = ArraySubset::new_with_shape(vec![8, 8]);
        array.write_region_elements::<u16>(&all, &iota(64))?;
        array.commit()?;

        let shard = store.get(&StoreKey::new("volume/c/0/1")?)?.unwrap();
        assert_eq!(shard.len(), 2 * 32 + 36);
        let (index, data_start) = match location {
            ShardIndexLocation::Start => (ShardIndex::decode(&shard[..36], 2)?, 36),
            ShardIndexLocation::End => (ShardIndex::decode(&shard[64..], 2)?, 0),
        };
        let entries: Vec<_> = index
            .iter_present()
            .map(|(local_index, entry)| (local_index, entry.offset, entry.length))
            .collect();
        assert_eq!(entries, vec![(0, data_start, 32), (1, data_start + 32, 32)]);

        // Chunk [0, 1] starts at element [0, 4], little endian
        assert_eq!(&shard[data_start as usize..data_start as usize + 4], &[4, 0, 5, 0]);

        assert_eq!(array.read_region_elements::<u16>(&all)?, iota(64));
    }
    Ok(())
}

#[test]
fn array_store_append_after_commit() -> Result<(), Box<dyn std::error::Error>> {
    for location in [ShardIndexLocation::Start, ShardIndexLocation::End] {
        let store = Arc::new(MemoryStore::new());
        let array = array_8x8(store.clone(), location);
        let key = StoreKey::new("volume/c/0/0")?;

        array.store_chunk_elements::<u16>(&[0, 0], &[1; 16])?;
        array.commit()?;
        assert_eq!(store.size_key(&key)?, Some(32 + 36));

        // A second commit to the same shard keeps the first chunk
        array.store_chunk_elements::<u16>(&[1, 0], &[2; 16])?;
        array.commit()?;
        assert_eq!(store.size_key(&key)?, Some(64 + 36));

        // Rewriting a chunk appends it, the superseded payload is retained
        array.store_chunk_elements::<u16>(&[0, 0], &[3; 16])?;
        array.commit()?;
        assert_eq!(store.size_key(&key)?, Some(96 + 36));

        let reopened = array_8x8(store.clone(), location);
        assert_eq!(reopened.retrieve_chunk_elements::<u16>(&[0, 0])?, vec![3; 16]);
        assert_eq!(reopened.retrieve_chunk_elements::<u16>(&[1, 0])?, vec![2; 16]);
        assert_eq!(reopened.retrieve_chunk_if_exists(&[0, 1])?, None);
    }
    Ok(())
}

#[test]
fn array_store_empty_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store.clone(), ShardIndexLocation::End);
    let key = StoreKey::new("volume/c/0/0")?;
    assert!(!array.store_empty_chunks());

    // A chunk of fill values is not stored
    array.store_chunk_elements::<u16>(&[0, 0], &[0; 16])?;
    array.store_chunk_elements::<u16>(&[1, 0], &[1; 16])?;
    array.commit()?;
    assert_eq!(store.size_key(&key)?, Some(32 + 36));
    assert_eq!(array.retrieve_chunk_if_exists(&[0, 0])?, None);

    // Overwriting the last chunk with fill values erases the shard
    array.write_region_elements::<u16>(&ArraySubset::new_with_ranges(&[4..8, 0..4]), &[0; 16])?;
    array.commit()?;
    assert!(store.get(&key)?.is_none());
    assert_eq!(array.retrieve_chunk_if_exists(&[1, 0])?, None);

    // Erasing a chunk
    array.store_chunk_elements::<u16>(&[0, 1], &[7; 16])?;
    array.store_chunk_elements::<u16>(&[1, 1], &[8; 16])?;
    array.commit()?;
    array.erase_chunk(&[0, 1])?;
    assert_eq!(array.retrieve_chunk_if_exists(&[0, 1])?, None);
    array.commit()?;
    assert_eq!(array.retrieve_chunk_if_exists(&[0, 1])?, None);
    assert_eq!(array.retrieve_chunk_elements::<u16>(&[1, 1])?, vec![8; 16]);
    assert!(matches!(
        array.erase_chunk(&[0, 2]),
        Err(ArrayError::InvalidChunkIndices(_))
    ));

    // Chunks of fill values are stored if requested
    let mut array = array;
    array.set_store_empty_chunks(true);
    array.store_chunk_elements::<u16>(&[0, 0], &[0; 16])?;
    array.commit()?;
    assert_eq!(array.retrieve_chunk_if_exists(&[0, 0])?, Some(vec![0; 32]));
    Ok(())
}

#[test]
fn array_store_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayStoreBuilder::new(
        vec![10, 7],
        DataType::Float32,
        vec![4, 2].try_into()?,
        vec![8, 4].try_into()?,
        FillValue::from(f32::NAN),
    )
    .codecs(CodecChain::new(
        Box::new(BytesCodec::big()),
        vec![Box::new(GzipCodec::new(5)?), Box::new(Crc32cCodec::new())],
    )?)
    .index_location(ShardIndexLocation::Start)
    .build(store.clone(), "/group/volume")?;
    array.store_metadata()?;

    // Boundary chunks extend beyond the array
    let all = ArraySubset::new_with_shape(vec![10, 7]);
    let elements: Vec<f32> = (0..70).map(|i| i as f32 * 0.5).collect();
    array.write_region_elements::<f32>(&all, &elements)?;
    array.commit()?;

    let reopened = ArrayStore::open(store.clone(), "/group/volume")?;
    assert_eq!(reopened.config(), array.config());
    assert_eq!(reopened.index_location(), ShardIndexLocation::Start);
    assert_eq!(reopened.read_region_elements::<f32>(&all)?, elements);

    // Chunk [2, 3] covers [8..12, 6..8], only the elements at [8, 6] and [9, 6] are within the array
    let chunk = reopened.retrieve_chunk_elements::<f32>(&[2, 3])?;
    assert_eq!(chunk[0], 62.0 * 0.5);
    assert!(chunk[1].is_nan());
    assert_eq!(chunk[2], 69.0 * 0.5);
    assert!(chunk[3].is_nan());
    assert!(chunk[4..].iter().all(|v| v.is_nan()));

    assert!(ArrayStore::open(store, "/group").is_err());
    Ok(())
}

#[cfg(feature = "ndarray")]
#[test]
fn array_store_ndarray() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = array_8x8(store, ShardIndexLocation::End);
    let block = ndarray::array![[1u16, 2, 3], [4, 5, 6]].into_dyn();
    array.write_region_ndarray::<u16>(&[3, 2], &block.view())?;
    assert!(array.write_region_ndarray::<u16>(&[3], &block.view()).is_err());
    array.commit()?;
    assert_eq!(
        array.read_region_ndarray::<u16>(&ArraySubset::new_with_ranges(&[3..5, 2..5]))?,
        block
    );

    // Non-standard layout
    let transposed = block.t();
    array.write_region_ndarray::<u16>(&[0, 0], &transposed)?;
    assert_eq!(
        array.read_region_ndarray::<u16>(&ArraySubset::new_with_ranges(&[0..3, 0..2]))?,
        ndarray::array![[1u16, 4], [2, 5], [3, 6]].into_dyn()
    );
    Ok(())
}
