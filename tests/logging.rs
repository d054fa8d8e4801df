use std::sync::Arc;

use shardstore::array::shard::ShardReader;
use shardstore::array::shard_index::ShardIndexLocation;
use shardstore::array::{ArrayStore, ArrayStoreBuilder, DataType, FillValue};
use shardstore::array_subset::ArraySubset;
use shardstore::storage::storage_adapter::UsageLogStorageAdapter;
use shardstore::storage::store::MemoryStore;
use shardstore::storage::StoreKey;

#[test]
fn usage_log_and_commit() -> Result<(), Box<dyn std::error::Error>> {
    testing_logger::setup();
    let store = Arc::new(UsageLogStorageAdapter::new(Arc::new(MemoryStore::new())));
    let array = ArrayStoreBuilder::new(
        vec![4],
        DataType::UInt8,
        vec![2].try_into()?,
        vec![4].try_into()?,
        FillValue::from(0u8),
    )
    .build(store.clone(), "/volume")?;
    array.store_metadata()?;
    let _ = ArrayStore::open(store.clone(), "/volume")?;
    array.write_region_elements::<u8>(&ArraySubset::new_with_ranges(&[0..4]), &[1, 2, 3, 4])?;
    array.commit()?;

    let reader = ShardReader::open(
        &*store,
        &StoreKey::new("volume/c/0")?,
        2,
        ShardIndexLocation::End,
    )?;
    assert_eq!(reader.index().map(|index| index.num_chunks()), Some(2));

    testing_logger::validate(|captured_logs| {
        let usage: Vec<&str> = captured_logs
            .iter()
            .filter(|log| log.target == "shardstore::usage")
            .map(|log| log.body.as_str())
            .collect();
        assert!(usage[0].starts_with("set(volume/array.json, len="));
        assert!(usage[0].ends_with("-> Ok(())"));
        assert!(usage[1].starts_with("get(volume/array.json) -> len=Ok("));
        // An index at the end is checked against the shard size
        let n = usage.len();
        assert_eq!(
            usage[n - 2],
            "get_partial_values_key(volume/c/0, [-36..]) -> len=Ok([36])"
        );
        assert!(usage[n - 1].starts_with("size_key(volume/c/0) -> Ok(Some("));

        assert!(captured_logs.iter().any(|log| {
            log.level == log::Level::Debug && log.body == "committing 1 shards of volume/"
        }));
        assert!(captured_logs.iter().any(|log| {
            log.level == log::Level::Trace
                && log.body == "retrieving shard index of volume/c/0 (36 bytes at the end)"
        }));
    });
    Ok(())
}
