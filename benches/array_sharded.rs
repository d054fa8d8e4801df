use std::sync::Arc;

use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use shardstore::array::{
    codec::{BytesCodec, Crc32cCodec},
    ArrayStore, ArrayStoreBuilder, CodecChain, DataType, FillValue,
};
use shardstore::array_subset::ArraySubset;
use shardstore::storage::store::MemoryStore;

fn array(size: u64) -> ArrayStore<MemoryStore> {
    ArrayStoreBuilder::new(
        vec![size; 3],
        DataType::UInt16,
        vec![32; 3].try_into().unwrap(),
        vec![size.max(64) / 2; 3].try_into().unwrap(),
        FillValue::from(0u16),
    )
    .codecs(
        CodecChain::new(
            Box::new(BytesCodec::little()),
            vec![Box::new(Crc32cCodec::new())],
        )
        .unwrap(),
    )
    .build(Arc::new(MemoryStore::new()), "/")
    .unwrap()
}

fn array_sharded_write_all(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("array_sharded_write_all");
    group.plot_config(plot_config);

    for size in [64u64, 128, 256] {
        let num_elements = size * size * size;
        let data = vec![1u8; usize::try_from(num_elements * 2).unwrap()];
        let subset = ArraySubset::new_with_shape(vec![size; 3]);
        group.throughput(Throughput::Bytes(num_elements * 2));
        group.bench_function(BenchmarkId::new("write_commit", num_elements), |b| {
            b.iter(|| {
                let array = array(size);
                array.write_region(&subset, &data).unwrap();
                array.commit().unwrap();
            });
        });
    }
    group.finish();
}

fn array_sharded_read_all(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("array_sharded_read_all");
    group.plot_config(plot_config);

    for size in [64u64, 128, 256] {
        let num_elements = size * size * size;
        let data = vec![1u8; usize::try_from(num_elements * 2).unwrap()];
        let subset = ArraySubset::new_with_shape(vec![size; 3]);
        let array = array(size);
        array.write_region(&subset, &data).unwrap();
        array.commit().unwrap();

        group.throughput(Throughput::Bytes(num_elements * 2));
        group.bench_function(BenchmarkId::new("read", num_elements), |b| {
            b.iter(|| array.read_region(&subset).unwrap());
        });
    }
    group.finish();
}

fn array_sharded_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_sharded_geometry");
    let size = 128u64;
    let num_elements = size * size * size;
    let data = vec![1u8; usize::try_from(num_elements * 2).unwrap()];
    let subset = ArraySubset::new_with_shape(vec![size; 3]);
    group.throughput(Throughput::Bytes(num_elements * 2));

    for chunk in [16u64, 32, 64] {
        for shard in [chunk, chunk * 2, chunk * 4] {
            if shard > size {
                continue;
            }
            let build = || {
                ArrayStoreBuilder::new(
                    vec![size; 3],
                    DataType::UInt16,
                    vec![chunk; 3].try_into().unwrap(),
                    vec![shard; 3].try_into().unwrap(),
                    FillValue::from(0u16),
                )
                .build(Arc::new(MemoryStore::new()), "/")
                .unwrap()
            };
            let id = format!("chunk{chunk}_shard{shard}");
            group.bench_function(BenchmarkId::new("write_commit", &id), |b| {
                b.iter(|| {
                    let array = build();
                    array.write_region(&subset, &data).unwrap();
                    array.commit().unwrap();
                });
            });

            let array = build();
            array.write_region(&subset, &data).unwrap();
            array.commit().unwrap();
            group.bench_function(BenchmarkId::new("read", &id), |b| {
                b.iter(|| array.read_region(&subset).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    array_sharded_write_all,
    array_sharded_read_all,
    array_sharded_geometry
);
criterion_main!(benches);
