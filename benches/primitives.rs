//! Throughput benchmarks for the scan and sort primitives.
//!
//! Benchmarks are skipped (registered as no-ops) when no GPU adapter is
//! present.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use primr::prelude::*;

fn gpu_client() -> Option<GpuClient> {
    match GpuClient::new(GpuDevice::new(0)) {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("No GPU available, skipping benchmarks: {}", e);
            None
        }
    }
}

fn bench_prefix_sum(c: &mut Criterion) {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(1);

    let n = 1 << 22;
    let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
    let data = client.upload("bench data", &input);

    let mut group = c.benchmark_group("prefix_sum");
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("inclusive_4M", |b| {
        b.iter(|| {
            ops::prefix_sum_inclusive(&client, &data, n, DType::U32).unwrap();
            client.synchronize();
        })
    });
    group.bench_function("inclusive_multi_pass_4M", |b| {
        b.iter(|| {
            ops::prefix_sum_inclusive_multi_pass(&client, &data, n, DType::U32).unwrap();
            client.synchronize();
        })
    });
    group.finish();
}

fn bench_radix_sort(c: &mut Criterion) {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(2);

    let n = 1 << 20;
    let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
    let keys = client.upload("bench keys", &input);
    let temp = client.create_storage_buffer("bench temp", (n as u64) * 4);

    let mut group = c.benchmark_group("radix_sort");
    group.throughput(Throughput::Elements(n as u64));
    group.sample_size(20);
    group.bench_function("sort_1M", |b| {
        b.iter(|| {
            // Re-sorting sorted data after the first iteration; pass count
            // and memory traffic are identical either way.
            ops::radix_sort(&client, &keys, &temp, n).unwrap();
            client.synchronize();
        })
    });
    group.finish();
}

criterion_group!(benches, bench_prefix_sum, bench_radix_sort);
criterion_main!(benches);
