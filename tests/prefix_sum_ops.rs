//! Integration tests for prefix sum operations
//!
//! Tests skip gracefully when no GPU adapter is present.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use primr::prelude::*;

fn gpu_client() -> Option<GpuClient> {
    match GpuClient::new(GpuDevice::new(0)) {
        Ok(client) => Some(client),
        Err(e) => {
            println!("No GPU available, skipping test: {}", e);
            None
        }
    }
}

fn cpu_inclusive(data: &[u32]) -> Vec<u32> {
    let mut acc = 0u32;
    data.iter()
        .map(|&x| {
            acc = acc.wrapping_add(x);
            acc
        })
        .collect()
}

fn cpu_exclusive(data: &[u32]) -> Vec<u32> {
    let mut acc = 0u32;
    data.iter()
        .map(|&x| {
            let prev = acc;
            acc = acc.wrapping_add(x);
            prev
        })
        .collect()
}

// ============================================================================
// Single-pass scan
// ============================================================================

#[test]
fn test_inclusive_known_vector() {
    let Some(client) = gpu_client() else { return };

    let data = client.upload("data", &[3u32, 1, 4, 1, 5, 9, 2, 6]);
    ops::prefix_sum_inclusive(&client, &data, 8, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, 8).unwrap();
    assert_eq!(result, vec![3, 4, 8, 9, 14, 23, 25, 31]);
}

#[test]
fn test_exclusive_known_vector() {
    let Some(client) = gpu_client() else { return };

    let data = client.upload("data", &[3u32, 1, 4, 1, 5, 9, 2, 6]);
    ops::prefix_sum_exclusive(&client, &data, 8, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, 8).unwrap();
    assert_eq!(result, vec![0, 3, 4, 8, 9, 14, 23, 25]);
}

#[test]
fn test_scan_of_zeros_stays_zero() {
    let Some(client) = gpu_client() else { return };

    let zeros = vec![0u32; 4096];

    let data = client.upload("data", &zeros);
    ops::prefix_sum_inclusive(&client, &data, zeros.len(), DType::U32).unwrap();
    let result: Vec<u32> = client.download(&data, zeros.len()).unwrap();
    assert_eq!(result, zeros);

    let data = client.upload("data", &zeros);
    ops::prefix_sum_exclusive(&client, &data, zeros.len(), DType::U32).unwrap();
    let result: Vec<u32> = client.download(&data, zeros.len()).unwrap();
    assert_eq!(result, zeros);
}

#[test]
fn test_boundary_sizes() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(7);

    for n in [0usize, 1, 2, 2047, 2048, 2049, 6000] {
        let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();

        let data = client.upload("data", &input);
        ops::prefix_sum_inclusive(&client, &data, n, DType::U32).unwrap();
        let result: Vec<u32> = client.download(&data, n).unwrap();
        assert_eq!(result, cpu_inclusive(&input), "inclusive, n = {}", n);

        let data = client.upload("data", &input);
        ops::prefix_sum_exclusive(&client, &data, n, DType::U32).unwrap();
        let result: Vec<u32> = client.download(&data, n).unwrap();
        assert_eq!(result, cpu_exclusive(&input), "exclusive, n = {}", n);
    }
}

#[test]
fn test_large_input() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(42);

    let n = (1 << 20) + 17;
    let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();

    let data = client.upload("data", &input);
    ops::prefix_sum_inclusive(&client, &data, n, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, n).unwrap();
    assert_eq!(result, cpu_inclusive(&input));
}

#[test]
fn test_scan_only_touches_prefix() {
    let Some(client) = gpu_client() else { return };

    // Elements beyond `count` must be left alone.
    let data = client.upload("data", &[1u32, 2, 3, 99, 98]);
    ops::prefix_sum_inclusive(&client, &data, 3, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, 5).unwrap();
    assert_eq!(result, vec![1, 3, 6, 99, 98]);
}

#[test]
fn test_i32_inclusive() {
    let Some(client) = gpu_client() else { return };

    let data = client.upload("data", &[5i32, -3, 2, -10, 4]);
    ops::prefix_sum_inclusive(&client, &data, 5, DType::I32).unwrap();

    let result: Vec<i32> = client.download(&data, 5).unwrap();
    assert_eq!(result, vec![5, 2, 4, -6, -2]);
}

#[test]
fn test_f32_exclusive() {
    let Some(client) = gpu_client() else { return };

    // Whole numbers: sums are exact in f32 regardless of addition order.
    let data = client.upload("data", &[1.0f32, 2.0, 3.0, 4.0, 5.0]);
    ops::prefix_sum_exclusive(&client, &data, 5, DType::F32).unwrap();

    let result: Vec<f32> = client.download(&data, 5).unwrap();
    assert_eq!(result, vec![0.0, 1.0, 3.0, 6.0, 10.0]);
}

// ============================================================================
// Indirect dispatch
// ============================================================================

#[test]
fn test_inclusive_indirect() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(3);

    let n = 5000usize;
    let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();

    let data = client.upload("data", &input);
    let count = client.create_uniform_buffer("count", 4);
    client.write_buffer(&count, &[n as u32]);

    ops::prefix_sum_inclusive_indirect(&client, &data, &count, n, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, n).unwrap();
    assert_eq!(result, cpu_inclusive(&input));
}

// ============================================================================
// Multi-pass fallback
// ============================================================================

#[test]
fn test_multi_pass_matches_single_pass_semantics() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(11);

    // 100: single segment, no aggregate pass; the rest exercise it.
    for n in [100usize, 2048, 3 * 2048 + 123, 1 << 16] {
        let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();

        let data = client.upload("data", &input);
        ops::prefix_sum_inclusive_multi_pass(&client, &data, n, DType::U32).unwrap();
        let result: Vec<u32> = client.download(&data, n).unwrap();
        assert_eq!(result, cpu_inclusive(&input), "inclusive, n = {}", n);

        let data = client.upload("data", &input);
        ops::prefix_sum_exclusive_multi_pass(&client, &data, n, DType::U32).unwrap();
        let result: Vec<u32> = client.download(&data, n).unwrap();
        assert_eq!(result, cpu_exclusive(&input), "exclusive, n = {}", n);
    }
}

#[test]
fn test_multi_pass_zeros() {
    let Some(client) = gpu_client() else { return };

    let zeros = vec![0u32; 3 * 2048];
    let data = client.upload("data", &zeros);
    ops::prefix_sum_inclusive_multi_pass(&client, &data, zeros.len(), DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data, zeros.len()).unwrap();
    assert_eq!(result, zeros);
}
