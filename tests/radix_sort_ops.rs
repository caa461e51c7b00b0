//! Integration tests for radix sort operations
//!
//! Tests skip gracefully when no GPU adapter is present.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use primr::error::Error;
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

fn sort_on_gpu(client: &GpuClient, input: &[u32]) -> Vec<u32> {
    let keys = client.upload("keys", input);
    let temp = client.create_storage_buffer("temp", (input.len() * 4) as u64);
    ops::radix_sort(client, &keys, &temp, input.len()).unwrap();
    client.download(&keys, input.len()).unwrap()
}

// ============================================================================
// Keys only
// ============================================================================

#[test]
fn test_sort_known_vector() {
    let Some(client) = gpu_client() else { return };

    let result = sort_on_gpu(&client, &[0xFFFFFFFF, 0, 0x00010000, 0x00000001, 0x00010000]);
    assert_eq!(result, vec![0, 1, 0x00010000, 0x00010000, 0xFFFFFFFF]);
}

#[test]
fn test_sort_random() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(1);

    let input: Vec<u32> = (0..10_000).map(|_| rng.gen()).collect();
    let result = sort_on_gpu(&client, &input);

    let mut expected = input;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

#[test]
fn test_sort_boundary_sizes() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(2);

    for n in [0usize, 1, 2, 1023, 1024, 1025, 4096] {
        let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
        let result = sort_on_gpu(&client, &input);

        let mut expected = input;
        expected.sort_unstable();
        assert_eq!(result, expected, "n = {}", n);
    }
}

#[test]
fn test_sort_large_random() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(1234);

    let input: Vec<u32> = (0..1 << 20).map(|_| rng.gen()).collect();
    let result = sort_on_gpu(&client, &input);

    let mut expected = input;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

#[test]
fn test_sort_few_distinct_keys() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(5);

    // Buckets much larger than a segment stress the per-digit lookback.
    let input: Vec<u32> = (0..20_000).map(|_| rng.gen_range(0u32..8)).collect();
    let result = sort_on_gpu(&client, &input);

    let mut expected = input;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

#[test]
fn test_sort_idempotent() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(6);

    let input: Vec<u32> = (0..5000).map(|_| rng.gen()).collect();

    let keys = client.upload("keys", &input);
    let temp = client.create_storage_buffer("temp", (input.len() * 4) as u64);
    ops::radix_sort(&client, &keys, &temp, input.len()).unwrap();
    let once: Vec<u32> = client.download(&keys, input.len()).unwrap();

    ops::radix_sort(&client, &keys, &temp, input.len()).unwrap();
    let twice: Vec<u32> = client.download(&keys, input.len()).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_sort_rejects_oversized_input() {
    let Some(client) = gpu_client() else { return };

    let keys = client.create_storage_buffer("keys", 16);
    let temp = client.create_storage_buffer("temp", 16);
    let result = ops::radix_sort(&client, &keys, &temp, 1 << 30);

    assert!(matches!(result, Err(Error::InputTooLarge { .. })));
}

#[test]
fn test_sort_indirect() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(8);

    let n = 3000usize;
    let input: Vec<u32> = (0..n).map(|_| rng.gen()).collect();

    let keys = client.upload("keys", &input);
    let temp = client.create_storage_buffer("temp", (n * 4) as u64);
    let count = client.create_uniform_buffer("count", 4);
    client.write_buffer(&count, &[n as u32]);

    ops::radix_sort_indirect(&client, &keys, &temp, &count, n).unwrap();

    let result: Vec<u32> = client.download(&keys, n).unwrap();
    let mut expected = input;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

#[test]
fn test_sort_half_precision() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(9);

    let n = 5000usize;
    let input: Vec<u32> = (0..n).map(|_| rng.gen_range(0u32..0x10000)).collect();

    let keys = client.upload("keys", &input);
    let temp = client.create_storage_buffer("temp", (n * 4) as u64);
    ops::radix_sort_half_precision(&client, &keys, &temp, n).unwrap();

    let result: Vec<u32> = client.download(&keys, n).unwrap();
    let mut expected = input;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

// ============================================================================
// Keys with payload
// ============================================================================

#[test]
fn test_sort_by_known_vector() {
    let Some(client) = gpu_client() else { return };

    let keys = client.upload("keys", &[3u32, 1, 2]);
    let values = client.upload("values", &[30u32, 10, 20]);
    let temp_keys = client.create_storage_buffer("temp_keys", 12);
    let temp_values = client.create_storage_buffer("temp_values", 12);

    ops::radix_sort_by(
        &client,
        &keys,
        &values,
        &temp_keys,
        &temp_values,
        3,
        DType::U32,
    )
    .unwrap();

    let sorted_keys: Vec<u32> = client.download(&keys, 3).unwrap();
    let sorted_values: Vec<u32> = client.download(&values, 3).unwrap();
    assert_eq!(sorted_keys, vec![1, 2, 3]);
    assert_eq!(sorted_values, vec![10, 20, 30]);
}

#[test]
fn test_sort_by_is_a_consistent_permutation() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(10);

    let n = 10_000usize;
    let input_keys: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
    // Payload = source index, so the permutation can be checked directly.
    let input_values: Vec<u32> = (0..n as u32).collect();

    let keys = client.upload("keys", &input_keys);
    let values = client.upload("values", &input_values);
    let temp_keys = client.create_storage_buffer("temp_keys", (n * 4) as u64);
    let temp_values = client.create_storage_buffer("temp_values", (n * 4) as u64);

    ops::radix_sort_by(
        &client,
        &keys,
        &values,
        &temp_keys,
        &temp_values,
        n,
        DType::U32,
    )
    .unwrap();

    let sorted_keys: Vec<u32> = client.download(&keys, n).unwrap();
    let sorted_values: Vec<u32> = client.download(&values, n).unwrap();

    let mut expected_keys = input_keys.clone();
    expected_keys.sort_unstable();
    assert_eq!(sorted_keys, expected_keys);

    // Every key rode along with its original payload.
    for i in 0..n {
        assert_eq!(input_keys[sorted_values[i] as usize], sorted_keys[i]);
    }

    // And the payload is a permutation of 0..n.
    let mut seen = sorted_values;
    seen.sort_unstable();
    assert_eq!(seen, input_values);
}

#[test]
fn test_sort_by_f32_payload() {
    let Some(client) = gpu_client() else { return };

    let keys = client.upload("keys", &[9u32, 4, 7, 4]);
    let values = client.upload("values", &[9.5f32, 4.5, 7.5, 4.25]);
    let temp_keys = client.create_storage_buffer("temp_keys", 16);
    let temp_values = client.create_storage_buffer("temp_values", 16);

    ops::radix_sort_by(
        &client,
        &keys,
        &values,
        &temp_keys,
        &temp_values,
        4,
        DType::F32,
    )
    .unwrap();

    let sorted_keys: Vec<u32> = client.download(&keys, 4).unwrap();
    let sorted_values: Vec<f32> = client.download(&values, 4).unwrap();
    assert_eq!(sorted_keys, vec![4, 4, 7, 9]);

    // Order among the duplicate keys is unspecified; their payloads travel
    // with them either way.
    let mut dup: Vec<f32> = sorted_values[0..2].to_vec();
    dup.sort_by(f32::total_cmp);
    assert_eq!(dup, vec![4.25, 4.5]);
    assert_eq!(sorted_values[2], 7.5);
    assert_eq!(sorted_values[3], 9.5);
}
