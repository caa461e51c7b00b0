//! Integration tests for gather and scatter-by
//!
//! Tests skip gracefully when no GPU adapter is present.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
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

#[test]
fn test_gather_basic() {
    let Some(client) = gpu_client() else { return };

    let data_in = client.upload("in", &[10u32, 20, 30, 40]);
    let indices = client.upload("idx", &[3u32, 0, 2]);
    let data_out = client.create_storage_buffer("out", 12);

    ops::gather(&client, &data_out, &data_in, &indices, 3, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data_out, 3).unwrap();
    assert_eq!(result, vec![40, 10, 30]);
}

#[test]
fn test_scatter_by_basic() {
    let Some(client) = gpu_client() else { return };

    let data_in = client.upload("in", &[1u32, 2, 3]);
    let indices = client.upload("idx", &[2u32, 0, 1]);
    let data_out = client.create_storage_buffer("out", 12);

    ops::scatter_by(&client, &data_out, &data_in, &indices, 3, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data_out, 3).unwrap();
    assert_eq!(result, vec![2, 3, 1]);
}

#[test]
fn test_scatter_then_gather_roundtrip() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(31);

    let n = 2000usize;
    let input: Vec<f32> = (0..n).map(|_| rng.gen::<f32>()).collect();
    let mut permutation: Vec<u32> = (0..n as u32).collect();
    permutation.shuffle(&mut rng);

    let data_in = client.upload("in", &input);
    let indices = client.upload("idx", &permutation);
    let scattered = client.create_storage_buffer("scattered", (n * 4) as u64);
    let recovered = client.create_storage_buffer("recovered", (n * 4) as u64);

    // scatter then gather through the same permutation is the identity
    ops::scatter_by(&client, &scattered, &data_in, &indices, n, DType::F32).unwrap();
    ops::gather(&client, &recovered, &scattered, &indices, n, DType::F32).unwrap();

    let result: Vec<f32> = client.download(&recovered, n).unwrap();
    assert_eq!(result, input);
}

#[test]
fn test_sort_by_then_gather_sorts_values() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(32);

    // Argsort composition: sort (key, index) pairs, then gather the
    // original keys through the sorted indices.
    let n = 5000usize;
    let input_keys: Vec<u32> = (0..n).map(|_| rng.gen()).collect();
    let index_values: Vec<u32> = (0..n as u32).collect();

    let keys = client.upload("keys", &input_keys);
    let values = client.upload("values", &index_values);
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

    let original = client.upload("original", &input_keys);
    let gathered = client.create_storage_buffer("gathered", (n * 4) as u64);
    ops::gather(&client, &gathered, &original, &values, n, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&gathered, n).unwrap();
    let mut expected = input_keys;
    expected.sort_unstable();
    assert_eq!(result, expected);
}

#[test]
fn test_empty_count_is_a_noop() {
    let Some(client) = gpu_client() else { return };

    let data_in = client.upload("in", &[1u32, 2, 3]);
    let indices = client.upload("idx", &[0u32, 1, 2]);
    let data_out = client.upload("out", &[9u32, 9, 9]);

    ops::gather(&client, &data_out, &data_in, &indices, 0, DType::U32).unwrap();

    let result: Vec<u32> = client.download(&data_out, 3).unwrap();
    assert_eq!(result, vec![9, 9, 9]);
}
