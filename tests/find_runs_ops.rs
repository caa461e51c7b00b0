//! Integration tests for run finding
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

fn find_runs_on_gpu(client: &GpuClient, input: &[u32]) -> (u32, Vec<u32>) {
    let n = input.len();
    let data = client.upload("data", input);
    let temp = client.create_storage_buffer("temp", (n * 4) as u64);
    let run_starts = client.create_storage_buffer("run_starts", (n.max(1) * 4) as u64);
    let run_count = client.create_storage_buffer("run_count", 4);

    ops::find_runs(client, &data, &temp, &run_starts, &run_count, n, DType::U32).unwrap();

    let count: Vec<u32> = client.download(&run_count, 1).unwrap();
    let starts: Vec<u32> = client.download(&run_starts, count[0] as usize).unwrap();
    (count[0], starts)
}

fn cpu_run_starts(input: &[u32]) -> Vec<u32> {
    let mut starts = Vec::new();
    for i in 0..input.len() {
        if i == 0 || input[i] != input[i - 1] {
            starts.push(i as u32);
        }
    }
    starts
}

#[test]
fn test_known_vector() {
    let Some(client) = gpu_client() else { return };

    let (count, starts) = find_runs_on_gpu(&client, &[1, 1, 1, 2, 2, 3, 3, 3, 3]);
    assert_eq!(count, 3);
    assert_eq!(starts, vec![0, 3, 5]);
}

#[test]
fn test_single_element() {
    let Some(client) = gpu_client() else { return };

    let (count, starts) = find_runs_on_gpu(&client, &[42]);
    assert_eq!(count, 1);
    assert_eq!(starts, vec![0]);
}

#[test]
fn test_all_equal() {
    let Some(client) = gpu_client() else { return };

    let (count, starts) = find_runs_on_gpu(&client, &[7; 5000]);
    assert_eq!(count, 1);
    assert_eq!(starts, vec![0]);
}

#[test]
fn test_all_distinct() {
    let Some(client) = gpu_client() else { return };

    let input: Vec<u32> = (0..3000).collect();
    let (count, starts) = find_runs_on_gpu(&client, &input);
    assert_eq!(count, 3000);
    assert_eq!(starts, input);
}

#[test]
fn test_empty_input() {
    let Some(client) = gpu_client() else { return };

    let (count, starts) = find_runs_on_gpu(&client, &[]);
    assert_eq!(count, 0);
    assert!(starts.is_empty());
}

#[test]
fn test_runs_crossing_segment_boundaries() {
    let Some(client) = gpu_client() else { return };

    // Runs of 7 do not align with the 2048-element scan segments.
    let input: Vec<u32> = (0..10_000).map(|i| (i / 7) as u32).collect();
    let (count, starts) = find_runs_on_gpu(&client, &input);

    let expected = cpu_run_starts(&input);
    assert_eq!(count as usize, expected.len());
    assert_eq!(starts, expected);
}

#[test]
fn test_random_sorted_input() {
    let Some(client) = gpu_client() else { return };
    let mut rng = StdRng::seed_from_u64(21);

    let mut input: Vec<u32> = (0..50_000).map(|_| rng.gen_range(0u32..2000)).collect();
    input.sort_unstable();

    let (count, starts) = find_runs_on_gpu(&client, &input);
    let expected = cpu_run_starts(&input);

    assert_eq!(count as usize, expected.len());
    assert_eq!(starts, expected);

    // The values at the run starts are the distinct values in order.
    let distinct: Vec<u32> = starts.iter().map(|&s| input[s as usize]).collect();
    let mut expected_distinct = input.clone();
    expected_distinct.dedup();
    assert_eq!(distinct, expected_distinct);
}

#[test]
fn test_i32_input() {
    let Some(client) = gpu_client() else { return };

    let input = [-5i32, -5, -1, 0, 0, 0, 3];
    let data = client.upload("data", &input);
    let temp = client.create_storage_buffer("temp", (input.len() * 4) as u64);
    let run_starts = client.create_storage_buffer("run_starts", (input.len() * 4) as u64);
    let run_count = client.create_storage_buffer("run_count", 4);

    ops::find_runs(
        &client,
        &data,
        &temp,
        &run_starts,
        &run_count,
        input.len(),
        DType::I32,
    )
    .unwrap();

    let count: Vec<u32> = client.download(&run_count, 1).unwrap();
    let starts: Vec<u32> = client.download(&run_starts, count[0] as usize).unwrap();
    assert_eq!(count[0], 4);
    assert_eq!(starts, vec![0, 2, 3, 6]);
}

#[test]
fn test_f32_input() {
    let Some(client) = gpu_client() else { return };

    let input = [0.5f32, 0.5, 1.25, 2.0, 2.0];
    let data = client.upload("data", &input);
    let temp = client.create_storage_buffer("temp", (input.len() * 4) as u64);
    let run_starts = client.create_storage_buffer("run_starts", (input.len() * 4) as u64);
    let run_count = client.create_storage_buffer("run_count", 4);

    ops::find_runs(
        &client,
        &data,
        &temp,
        &run_starts,
        &run_count,
        input.len(),
        DType::F32,
    )
    .unwrap();

    let count: Vec<u32> = client.download(&run_count, 1).unwrap();
    let starts: Vec<u32> = client.download(&run_starts, count[0] as usize).unwrap();
    assert_eq!(count[0], 3);
    assert_eq!(starts, vec![0, 2, 3]);
}
