//! Run finding over sorted sequences.

use wgpu::Buffer;

use super::helpers::{check_capacity, create_count_buffer};
use super::prefix_sum::prefix_sum_inclusive;
use crate::client::GpuClient;
use crate::dtype::DType;
use crate::error::Result;
use crate::shaders::find_runs::{
    launch_collect_run_starts, launch_mark_run_starts, launch_resolve_run_count,
};

/// Find the runs of a sorted array.
///
/// Writes the number of distinct values into `run_count` (one `u32`) and
/// the starting index of each run into `run_starts[0..run_count]`. The
/// caller sizes `run_starts` for the number of runs it expects (at most
/// `count`). `temporary_storage` must hold `count` elements; its final
/// contents are the run index of every position.
///
/// `data` must be sorted (or at least have equal values adjacent);
/// otherwise the result counts value boundaries rather than distinct
/// values.
pub fn find_runs(
    client: &GpuClient,
    data: &Buffer,
    temporary_storage: &Buffer,
    run_starts: &Buffer,
    run_count: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    if count == 0 {
        client.write_buffer(run_count, &[0u32]);
        return Ok(());
    }
    check_capacity(data, "data", count)?;
    check_capacity(temporary_storage, "temporary_storage", count)?;
    check_capacity(run_count, "run_count", 1)?;

    let count_buffer = create_count_buffer(client, count);

    launch_mark_run_starts(
        client.pipeline_cache(),
        client.wgpu_queue(),
        data,
        temporary_storage,
        &count_buffer,
        count,
        dtype,
    )?;

    // After the scan, temporary_storage[i] is the run index of position i.
    prefix_sum_inclusive(client, temporary_storage, count, DType::U32)?;

    launch_collect_run_starts(
        client.pipeline_cache(),
        client.wgpu_queue(),
        temporary_storage,
        run_starts,
        &count_buffer,
        count,
    )?;

    launch_resolve_run_count(
        client.pipeline_cache(),
        client.wgpu_queue(),
        temporary_storage,
        run_count,
        &count_buffer,
    )?;

    Ok(())
}
