//! Prefix sum operations.
//!
//! The default implementations run the single-pass decoupled-lookback scan
//! and finish in one dispatch. They assume the weak occupancy-bound
//! forward-progress model (see the crate docs); the `_multi_pass` variants
//! trade a dispatch per phase for independence from that assumption.
//!
//! Addition is the element type's native addition; for `u32` that is
//! 32-bit wraparound with no overflow detection.

use wgpu::Buffer;

use super::helpers::{check_capacity, create_count_buffer, create_params_buffer, element_capacity};
use crate::client::GpuClient;
use crate::dtype::DType;
use crate::error::Result;
use crate::shaders::dispatch::launch_generate_dispatch;
use crate::shaders::pipeline::{Grid, workgroup_count};
use crate::shaders::scan::{
    launch_scan, launch_scan_add_bases, launch_scan_segments, launch_scan_sums,
};
use crate::shaders::scan_wgsl::{SCAN_SEGMENT_SIZE, ScanKind};

/// Rewrite `data[0..count]` with its inclusive prefix sum.
pub fn prefix_sum_inclusive(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    scan_single_pass(client, data, count, dtype, ScanKind::Inclusive)
}

/// Rewrite `data[0..count]` with its exclusive prefix sum.
pub fn prefix_sum_exclusive(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    scan_single_pass(client, data, count, dtype, ScanKind::Exclusive)
}

/// Inclusive prefix sum with the element count read from a GPU buffer.
///
/// `count` must carry `UNIFORM` usage (see
/// [`GpuClient::create_uniform_buffer`]) and hold a `u32` no larger than
/// `max_count`. Scratch and the indirect dispatch are sized for
/// `max_count`, so no host readback of the real count is needed.
pub fn prefix_sum_inclusive_indirect(
    client: &GpuClient,
    data: &Buffer,
    count: &Buffer,
    max_count: usize,
    dtype: DType,
) -> Result<()> {
    scan_indirect(client, data, count, max_count, dtype, ScanKind::Inclusive)
}

/// Exclusive prefix sum with the element count read from a GPU buffer.
pub fn prefix_sum_exclusive_indirect(
    client: &GpuClient,
    data: &Buffer,
    count: &Buffer,
    max_count: usize,
    dtype: DType,
) -> Result<()> {
    scan_indirect(client, data, count, max_count, dtype, ScanKind::Exclusive)
}

/// Inclusive prefix sum via the classical multi-pass scan.
///
/// Correct without any forward-progress assumption: segment scan, scan of
/// segment aggregates, uniform add.
pub fn prefix_sum_inclusive_multi_pass(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    scan_multi_pass(client, data, count, dtype, ScanKind::Inclusive)
}

/// Exclusive prefix sum via the classical multi-pass scan.
pub fn prefix_sum_exclusive_multi_pass(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    scan_multi_pass(client, data, count, dtype, ScanKind::Exclusive)
}

// ============================================================================
// Implementation
// ============================================================================

fn scan_single_pass(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
    kind: ScanKind,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    check_capacity(data, "data", count)?;

    let workgroups = workgroup_count(count, SCAN_SEGMENT_SIZE);
    let group_state =
        client.create_storage_buffer("prefix_sum group state", workgroups as u64 * 8);
    let group_counter = client.create_storage_buffer("prefix_sum group counter", 4);
    let count_buffer = create_count_buffer(client, count);

    launch_scan(
        client.pipeline_cache(),
        client.wgpu_queue(),
        data,
        &group_state,
        &group_counter,
        &count_buffer,
        Grid::Direct(workgroups),
        dtype,
        kind,
    )
}

fn scan_indirect(
    client: &GpuClient,
    data: &Buffer,
    count: &Buffer,
    max_count: usize,
    dtype: DType,
    kind: ScanKind,
) -> Result<()> {
    if max_count == 0 {
        return Ok(());
    }
    check_capacity(data, "data", max_count)?;

    // The dispatch generator takes the larger of the count uniform and the
    // data buffer length, so scratch covers both bounds.
    let dispatch_bound = max_count.max(element_capacity(data));
    let workgroups = workgroup_count(dispatch_bound, SCAN_SEGMENT_SIZE);

    let group_state =
        client.create_storage_buffer("prefix_sum group state", workgroups as u64 * 8);
    let group_counter = client.create_storage_buffer("prefix_sum group counter", 4);
    let dispatch = client.create_indirect_buffer("prefix_sum dispatch");
    let segment_size = create_params_buffer(client, "segment_size", &SCAN_SEGMENT_SIZE);

    launch_generate_dispatch(
        client.pipeline_cache(),
        client.wgpu_queue(),
        data,
        &dispatch,
        &segment_size,
        count,
    )?;

    launch_scan(
        client.pipeline_cache(),
        client.wgpu_queue(),
        data,
        &group_state,
        &group_counter,
        count,
        Grid::Indirect(&dispatch),
        dtype,
        kind,
    )
}

fn scan_multi_pass(
    client: &GpuClient,
    data: &Buffer,
    count: usize,
    dtype: DType,
    kind: ScanKind,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    check_capacity(data, "data", count)?;

    let workgroups = workgroup_count(count, SCAN_SEGMENT_SIZE);
    let segment_sums =
        client.create_storage_buffer("prefix_sum segment sums", workgroups as u64 * 4);
    let count_buffer = create_count_buffer(client, count);

    launch_scan_segments(
        client.pipeline_cache(),
        client.wgpu_queue(),
        data,
        &segment_sums,
        &count_buffer,
        workgroups,
        dtype,
        kind,
    )?;

    // One segment means the local scan already is the full result.
    if workgroups > 1 {
        let sums_count_buffer = create_count_buffer(client, workgroups as usize);

        launch_scan_sums(
            client.pipeline_cache(),
            client.wgpu_queue(),
            &segment_sums,
            &sums_count_buffer,
            dtype,
        )?;

        launch_scan_add_bases(
            client.pipeline_cache(),
            client.wgpu_queue(),
            data,
            &segment_sums,
            &count_buffer,
            workgroups,
            dtype,
        )?;
    }

    Ok(())
}
