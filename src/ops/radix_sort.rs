//! Radix sort operations.
//!
//! Least-significant-digit radix sort over `u32` keys: one histogram pass
//! counts all four 8-bit digit groups, an in-place exclusive scan turns the
//! histograms into base offsets, then four scatter passes ping-pong the
//! keys between `keys` and `temporary_storage`. The scatter resolves
//! inter-segment offsets with a per-digit decoupled lookback, so the whole
//! sort is enqueued with no host synchronization between passes.
//!
//! Ordering among equal keys in the `_by` variants is unspecified.
//!
//! Segment state payloads are 30 bits wide, so inputs of `2^30` elements
//! or more are rejected at the host boundary.

use wgpu::Buffer;

use super::helpers::{check_capacity, create_count_buffer, create_params_buffer, element_capacity};
use crate::client::GpuClient;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::shaders::dispatch::launch_generate_dispatches;
use crate::shaders::pipeline::{Grid, workgroup_count};
use crate::shaders::radix::{
    launch_bucket_histogram, launch_bucket_scatter, launch_bucket_scatter_by,
    launch_global_bucket_offsets,
};
use crate::shaders::radix_wgsl::{
    HISTOGRAM_SEGMENT_SIZE, RADIX_BITS, RADIX_DIGITS, RADIX_GROUPS, SCATTER_SEGMENT_SIZE,
};

/// Maximum supported input length (exclusive), set by the 30-bit segment
/// state payload.
pub const MAX_SORT_LEN: usize = 1 << 30;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ScatterParams {
    radix_offset: u32,
    radix_group: u32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SegmentSizes {
    histogram: u32,
    scatter: u32,
}

/// How an invocation learns its element count.
enum CountArg<'a> {
    /// Host-known count; dispatches are sized on the host.
    Direct(usize),
    /// GPU-resident count (uniform-usage buffer holding one `u32`);
    /// dispatches are generated on-device. `max_count` bounds scratch.
    Gpu {
        count: &'a Buffer,
        max_count: usize,
    },
}

impl CountArg<'_> {
    fn scratch_bound(&self, keys: &Buffer) -> usize {
        match self {
            CountArg::Direct(count) => *count,
            // The dispatch generator takes the larger of the count uniform
            // and the key buffer length.
            CountArg::Gpu { max_count, .. } => (*max_count).max(element_capacity(keys)),
        }
    }
}

/// Host-sized or device-generated dispatch arguments for the sort passes.
enum Dispatches {
    Direct { histogram: u32, scatter: u32 },
    Indirect { histogram: Buffer, scatter: Buffer },
}

/// Sort `keys[0..count]` ascending.
///
/// `temporary_storage` must hold at least `count` elements; its final
/// contents are unspecified. The sorted keys end up back in `keys`.
pub fn radix_sort(
    client: &GpuClient,
    keys: &Buffer,
    temporary_storage: &Buffer,
    count: usize,
) -> Result<()> {
    sort_keys(
        client,
        keys,
        temporary_storage,
        CountArg::Direct(count),
        RADIX_GROUPS,
    )
}

/// Sort keys known to occupy only the low 16 bits.
///
/// Runs the two low digit groups only, halving the pass count. Keys with
/// bits set above bit 15 end up in unspecified order.
pub fn radix_sort_half_precision(
    client: &GpuClient,
    keys: &Buffer,
    temporary_storage: &Buffer,
    count: usize,
) -> Result<()> {
    sort_keys(
        client,
        keys,
        temporary_storage,
        CountArg::Direct(count),
        RADIX_GROUPS / 2,
    )
}

/// Sort with the element count read from a GPU buffer.
///
/// `count` must carry `UNIFORM` usage and hold a `u32` no larger than
/// `max_count`; scratch is sized for `max_count`. The dispatch generator
/// kernel sizes the histogram and scatter grids on-device.
pub fn radix_sort_indirect(
    client: &GpuClient,
    keys: &Buffer,
    temporary_storage: &Buffer,
    count: &Buffer,
    max_count: usize,
) -> Result<()> {
    sort_keys(
        client,
        keys,
        temporary_storage,
        CountArg::Gpu { count, max_count },
        RADIX_GROUPS,
    )
}

/// Sort `keys[0..count]` ascending, permuting `values` alongside.
///
/// Values are opaque 32-bit elements of the given `value_dtype`. Both
/// temporary buffers must hold at least `count` elements.
#[allow(clippy::too_many_arguments)]
pub fn radix_sort_by(
    client: &GpuClient,
    keys: &Buffer,
    values: &Buffer,
    temporary_key_storage: &Buffer,
    temporary_value_storage: &Buffer,
    count: usize,
    value_dtype: DType,
) -> Result<()> {
    if count >= MAX_SORT_LEN {
        return Err(Error::InputTooLarge {
            len: count,
            max: MAX_SORT_LEN - 1,
            op: "radix_sort_by",
        });
    }
    if count == 0 {
        return Ok(());
    }
    check_capacity(keys, "keys", count)?;
    check_capacity(values, "values", count)?;
    check_capacity(temporary_key_storage, "temporary_key_storage", count)?;
    check_capacity(temporary_value_storage, "temporary_value_storage", count)?;

    let scratch = SortScratch::new(client, count);
    let count_buffer = create_count_buffer(client, count);
    let histogram_grid = workgroup_count(count, HISTOGRAM_SEGMENT_SIZE);
    let scatter_grid = workgroup_count(count, SCATTER_SEGMENT_SIZE);

    launch_bucket_histogram(
        client.pipeline_cache(),
        client.wgpu_queue(),
        keys,
        &scratch.global_histograms,
        &count_buffer,
        Grid::Direct(histogram_grid),
    )?;
    launch_global_bucket_offsets(
        client.pipeline_cache(),
        client.wgpu_queue(),
        &scratch.global_histograms,
    )?;

    for group in 0..RADIX_GROUPS {
        let params = create_params_buffer(
            client,
            "scatter params",
            &ScatterParams {
                radix_offset: RADIX_BITS * group as u32,
                radix_group: group as u32,
            },
        );

        let (keys_in, keys_out, values_in, values_out) = if group & 1 == 0 {
            (keys, temporary_key_storage, values, temporary_value_storage)
        } else {
            (temporary_key_storage, keys, temporary_value_storage, values)
        };

        launch_bucket_scatter_by(
            client.pipeline_cache(),
            client.wgpu_queue(),
            keys_in,
            keys_out,
            values_in,
            values_out,
            &scratch.global_histograms,
            &scratch.group_state,
            &scratch.group_counter,
            &params,
            &count_buffer,
            Grid::Direct(scatter_grid),
            value_dtype,
        )?;
    }

    Ok(())
}

// ============================================================================
// Implementation
// ============================================================================

struct SortScratch {
    global_histograms: Buffer,
    group_state: Buffer,
    group_counter: Buffer,
}

impl SortScratch {
    fn new(client: &GpuClient, scratch_bound: usize) -> Self {
        let segments = workgroup_count(scratch_bound, SCATTER_SEGMENT_SIZE);
        Self {
            global_histograms: client.create_storage_buffer(
                "radix_sort global histograms",
                (RADIX_GROUPS * RADIX_DIGITS * 4) as u64,
            ),
            group_state: client.create_storage_buffer(
                "radix_sort segment state",
                segments as u64 * RADIX_DIGITS as u64 * 4,
            ),
            group_counter: client.create_storage_buffer("radix_sort group counter", 4),
        }
    }
}

fn sort_keys(
    client: &GpuClient,
    keys: &Buffer,
    temporary_storage: &Buffer,
    count: CountArg<'_>,
    radix_groups: usize,
) -> Result<()> {
    let max_count = match &count {
        CountArg::Direct(n) => *n,
        CountArg::Gpu { max_count, .. } => *max_count,
    };

    if max_count >= MAX_SORT_LEN {
        return Err(Error::InputTooLarge {
            len: max_count,
            max: MAX_SORT_LEN - 1,
            op: "radix_sort",
        });
    }
    if max_count == 0 {
        return Ok(());
    }
    check_capacity(keys, "keys", max_count)?;
    check_capacity(temporary_storage, "temporary_storage", max_count)?;

    let scratch = SortScratch::new(client, count.scratch_bound(keys));

    // Indirect mode: generate both dispatch arguments on-device, then bind
    // the caller's count buffer everywhere a count uniform is needed.
    let owned_count_buffer;
    let count_binding: &Buffer = match &count {
        CountArg::Direct(n) => {
            owned_count_buffer = create_count_buffer(client, *n);
            &owned_count_buffer
        }
        CountArg::Gpu { count, .. } => count,
    };

    let dispatches = match &count {
        CountArg::Direct(n) => Dispatches::Direct {
            histogram: workgroup_count(*n, HISTOGRAM_SEGMENT_SIZE),
            scatter: workgroup_count(*n, SCATTER_SEGMENT_SIZE),
        },
        CountArg::Gpu { count, .. } => {
            let histogram_dispatch = client.create_indirect_buffer("radix_sort histogram dispatch");
            let scatter_dispatch = client.create_indirect_buffer("radix_sort scatter dispatch");
            let segment_sizes = create_params_buffer(
                client,
                "segment sizes",
                &SegmentSizes {
                    histogram: HISTOGRAM_SEGMENT_SIZE,
                    scatter: SCATTER_SEGMENT_SIZE,
                },
            );
            launch_generate_dispatches(
                client.pipeline_cache(),
                client.wgpu_queue(),
                keys,
                &histogram_dispatch,
                &scatter_dispatch,
                &segment_sizes,
                count,
            )?;
            Dispatches::Indirect {
                histogram: histogram_dispatch,
                scatter: scatter_dispatch,
            }
        }
    };

    let histogram_grid = match &dispatches {
        Dispatches::Direct { histogram, .. } => Grid::Direct(*histogram),
        Dispatches::Indirect { histogram, .. } => Grid::Indirect(histogram),
    };

    launch_bucket_histogram(
        client.pipeline_cache(),
        client.wgpu_queue(),
        keys,
        &scratch.global_histograms,
        count_binding,
        histogram_grid,
    )?;
    launch_global_bucket_offsets(
        client.pipeline_cache(),
        client.wgpu_queue(),
        &scratch.global_histograms,
    )?;

    for group in 0..radix_groups {
        let params = create_params_buffer(
            client,
            "scatter params",
            &ScatterParams {
                radix_offset: RADIX_BITS * group as u32,
                radix_group: group as u32,
            },
        );

        let (keys_in, keys_out) = if group & 1 == 0 {
            (keys, temporary_storage)
        } else {
            (temporary_storage, keys)
        };

        let scatter_grid = match &dispatches {
            Dispatches::Direct { scatter, .. } => Grid::Direct(*scatter),
            Dispatches::Indirect { scatter, .. } => Grid::Indirect(scatter),
        };

        launch_bucket_scatter(
            client.pipeline_cache(),
            client.wgpu_queue(),
            keys_in,
            keys_out,
            &scratch.global_histograms,
            &scratch.group_state,
            &scratch.group_counter,
            &params,
            count_binding,
            scatter_grid,
        )?;
    }

    Ok(())
}
