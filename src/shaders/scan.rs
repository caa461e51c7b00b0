//! Prefix sum kernel launchers
//!
//! Provides launchers for the single-pass decoupled-lookback scan and the
//! three multi-pass fallback kernels. Scratch buffers (group state, group
//! counter) are cleared in the same command encoder as the compute pass,
//! so callers never pre-zero anything.

use wgpu::{Buffer, Queue};

use super::pipeline::{Grid, LayoutKey, PipelineCache};
use super::scan_wgsl::{
    ScanKind, generate_scan_add_bases_shader, generate_scan_segments_shader,
    generate_scan_shader, generate_scan_sums_shader, scan_add_bases_entry_point,
    scan_entry_point, scan_segments_entry_point, scan_sums_entry_point,
};
use crate::dtype::DType;
use crate::error::Result;

// ============================================================================
// Single-pass scan
// ============================================================================

/// Launch the decoupled-lookback scan.
///
/// `group_state` must hold 8 bytes per workgroup; `group_counter` 4 bytes.
/// Both are cleared before the pass in the same encoder.
#[allow(clippy::too_many_arguments)]
pub fn launch_scan(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    group_state: &Buffer,
    group_counter: &Buffer,
    count: &Buffer,
    grid: Grid<'_>,
    dtype: DType,
    kind: ScanKind,
) -> Result<()> {
    let entry = scan_entry_point(dtype, kind);
    let shader = generate_scan_shader(dtype, kind);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 3,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, group_state, group_counter, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("prefix_sum"),
        });

    encoder.clear_buffer(group_state, 0, None);
    encoder.clear_buffer(group_counter, 0, None);

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("prefix_sum"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        match grid {
            Grid::Direct(workgroups) => pass.dispatch_workgroups(workgroups, 1, 1),
            Grid::Indirect(buffer) => pass.dispatch_workgroups_indirect(buffer, 0),
        }
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

// ============================================================================
// Multi-pass fallback
// ============================================================================

/// Launch the per-segment local scan (multi-pass phase 1).
#[allow(clippy::too_many_arguments)]
pub fn launch_scan_segments(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    segment_sums: &Buffer,
    count: &Buffer,
    workgroups: u32,
    dtype: DType,
    kind: ScanKind,
) -> Result<()> {
    let entry = scan_segments_entry_point(dtype, kind);
    let shader = generate_scan_segments_shader(dtype, kind);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, segment_sums, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scan_segments"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("scan_segments"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the exclusive scan over segment aggregates (multi-pass phase 2).
///
/// Runs a single workgroup that walks the aggregate array serially.
pub fn launch_scan_sums(
    cache: &PipelineCache,
    queue: &Queue,
    segment_sums: &Buffer,
    sums_count: &Buffer,
    dtype: DType,
) -> Result<()> {
    let entry = scan_sums_entry_point(dtype);
    let shader = generate_scan_sums_shader(dtype);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 1,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[segment_sums, sums_count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scan_sums"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("scan_sums"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(1, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the uniform segment-base add (multi-pass phase 3).
pub fn launch_scan_add_bases(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    segment_sums: &Buffer,
    count: &Buffer,
    workgroups: u32,
    dtype: DType,
) -> Result<()> {
    let entry = scan_add_bases_entry_point(dtype);
    let shader = generate_scan_add_bases_shader(dtype);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, segment_sums, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scan_add_bases"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("scan_add_bases"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}
