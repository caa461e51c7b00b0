//! Radix sort kernel launchers
//!
//! One launcher per pass of the sort pipeline: histogram, global offsets,
//! and scatter (with or without payload). The scatter launcher clears the
//! segment state table and group counter in the same encoder, so each
//! digit pass starts from pristine lookback state.

use wgpu::{Buffer, Queue};

use super::pipeline::{Grid, LayoutKey, PipelineCache};
use super::radix_wgsl::{
    generate_global_offsets_shader, generate_histogram_shader, generate_scatter_shader,
    scatter_entry_point,
};
use crate::dtype::DType;
use crate::error::Result;

/// Launch the bucket histogram pass.
///
/// Clears `global_histograms` before counting, so one launch per sort
/// resets the table.
pub fn launch_bucket_histogram(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    global_histograms: &Buffer,
    count: &Buffer,
    grid: Grid<'_>,
) -> Result<()> {
    let shader = generate_histogram_shader();

    let module = cache.get_or_create_module("bucket_histogram", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline =
        cache.get_or_create_pipeline("bucket_histogram", "bucket_histogram", &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, global_histograms, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bucket_histogram"),
        });

    encoder.clear_buffer(global_histograms, 0, None);

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("bucket_histogram"),
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

/// Launch the global bucket offsets pass (one workgroup per radix group).
pub fn launch_global_bucket_offsets(
    cache: &PipelineCache,
    queue: &Queue,
    global_histograms: &Buffer,
) -> Result<()> {
    let shader = generate_global_offsets_shader();

    let module = cache.get_or_create_module("global_bucket_offsets", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 1,
        num_uniform_buffers: 0,
    });
    let pipeline = cache.get_or_create_pipeline(
        "global_bucket_offsets",
        "global_bucket_offsets",
        &module,
        &layout,
    );

    let bind_group = cache.create_bind_group(&layout, &[global_histograms]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("global_bucket_offsets"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("global_bucket_offsets"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(super::radix_wgsl::RADIX_GROUPS as u32, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch one key-only scatter pass.
///
/// `group_state` must hold `RADIX_DIGITS` u32 slots per scatter segment;
/// it and `group_counter` are cleared before the pass.
#[allow(clippy::too_many_arguments)]
pub fn launch_bucket_scatter(
    cache: &PipelineCache,
    queue: &Queue,
    keys_in: &Buffer,
    keys_out: &Buffer,
    global_base_offsets: &Buffer,
    group_state: &Buffer,
    group_counter: &Buffer,
    params: &Buffer,
    count: &Buffer,
    grid: Grid<'_>,
) -> Result<()> {
    let entry = scatter_entry_point(None);
    let shader = generate_scatter_shader(None);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 5,
        num_uniform_buffers: 2,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(
        &layout,
        &[
            keys_in,
            keys_out,
            global_base_offsets,
            group_state,
            group_counter,
            params,
            count,
        ],
    );

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bucket_scatter"),
        });

    encoder.clear_buffer(group_state, 0, None);
    encoder.clear_buffer(group_counter, 0, None);

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("bucket_scatter"),
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

/// Launch one key-value scatter pass.
#[allow(clippy::too_many_arguments)]
pub fn launch_bucket_scatter_by(
    cache: &PipelineCache,
    queue: &Queue,
    keys_in: &Buffer,
    keys_out: &Buffer,
    values_in: &Buffer,
    values_out: &Buffer,
    global_base_offsets: &Buffer,
    group_state: &Buffer,
    group_counter: &Buffer,
    params: &Buffer,
    count: &Buffer,
    grid: Grid<'_>,
    value_dtype: DType,
) -> Result<()> {
    let entry = scatter_entry_point(Some(value_dtype));
    let shader = generate_scatter_shader(Some(value_dtype));

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 7,
        num_uniform_buffers: 2,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(
        &layout,
        &[
            keys_in,
            keys_out,
            values_in,
            values_out,
            global_base_offsets,
            group_state,
            group_counter,
            params,
            count,
        ],
    );

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bucket_scatter_by"),
        });

    encoder.clear_buffer(group_state, 0, None);
    encoder.clear_buffer(group_counter, 0, None);

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("bucket_scatter_by"),
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
