//! Indirect-dispatch generator launchers

use wgpu::{Buffer, Queue};

use super::dispatch_wgsl::{generate_dispatch_shader, generate_dispatches_shader};
use super::pipeline::{LayoutKey, PipelineCache};
use crate::error::Result;

/// Launch the single-target dispatch generator.
///
/// Writes `ceil(count / segment_size)` into `dispatch`, where `count` is
/// the larger of the count uniform and the data buffer length.
pub fn launch_generate_dispatch(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    dispatch: &Buffer,
    segment_size: &Buffer,
    max_count: &Buffer,
) -> Result<()> {
    let shader = generate_dispatch_shader();

    let module = cache.get_or_create_module("generate_dispatch", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 2,
    });
    let pipeline =
        cache.get_or_create_pipeline("generate_dispatch", "generate_dispatch", &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, dispatch, segment_size, max_count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("generate_dispatch"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("generate_dispatch"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(1, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the dual-target dispatch generator for the radix sort.
#[allow(clippy::too_many_arguments)]
pub fn launch_generate_dispatches(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    histogram_dispatch: &Buffer,
    scatter_dispatch: &Buffer,
    segment_sizes: &Buffer,
    max_count: &Buffer,
) -> Result<()> {
    let shader = generate_dispatches_shader();

    let module = cache.get_or_create_module("generate_dispatches", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 3,
        num_uniform_buffers: 2,
    });
    let pipeline = cache.get_or_create_pipeline(
        "generate_dispatches",
        "generate_dispatches",
        &module,
        &layout,
    );

    let bind_group = cache.create_bind_group(
        &layout,
        &[
            data,
            histogram_dispatch,
            scatter_dispatch,
            segment_sizes,
            max_count,
        ],
    );

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("generate_dispatches"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("generate_dispatches"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(1, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}
