//! Run finding kernel launchers

use wgpu::{Buffer, Queue};

use super::find_runs_wgsl::{
    FIND_RUNS_GROUP_SIZE, generate_collect_run_starts_shader, generate_mark_run_starts_shader,
    generate_resolve_run_count_shader, mark_run_starts_entry_point,
};
use super::pipeline::{LayoutKey, PipelineCache, workgroup_count};
use crate::dtype::DType;
use crate::error::Result;

/// Launch the mark-run-starts kernel.
pub fn launch_mark_run_starts(
    cache: &PipelineCache,
    queue: &Queue,
    data: &Buffer,
    temporary_storage: &Buffer,
    count: &Buffer,
    numel: usize,
    dtype: DType,
) -> Result<()> {
    let entry = mark_run_starts_entry_point(dtype);
    let shader = generate_mark_run_starts_shader(dtype);

    let module = cache.get_or_create_module(&entry, &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(&entry, &entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[data, temporary_storage, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mark_run_starts"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("mark_run_starts"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(workgroup_count(numel, FIND_RUNS_GROUP_SIZE), 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the collect-run-starts kernel (after the marks were scanned).
pub fn launch_collect_run_starts(
    cache: &PipelineCache,
    queue: &Queue,
    temporary_storage: &Buffer,
    run_starts: &Buffer,
    count: &Buffer,
    numel: usize,
) -> Result<()> {
    let shader = generate_collect_run_starts_shader();

    let module = cache.get_or_create_module("collect_run_starts", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline =
        cache.get_or_create_pipeline("collect_run_starts", "collect_run_starts", &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[temporary_storage, run_starts, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("collect_run_starts"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("collect_run_starts"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(workgroup_count(numel, FIND_RUNS_GROUP_SIZE), 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the single-thread run-count kernel.
pub fn launch_resolve_run_count(
    cache: &PipelineCache,
    queue: &Queue,
    temporary_storage: &Buffer,
    run_count: &Buffer,
    count: &Buffer,
) -> Result<()> {
    let shader = generate_resolve_run_count_shader();

    let module = cache.get_or_create_module("resolve_run_count", &shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 2,
        num_uniform_buffers: 1,
    });
    let pipeline =
        cache.get_or_create_pipeline("resolve_run_count", "resolve_run_count", &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[temporary_storage, run_count, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("resolve_run_count"),
        });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("resolve_run_count"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(1, 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}
