//! Gather / scatter-by kernel launchers

use wgpu::{Buffer, Queue};

use super::gather_scatter_wgsl::{
    GATHER_SCATTER_GROUP_SIZE, gather_entry_point, generate_gather_shader,
    generate_scatter_by_shader, scatter_by_entry_point,
};
use super::pipeline::{LayoutKey, PipelineCache, workgroup_count};
use crate::dtype::DType;
use crate::error::Result;

#[allow(clippy::too_many_arguments)]
fn launch_indirection(
    cache: &PipelineCache,
    queue: &Queue,
    entry: &str,
    shader: &str,
    indices: &Buffer,
    data_in: &Buffer,
    data_out: &Buffer,
    count: &Buffer,
    numel: usize,
) -> Result<()> {
    let module = cache.get_or_create_module(entry, shader);
    let layout = cache.get_or_create_layout(LayoutKey {
        num_storage_buffers: 3,
        num_uniform_buffers: 1,
    });
    let pipeline = cache.get_or_create_pipeline(entry, entry, &module, &layout);

    let bind_group = cache.create_bind_group(&layout, &[indices, data_in, data_out, count]);

    let mut encoder = cache
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(entry) });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(entry),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, Some(&bind_group), &[]);
        pass.dispatch_workgroups(workgroup_count(numel, GATHER_SCATTER_GROUP_SIZE), 1, 1);
    }

    queue.submit(std::iter::once(encoder.finish()));
    Ok(())
}

/// Launch the gather kernel: `data_out[i] = data_in[indices[i]]`.
#[allow(clippy::too_many_arguments)]
pub fn launch_gather(
    cache: &PipelineCache,
    queue: &Queue,
    indices: &Buffer,
    data_in: &Buffer,
    data_out: &Buffer,
    count: &Buffer,
    numel: usize,
    dtype: DType,
) -> Result<()> {
    let entry = gather_entry_point(dtype);
    let shader = generate_gather_shader(dtype);
    launch_indirection(
        cache, queue, &entry, &shader, indices, data_in, data_out, count, numel,
    )
}

/// Launch the scatter-by kernel: `data_out[indices[i]] = data_in[i]`.
#[allow(clippy::too_many_arguments)]
pub fn launch_scatter_by(
    cache: &PipelineCache,
    queue: &Queue,
    indices: &Buffer,
    data_in: &Buffer,
    data_out: &Buffer,
    count: &Buffer,
    numel: usize,
    dtype: DType,
) -> Result<()> {
    let entry = scatter_by_entry_point(dtype);
    let shader = generate_scatter_by_shader(dtype);
    launch_indirection(
        cache, queue, &entry, &shader, indices, data_in, data_out, count, numel,
    )
}
