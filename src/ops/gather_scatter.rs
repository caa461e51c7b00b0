//! Gather and scatter-by indirection.

use wgpu::Buffer;

use super::helpers::{check_capacity, create_count_buffer};
use crate::client::GpuClient;
use crate::dtype::DType;
use crate::error::Result;
use crate::shaders::gather_scatter::{launch_gather, launch_scatter_by};

/// Gather: `data_out[i] = data_in[indices[i]]` for `i < count`.
///
/// Indices are not bounds-checked against `data_in`; the caller guarantees
/// they fit.
pub fn gather(
    client: &GpuClient,
    data_out: &Buffer,
    data_in: &Buffer,
    indices: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    check_capacity(indices, "indices", count)?;
    check_capacity(data_out, "data_out", count)?;

    let count_buffer = create_count_buffer(client, count);
    launch_gather(
        client.pipeline_cache(),
        client.wgpu_queue(),
        indices,
        data_in,
        data_out,
        &count_buffer,
        count,
        dtype,
    )
}

/// Scatter: `data_out[indices[i]] = data_in[i]` for `i < count`.
///
/// Indices are not bounds-checked against `data_out`, and colliding
/// indices are implementation-defined (any one store wins).
pub fn scatter_by(
    client: &GpuClient,
    data_out: &Buffer,
    data_in: &Buffer,
    indices: &Buffer,
    count: usize,
    dtype: DType,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    check_capacity(indices, "indices", count)?;
    check_capacity(data_in, "data_in", count)?;

    let count_buffer = create_count_buffer(client, count);
    launch_scatter_by(
        client.pipeline_cache(),
        client.wgpu_queue(),
        indices,
        data_in,
        data_out,
        &count_buffer,
        count,
        dtype,
    )
}
