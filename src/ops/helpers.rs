//! Helper functions shared by the operation implementations.

use wgpu::Buffer;

use crate::client::GpuClient;
use crate::error::{Error, Result};

/// Create a uniform buffer holding the given parameter struct.
pub(super) fn create_params_buffer<T: bytemuck::Pod>(
    client: &GpuClient,
    label: &str,
    data: &T,
) -> Buffer {
    let buffer = client.create_uniform_buffer(label, std::mem::size_of::<T>() as u64);
    client
        .wgpu_queue()
        .write_buffer(&buffer, 0, bytemuck::bytes_of(data));
    buffer
}

/// Create a uniform buffer holding an element count.
pub(super) fn create_count_buffer(client: &GpuClient, count: usize) -> Buffer {
    create_params_buffer(client, "count", &(count as u32))
}

/// Number of 32-bit elements a buffer can hold.
pub(super) fn element_capacity(buffer: &Buffer) -> usize {
    (buffer.size() / 4) as usize
}

/// Reject buffers too small for the requested element count.
pub(super) fn check_capacity(buffer: &Buffer, name: &'static str, needed: usize) -> Result<()> {
    let got = element_capacity(buffer);
    if got < needed {
        return Err(Error::BufferTooSmall {
            buffer: name,
            needed,
            got,
        });
    }
    Ok(())
}
