//! Global client cache

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::client::GpuClient;
use crate::device::{GpuDevice, WgpuError};

/// Global client cache: device index -> cached GpuClient
///
/// This caches GpuClient instances per device to avoid creating new
/// WebGPU devices and queues on every operation.
static CLIENT_CACHE: OnceLock<Mutex<HashMap<usize, GpuClient>>> = OnceLock::new();

/// Get or create a cached GpuClient for a device.
///
/// This ensures only one `wgpu::Device` exists per adapter index. All
/// `GpuClient` instances for the same index share the same underlying
/// device, queue, and pipeline cache. This is critical because wgpu
/// buffers belong to the device that created them and cannot be used
/// in bind groups on a different device.
pub(crate) fn get_or_create_client(device: &GpuDevice) -> Result<GpuClient, WgpuError> {
    let cache = CLIENT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache_guard = cache.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(client) = cache_guard.get(&device.index) {
        return Ok(client.clone());
    }

    // Create new client via uncached path and cache it
    let client = GpuClient::new_uncached(device.clone())?;
    cache_guard.insert(device.index, client.clone());

    Ok(client)
}
