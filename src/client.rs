//! WebGPU client.
//!
//! `GpuClient` owns the WebGPU device and queue that every primr operation
//! dispatches through, plus the compute pipeline cache.
//!
//! # Thread Safety
//!
//! `GpuClient` is `Clone`; the underlying `wgpu::Device` and `wgpu::Queue`
//! are `Send + Sync` by design, and the pipeline cache is shared behind an
//! `Arc`.

use std::sync::Arc;
use std::time::Duration;
use wgpu::{Buffer, BufferDescriptor, BufferUsages, Device, Queue};

use crate::cache::get_or_create_client;
use crate::device::{GpuDevice, WgpuError, query_adapter_info_blocking};
use crate::error::{Error, Result};
use crate::shaders::pipeline::PipelineCache;

// ============================================================================
// GpuClient
// ============================================================================

/// GPU client for operation dispatch.
///
/// Owns the WebGPU device and queue. All primitive operations are submitted
/// through this client's queue; all compute pipelines are created and
/// cached through its [`PipelineCache`].
///
/// # Buffer Management
///
/// primr operations work on caller-owned storage buffers. The client
/// provides constructors for the buffer kinds the operations expect
/// (storage, uniform, staging, indirect) plus `upload`/`download`
/// convenience wrappers for moving data between host slices and the GPU.
#[derive(Clone)]
pub struct GpuClient {
    /// GPU device identifier
    pub(crate) device_id: GpuDevice,

    /// WebGPU device handle
    pub(crate) wgpu_device: Arc<Device>,

    /// WebGPU queue for command submission
    pub(crate) queue: Arc<Queue>,

    /// Pipeline cache for compute shaders
    pub(crate) pipeline_cache: Arc<PipelineCache>,
}

impl std::fmt::Debug for GpuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuClient")
            .field("device", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl GpuClient {
    /// Get or create a client for a device.
    ///
    /// Clients are cached per adapter index so only one `wgpu::Device`
    /// exists per adapter; buffers created through one client remain
    /// bindable through every other client for the same index.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter is found or device
    /// creation fails.
    pub fn new(device: GpuDevice) -> std::result::Result<Self, WgpuError> {
        get_or_create_client(&device)
    }

    /// Create a new client without consulting the process-wide cache.
    pub(crate) fn new_uncached(device: GpuDevice) -> std::result::Result<Self, WgpuError> {
        let (adapter, info) = query_adapter_info_blocking(device.index)?;
        let device_with_info = GpuDevice::with_info(device.index, info);

        let required_features = if device_with_info.subgroups_supported() {
            wgpu::Features::SUBGROUP
        } else {
            wgpu::Features::empty()
        };

        let (wgpu_device, queue) = pollster::block_on(async {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("primr WebGPU Device"),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    trace: wgpu::Trace::Off,
                    experimental_features: wgpu::ExperimentalFeatures::default(),
                })
                .await
        })
        .map_err(|e| WgpuError::DeviceError(format!("{:?}", e)))?;

        let wgpu_device = Arc::new(wgpu_device);
        let queue = Arc::new(queue);

        let pipeline_cache = Arc::new(PipelineCache::new(wgpu_device.clone(), queue.clone()));

        Ok(Self {
            device_id: device_with_info,
            wgpu_device,
            queue,
            pipeline_cache,
        })
    }

    /// Get the device this client dispatches to.
    #[inline]
    pub fn device(&self) -> &GpuDevice {
        &self.device_id
    }

    /// Get reference to the WebGPU device.
    #[inline]
    pub fn wgpu_device(&self) -> &Device {
        &self.wgpu_device
    }

    /// Get reference to the WebGPU queue.
    #[inline]
    pub fn wgpu_queue(&self) -> &Queue {
        &self.queue
    }

    /// Get reference to the pipeline cache.
    #[inline]
    pub fn pipeline_cache(&self) -> &PipelineCache {
        &self.pipeline_cache
    }

    /// Create a storage buffer.
    ///
    /// Storage buffers can be read/written by compute shaders and serve as
    /// both operation inputs/outputs and scratch space.
    pub fn create_storage_buffer(&self, label: &str, size: u64) -> Buffer {
        self.wgpu_device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    /// Create a staging buffer for CPU readback.
    pub fn create_staging_buffer(&self, label: &str, size: u64) -> Buffer {
        self.wgpu_device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a uniform buffer for shader parameters.
    ///
    /// Buffers passed as GPU-resident element counts to the `_indirect`
    /// operation variants must carry `UNIFORM` usage, which this
    /// constructor provides.
    pub fn create_uniform_buffer(&self, label: &str, size: u64) -> Buffer {
        self.wgpu_device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size,
            usage: BufferUsages::UNIFORM | BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create a buffer usable as an indirect-dispatch argument.
    ///
    /// The dispatch generator kernels write `(x, y, z)` workgroup counts
    /// into buffers of this kind.
    pub fn create_indirect_buffer(&self, label: &str) -> Buffer {
        self.wgpu_device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: 12,
            usage: BufferUsages::INDIRECT | BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Write data to a buffer.
    pub fn write_buffer<T: bytemuck::Pod>(&self, buffer: &Buffer, data: &[T]) {
        self.queue
            .write_buffer(buffer, 0, bytemuck::cast_slice(data));
    }

    /// Create a storage buffer initialized with the given elements.
    pub fn upload<T: bytemuck::Pod>(&self, label: &str, data: &[T]) -> Buffer {
        let buffer = self.create_storage_buffer(label, std::mem::size_of_val(data) as u64);
        if !data.is_empty() {
            self.write_buffer(&buffer, data);
        }
        buffer
    }

    /// Read the first `len` elements of a storage buffer back to the host.
    ///
    /// Copies through an internal staging buffer and blocks until the copy
    /// completes.
    pub fn download<T: bytemuck::Pod + Default + Clone>(
        &self,
        buffer: &Buffer,
        len: usize,
    ) -> Result<Vec<T>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let size = (len * std::mem::size_of::<T>()) as u64;
        let staging = self.create_staging_buffer("primr download staging", size);

        let mut encoder = self
            .wgpu_device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("download"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.submit_and_wait(encoder);

        let mut output = vec![T::default(); len];
        self.read_buffer(&staging, &mut output)?;
        Ok(output)
    }

    /// Submit commands and wait for completion.
    pub fn submit_and_wait(&self, encoder: wgpu::CommandEncoder) {
        let submission = self.queue.submit(std::iter::once(encoder.finish()));
        let _ = self.wgpu_device.poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: Some(Duration::from_secs(60)),
        });
    }

    /// Wait for all submitted GPU work to complete.
    pub fn synchronize(&self) {
        let _ = self.wgpu_device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(60)),
        });
    }

    /// Read a mapped-readable buffer into a host slice (blocking).
    pub fn read_buffer<T: bytemuck::Pod>(&self, staging: &Buffer, output: &mut [T]) -> Result<()> {
        let slice = staging.slice(..);

        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.wgpu_device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(60)),
            })
            .map_err(|e| Error::Backend(format!("GPU poll failed during buffer read: {e}")))?;

        let map_result = receiver.recv().map_err(|_| {
            Error::Backend("map_async callback was not invoked during buffer read".into())
        })?;
        map_result
            .map_err(|e| Error::Backend(format!("map_async failed during buffer read: {e}")))?;

        {
            let data = slice.get_mapped_range();
            let src: &[T] = bytemuck::cast_slice(&data);
            output.copy_from_slice(&src[..output.len()]);
        }

        staging.unmap();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
