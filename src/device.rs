//! WebGPU device discovery.
//!
//! `GpuDevice` names an adapter by enumeration index and caches its
//! properties (name, backend, limits, feature set) once a client has been
//! created for it. Capability queries - most usefully subgroup support -
//! are answered from the cached info without touching the GPU again.
//!
//! # Thread Safety
//!
//! `GpuDevice` is `Clone` and `Send + Sync`; the cached adapter info is
//! shared behind an `Arc`.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use wgpu::{Adapter, Backend, Features, Limits};

/// Errors raised while discovering or initializing a GPU.
#[derive(Error, Debug, Clone)]
pub enum WgpuError {
    /// No suitable GPU adapter found.
    #[error("no suitable WebGPU adapter found")]
    NoAdapter,
    /// Device request failed.
    #[error("WebGPU device error: {0}")]
    DeviceError(String),
}

/// Cached adapter properties, captured once at client creation.
#[derive(Clone)]
pub(crate) struct AdapterInfo {
    /// Adapter name (e.g., "NVIDIA GeForce RTX 4090")
    name: String,
    /// Backend type (Vulkan, Metal, DX12, etc.)
    backend: Backend,
    /// Device limits
    limits: Limits,
    /// Full adapter feature set; subgroup capability derives from this
    features: Features,
}

/// GPU device identifier.
///
/// The index maps to the order of adapters returned by WebGPU
/// enumeration. Creating a `GpuDevice` does not initialize the GPU - that
/// happens when [`GpuClient::new`](crate::client::GpuClient::new) is
/// called, which also populates the cached adapter info.
///
/// # Example
///
/// ```ignore
/// let device = GpuDevice::new(0);  // First GPU
/// let client = GpuClient::new(device)?;
/// println!("Running on {}", client.device().adapter_name());
/// ```
#[derive(Clone)]
pub struct GpuDevice {
    /// Device index (adapter order)
    pub(crate) index: usize,
    /// Cached adapter info (populated by client creation)
    info: Option<Arc<AdapterInfo>>,
}

impl GpuDevice {
    /// Create a device identifier for the specified adapter index.
    pub fn new(index: usize) -> Self {
        Self { index, info: None }
    }

    /// Create a device with cached adapter info.
    pub(crate) fn with_info(index: usize, info: Arc<AdapterInfo>) -> Self {
        Self {
            index,
            info: Some(info),
        }
    }

    /// The adapter index this device refers to.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the adapter name.
    ///
    /// Returns "unknown" if the device hasn't been initialized yet.
    pub fn adapter_name(&self) -> String {
        self.info
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Get the backend type (Vulkan, Metal, DX12, etc.).
    ///
    /// Returns `None` if the device hasn't been initialized yet.
    pub fn backend(&self) -> Option<Backend> {
        self.info.as_ref().map(|i| i.backend)
    }

    /// Get device limits.
    ///
    /// Returns default limits if the device hasn't been initialized yet.
    pub fn limits(&self) -> Limits {
        self.info
            .as_ref()
            .map(|i| i.limits.clone())
            .unwrap_or_default()
    }

    /// The adapter's feature set, empty until the device is initialized.
    pub fn features(&self) -> Features {
        self.info
            .as_ref()
            .map(|i| i.features)
            .unwrap_or_else(Features::empty)
    }

    /// Check if subgroup operations are supported.
    ///
    /// No primr kernel requires subgroups; the capability is surfaced for
    /// custom kernels sharing the device.
    pub fn subgroups_supported(&self) -> bool {
        self.features().contains(Features::SUBGROUP)
    }

    /// Get subgroup size range.
    ///
    /// Returns `(min, max)`, or `(0, 0)` if subgroups are not supported.
    /// wgpu does not expose the exact sizes through [`Limits`], so
    /// supporting adapters report the common hardware range (NVIDIA 32,
    /// AMD 32-64, Intel 8-32).
    pub fn subgroup_size(&self) -> (u32, u32) {
        if self.subgroups_supported() {
            (4, 64)
        } else {
            (0, 0)
        }
    }

    /// Get maximum storage buffer binding size.
    pub fn max_storage_buffer_size(&self) -> u64 {
        self.limits().max_storage_buffer_binding_size as u64
    }

    /// Get maximum number of workgroups per dispatch dimension.
    ///
    /// Bounds the largest input a single primitive invocation can cover.
    pub fn max_workgroups_per_dimension(&self) -> u32 {
        self.limits().max_compute_workgroups_per_dimension
    }
}

impl fmt::Debug for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuDevice")
            .field("index", &self.index)
            .field("adapter", &self.adapter_name())
            .field("backend", &self.backend())
            .field("subgroups", &self.subgroups_supported())
            .finish()
    }
}

// ============================================================================
// Adapter Discovery
// ============================================================================

/// Request the adapter for a device index and capture its properties.
///
/// An index past the end of the enumeration falls back to asking the
/// instance for its highest-performance adapter, so `GpuDevice::new(0)`
/// works even on runtimes that enumerate nothing but can still serve a
/// default adapter.
pub(crate) async fn query_adapter_info(
    index: usize,
) -> Result<(Adapter, Arc<AdapterInfo>), WgpuError> {
    let instance = wgpu::Instance::default();

    let mut adapters = instance.enumerate_adapters(wgpu::Backends::all()).await;

    let adapter = if index < adapters.len() {
        adapters.swap_remove(index)
    } else {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| WgpuError::NoAdapter)?
    };

    let wgpu_info = adapter.get_info();
    let info = Arc::new(AdapterInfo {
        name: wgpu_info.name,
        backend: wgpu_info.backend,
        limits: adapter.limits(),
        features: adapter.features(),
    });

    Ok((adapter, info))
}

/// Query adapter information synchronously using pollster.
pub(crate) fn query_adapter_info_blocking(
    index: usize,
) -> Result<(Adapter, Arc<AdapterInfo>), WgpuError> {
    pollster::block_on(query_adapter_info(index))
}

// ============================================================================
// Tests
// ============================================================================
