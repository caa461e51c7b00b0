//! # primr
//!
//! **GPU data-parallel primitives for Rust on WebGPU.**
//!
//! primr provides the building blocks of GPU data processing pipelines -
//! a single-pass decoupled-lookback prefix sum, a four-pass radix sort over
//! 32-bit keys (with optional payload), run finding over sorted sequences,
//! and gather/scatter indirection - as WGSL compute kernels with a thin
//! host layer over [`wgpu`].
//!
//! ## Why primr?
//!
//! - **Single-pass scan**: the prefix sum and the radix scatter use the
//!   decoupled-lookback protocol, so an entire sort is enqueued without any
//!   host synchronization between passes
//! - **Caller-owned buffers**: every operation works on plain
//!   [`wgpu::Buffer`]s; primr owns no data, only pipelines and scratch
//! - **Indirect dispatch**: device-side dispatch generators let a pipeline
//!   continue from a GPU-computed element count without a readback
//! - **Portable**: relaxed-only atomics throughout; no subgroup operations,
//!   no extensions beyond baseline WebGPU
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use primr::prelude::*;
//!
//! let client = GpuClient::new(GpuDevice::new(0))?;
//!
//! let keys = client.upload("keys", &[5u32, 3, 9, 1]);
//! let temp = client.create_storage_buffer("temp", 4 * 4);
//!
//! ops::radix_sort(&client, &keys, &temp, 4)?;
//!
//! let sorted: Vec<u32> = client.download(&keys, 4)?;
//! assert_eq!(sorted, vec![1, 3, 5, 9]);
//! ```
//!
//! ## Forward progress
//!
//! The single-pass scan and the radix scatter spin on state published by
//! other workgroups. They are correct under the weak occupancy-bound
//! execution model: once a workgroup is scheduled, every scheduled
//! workgroup keeps making progress. All current desktop drivers satisfy
//! this; for environments that cannot guarantee it, use the multi-pass
//! scan fallback ([`ops::prefix_sum_inclusive_multi_pass`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;

pub mod client;
pub mod device;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod shaders;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::GpuClient;
    pub use crate::device::GpuDevice;
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops;
}
