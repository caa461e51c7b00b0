//! Public primitive operations
//!
//! Each operation takes a [`GpuClient`](crate::client::GpuClient) and
//! caller-owned [`wgpu::Buffer`]s, validates at the host boundary, and
//! submits the WGSL kernels that do the work. Scratch buffers are
//! allocated per call and cleared on the GPU before use; callers never
//! pre-zero anything.
//!
//! The `_indirect` variants read their element count from a GPU-resident
//! uniform buffer and size their dispatches on-device, so a pipeline can
//! continue from a GPU-computed count without a host round-trip.

pub mod find_runs;
pub mod gather_scatter;
mod helpers;
pub mod prefix_sum;
pub mod radix_sort;

pub use self::find_runs::find_runs;
pub use self::gather_scatter::{gather, scatter_by};
pub use self::prefix_sum::{
    prefix_sum_exclusive, prefix_sum_exclusive_indirect, prefix_sum_exclusive_multi_pass,
    prefix_sum_inclusive, prefix_sum_inclusive_indirect, prefix_sum_inclusive_multi_pass,
};
pub use self::radix_sort::{
    MAX_SORT_LEN, radix_sort, radix_sort_by, radix_sort_half_precision, radix_sort_indirect,
};
