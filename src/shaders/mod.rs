//! WGSL compute shader infrastructure
//!
//! Every primr primitive is a WGSL compute kernel. Shader sources are
//! generated per element type by the `*_wgsl` modules; the sibling
//! launcher modules fetch cached pipelines, build bind groups, and encode
//! compute passes.
//!
//! # Module Structure
//!
//! - `pipeline` - Pipeline caching and dispatch utilities
//! - `scan` / `scan_wgsl` - Decoupled-lookback prefix sum + multi-pass fallback
//! - `radix` / `radix_wgsl` - Histogram, global offsets, bucket scatter
//! - `find_runs` / `find_runs_wgsl` - Run marking, collection, counting
//! - `gather_scatter` / `gather_scatter_wgsl` - Index indirection kernels
//! - `dispatch` / `dispatch_wgsl` - Indirect-dispatch argument generators

pub mod pipeline;

pub mod dispatch;
pub mod dispatch_wgsl;
pub mod find_runs;
pub mod find_runs_wgsl;
pub mod gather_scatter;
pub mod gather_scatter_wgsl;
pub mod radix;
pub mod radix_wgsl;
pub mod scan;
pub mod scan_wgsl;
