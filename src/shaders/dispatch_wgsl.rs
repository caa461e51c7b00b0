//! WGSL shader sources for indirect-dispatch generation
//!
//! Single-thread kernels that write `(x, y, z)` workgroup counts into
//! indirect-dispatch buffers, so a pipeline whose element count lives on
//! the GPU can keep going without a host round-trip. The effective count
//! is the larger of the count uniform and the data buffer's length.

/// Source for the single-target dispatch generator (used by the scan).
pub fn generate_dispatch_shader() -> String {
    r#"struct DispatchSize {
    x: u32,
    y: u32,
    z: u32,
}

@group(0) @binding(0) var<storage, read_write> data: array<u32>;
@group(0) @binding(1) var<storage, read_write> dispatch: DispatchSize;
@group(0) @binding(2) var<uniform> segment_size: u32;
@group(0) @binding(3) var<uniform> max_count: u32;

@compute @workgroup_size(1)
fn generate_dispatch() {
    let count = max(max_count, arrayLength(&data));
    dispatch.x = (count + segment_size - 1u) / segment_size;
    dispatch.y = 1u;
    dispatch.z = 1u;
}
"#
    .to_string()
}

/// Source for the dual-target dispatch generator (used by the radix sort,
/// which needs workgroup counts for both histogram and scatter segments).
pub fn generate_dispatches_shader() -> String {
    r#"struct DispatchSize {
    x: u32,
    y: u32,
    z: u32,
}

struct SegmentSizes {
    histogram: u32,
    scatter: u32,
}

@group(0) @binding(0) var<storage, read_write> data: array<u32>;
@group(0) @binding(1) var<storage, read_write> histogram_dispatch: DispatchSize;
@group(0) @binding(2) var<storage, read_write> scatter_dispatch: DispatchSize;
@group(0) @binding(3) var<uniform> segment_sizes: SegmentSizes;
@group(0) @binding(4) var<uniform> max_count: u32;

@compute @workgroup_size(1)
fn generate_dispatches() {
    let count = max(max_count, arrayLength(&data));
    histogram_dispatch.x = (count + segment_sizes.histogram - 1u) / segment_sizes.histogram;
    histogram_dispatch.y = 1u;
    histogram_dispatch.z = 1u;
    scatter_dispatch.x = (count + segment_sizes.scatter - 1u) / segment_sizes.scatter;
    scatter_dispatch.y = 1u;
    scatter_dispatch.z = 1u;
}
"#
    .to_string()
}
