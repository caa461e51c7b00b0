//! WGSL shader sources for gather and scatter-by
//!
//! Plain index indirection over flat grids. No bounds checking beyond the
//! element count; callers guarantee indices fit the target buffers.

use crate::dtype::DType;

/// Threads per workgroup for the indirection kernels
pub const GATHER_SCATTER_GROUP_SIZE: u32 = 256;

/// Entry point name for the gather kernel.
pub fn gather_entry_point(dtype: DType) -> String {
    format!("gather_{}", dtype.suffix())
}

/// Gather kernel source: `data_out[i] = data_in[indices[i]]`.
pub fn generate_gather_shader(dtype: DType) -> String {
    let t = dtype.wgsl_type();
    let entry = gather_entry_point(dtype);

    format!(
        r#"@group(0) @binding(0) var<storage, read_write> indices: array<u32>;
@group(0) @binding(1) var<storage, read_write> data_in: array<{t}>;
@group(0) @binding(2) var<storage, read_write> data_out: array<{t}>;
@group(0) @binding(3) var<uniform> count: u32;

@compute @workgroup_size(256)
fn {entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let i = global_id.x;
    if (i < count) {{
        data_out[i] = data_in[indices[i]];
    }}
}}
"#,
        t = t,
        entry = entry,
    )
}

/// Entry point name for the scatter-by kernel.
pub fn scatter_by_entry_point(dtype: DType) -> String {
    format!("scatter_by_{}", dtype.suffix())
}

/// Scatter kernel source: `data_out[indices[i]] = data_in[i]`.
///
/// Colliding indices are implementation-defined: any one store wins.
pub fn generate_scatter_by_shader(dtype: DType) -> String {
    let t = dtype.wgsl_type();
    let entry = scatter_by_entry_point(dtype);

    format!(
        r#"@group(0) @binding(0) var<storage, read_write> indices: array<u32>;
@group(0) @binding(1) var<storage, read_write> data_in: array<{t}>;
@group(0) @binding(2) var<storage, read_write> data_out: array<{t}>;
@group(0) @binding(3) var<uniform> count: u32;

@compute @workgroup_size(256)
fn {entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let i = global_id.x;
    if (i < count) {{
        data_out[indices[i]] = data_in[i];
    }}
}}
"#,
        t = t,
        entry = entry,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_shader() {
        let source = generate_gather_shader(DType::F32);
        assert!(source.contains("fn gather_f32"));
        assert!(source.contains("data_out[i] = data_in[indices[i]]"));
    }

    #[test]
    fn test_scatter_by_shader() {
        let source = generate_scatter_by_shader(DType::U32);
        assert!(source.contains("fn scatter_by_u32"));
        assert!(source.contains("data_out[indices[i]] = data_in[i]"));
    }
}
