//! WGSL shader sources for run finding
//!
//! Three small kernels around an inclusive scan:
//!
//! - `mark_run_starts` writes 1 at every position whose value differs from
//!   its predecessor (and 0 everywhere else, so the scratch buffer needs no
//!   pre-clearing).
//! - After an inclusive scan of the marks, `temporary_storage[i]` is the
//!   index of the run containing position `i`.
//! - `collect_run_starts` writes each run's first position into the run
//!   starts buffer; `resolve_run_count` reads the last scanned mark.

use crate::dtype::DType;

/// Threads per workgroup for the flat run-finding kernels
pub const FIND_RUNS_GROUP_SIZE: u32 = 256;

/// Entry point name for the mark kernel.
pub fn mark_run_starts_entry_point(dtype: DType) -> String {
    format!("mark_run_starts_{}", dtype.suffix())
}

/// Mark kernel source for the given input element type.
pub fn generate_mark_run_starts_shader(dtype: DType) -> String {
    let t = dtype.wgsl_type();
    let entry = mark_run_starts_entry_point(dtype);

    format!(
        r#"@group(0) @binding(0) var<storage, read_write> data: array<{t}>;
@group(0) @binding(1) var<storage, read_write> temporary_storage: array<u32>;
@group(0) @binding(2) var<uniform> count: u32;

@compute @workgroup_size(256)
fn {entry}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let i = global_id.x;
    if (i < count) {{
        var mark = 0u;
        if (i > 0u && data[i] != data[i - 1u]) {{
            mark = 1u;
        }}
        temporary_storage[i] = mark;
    }}
}}
"#,
        t = t,
        entry = entry,
    )
}

/// Collect kernel source (operates on the scanned marks, dtype-independent).
pub fn generate_collect_run_starts_shader() -> String {
    r#"@group(0) @binding(0) var<storage, read_write> temporary_storage: array<u32>;
@group(0) @binding(1) var<storage, read_write> run_starts: array<u32>;
@group(0) @binding(2) var<uniform> count: u32;

@compute @workgroup_size(256)
fn collect_run_starts(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let i = global_id.x;
    if (i < count) {
        if (i == 0u) {
            run_starts[0] = 0u;
        } else if (temporary_storage[i] != temporary_storage[i - 1u]) {
            run_starts[temporary_storage[i]] = i;
        }
    }
}
"#
    .to_string()
}

/// Run count kernel source.
///
/// The scanned mark at the last position is the index of the final run, so
/// the distinct-value count is that plus one.
pub fn generate_resolve_run_count_shader() -> String {
    r#"@group(0) @binding(0) var<storage, read_write> temporary_storage: array<u32>;
@group(0) @binding(1) var<storage, read_write> run_count: u32;
@group(0) @binding(2) var<uniform> count: u32;

@compute @workgroup_size(1)
fn resolve_run_count() {
    if (count == 0u) {
        run_count = 0u;
    } else {
        run_count = temporary_storage[count - 1u] + 1u;
    }
}
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_shader_per_dtype() {
        for dtype in [DType::U32, DType::I32, DType::F32] {
            let source = generate_mark_run_starts_shader(dtype);
            assert!(source.contains(&format!("fn mark_run_starts_{}", dtype.suffix())));
            assert!(source.contains(&format!("array<{}>", dtype.wgsl_type())));
        }
    }

    #[test]
    fn test_resolve_reads_last_element() {
        let source = generate_resolve_run_count_shader();
        assert!(source.contains("temporary_storage[count - 1u] + 1u"));
        assert!(source.contains("run_count = 0u"));
    }
}
