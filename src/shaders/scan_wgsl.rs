//! WGSL shader sources for prefix sum
//!
//! Two scan implementations share the local-phase machinery:
//!
//! - A single-pass scan using inter-workgroup decoupled lookback. Each
//!   workgroup scans a 2048-element segment in shared memory, publishes its
//!   aggregate, then walks backwards over predecessor segments until it
//!   finds one whose inclusive prefix is already final. The walk spins on
//!   predecessor state, so this kernel requires the weak occupancy-bound
//!   forward-progress model: once a workgroup is scheduled, every scheduled
//!   workgroup keeps making progress. A runtime that can starve an
//!   earlier-indexed workgroup indefinitely will deadlock it.
//! - A classical three-kernel multi-pass scan (segment scan, scan of
//!   segment aggregates, uniform add) for environments without that
//!   guarantee.
//!
//! WGSL atomics are relaxed-only, so the lookback state cannot rely on a
//! release-store/acquire-load pair to order a payload store against its
//! status store. Instead each group publishes through two atomic slots,
//! each carrying the 2-bit status tag in its top bits and one 16-bit half
//! of the payload in its low bits. A reader accepts a payload only when
//! both slots report the same non-zero tag; because a slot only ever
//! transitions NOT_READY -> AGGREGATE -> PREFIX, tag agreement implies both
//! halves belong to the same logical publication.

use crate::dtype::DType;

/// Threads per scan workgroup
pub const SCAN_GROUP_SIZE: u32 = 256;
/// Elements processed by each thread
pub const SCAN_VALUES_PER_THREAD: u32 = 8;
/// Elements per scan segment (one workgroup)
pub const SCAN_SEGMENT_SIZE: u32 = SCAN_GROUP_SIZE * SCAN_VALUES_PER_THREAD;

/// Whether a scan produces inclusive or exclusive prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    /// `out[i] = sum of data[0..=i]`
    Inclusive,
    /// `out[i] = sum of data[0..i]`
    Exclusive,
}

impl ScanKind {
    pub(crate) fn suffix(self) -> &'static str {
        match self {
            ScanKind::Inclusive => "inclusive",
            ScanKind::Exclusive => "exclusive",
        }
    }
}

/// Entry point name for the single-pass scan kernel.
pub fn scan_entry_point(dtype: DType, kind: ScanKind) -> String {
    format!("prefix_sum_{}_{}", kind.suffix(), dtype.suffix())
}

fn to_bits(dtype: DType, expr: &str) -> String {
    match dtype {
        DType::U32 => expr.to_string(),
        _ => format!("bitcast<u32>({})", expr),
    }
}

fn from_bits(dtype: DType, expr: &str) -> String {
    match dtype {
        DType::U32 => expr.to_string(),
        _ => format!("bitcast<{}>({})", dtype.wgsl_type(), expr),
    }
}

/// Shared WGSL for the 2048-lane Hillis-Steele scan over `shared_values`.
///
/// Expects `shared_values` loaded and a barrier already issued; leaves the
/// inclusive scan in place with a trailing barrier.
fn local_scan_body(dtype: DType) -> String {
    let zero = dtype.zero_literal();
    format!(
        r#"    for (var stride = 1u; stride < SEGMENT_SIZE; stride = stride << 1u) {{
        var partial: array<{t}, VALUES_PER_THREAD>;
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            if (i >= stride) {{
                partial[j] = shared_values[i - stride];
            }} else {{
                partial[j] = {zero};
            }}
        }}
        workgroupBarrier();
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            shared_values[i] = shared_values[i] + partial[j];
        }}
        workgroupBarrier();
    }}
"#,
        t = dtype.wgsl_type(),
        zero = zero,
    )
}

fn load_segment_body(dtype: DType) -> String {
    format!(
        r#"    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        let global_i = segment_base + i;
        if (global_i < count) {{
            shared_values[i] = data[global_i];
        }} else {{
            shared_values[i] = {zero};
        }}
    }}
    workgroupBarrier();
"#,
        zero = dtype.zero_literal(),
    )
}

fn store_body(dtype: DType, kind: ScanKind, prefix_var: Option<&str>) -> String {
    let zero = dtype.zero_literal();
    let value = match kind {
        ScanKind::Inclusive => "shared_values[i]",
        ScanKind::Exclusive => "shifted",
    };
    let shift = match kind {
        ScanKind::Inclusive => String::new(),
        ScanKind::Exclusive => format!(
            "            var shifted = {zero};\n            if (i > 0u) {{\n                shifted = shared_values[i - 1u];\n            }}\n",
            zero = zero
        ),
    };
    let rhs = match prefix_var {
        Some(prefix) => format!("{} + {}", prefix, value),
        None => value.to_string(),
    };
    format!(
        r#"    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        let global_i = segment_base + i;
        if (global_i < count) {{
{shift}            data[global_i] = {rhs};
        }}
    }}
"#,
        shift = shift,
        rhs = rhs,
    )
}

/// Generate the single-pass decoupled-lookback scan shader.
pub fn generate_scan_shader(dtype: DType, kind: ScanKind) -> String {
    let t = dtype.wgsl_type();
    let zero = dtype.zero_literal();
    let entry = scan_entry_point(dtype, kind);
    let agg_bits = to_bits(dtype, "value");
    let value_from_bits = from_bits(dtype, "bits");
    let load = load_segment_body(dtype);
    let local_scan = local_scan_body(dtype);
    let store = store_body(dtype, kind, Some("exclusive_prefix"));

    format!(
        r#"// Single-pass prefix sum with inter-workgroup decoupled lookback.

const GROUP_SIZE: u32 = 256u;
const VALUES_PER_THREAD: u32 = 8u;
const SEGMENT_SIZE: u32 = 2048u;

const STATUS_NOT_READY: u32 = 0u;
const STATUS_AGGREGATE: u32 = 1u;
const STATUS_PREFIX: u32 = 2u;

// Each slot: 2-bit status tag in the top bits, 16-bit payload half in the
// low bits. Readers require tag agreement across both slots.
struct GroupState {{
    state_0: atomic<u32>,
    state_1: atomic<u32>,
}}

@group(0) @binding(0) var<storage, read_write> data: array<{t}>;
@group(0) @binding(1) var<storage, read_write> group_state: array<GroupState>;
@group(0) @binding(2) var<storage, read_write> group_counter: atomic<u32>;
@group(0) @binding(3) var<uniform> count: u32;

var<workgroup> shared_values: array<{t}, SEGMENT_SIZE>;
var<workgroup> shared_group_index: u32;
var<workgroup> shared_prefix: {t};

fn publish(group: u32, status: u32, value: {t}) {{
    let bits = {agg_bits};
    atomicStore(&group_state[group].state_0, (status << 30u) | (bits & 0xFFFFu));
    atomicStore(&group_state[group].state_1, (status << 30u) | (bits >> 16u));
}}

@compute @workgroup_size(256)
fn {entry}(@builtin(local_invocation_index) local_index: u32) {{
    // Logical segment order is assigned by the counter, not by hardware
    // scheduling order, so every segment's predecessors were launched
    // before it.
    if (local_index == 0u) {{
        shared_group_index = atomicAdd(&group_counter, 1u);
    }}
    workgroupBarrier();
    let group_index = shared_group_index;
    let segment_base = group_index * SEGMENT_SIZE;

{load}
{local_scan}
    if (local_index == 0u) {{
        let aggregate = shared_values[SEGMENT_SIZE - 1u];
        var running = {zero};
        if (group_index == 0u) {{
            publish(group_index, STATUS_PREFIX, aggregate);
        }} else {{
            publish(group_index, STATUS_AGGREGATE, aggregate);

            var i = group_index - 1u;
            loop {{
                var status: u32;
                var bits: u32;
                loop {{
                    let s0 = atomicLoad(&group_state[i].state_0);
                    let s1 = atomicLoad(&group_state[i].state_1);
                    let tag = s0 >> 30u;
                    if (tag != STATUS_NOT_READY && tag == (s1 >> 30u)) {{
                        status = tag;
                        bits = (s0 & 0xFFFFu) | ((s1 & 0xFFFFu) << 16u);
                        break;
                    }}
                }}
                let value = {value_from_bits};
                running = running + value;
                if (status == STATUS_PREFIX) {{
                    publish(group_index, STATUS_PREFIX, running + aggregate);
                    break;
                }}
                i = i - 1u;
            }}
        }}
        shared_prefix = running;
    }}
    workgroupBarrier();
    let exclusive_prefix = shared_prefix;

{store}}}
"#,
        t = t,
        zero = zero,
        entry = entry,
        agg_bits = agg_bits,
        value_from_bits = value_from_bits,
        load = load,
        local_scan = local_scan,
        store = store,
    )
}

// ============================================================================
// Multi-pass fallback
// ============================================================================

/// Entry point name for the multi-pass segment scan kernel.
pub fn scan_segments_entry_point(dtype: DType, kind: ScanKind) -> String {
    format!("scan_segments_{}_{}", kind.suffix(), dtype.suffix())
}

/// Generate the per-segment local scan kernel (multi-pass phase 1).
///
/// Writes each segment's local scan to `data` and its total to
/// `segment_sums[workgroup]`. No inter-workgroup communication; the grid
/// position is the segment index.
pub fn generate_scan_segments_shader(dtype: DType, kind: ScanKind) -> String {
    let t = dtype.wgsl_type();
    let entry = scan_segments_entry_point(dtype, kind);
    let load = load_segment_body(dtype);
    let local_scan = local_scan_body(dtype);
    let store = store_body(dtype, kind, None);

    format!(
        r#"const GROUP_SIZE: u32 = 256u;
const VALUES_PER_THREAD: u32 = 8u;
const SEGMENT_SIZE: u32 = 2048u;

@group(0) @binding(0) var<storage, read_write> data: array<{t}>;
@group(0) @binding(1) var<storage, read_write> segment_sums: array<{t}>;
@group(0) @binding(2) var<uniform> count: u32;

var<workgroup> shared_values: array<{t}, SEGMENT_SIZE>;

@compute @workgroup_size(256)
fn {entry}(@builtin(workgroup_id) workgroup_id: vec3<u32>,
           @builtin(local_invocation_index) local_index: u32) {{
    let segment_base = workgroup_id.x * SEGMENT_SIZE;

{load}
{local_scan}
    if (local_index == 0u) {{
        segment_sums[workgroup_id.x] = shared_values[SEGMENT_SIZE - 1u];
    }}

{store}}}
"#,
        t = t,
        entry = entry,
        load = load,
        local_scan = local_scan,
        store = store,
    )
}

/// Entry point name for the multi-pass aggregate scan kernel.
pub fn scan_sums_entry_point(dtype: DType) -> String {
    format!("scan_sums_{}", dtype.suffix())
}

/// Generate the exclusive scan over segment aggregates (multi-pass phase 2).
///
/// A single workgroup walks the aggregate array in segment-sized chunks,
/// carrying the running total across chunks, so any aggregate count is
/// handled in one dispatch.
pub fn generate_scan_sums_shader(dtype: DType) -> String {
    let t = dtype.wgsl_type();
    let zero = dtype.zero_literal();
    let entry = scan_sums_entry_point(dtype);
    let local_scan = local_scan_body(dtype);

    format!(
        r#"const GROUP_SIZE: u32 = 256u;
const VALUES_PER_THREAD: u32 = 8u;
const SEGMENT_SIZE: u32 = 2048u;

@group(0) @binding(0) var<storage, read_write> segment_sums: array<{t}>;
@group(0) @binding(1) var<uniform> count: u32;

var<workgroup> shared_values: array<{t}, SEGMENT_SIZE>;

@compute @workgroup_size(256)
fn {entry}(@builtin(local_invocation_index) local_index: u32) {{
    var carry = {zero};
    let chunks = (count + SEGMENT_SIZE - 1u) / SEGMENT_SIZE;

    for (var c = 0u; c < chunks; c = c + 1u) {{
        let chunk_base = c * SEGMENT_SIZE;

        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            let global_i = chunk_base + i;
            if (global_i < count) {{
                shared_values[i] = segment_sums[global_i];
            }} else {{
                shared_values[i] = {zero};
            }}
        }}
        workgroupBarrier();

{local_scan}
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            let global_i = chunk_base + i;
            if (global_i < count) {{
                var shifted = {zero};
                if (i > 0u) {{
                    shifted = shared_values[i - 1u];
                }}
                segment_sums[global_i] = carry + shifted;
            }}
        }}

        // Uniform across the workgroup: every thread reads the same total.
        let chunk_total = shared_values[SEGMENT_SIZE - 1u];
        workgroupBarrier();
        carry = carry + chunk_total;
    }}
}}
"#,
        t = t,
        zero = zero,
        entry = entry,
        local_scan = local_scan,
    )
}

/// Entry point name for the multi-pass uniform-add kernel.
pub fn scan_add_bases_entry_point(dtype: DType) -> String {
    format!("scan_add_bases_{}", dtype.suffix())
}

/// Generate the uniform-add kernel (multi-pass phase 3).
pub fn generate_scan_add_bases_shader(dtype: DType) -> String {
    let t = dtype.wgsl_type();
    let entry = scan_add_bases_entry_point(dtype);

    format!(
        r#"const GROUP_SIZE: u32 = 256u;
const VALUES_PER_THREAD: u32 = 8u;
const SEGMENT_SIZE: u32 = 2048u;

@group(0) @binding(0) var<storage, read_write> data: array<{t}>;
@group(0) @binding(1) var<storage, read_write> segment_sums: array<{t}>;
@group(0) @binding(2) var<uniform> count: u32;

@compute @workgroup_size(256)
fn {entry}(@builtin(workgroup_id) workgroup_id: vec3<u32>,
           @builtin(local_invocation_index) local_index: u32) {{
    let base = segment_sums[workgroup_id.x];
    let segment_base = workgroup_id.x * SEGMENT_SIZE;

    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = segment_base + j * GROUP_SIZE + local_index;
        if (i < count) {{
            data[i] = data[i] + base;
        }}
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
    fn test_scan_shader_entry_points() {
        for dtype in [DType::U32, DType::I32, DType::F32] {
            for kind in [ScanKind::Inclusive, ScanKind::Exclusive] {
                let source = generate_scan_shader(dtype, kind);
                let entry = scan_entry_point(dtype, kind);
                assert!(source.contains(&format!("fn {}", entry)));
                assert!(source.contains("STATUS_PREFIX"));
            }
        }
    }

    #[test]
    fn test_exclusive_shifts_by_one() {
        let source = generate_scan_shader(DType::U32, ScanKind::Exclusive);
        assert!(source.contains("shifted = shared_values[i - 1u]"));
        let inclusive = generate_scan_shader(DType::U32, ScanKind::Inclusive);
        assert!(!inclusive.contains("shifted"));
    }

    #[test]
    fn test_bitcast_only_for_non_u32() {
        let u32_src = generate_scan_shader(DType::U32, ScanKind::Inclusive);
        assert!(!u32_src.contains("bitcast"));
        let f32_src = generate_scan_shader(DType::F32, ScanKind::Inclusive);
        assert!(f32_src.contains("bitcast<u32>(value)"));
        assert!(f32_src.contains("bitcast<f32>(bits)"));
    }

    #[test]
    fn test_multi_pass_shaders() {
        let seg = generate_scan_segments_shader(DType::U32, ScanKind::Inclusive);
        assert!(seg.contains("fn scan_segments_inclusive_u32"));
        let sums = generate_scan_sums_shader(DType::U32);
        assert!(sums.contains("fn scan_sums_u32"));
        let add = generate_scan_add_bases_shader(DType::U32);
        assert!(add.contains("fn scan_add_bases_u32"));
    }
}
