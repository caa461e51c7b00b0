//! WGSL shader sources for radix sort
//!
//! The sort is least-significant-digit radix over four 8-bit digit groups:
//!
//! - `bucket_histogram` counts digit occurrences for all four groups in one
//!   pass, accumulating thread -> workgroup -> global so global atomic
//!   contention stays bounded by the workgroup count, not the input size.
//! - `global_bucket_offsets` turns each 256-entry histogram row into its
//!   exclusive prefix sum in place, yielding the base output offset of
//!   every digit value.
//! - `bucket_scatter` / `bucket_scatter_by` sort each 1024-key segment by
//!   the current digit in shared memory (eight stable bit splits), extract
//!   the per-digit runs, resolve per-segment global offsets with a
//!   per-digit decoupled lookback (one digit per lane), and write every key
//!   to its final position. Like the single-pass scan, the lookback spins
//!   on predecessor state and assumes weak occupancy-bound forward
//!   progress.
//!
//! Segment state slots pack a 2-bit status into the top bits of a single
//! atomic word and a 30-bit count into the rest; a single atomic word needs
//! no ordering against a separate payload, so relaxed atomics suffice. The
//! 30-bit payload is why the sort rejects inputs of `2^30` elements or
//! more.
//!
//! Tail positions of the last segment are padded with `0xFFFFFFFF` so the
//! local sort sinks them; their lanes are never scattered.

use crate::dtype::DType;

/// Bits per radix digit
pub const RADIX_BITS: u32 = 8;
/// Number of digit values per radix group
pub const RADIX_DIGITS: usize = 256;
/// Number of 8-bit digit groups in a 32-bit key
pub const RADIX_GROUPS: usize = 4;

/// Elements per histogram segment (256 threads x 4 iterations)
pub const HISTOGRAM_SEGMENT_SIZE: u32 = 1024;
/// Elements per scatter segment (256 threads x 4 values)
pub const SCATTER_SEGMENT_SIZE: u32 = 1024;

/// Histogram shader source (keys are always u32).
pub fn generate_histogram_shader() -> String {
    r#"const GROUP_SIZE: u32 = 256u;
const GROUP_ITERATIONS: u32 = 4u;
const SEGMENT_SIZE: u32 = 1024u;
const RADIX_GROUPS: u32 = 4u;
const RADIX_DIGITS: u32 = 256u;

@group(0) @binding(0) var<storage, read_write> data: array<u32>;
@group(0) @binding(1) var<storage, read_write> global_histograms: array<array<atomic<u32>, 256>, 4>;
@group(0) @binding(2) var<uniform> count: u32;

var<workgroup> local_histograms: array<array<atomic<u32>, 256>, 4>;

@compute @workgroup_size(256)
fn bucket_histogram(@builtin(workgroup_id) workgroup_id: vec3<u32>,
                    @builtin(local_invocation_index) local_index: u32) {
    for (var g = 0u; g < RADIX_GROUPS; g = g + 1u) {
        atomicStore(&local_histograms[g][local_index], 0u);
    }
    workgroupBarrier();

    let segment_base = workgroup_id.x * SEGMENT_SIZE;
    for (var j = 0u; j < GROUP_ITERATIONS; j = j + 1u) {
        let i = segment_base + j * GROUP_SIZE + local_index;
        if (i < count) {
            let key = data[i];
            atomicAdd(&local_histograms[0u][key & 0xFFu], 1u);
            atomicAdd(&local_histograms[1u][(key >> 8u) & 0xFFu], 1u);
            atomicAdd(&local_histograms[2u][(key >> 16u) & 0xFFu], 1u);
            atomicAdd(&local_histograms[3u][(key >> 24u) & 0xFFu], 1u);
        }
    }
    workgroupBarrier();

    // One global slot per thread per radix group; zero bins stay local.
    for (var g = 0u; g < RADIX_GROUPS; g = g + 1u) {
        let bin_count = atomicLoad(&local_histograms[g][local_index]);
        if (bin_count != 0u) {
            atomicAdd(&global_histograms[g][local_index], bin_count);
        }
    }
}
"#
    .to_string()
}

/// Global bucket offsets shader source.
///
/// One workgroup per radix group rewrites its 256-entry histogram row into
/// an exclusive prefix sum in place.
pub fn generate_global_offsets_shader() -> String {
    r#"const RADIX_DIGITS: u32 = 256u;

@group(0) @binding(0) var<storage, read_write> global_histograms: array<array<u32, 256>, 4>;

var<workgroup> workspace: array<u32, 256>;

@compute @workgroup_size(256)
fn global_bucket_offsets(@builtin(workgroup_id) workgroup_id: vec3<u32>,
                         @builtin(local_invocation_index) local_index: u32) {
    workspace[local_index] = global_histograms[workgroup_id.x][local_index];
    workgroupBarrier();

    for (var stride = 1u; stride < RADIX_DIGITS; stride = stride << 1u) {
        var partial = 0u;
        if (local_index >= stride) {
            partial = workspace[local_index - stride];
        }
        workgroupBarrier();
        workspace[local_index] = workspace[local_index] + partial;
        workgroupBarrier();
    }

    // Shift right by one lane: slot 0 becomes 0.
    var result = 0u;
    if (local_index > 0u) {
        result = workspace[local_index - 1u];
    }
    global_histograms[workgroup_id.x][local_index] = result;
}
"#
    .to_string()
}

/// Entry point name for the scatter kernel.
pub fn scatter_entry_point(values: Option<DType>) -> String {
    match values {
        None => "bucket_scatter".to_string(),
        Some(dtype) => format!("bucket_scatter_by_{}", dtype.suffix()),
    }
}

/// Scatter shader source.
///
/// `values`: `None` generates the key-only kernel; `Some(dtype)` generates
/// the key-value kernel that carries a payload of the given element type
/// through the permutation by source index.
pub fn generate_scatter_shader(values: Option<DType>) -> String {
    let entry = scatter_entry_point(values);

    let (value_bindings, offsets_binding, state_binding, counter_binding, params_binding, count_binding) =
        match values {
            None => (String::new(), 2, 3, 4, 5, 6),
            Some(dtype) => (
                format!(
                    "@group(0) @binding(2) var<storage, read_write> values_in: array<{t}>;\n\
                     @group(0) @binding(3) var<storage, read_write> values_out: array<{t}>;\n",
                    t = dtype.wgsl_type()
                ),
                4,
                5,
                6,
                7,
                8,
            ),
        };

    let source_indices_decl = if values.is_some() {
        "var<workgroup> local_source_indices: array<u32, SEGMENT_SIZE>;\n"
    } else {
        ""
    };
    let load_source_index = if values.is_some() {
        "        local_source_indices[i] = segment_base + i;\n"
    } else {
        ""
    };
    let stage_source = if values.is_some() {
        "            staged_sources[j] = local_source_indices[i];\n"
    } else {
        ""
    };
    let staged_sources_decl = if values.is_some() {
        "        var staged_sources: array<u32, VALUES_PER_THREAD>;\n"
    } else {
        ""
    };
    let permute_source = if values.is_some() {
        "            local_source_indices[staged_positions[j]] = staged_sources[j];\n"
    } else {
        ""
    };
    let scatter_value = if values.is_some() {
        "            values_out[dst_index] = values_in[local_source_indices[i]];\n"
    } else {
        ""
    };

    format!(
        r#"const GROUP_SIZE: u32 = 256u;
const VALUES_PER_THREAD: u32 = 4u;
const SEGMENT_SIZE: u32 = 1024u;
const RADIX_DIGITS: u32 = 256u;

const STATUS_NOT_READY: u32 = 0u;
const STATUS_LOCAL_OFFSET: u32 = 1u;
const STATUS_GLOBAL_OFFSET: u32 = 2u;

const VALUE_MASK: u32 = 0x3FFFFFFFu;

struct ScatterParams {{
    radix_offset: u32,
    radix_group: u32,
}}

@group(0) @binding(0) var<storage, read_write> keys_in: array<u32>;
@group(0) @binding(1) var<storage, read_write> keys_out: array<u32>;
{value_bindings}@group(0) @binding({offsets_binding}) var<storage, read_write> global_base_offsets: array<array<u32, 256>, 4>;
@group(0) @binding({state_binding}) var<storage, read_write> group_state: array<atomic<u32>>;
@group(0) @binding({counter_binding}) var<storage, read_write> group_counter: atomic<u32>;
@group(0) @binding({params_binding}) var<uniform> params: ScatterParams;
@group(0) @binding({count_binding}) var<uniform> count: u32;

var<workgroup> local_keys: array<u32, SEGMENT_SIZE>;
var<workgroup> workspace: array<u32, SEGMENT_SIZE>;
{source_indices_decl}var<workgroup> shared_group_index: u32;

fn pack_state(status: u32, value: u32) -> u32 {{
    return (status << 30u) | (value & VALUE_MASK);
}}

fn digit_of(key: u32) -> u32 {{
    return (key >> params.radix_offset) & 0xFFu;
}}

@compute @workgroup_size(256)
fn {entry}(@builtin(local_invocation_index) local_index: u32) {{
    if (local_index == 0u) {{
        shared_group_index = atomicAdd(&group_counter, 1u);
    }}
    workgroupBarrier();
    let group_index = shared_group_index;
    let segment_base = group_index * SEGMENT_SIZE;

    // Real elements in this segment; the rest is padding.
    var data_size = 0u;
    if (count > segment_base) {{
        data_size = min(count - segment_base, SEGMENT_SIZE);
    }}

    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        if (i < data_size) {{
            local_keys[i] = keys_in[segment_base + i];
        }} else {{
            // Max key sinks padding to the segment tail in the local sort.
            local_keys[i] = 0xFFFFFFFFu;
        }}
{load_source_index}    }}
    workgroupBarrier();

    // Eight stable bit splits sort the segment by the current digit.
    for (var bit = 0u; bit < 8u; bit = bit + 1u) {{
        let shift = params.radix_offset + bit;

        // workspace[i] = 1 iff the key before i has a zero bit
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            var mark = 0u;
            if (i > 0u && ((local_keys[i - 1u] >> shift) & 1u) == 0u) {{
                mark = 1u;
            }}
            workspace[i] = mark;
        }}
        workgroupBarrier();

        // Inclusive scan: workspace[i] = zero-bit keys before position i
        for (var stride = 1u; stride < SEGMENT_SIZE; stride = stride << 1u) {{
            var partial: array<u32, VALUES_PER_THREAD>;
            for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
                let i = j * GROUP_SIZE + local_index;
                partial[j] = 0u;
                if (i >= stride) {{
                    partial[j] = workspace[i - stride];
                }}
            }}
            workgroupBarrier();
            for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
                let i = j * GROUP_SIZE + local_index;
                workspace[i] = workspace[i] + partial[j];
            }}
            workgroupBarrier();
        }}

        let last_key = local_keys[SEGMENT_SIZE - 1u];
        var total_false = workspace[SEGMENT_SIZE - 1u];
        if (((last_key >> shift) & 1u) == 0u) {{
            total_false = total_false + 1u;
        }}

        // Two-phase permutation: read everything, barrier, write everything.
        var staged_keys: array<u32, VALUES_PER_THREAD>;
        var staged_positions: array<u32, VALUES_PER_THREAD>;
{staged_sources_decl}        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            let key = local_keys[i];
            staged_keys[j] = key;
{stage_source}            if (((key >> shift) & 1u) == 0u) {{
                staged_positions[j] = workspace[i];
            }} else {{
                staged_positions[j] = total_false + i - workspace[i];
            }}
        }}
        workgroupBarrier();
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            local_keys[staged_positions[j]] = staged_keys[j];
{permute_source}        }}
        workgroupBarrier();
    }}

    // Run extraction. After the digit sort each digit present in the
    // segment forms exactly one run, so runs and buckets coincide.
    var run_start_flag: array<u32, VALUES_PER_THREAD>;
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        var mark = 0u;
        if (i > 0u && digit_of(local_keys[i]) != digit_of(local_keys[i - 1u])) {{
            mark = 1u;
        }}
        workspace[i] = mark;
        run_start_flag[j] = mark;
        if (i == 0u) {{
            run_start_flag[j] = 1u;
        }}
    }}
    workgroupBarrier();

    // Inclusive scan: workspace[i] = index of the run containing i
    for (var stride = 1u; stride < SEGMENT_SIZE; stride = stride << 1u) {{
        var partial: array<u32, VALUES_PER_THREAD>;
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            partial[j] = 0u;
            if (i >= stride) {{
                partial[j] = workspace[i - stride];
            }}
        }}
        workgroupBarrier();
        for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
            let i = j * GROUP_SIZE + local_index;
            workspace[i] = workspace[i] + partial[j];
        }}
        workgroupBarrier();
    }}

    var run_index: array<u32, VALUES_PER_THREAD>;
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        run_index[j] = workspace[i];
    }}
    workgroupBarrier();

    // Repurpose workspace as the run start table, sentinel-filled so the
    // slot after the last run reads as data_size.
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        workspace[i] = data_size;
    }}
    workgroupBarrier();
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        if (run_start_flag[j] == 1u) {{
            workspace[run_index[j]] = i;
        }}
    }}
    workgroupBarrier();

    // Latch per-lane run starts and per-run lengths before the table is
    // repurposed again.
    var run_start_pos: array<u32, VALUES_PER_THREAD>;
    var run_length: array<u32, VALUES_PER_THREAD>;
    var run_digit: array<u32, VALUES_PER_THREAD>;
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        run_start_pos[j] = workspace[run_index[j]];
        run_length[j] = 0u;
        run_digit[j] = 0u;
        if (run_start_flag[j] == 1u) {{
            run_length[j] = workspace[run_index[j] + 1u] - i;
            run_digit[j] = digit_of(local_keys[i]);
        }}
    }}
    workgroupBarrier();

    // Repurpose workspace as per-digit bucket counts.
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        workspace[i] = 0u;
    }}
    workgroupBarrier();
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        if (run_start_flag[j] == 1u) {{
            workspace[run_digit[j]] = run_length[j];
        }}
    }}
    workgroupBarrier();

    // Per-digit decoupled lookback, one digit per lane.
    let digit = local_index;
    let local_count = workspace[digit];
    var exclusive_offset = 0u;
    if (group_index == 0u) {{
        atomicStore(&group_state[digit], pack_state(STATUS_GLOBAL_OFFSET, local_count));
    }} else {{
        atomicStore(
            &group_state[group_index * RADIX_DIGITS + digit],
            pack_state(STATUS_LOCAL_OFFSET, local_count),
        );

        var i = group_index - 1u;
        loop {{
            var state: u32;
            loop {{
                state = atomicLoad(&group_state[i * RADIX_DIGITS + digit]);
                if ((state >> 30u) != STATUS_NOT_READY) {{
                    break;
                }}
            }}
            exclusive_offset = exclusive_offset + (state & VALUE_MASK);
            if ((state >> 30u) == STATUS_GLOBAL_OFFSET) {{
                atomicStore(
                    &group_state[group_index * RADIX_DIGITS + digit],
                    pack_state(STATUS_GLOBAL_OFFSET, exclusive_offset + local_count),
                );
                break;
            }}
            i = i - 1u;
        }}
    }}
    workspace[digit] = exclusive_offset;
    workgroupBarrier();

    // Scatter. Padding lanes (i >= data_size) are skipped.
    for (var j = 0u; j < VALUES_PER_THREAD; j = j + 1u) {{
        let i = j * GROUP_SIZE + local_index;
        if (i < data_size) {{
            let key = local_keys[i];
            let key_digit = digit_of(key);
            let dst_index = global_base_offsets[params.radix_group][key_digit]
                + workspace[key_digit]
                + (i - run_start_pos[j]);
            keys_out[dst_index] = key;
{scatter_value}        }}
    }}
}}
"#,
        entry = entry,
        value_bindings = value_bindings,
        offsets_binding = offsets_binding,
        state_binding = state_binding,
        counter_binding = counter_binding,
        params_binding = params_binding,
        count_binding = count_binding,
        source_indices_decl = source_indices_decl,
        load_source_index = load_source_index,
        staged_sources_decl = staged_sources_decl,
        stage_source = stage_source,
        permute_source = permute_source,
        scatter_value = scatter_value,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_shader() {
        let source = generate_histogram_shader();
        assert!(source.contains("fn bucket_histogram"));
        assert!(source.contains("atomicAdd(&local_histograms[3u][(key >> 24u) & 0xFFu], 1u)"));
    }

    #[test]
    fn test_global_offsets_shader() {
        let source = generate_global_offsets_shader();
        assert!(source.contains("fn global_bucket_offsets"));
        assert!(source.contains("var result = 0u;"));
    }

    #[test]
    fn test_scatter_entry_points() {
        assert_eq!(scatter_entry_point(None), "bucket_scatter");
        assert_eq!(
            scatter_entry_point(Some(DType::F32)),
            "bucket_scatter_by_f32"
        );
    }

    #[test]
    fn test_scatter_shader_key_only() {
        let source = generate_scatter_shader(None);
        assert!(source.contains("fn bucket_scatter"));
        assert!(!source.contains("values_in"));
        assert!(source.contains("@binding(6) var<uniform> count"));
    }

    #[test]
    fn test_scatter_shader_with_values() {
        let source = generate_scatter_shader(Some(DType::I32));
        assert!(source.contains("fn bucket_scatter_by_i32"));
        assert!(source.contains("var<storage, read_write> values_in: array<i32>"));
        assert!(source.contains("local_source_indices"));
        assert!(source.contains("@binding(8) var<uniform> count"));
    }
}
