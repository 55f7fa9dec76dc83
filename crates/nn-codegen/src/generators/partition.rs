//! Partition-function tables, their dispatch, and spin-state dispatch.

use nn_core::{Nuclide, real_literal};

use super::line;
use crate::context::EmitContext;
use crate::error::EmitResult;

const PF_DECL: &str = "MICROPHYSICS_UNUSED HIP_CONSTEXPR static AMREX_GPU_MANAGED amrex::Real";
const PER_LINE: usize = 5;

fn batched(out: &mut String, ind: &str, values: impl Iterator<Item = f64>) {
    let values: Vec<String> = values.map(|v| format!("{},", real_literal(v))).collect();
    for chunk in values.chunks(PER_LINE) {
        line(out, ind, chunk.join(" "));
    }
}

/// Shared T9 grids, then log10 of each nuclide's partition function.
pub(crate) fn part_fun_data(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    let inner = ctx.indent(n + 1);
    let (grids, indices) = ctx.graph().dedupe_partition_function_temperatures();

    for (i, temp) in grids.iter().enumerate() {
        let k = i + 1;
        line(out, &ind, format_args!("constexpr int npts_{k} = {};\n", temp.len()));
        line(out, &ind, "// this is T9\n");
        line(out, &ind, format_args!("{PF_DECL} temp_array_{k}[npts_{k}] = {{"));
        batched(out, &inner, temp.iter().map(|t| t / 1.0e9));
        line(out, &ind, "};\n");
        if k == grids.len() {
            out.push('\n');
        }
    }

    for (nuc, i) in &indices {
        let Some(pf) = nuc.partition_function() else {
            continue;
        };
        line(out, &ind, "// this is log10(partition function)\n");
        line(
            out,
            &ind,
            format_args!("{PF_DECL} {}_pf_array[npts_{}] = {{", nuc.name(), i + 1),
        );
        batched(out, &inner, pf.log10_values().iter().copied());
        line(out, &ind, "};\n");
    }
    Ok(())
}

pub(crate) fn part_fun_cases(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    let inner = ctx.indent(n + 1);
    let (_, indices) = ctx.graph().dedupe_partition_function_temperatures();
    for (nuc, i) in &indices {
        let k = i + 1;
        line(out, &ind, format_args!("case {}:", nuc.cindex()));
        line(
            out,
            &inner,
            format_args!(
                "part_fun::interpolate_pf<part_fun::npts_{k}>(tfactors.T9, part_fun::temp_array_{k}, part_fun::{}_pf_array, pf, dpf_dT);",
                nuc.name()
            ),
        );
        line(out, &inner, "break;\n");
    }
    Ok(())
}

/// Nuclides with the same spin share one `case` group; nuclides with no
/// known spin are left to the default branch.
pub(crate) fn spin_state_cases(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    let inner = ctx.indent(n + 1);
    let graph = ctx.graph();

    let mut nuclides: Vec<&Nuclide> = graph
        .nuclides()
        .iter()
        .chain(graph.approx_nuclides())
        .filter(|nuc| nuc.spin_states().is_some())
        .collect();
    nuclides.sort_by_key(|nuc| nuc.spin_states());

    for group in nuclides.chunk_by(|a, b| a.spin_states() == b.spin_states()) {
        let Some(spin) = group.first().and_then(|nuc| nuc.spin_states()) else {
            continue;
        };
        for nuc in group {
            line(out, &ind, format_args!("case {}:", nuc.cindex()));
        }
        line(out, &inner, format_args!("spin = {spin};"));
        line(out, &inner, "break;\n");
    }
    Ok(())
}
