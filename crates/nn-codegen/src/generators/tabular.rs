//! Declarations, setup and evaluation of table-driven rates.

use nn_core::{RateKind, TableMeta};
use nn_graph::RateEntry;

use super::line;
use crate::context::EmitContext;
use crate::error::{EmitError, EmitResult};
use crate::marker::Marker;

fn tables<'g>(ctx: &EmitContext<'g>, marker: Marker) -> EmitResult<Vec<(&'g RateEntry, &'g TableMeta)>> {
    ctx.graph()
        .entries_of_kind(RateKind::Tabular)
        .map(|entry| match entry.rate.table() {
            Some(meta) => Ok((entry, meta)),
            None => Err(EmitError::UnsupportedRate {
                marker: marker.token(),
                rate: entry.name().to_string(),
                what: "tabular rate without table metadata".into(),
            }),
        })
        .collect()
}

pub(crate) fn table_num(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let count = ctx.graph().entries_of_kind(RateKind::Tabular).count();
    line(out, &ctx.indent(n), format_args!("const int num_tables = {count};"));
    Ok(())
}

fn storage(out: &mut String, ind: &str, prefix: &str, meta: &TableMeta) {
    let idx = &meta.index_name;
    let (temp, rhoy, vars) = (meta.temp_points, meta.rhoy_points, meta.num_vars);
    line(out, ind, format_args!("{prefix}AMREX_GPU_MANAGED table_t {idx}_meta;"));
    line(
        out,
        ind,
        format_args!("{prefix}AMREX_GPU_MANAGED Array3D<Real, 1, {temp}, 1, {rhoy}, 1, {vars}> {idx}_data;"),
    );
    line(out, ind, format_args!("{prefix}AMREX_GPU_MANAGED Array1D<Real, 1, {rhoy}> {idx}_rhoy;"));
    line(out, ind, format_args!("{prefix}AMREX_GPU_MANAGED Array1D<Real, 1, {temp}> {idx}_temp;"));
    out.push('\n');
}

pub(crate) fn declare_tables(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for (_, meta) in tables(ctx, Marker::DeclareTables)? {
        storage(out, &ind, "extern ", meta);
    }
    Ok(())
}

pub(crate) fn table_declare_meta(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for (_, meta) in tables(ctx, Marker::TableDeclareMeta)? {
        storage(out, &ind, "", meta);
    }
    Ok(())
}

pub(crate) fn table_init_meta(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for (_, meta) in tables(ctx, Marker::TableInitMeta)? {
        let idx = &meta.index_name;
        line(out, &ind, format_args!("{idx}_meta.ntemp = {};", meta.temp_points));
        line(out, &ind, format_args!("{idx}_meta.nrhoy = {};", meta.rhoy_points));
        line(out, &ind, format_args!("{idx}_meta.nvars = {};", meta.num_vars));
        line(out, &ind, format_args!("{idx}_meta.nheader = {};\n", meta.header_lines));
        line(
            out,
            &ind,
            format_args!(
                "init_tab_info({idx}_meta, \"{}\", {idx}_rhoy, {idx}_temp, {idx}_data);\n",
                meta.table_file
            ),
        );
        out.push('\n');
    }
    Ok(())
}

pub(crate) fn compute_tabular_rates(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for (entry, meta) in tables(ctx, Marker::ComputeTabularRates)? {
        let idx = &meta.index_name;
        let k = entry.name();
        let Some(reactant) = entry.rate.reactants().first() else {
            return Err(EmitError::UnsupportedRate {
                marker: Marker::ComputeTabularRates.token(),
                rate: k.to_string(),
                what: "no reactant to charge the neutrino losses to".into(),
            });
        };
        line(
            out,
            &ind,
            format_args!("tabular_evaluate({idx}_meta, {idx}_rhoy, {idx}_temp, {idx}_data,"),
        );
        line(out, &ind, "                 rhoy, state.T, rate, drate_dt, edot_nu, edot_gamma);");
        line(out, &ind, format_args!("rate_eval.screened_rates(k_{k}) = rate;"));
        line(out, &ind, "if constexpr (std::is_same<T, rate_derivs_t>::value) {");
        line(out, &ind, format_args!("    rate_eval.dscreened_rates_dT(k_{k}) = drate_dt;"));
        line(out, &ind, "}");
        line(
            out,
            &ind,
            format_args!(
                "rate_eval.enuc_weak += C::Legacy::n_A * {}({}) * (edot_nu + edot_gamma);",
                ctx.config().names.abundance,
                reactant.cindex()
            ),
        );
        out.push('\n');
    }
    Ok(())
}
