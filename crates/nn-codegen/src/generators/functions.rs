//! Per-rate C++ functions and the calls that fill the rate arrays.
//!
//! REACLIB and derived rates get a function summing their fitted sets in log
//! space; derived rates that use partition functions are then scaled by
//! `z_r / z_p`. Approximate rates get a function combining the screened
//! constituent rates. Custom rates are supplied by the target code base and
//! get no function here.

use std::fmt::Write as _;

use nn_core::{ApproxRole, Nuclide, Rate, RateKind, ReaclibSet, Real, real_literal};
use nn_graph::RateEntry;

use super::{line, top_level_only};
use crate::context::EmitContext;
use crate::error::{EmitError, EmitResult};
use crate::marker::Marker;

const BODY: &str = "    ";
const NESTED: &str = "        ";

fn reaclib_like<'g>(ctx: &EmitContext<'g>) -> impl Iterator<Item = &'g RateEntry> + 'g {
    let graph = ctx.graph();
    graph
        .entries_of_kind(RateKind::Reaclib)
        .chain(graph.entries_of_kind(RateKind::Derived))
}

pub(crate) fn rate_struct(_ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    top_level_only(Marker::RateStruct, n)?;
    out.push_str("struct rate_t {\n");
    out.push_str("    Array1D<Real, 1, NumRates>  screened_rates;\n");
    out.push_str("    Real enuc_weak;\n");
    out.push_str("};\n\n");
    out.push_str("struct rate_derivs_t {\n");
    out.push_str("    Array1D<Real, 1, NumRates>  screened_rates;\n");
    out.push_str("    Array1D<Real, 1, NumRates>  dscreened_rates_dT;\n");
    out.push_str("    Real enuc_weak;\n");
    out.push_str("};\n\n");
    Ok(())
}

pub(crate) fn reaclib_rate_functions(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    top_level_only(Marker::ReaclibRateFunctions, n)?;
    for entry in reaclib_like(ctx) {
        reaclib_function(ctx, entry, out);
    }
    Ok(())
}

/// `ln_set_rate` for one set; zero coefficients are left out.
fn ln_rate_expr(a: &[Real; 7]) -> String {
    const BASIS: [&str; 6] = [
        "tfactors.T9i",
        "tfactors.T913i",
        "tfactors.T913",
        "tfactors.T9",
        "tfactors.T953",
        "tfactors.lnT9",
    ];
    let mut out = real_literal(a[0]);
    for (coeff, basis) in a[1..].iter().zip(BASIS) {
        if *coeff != 0.0 {
            let _ = write!(out, " + {} * {basis}", real_literal(*coeff));
        }
    }
    out
}

/// d(ln_set_rate)/dT9 for one set.
fn dln_rate_expr(a: &[Real; 7]) -> String {
    let mut terms = Vec::new();
    if a[1] != 0.0 {
        terms.push(format!("{} * tfactors.T9i * tfactors.T9i", real_literal(-a[1])));
    }
    if a[2] != 0.0 {
        terms.push(format!("-(1.0/3.0) * {} * tfactors.T943i", real_literal(a[2])));
    }
    if a[3] != 0.0 {
        terms.push(format!("(1.0/3.0) * {} * tfactors.T923i", real_literal(a[3])));
    }
    if a[4] != 0.0 {
        terms.push(real_literal(a[4]));
    }
    if a[5] != 0.0 {
        terms.push(format!("(5.0/3.0) * {} * tfactors.T923", real_literal(a[5])));
    }
    if a[6] != 0.0 {
        terms.push(format!("{} * tfactors.T9i", real_literal(a[6])));
    }
    if terms.is_empty() {
        return "0.0".into();
    }
    terms.join(" + ")
}

fn reaclib_set(set: &ReaclibSet, out: &mut String) {
    line(out, BODY, format_args!("// {}", set.label));
    line(out, BODY, format_args!("ln_set_rate = {};\n", ln_rate_expr(&set.a)));
    line(out, BODY, "if constexpr (do_T_derivatives) {");
    line(out, NESTED, format_args!("dln_set_rate_dT9 = {};", dln_rate_expr(&set.a)));
    line(out, BODY, "}\n");
    line(out, BODY, "// avoid underflows by zeroing rates in [0.0, 1.e-100]");
    line(out, BODY, "ln_set_rate = std::max(ln_set_rate, -230.0);");
    line(out, BODY, "set_rate = std::exp(ln_set_rate);");
    line(out, BODY, "rate += set_rate;");
    line(out, BODY, "if constexpr (do_T_derivatives) {");
    line(out, NESTED, "drate_dT += set_rate * dln_set_rate_dT9 / 1.0e9;");
    line(out, BODY, "}\n");
}

fn reaclib_function(ctx: &EmitContext<'_>, entry: &RateEntry, out: &mut String) {
    let config = ctx.config();
    let dtype = &config.dtype;
    let rate = entry.rate.as_ref();

    line(out, "", "template <int do_T_derivatives>");
    line(out, "", &config.function_specifier);
    line(
        out,
        "",
        format_args!(
            "void rate_{}(const tf_t& tfactors, {dtype}& rate, {dtype}& drate_dT) {{\n",
            entry.name()
        ),
    );
    line(out, BODY, format_args!("// {}\n", rate.reaction().equation()));
    line(out, BODY, "rate = 0.0;");
    line(out, BODY, "drate_dT = 0.0;\n");
    line(out, BODY, format_args!("{dtype} ln_set_rate{{0.0}};"));
    line(out, BODY, format_args!("{dtype} dln_set_rate_dT9{{0.0}};"));
    line(out, BODY, format_args!("{dtype} set_rate{{0.0}};\n"));

    for set in rate.reaclib_sets() {
        reaclib_set(set, out);
    }

    if rate.kind() == RateKind::Derived && rate.uses_partition_functions() {
        out.push('\n');
        partition_correction(rate, dtype, out);
    }
    out.push_str("}\n\n");
}

/// Scale a derived rate by `prod(pf(products)) / prod(pf(reactants))`.
fn partition_correction(rate: &dyn Rate, dtype: &str, out: &mut String) {
    let mut seen: Vec<&Nuclide> = Vec::new();
    for nuc in rate.reactants().iter().chain(rate.products()) {
        if seen.contains(&nuc) {
            continue;
        }
        seen.push(nuc);
        let name = nuc.name();
        line(out, BODY, format_args!("{dtype} {name}_pf, d{name}_pf_dT;"));
        if nuc.partition_function().is_some() {
            line(out, BODY, format_args!("// interpolating {name} partition function"));
            line(
                out,
                BODY,
                format_args!(
                    "get_partition_function({}, tfactors, {name}_pf, d{name}_pf_dT);\n",
                    nuc.cindex()
                ),
            );
        } else {
            line(
                out,
                BODY,
                format_args!("// setting {name} partition function to 1.0 by default, independent of T"),
            );
            line(out, BODY, format_args!("{name}_pf = 1.0_rt;"));
            line(out, BODY, format_args!("d{name}_pf_dT = 0.0_rt;\n"));
        }
    }

    line(out, BODY, format_args!("{dtype} z_r = {};", pf_product(rate.products())));
    line(out, BODY, format_args!("{dtype} z_p = {};\n", pf_product(rate.reactants())));
    line(out, BODY, format_args!("{dtype} dz_r_dT = {};", pf_product_derivative(rate.products())));
    line(out, BODY, format_args!("{dtype} dz_p_dT = {};\n", pf_product_derivative(rate.reactants())));
    line(
        out,
        BODY,
        format_args!("{dtype} dzterm_dT = (z_p * dz_r_dT - z_r * dz_p_dT) / (z_p * z_p);\n"),
    );
    line(out, BODY, "drate_dT = dzterm_dT * rate + drate_dT * (z_r / z_p);");
    line(out, BODY, "rate *= z_r/z_p;\n");
}

fn pf_product(nucs: &[Nuclide]) -> String {
    if nucs.is_empty() {
        return "1.0_rt".into();
    }
    nucs.iter()
        .map(|n| format!("{}_pf", n.name()))
        .collect::<Vec<_>>()
        .join(" * ")
}

/// Product rule over `pf_product(nucs)`.
fn pf_product_derivative(nucs: &[Nuclide]) -> String {
    if nucs.is_empty() {
        return "0.0_rt".into();
    }
    (0..nucs.len())
        .map(|i| {
            nucs.iter()
                .enumerate()
                .map(|(j, n)| {
                    if i == j {
                        format!("d{}_pf_dT", n.name())
                    } else {
                        format!("{}_pf", n.name())
                    }
                })
                .collect::<Vec<_>>()
                .join(" * ")
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

pub(crate) fn approx_rate_functions(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    top_level_only(Marker::ApproxRateFunctions, n)?;
    for entry in ctx.graph().entries_of_kind(RateKind::Approximate) {
        approx_function(ctx, entry, out)?;
    }
    Ok(())
}

fn approx_function(ctx: &EmitContext<'_>, entry: &RateEntry, out: &mut String) -> EmitResult<()> {
    let config = ctx.config();
    let dtype = &config.dtype;
    let Some(approx) = entry.rate.as_approximate() else {
        return Err(EmitError::UnsupportedRate {
            marker: Marker::ApproxRateFunctions.token(),
            rate: entry.name().to_string(),
            what: "approximate kind without constituents".into(),
        });
    };

    let mut children: Vec<(ApproxRole, &str)> = Vec::new();
    for role in approx.roles() {
        let child = approx.child(role);
        let Some(id) = ctx.graph().entry_for(child.as_ref()) else {
            return Err(EmitError::MissingState {
                marker: Marker::ApproxRateFunctions.token(),
                what: format!("constituent {} of {}", child.name(), entry.name()),
            });
        };
        children.push((role, ctx.graph().entry(id).name()));
    }

    line(out, "", "template <typename T>");
    line(out, "", &config.function_specifier);
    line(
        out,
        "",
        format_args!(
            "void rate_{}(const T& rate_eval, {dtype}& rate, {dtype}& drate_dT) {{\n",
            entry.name()
        ),
    );
    line(out, BODY, format_args!("// {}\n", entry.rate.reaction().equation()));
    for (role, name) in &children {
        line(
            out,
            BODY,
            format_args!("{dtype} r_{} = rate_eval.screened_rates(k_{name});", role.stem()),
        );
    }
    out.push('\n');
    line(out, BODY, format_args!("{dtype} dd = 1.0_rt / (r_pg + r_pa);\n"));

    // direct channel + branch through the intermediate
    let (direct, first, second) = if approx.is_reverse() {
        ("ga", "pa", "gp")
    } else {
        ("ag", "ap", "pg")
    };
    line(out, BODY, format_args!("rate = r_{direct} + r_{first} * r_{second} * dd;\n"));

    line(out, BODY, "if constexpr (std::is_same<T, rate_derivs_t>::value) {");
    for (role, name) in &children {
        line(
            out,
            NESTED,
            format_args!(
                "{dtype} drdT_{} = rate_eval.dscreened_rates_dT(k_{name});",
                role.stem()
            ),
        );
    }
    line(
        out,
        NESTED,
        format_args!(
            "drate_dT = drdT_{direct} + drdT_{first} * r_{second} * dd + r_{first} * drdT_{second} * dd - r_{first} * r_{second} * dd * dd * (drdT_pg + drdT_pa);"
        ),
    );
    line(out, BODY, "}");
    out.push_str("}\n\n");
    Ok(())
}

fn fill(out: &mut String, ind: &str, call: &str, name: &str) {
    line(out, ind, format_args!("rate_{name}{call};"));
    line(out, ind, format_args!("rate_eval.screened_rates(k_{name}) = rate;"));
    line(out, ind, "if constexpr (std::is_same<T, rate_derivs_t>::value) {");
    line(out, ind, format_args!("    rate_eval.dscreened_rates_dT(k_{name}) = drate_dT;\n"));
    line(out, ind, "}");
}

pub(crate) fn fill_reaclib_rates(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for entry in reaclib_like(ctx) {
        fill(out, &ind, "<do_T_derivatives>(tfactors, rate, drate_dT)", entry.name());
    }
    Ok(())
}

pub(crate) fn fill_approx_rates(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for entry in ctx.graph().entries_of_kind(RateKind::Approximate) {
        fill(out, &ind, "<T>(rate_eval, rate, drate_dT)", entry.name());
    }
    Ok(())
}
