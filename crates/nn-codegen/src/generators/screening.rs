//! Screening-factor block: one scoped factor per group, then the products
//! into every member rate's screened coefficient and its T derivative.

use nn_core::RateId;
use nn_screening::{ScreeningGroup, ScreeningStep};

use super::{line, rt};
use crate::context::EmitContext;
use crate::error::EmitResult;

pub(crate) fn compute_screening_factors(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let plan = ctx.screening();
    let ind = ctx.indent(n);
    let inner = ctx.indent(n + 1);

    for step in plan.steps()? {
        match step {
            ScreeningStep::Apply { group } => {
                let group = &plan.groups()[group];
                factor_block(out, &ind, &inner, group, "scn_fac", "scor", "dscor_dt");
                out.push_str(&format!("{ind}}}\n\n"));
                for &id in &group.rates {
                    apply_single(ctx, out, &ind, id);
                }
            }
            ScreeningStep::TripleAlphaFirst { group } => {
                // held for the second leg
                let group = &plan.groups()[group];
                factor_block(out, &ind, &inner, group, "scn_fac", "scor", "dscor_dt");
                out.push_str(&format!("{ind}}}\n\n"));
            }
            ScreeningStep::TripleAlphaSecond { group } => {
                let group = &plan.groups()[group];
                factor_block(out, &ind, &inner, group, "scn_fac2", "scor2", "dscor2_dt");
                out.push_str(&format!("\n{ind}}}\n\n"));
                for &id in &group.rates {
                    apply_double(ctx, out, &ind, id);
                }
            }
        }
        out.push('\n');
    }
    Ok(())
}

fn factor_block(
    out: &mut String,
    ind: &str,
    inner: &str,
    group: &ScreeningGroup,
    fac: &str,
    scor: &str,
    dscor: &str,
) {
    let z1 = f64::from(group.n1.z());
    let a1 = f64::from(group.n1.a());
    let z2 = f64::from(group.n2.z());
    let a2 = f64::from(group.n2.a());
    let args = format!("{}, {}, {}, {}", rt(z1), rt(a1), rt(z2), rt(a2));

    out.push_str(&format!("\n{ind}{{"));
    out.push_str(&format!(
        "\n{inner}constexpr auto {fac} = scrn::calculate_screen_factor({args});\n\n"
    ));
    out.push_str(&format!("\n{inner}static_assert({fac}.z1 == {});\n\n", rt(z1)));
    out.push_str(&format!(
        "\n{inner}actual_screen<do_T_derivatives>(pstate, {fac}, {scor}, {dscor});\n"
    ));
}

fn apply_single(ctx: &EmitContext<'_>, out: &mut String, ind: &str, id: RateId) {
    let k = ctx.graph().entry(id).name();
    out.push('\n');
    line(out, ind, format_args!("ratraw = rate_eval.screened_rates(k_{k});"));
    line(out, ind, format_args!("rate_eval.screened_rates(k_{k}) *= scor;"));
    line(out, ind, "if constexpr (std::is_same<T, rate_derivs_t>::value) {");
    line(out, ind, format_args!("    dratraw_dT = rate_eval.dscreened_rates_dT(k_{k});"));
    line(
        out,
        ind,
        format_args!("    rate_eval.dscreened_rates_dT(k_{k}) = ratraw * dscor_dt + dratraw_dT * scor;"),
    );
    line(out, ind, "}");
}

fn apply_double(ctx: &EmitContext<'_>, out: &mut String, ind: &str, id: RateId) {
    let k = ctx.graph().entry(id).name();
    out.push('\n');
    line(out, ind, format_args!("ratraw = rate_eval.screened_rates(k_{k});"));
    line(out, ind, format_args!("rate_eval.screened_rates(k_{k}) *= scor * scor2;"));
    line(out, ind, "if constexpr (std::is_same<T, rate_derivs_t>::value) {");
    line(out, ind, format_args!("    dratraw_dT = rate_eval.dscreened_rates_dT(k_{k});"));
    line(
        out,
        ind,
        format_args!(
            "    rate_eval.dscreened_rates_dT(k_{k}) = ratraw * (scor * dscor2_dt + dscor_dt * scor2) + dratraw_dT * scor * scor2;"
        ),
    );
    line(out, ind, "}");
}

/// Size of the screening-call arrays in the generated code.
pub(crate) fn num_screen_calls(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let count = ctx.screening().effective_group_count();
    line(out, &ctx.indent(n), format_args!("const int num_screen_calls = {count};"));
    Ok(())
}
