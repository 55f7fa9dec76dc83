//! Rate counts, rate indices and per-nuclide constants.

use nn_core::RateKind;

use super::{line, rt};
use crate::context::EmitContext;
use crate::error::{EmitError, EmitResult};
use crate::marker::Marker;

pub(crate) fn nrat_reaclib(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let graph = ctx.graph();
    let count = graph.entries_of_kind(RateKind::Reaclib).count()
        + graph.entries_of_kind(RateKind::Derived).count();
    line(out, &ctx.indent(n), format_args!("const int NrateReaclib = {count};"));
    Ok(())
}

pub(crate) fn nrat_tabular(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let count = ctx.graph().entries_of_kind(RateKind::Tabular).count();
    line(out, &ctx.indent(n), format_args!("const int NrateTabular = {count};"));
    Ok(())
}

/// `k_<name> = <i>,` per entry, closed by `NumRates = k_<last>`.
pub(crate) fn nrxn(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    let entries = ctx.graph().entries();
    let Some(last) = entries.last() else {
        return Err(EmitError::MissingState {
            marker: Marker::Nrxn.token(),
            what: "at least one rate".into(),
        });
    };
    for (i, entry) in entries.iter().enumerate() {
        line(out, &ind, format_args!("k_{} = {},", entry.name(), i + 1));
    }
    line(out, &ind, format_args!("NumRates = k_{}", last.name()));
    Ok(())
}

pub(crate) fn rate_names(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    let entries = ctx.graph().entries();
    for (i, entry) in entries.iter().enumerate() {
        let cont = if i + 1 < entries.len() { "," } else { "" };
        line(out, &ind, format_args!("\"{}\"{cont}  // {},", entry.name(), i + 1));
    }
    Ok(())
}

pub(crate) fn ebind(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for nuc in ctx.graph().nuclides() {
        line(
            out,
            &ind,
            format_args!("ebind_per_nucleon({}) = {};", nuc.cindex(), rt(nuc.binding_energy())),
        );
    }
    Ok(())
}

/// Neutrino losses of tabular weak rates, charged to their single reactant.
pub(crate) fn enuc_add_energy_rate(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for entry in ctx.graph().entries_of_kind(RateKind::Tabular) {
        let reactants = entry.rate.reactants();
        let [reactant] = reactants else {
            return Err(EmitError::UnsupportedRate {
                marker: Marker::EnucAddEnergyRate.token(),
                rate: entry.name().to_string(),
                what: format!("{} reactants, energy accounting needs exactly one", reactants.len()),
            });
        };
        line(
            out,
            &ind,
            format_args!(
                "enuc += C::Legacy::n_A * Y({}) * rate_eval.add_energy_rate(k_{});",
                reactant.cindex(),
                entry.name()
            ),
        );
    }
    Ok(())
}

/// Unit-test composition: everything in the first nuclide.
pub(crate) fn initial_mass_fractions(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let ind = ctx.indent(n);
    for (i, _) in ctx.graph().nuclides().iter().enumerate() {
        let x = if i == 0 { "1.0" } else { "0.0" };
        line(out, &ind, format_args!("unit_test.X{} = {x}", i + 1));
    }
    Ok(())
}
