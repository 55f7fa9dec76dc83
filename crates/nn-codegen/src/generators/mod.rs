//! One generator per marker. Each appends complete lines to the output.

mod functions;
mod partition;
mod screening;
mod system;
mod tables;
mod tabular;

use std::fmt::Write as _;

use crate::error::{EmitError, EmitResult};
use crate::marker::{Generator, Marker};

pub fn for_marker(marker: Marker) -> Generator {
    match marker {
        Marker::NratReaclib => tables::nrat_reaclib,
        Marker::NratTabular => tables::nrat_tabular,
        Marker::Nrxn => tables::nrxn,
        Marker::RateNames => tables::rate_names,
        Marker::Ebind => tables::ebind,
        Marker::ComputeScreeningFactors => screening::compute_screening_factors,
        Marker::TableNum => tabular::table_num,
        Marker::DeclareTables => tabular::declare_tables,
        Marker::TableDeclareMeta => tabular::table_declare_meta,
        Marker::TableInitMeta => tabular::table_init_meta,
        Marker::ComputeTabularRates => tabular::compute_tabular_rates,
        Marker::Ydot => system::ydot,
        Marker::EnucAddEnergyRate => tables::enuc_add_energy_rate,
        Marker::Jacnuc => system::jacnuc,
        Marker::InitialMassFractions => tables::initial_mass_fractions,
        Marker::ReaclibRateFunctions => functions::reaclib_rate_functions,
        Marker::RateStruct => functions::rate_struct,
        Marker::FillReaclibRates => functions::fill_reaclib_rates,
        Marker::ApproxRateFunctions => functions::approx_rate_functions,
        Marker::FillApproxRates => functions::fill_approx_rates,
        Marker::PartFunData => partition::part_fun_data,
        Marker::PartFunCases => partition::part_fun_cases,
        Marker::SpinStateCases => partition::spin_state_cases,
        Marker::NumScreenCalls => screening::num_screen_calls,
    }
}

/// Append `text` at `ind` followed by a newline.
pub(crate) fn line(out: &mut String, ind: &str, text: impl std::fmt::Display) {
    let _ = writeln!(out, "{ind}{text}");
}

pub(crate) fn top_level_only(marker: Marker, indent: usize) -> EmitResult<()> {
    if indent != 0 {
        return Err(EmitError::TopLevelOnly {
            marker: marker.token(),
            indent,
        });
    }
    Ok(())
}

/// `2.0_rt`
pub(crate) fn rt(v: nn_core::Real) -> String {
    format!("{}_rt", nn_core::real_literal(v))
}
