//! Template markers and the marker -> generator table.

use crate::context::EmitContext;
use crate::error::EmitResult;
use crate::generators;

/// Every injection point a template may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    NratReaclib,
    NratTabular,
    Nrxn,
    RateNames,
    Ebind,
    ComputeScreeningFactors,
    TableNum,
    DeclareTables,
    TableDeclareMeta,
    TableInitMeta,
    ComputeTabularRates,
    Ydot,
    EnucAddEnergyRate,
    Jacnuc,
    InitialMassFractions,
    ReaclibRateFunctions,
    RateStruct,
    FillReaclibRates,
    ApproxRateFunctions,
    FillApproxRates,
    PartFunData,
    PartFunCases,
    SpinStateCases,
    NumScreenCalls,
}

impl Marker {
    pub const ALL: [Marker; 24] = [
        Marker::NratReaclib,
        Marker::NratTabular,
        Marker::Nrxn,
        Marker::RateNames,
        Marker::Ebind,
        Marker::ComputeScreeningFactors,
        Marker::TableNum,
        Marker::DeclareTables,
        Marker::TableDeclareMeta,
        Marker::TableInitMeta,
        Marker::ComputeTabularRates,
        Marker::Ydot,
        Marker::EnucAddEnergyRate,
        Marker::Jacnuc,
        Marker::InitialMassFractions,
        Marker::ReaclibRateFunctions,
        Marker::RateStruct,
        Marker::FillReaclibRates,
        Marker::ApproxRateFunctions,
        Marker::FillApproxRates,
        Marker::PartFunData,
        Marker::PartFunCases,
        Marker::SpinStateCases,
        Marker::NumScreenCalls,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Marker::NratReaclib => "<nrat_reaclib>",
            Marker::NratTabular => "<nrat_tabular>",
            Marker::Nrxn => "<nrxn>",
            Marker::RateNames => "<rate_names>",
            Marker::Ebind => "<ebind>",
            Marker::ComputeScreeningFactors => "<compute_screening_factors>",
            Marker::TableNum => "<table_num>",
            Marker::DeclareTables => "<declare_tables>",
            Marker::TableDeclareMeta => "<table_declare_meta>",
            Marker::TableInitMeta => "<table_init_meta>",
            Marker::ComputeTabularRates => "<compute_tabular_rates>",
            Marker::Ydot => "<ydot>",
            Marker::EnucAddEnergyRate => "<enuc_add_energy_rate>",
            Marker::Jacnuc => "<jacnuc>",
            Marker::InitialMassFractions => "<initial_mass_fractions>",
            Marker::ReaclibRateFunctions => "<reaclib_rate_functions>",
            Marker::RateStruct => "<rate_struct>",
            Marker::FillReaclibRates => "<fill_reaclib_rates>",
            Marker::ApproxRateFunctions => "<approx_rate_functions>",
            Marker::FillApproxRates => "<fill_approx_rates>",
            Marker::PartFunData => "<part_fun_data>",
            Marker::PartFunCases => "<part_fun_cases>",
            Marker::SpinStateCases => "<spin_state_cases>",
            Marker::NumScreenCalls => "<num_screen_calls>",
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Writes the text for one marker occurrence at `indent` levels.
pub type Generator = fn(&EmitContext<'_>, usize, &mut String) -> EmitResult<()>;

#[derive(Debug, Clone, Copy)]
pub struct MarkerEntry {
    pub marker: Marker,
    pub generator: Generator,
}

/// Ordered marker registrations; the first entry whose token a line
/// contains handles that line.
#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    entries: Vec<MarkerEntry>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All markers with their C++ generators.
    pub fn cxx() -> Self {
        let mut table = Self::new();
        for marker in Marker::ALL {
            table.register(marker, generators::for_marker(marker));
        }
        table
    }

    pub fn register(&mut self, marker: Marker, generator: Generator) -> &mut Self {
        self.entries.push(MarkerEntry { marker, generator });
        self
    }

    pub fn entries(&self) -> &[MarkerEntry] {
        &self.entries
    }

    /// Registered entry whose token occurs in `line`.
    pub fn lookup(&self, line: &str) -> Option<&MarkerEntry> {
        self.entries.iter().find(|e| line.contains(e.marker.token()))
    }
}

/// Indent level of a stripped marker line `<token>(N)`.
pub fn parse_indent(stripped: &str, token: &str) -> Option<usize> {
    let digits = stripped
        .strip_prefix(token)?
        .strip_prefix('(')?
        .strip_suffix(')')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
