//! Project schema definitions.
//!
//! Nuclides are referenced everywhere by their short name (`p`, `n`,
//! `He4`, `Mg24`), derived from symbol and mass number.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub nuclides: Vec<NuclideDef>,
    #[serde(default)]
    pub rates: Vec<RateDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approximations: Vec<ApproxDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inert: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_duplicates: Vec<LinkDef>,
    #[serde(default)]
    pub screening: ScreeningDef,
    #[serde(default)]
    pub output: OutputDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NuclideDef {
    /// Element symbol; `n` for the neutron.
    pub symbol: String,
    pub z: u32,
    pub a: u32,
    /// MeV per nucleon.
    #[serde(default)]
    pub binding_energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_states: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_function: Option<PartitionFunctionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionFunctionDef {
    /// K
    pub temperature: Vec<f64>,
    pub log10_values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateDef {
    /// Overrides the name built from the endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    /// MeV; defaults to the binding-energy difference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub weak_type: WeakTypeDef,
    pub law: RateLawDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeakTypeDef {
    #[default]
    None,
    BetaDecay,
    ElectronCapture,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateLawDef {
    Reaclib {
        sets: Vec<ReaclibSetDef>,
    },
    Derived {
        sets: Vec<ReaclibSetDef>,
        #[serde(default)]
        use_pf: bool,
    },
    Constant {
        value: f64,
    },
    Tabular(TableDef),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReaclibSetDef {
    pub label: String,
    pub a: [f64; 7],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDef {
    /// Relative paths are taken from the project file's directory.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    pub table_file: String,
    pub index_name: String,
    pub temp_points: usize,
    pub rhoy_points: usize,
    pub num_vars: usize,
    #[serde(default)]
    pub header_lines: usize,
    /// In-memory data for direct evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<TableGridDef>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableGridDef {
    pub log_rhoy: Vec<f64>,
    pub log_t: Vec<f64>,
    /// Row-major in (rhoy, temperature).
    pub log_rate: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApproxDef {
    /// Fold A(a,g)B with A(a,p)X(p,g)B, optionally only through these X.
    ApPg {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intermediates: Option<Vec<String>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub reactants: Vec<String>,
    pub products: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreeningDef {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub symmetric: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for ScreeningDef {
    fn default() -> Self {
        Self {
            enabled: true,
            symmetric: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OutputDef {
    #[serde(default)]
    pub templates: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_specifier: Option<String>,
}

/// A thermodynamic point for evaluation and rate-importance scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionDef {
    /// g/cm^3
    pub rho: f64,
    /// K
    pub temp: f64,
    /// Mass fractions by nuclide name; empty means equal fractions.
    #[serde(default)]
    pub mass_fractions: BTreeMap<String, f64>,
}
