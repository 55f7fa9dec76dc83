//! Generation faults and resource warnings.

use std::path::PathBuf;

use nn_screening::ScreeningError;
use nn_symbolic::SymbolicError;
use thiserror::Error;

/// Faults that abort a generation run.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Malformed marker in {template}:{line}: {text:?}")]
    MalformedMarker {
        template: PathBuf,
        line: usize,
        text: String,
    },

    #[error("Marker {marker} needs {what}")]
    MissingState { marker: &'static str, what: String },

    #[error("Marker {marker} writes top-level definitions and must use indent 0, got {indent}")]
    TopLevelOnly { marker: &'static str, indent: usize },

    #[error("Marker {marker} cannot handle rate {rate}: {what}")]
    UnsupportedRate {
        marker: &'static str,
        rate: String,
        what: String,
    },

    #[error("Screening error: {0}")]
    Screening(#[from] ScreeningError),

    #[error("Symbolic error: {0}")]
    Symbolic(#[from] SymbolicError),

    #[error("Unable to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type EmitResult<T> = Result<T, EmitError>;

/// Recoverable conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitWarning {
    /// A tabular rate's data file is not where its metadata says.
    MissingTable { file: PathBuf },
}

impl std::fmt::Display for EmitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitWarning::MissingTable { file } => {
                write!(f, "Table data file {} not found", file.display())
            }
        }
    }
}
