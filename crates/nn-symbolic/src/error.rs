//! Error types for symbolic composition and numeric evaluation.

use nn_core::CoreError;
use nn_graph::GraphError;
use nn_screening::ScreeningError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Screening error: {0}")]
    Screening(#[from] ScreeningError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Rate {rate} has constituent {child} outside the graph")]
    MissingConstituent { rate: String, child: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SymbolicResult<T> = Result<T, SymbolicError>;
