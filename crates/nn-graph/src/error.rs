//! Graph construction errors.

use nn_core::{CoreError, LinkKey};
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// One reaction link claimed by more than one rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateLink {
    pub link: LinkKey,
    pub rates: Vec<String>,
}

/// Structural faults found while building a rate graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Duplicate rate names: {}", .names.join(", "))]
    DuplicateRateNames { names: Vec<String> },

    #[error("Duplicate reaction links: {}", describe_links(.links))]
    DuplicateLinks { links: Vec<DuplicateLink> },

    #[error("Approximate rate {approx} is missing constituent {child}")]
    MissingChildRate { approx: String, child: String },

    #[error("Unknown nuclide: {name}")]
    UnknownNuclide { name: String },

    #[error("Unknown rate: {name}")]
    UnknownRate { name: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn describe_links(links: &[DuplicateLink]) -> String {
    links
        .iter()
        .map(|d| format!("[{}] shared by {}", d.link, d.rates.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
