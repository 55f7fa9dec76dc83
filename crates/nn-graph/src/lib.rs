//! nn-graph: rate/nuclide graph for nuclear reaction networks.
//!
//! Provides:
//! - `GraphBuilder`, which validates a flat rate set and freezes it into a `RateGraph`
//! - `RateGraph`: unique nuclides, emission-ordered rates, consumed/produced
//!   maps and forward/reverse rate pairs
//! - `RateCollection`, a mutable rate set that rebuilds its graph on every change
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nn_core::{CustomRate, Nuclide, Reaction};
//! use nn_graph::GraphBuilder;
//!
//! let decay = CustomRate::constant(
//!     Reaction::new(vec![Nuclide::neutron()], vec![Nuclide::proton()]).with_q(0.78),
//!     1.0 / 880.0,
//! );
//! let graph = GraphBuilder::new().add_rate(Arc::new(decay)).build().unwrap();
//!
//! assert_eq!(graph.nuclides().len(), 2);
//! assert_eq!(graph.rate_pairs().len(), 1);
//! ```

pub mod builder;
pub mod collection;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

pub use builder::GraphBuilder;
pub use collection::RateCollection;
pub use error::{DuplicateLink, GraphError, GraphResult};
pub use graph::{RateEntry, RateGraph, RatePair, Visibility, dedup};
pub use indexing::{NuclideIndex, RateIndex};
