//! nn-core: shared foundation for the nuclear network tools.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for graph objects)
//! - error (shared error types)
//! - nuclide (nuclide identity, binding energy, spin, partition functions)
//! - rate (the `Rate` trait) and the concrete rate kinds
//! - composition (mass fractions and derived quantities)

pub mod approximate;
pub mod composition;
pub mod custom;
pub mod derived;
pub mod error;
pub mod ids;
pub mod nuclide;
pub mod numeric;
pub mod rate;
pub mod reaclib;
pub mod tabular;

pub use approximate::{ApproxRole, ApproxType, ApproximateRate};
pub use composition::Composition;
pub use custom::{CustomRate, RateLaw};
pub use derived::DerivedRate;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use nuclide::{Nuclide, PartitionFunction};
pub use numeric::*;
pub use rate::{
    LinkKey, Rate, RateHandle, RateKey, RateKind, Reaction, WeakType, identical_particle_factor,
    link_name,
};
pub use reaclib::{ReaclibRate, ReaclibSet};
pub use tabular::{TableGrid, TableMeta, TabularRate};
