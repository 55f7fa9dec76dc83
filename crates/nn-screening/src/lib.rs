//! nn-screening: plasma screening of reaction rates.
//!
//! Provides:
//! - ScreeningPlan (ordered screening groups built from a rate graph)
//! - the triple-alpha two-factor rule as explicit screening steps
//! - PlasmaState / ScreeningProvider for numeric evaluation
//! - WeakScreening (Salpeter weak limit)

pub mod error;
pub mod group;
pub mod plan;
pub mod plasma;

pub use error::{ScreeningError, ScreeningResult};
pub use group::{ScreeningGroup, TRIPLE_ALPHA, TRIPLE_ALPHA_DUMMY};
pub use plan::{ScreeningFactors, ScreeningOptions, ScreeningPlan, ScreeningStep, screen_nuclides};
pub use plasma::{PlasmaState, ScreenFactor, ScreeningProvider, WeakScreening};
