//! Rates with a caller-supplied rate law.

use core::fmt;
use std::sync::Arc;

use crate::numeric::Real;
use crate::rate::{Rate, RateKind, Reaction};

/// `(T, rho*Ye) -> coefficient`.
pub type RateLaw = Arc<dyn Fn(Real, Real) -> Real + Send + Sync>;

#[derive(Clone)]
pub struct CustomRate {
    reaction: Reaction,
    law: RateLaw,
}

impl CustomRate {
    pub fn new(reaction: Reaction, law: RateLaw) -> Self {
        Self { reaction, law }
    }

    /// A rate whose coefficient does not depend on the thermodynamic state.
    pub fn constant(reaction: Reaction, value: Real) -> Self {
        Self::new(reaction, Arc::new(move |_, _| value))
    }
}

impl fmt::Debug for CustomRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRate")
            .field("reaction", &self.reaction)
            .finish_non_exhaustive()
    }
}

impl Rate for CustomRate {
    fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    fn kind(&self) -> RateKind {
        RateKind::Custom
    }

    fn eval(&self, t: Real, rho_ye: Real) -> Real {
        (self.law)(t, rho_ye)
    }
}
