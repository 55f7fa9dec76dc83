//! Rates sharing one screening factor.

use nn_core::{Nuclide, RateId};

/// First leg of triple-alpha: He4 + He4.
pub const TRIPLE_ALPHA: &str = "He4_He4_He4";
/// Second leg of triple-alpha: He4 + Be8, keyed on a placeholder Be8.
pub const TRIPLE_ALPHA_DUMMY: &str = "He4_He4_He4_dummy";

/// A screened nuclide pair and the rates whose coefficients it multiplies.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningGroup {
    pub name: String,
    pub n1: Nuclide,
    pub n2: Nuclide,
    pub rates: Vec<RateId>,
}

impl ScreeningGroup {
    pub fn new(name: impl Into<String>, n1: Nuclide, n2: Nuclide) -> Self {
        Self {
            name: name.into(),
            n1,
            n2,
            rates: Vec::new(),
        }
    }

    pub fn with_rate(mut self, id: RateId) -> Self {
        self.add_rate(id);
        self
    }

    /// Add `id` unless it is already in the group.
    pub fn add_rate(&mut self, id: RateId) {
        if !self.rates.contains(&id) {
            self.rates.push(id);
        }
    }

    /// Either side is a placeholder nucleus.
    pub fn has_dummy(&self) -> bool {
        self.n1.is_dummy() || self.n2.is_dummy()
    }

    pub fn is_triple_alpha(&self) -> bool {
        self.name == TRIPLE_ALPHA
    }

    pub fn is_triple_alpha_dummy(&self) -> bool {
        self.name == TRIPLE_ALPHA_DUMMY
    }
}
