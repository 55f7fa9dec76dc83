//! Mass-fraction composition of a network's nuclides.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::nuclide::Nuclide;
use crate::numeric::Real;

/// Mass fractions keyed by nuclide, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    items: Vec<(Nuclide, Real)>,
}

impl Composition {
    /// Every nuclide starts at `small`.
    pub fn new(nuclides: impl IntoIterator<Item = Nuclide>, small: Real) -> Self {
        let mut items: Vec<(Nuclide, Real)> = Vec::new();
        for n in nuclides {
            if !items.iter().any(|(k, _)| *k == n) {
                items.push((n, small));
            }
        }
        Self { items }
    }

    /// Build from explicit mass fractions, rejecting negative or non-finite entries.
    pub fn from_mass_fractions(fractions: Vec<(Nuclide, Real)>) -> CoreResult<Self> {
        if fractions.is_empty() {
            return Err(CoreError::InvalidArg {
                what: "empty composition".into(),
            });
        }
        let mut comp = Self { items: Vec::new() };
        for (n, x) in fractions {
            comp.set_nuc(n, x)?;
        }
        Ok(comp)
    }

    pub fn set_nuc(&mut self, nuc: Nuclide, x: Real) -> CoreResult<()> {
        if !x.is_finite() {
            return Err(CoreError::NonFinite {
                what: "mass fraction",
                value: x,
            });
        }
        if x < 0.0 {
            return Err(CoreError::InvalidArg {
                what: format!("negative mass fraction {x} for {nuc}"),
            });
        }
        match self.items.iter_mut().find(|(k, _)| *k == nuc) {
            Some((_, slot)) => *slot = x,
            None => self.items.push((nuc, x)),
        }
        Ok(())
    }

    pub fn set_all(&mut self, x: Real) {
        for (_, v) in &mut self.items {
            *v = x;
        }
    }

    pub fn set_equal(&mut self) {
        let x = 1.0 / self.items.len().max(1) as Real;
        self.set_all(x);
    }

    pub fn sum_x(&self) -> Real {
        self.items.iter().map(|(_, x)| x).sum()
    }

    /// Rescale so the mass fractions sum to one.
    pub fn normalize(&mut self) -> CoreResult<()> {
        let sum = self.sum_x();
        if sum <= 0.0 || !sum.is_finite() {
            return Err(CoreError::InvalidArg {
                what: "mass fractions sum to zero or non-finite".into(),
            });
        }
        for (_, v) in &mut self.items {
            *v /= sum;
        }
        Ok(())
    }

    /// Mass fraction of `nuc`, zero if absent.
    pub fn mass_fraction(&self, nuc: &Nuclide) -> Real {
        self.items
            .iter()
            .find(|(k, _)| k == nuc)
            .map_or(0.0, |(_, x)| *x)
    }

    /// Molar abundance `Y = X / A`.
    pub fn molar_fraction(&self, nuc: &Nuclide) -> Real {
        self.mass_fraction(nuc) / Real::from(nuc.a())
    }

    pub fn molar(&self) -> HashMap<Nuclide, Real> {
        self.items
            .iter()
            .map(|(n, x)| (n.clone(), x / Real::from(n.a())))
            .collect()
    }

    /// Electron fraction `sum(X Z/A) / sum(X)`.
    pub fn ye(&self) -> Real {
        let num: Real = self
            .items
            .iter()
            .map(|(n, x)| x * Real::from(n.z()) / Real::from(n.a()))
            .sum();
        num / self.sum_x()
    }

    /// Mean molecular weight.
    pub fn abar(&self) -> Real {
        let inv: Real = self
            .items
            .iter()
            .map(|(n, x)| x / Real::from(n.a()))
            .sum();
        1.0 / inv
    }

    pub fn zbar(&self) -> Real {
        self.abar() * self.ye()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Nuclide, Real)> + '_ {
        self.items.iter().map(|(n, x)| (n, *x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    fn tol() -> Tolerances {
        Tolerances {
            abs: 1e-12,
            rel: 1e-12,
        }
    }

    #[test]
    fn equal_mix_of_he4_and_c12() {
        let mut comp = Composition::new([Nuclide::he4(), Nuclide::new("C", 6, 12)], 0.0);
        comp.set_equal();
        assert!(nearly_equal(comp.sum_x(), 1.0, tol()));
        assert!(nearly_equal(comp.ye(), 0.5, tol()));
        // 1 / (0.5/4 + 0.5/12)
        assert!(nearly_equal(comp.abar(), 6.0, tol()));
        assert!(nearly_equal(comp.zbar(), 3.0, tol()));
        assert!(nearly_equal(comp.molar_fraction(&Nuclide::he4()), 0.125, tol()));
    }

    #[test]
    fn rejects_negative() {
        let result = Composition::from_mass_fractions(vec![(Nuclide::proton(), -0.1)]);
        assert!(result.is_err());
    }

    #[test]
    fn normalize_zero_sum_fails() {
        let mut comp = Composition::new([Nuclide::proton()], 0.0);
        assert!(comp.normalize().is_err());
    }

    #[test]
    fn missing_nuclide_reads_zero() {
        let comp = Composition::new([Nuclide::proton()], 0.5);
        assert_eq!(comp.mass_fraction(&Nuclide::he4()), 0.0);
    }
}
