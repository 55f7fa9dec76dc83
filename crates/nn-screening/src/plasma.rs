//! Plasma state and screening-factor providers.

use nn_core::{Composition, Nuclide, Real};

/// Thermodynamic and compositional averages the screening formulae need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaState {
    /// Temperature, K.
    pub temp: Real,
    /// Density, g/cm^3.
    pub dens: Real,
    /// Sum of molar abundances.
    pub ytot: Real,
    pub abar: Real,
    pub zbar: Real,
    pub z2bar: Real,
}

impl PlasmaState {
    /// Averages over `(nuclide, molar abundance)` pairs.
    pub fn new<'a>(temp: Real, dens: Real, molar: impl IntoIterator<Item = (&'a Nuclide, Real)>) -> Self {
        let (mut ytot, mut zy, mut z2y) = (0.0, 0.0, 0.0);
        for (nuc, y) in molar {
            let z = Real::from(nuc.z());
            ytot += y;
            zy += z * y;
            z2y += z * z * y;
        }
        let abar = if ytot > 0.0 { 1.0 / ytot } else { 0.0 };
        Self {
            temp,
            dens,
            ytot,
            abar,
            zbar: zy * abar,
            z2bar: z2y * abar,
        }
    }

    pub fn from_composition(temp: Real, dens: Real, comp: &Composition) -> Self {
        let molar: Vec<(&Nuclide, Real)> = comp
            .iter()
            .map(|(n, x)| (n, x / Real::from(n.a())))
            .collect();
        Self::new(temp, dens, molar)
    }
}

/// A screening enhancement and its temperature derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenFactor {
    pub value: Real,
    pub dvalue_dt: Real,
}

impl ScreenFactor {
    pub const UNITY: ScreenFactor = ScreenFactor {
        value: 1.0,
        dvalue_dt: 0.0,
    };

    /// Product of two factors, with the product rule for the derivative.
    pub fn combine(self, other: ScreenFactor) -> ScreenFactor {
        ScreenFactor {
            value: self.value * other.value,
            dvalue_dt: self.value * other.dvalue_dt + self.dvalue_dt * other.value,
        }
    }

    /// Screen a rate coefficient and its temperature derivative.
    pub fn apply(self, rate: Real, drate_dt: Real) -> (Real, Real) {
        (
            rate * self.value,
            rate * self.dvalue_dt + drate_dt * self.value,
        )
    }
}

/// Source of screening factors for a pair of nuclei.
pub trait ScreeningProvider {
    fn screen(&self, plasma: &PlasmaState, n1: &Nuclide, n2: &Nuclide) -> ScreenFactor;
}

/// Weak-screening (Salpeter) limit:
/// `H = 0.188 Z1 Z2 sqrt(rho * sum((Z^2 + Z) Y)) T6^-3/2`, factor `exp(H)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakScreening;

impl ScreeningProvider for WeakScreening {
    fn screen(&self, plasma: &PlasmaState, n1: &Nuclide, n2: &Nuclide) -> ScreenFactor {
        let zeta2 = plasma.ytot * (plasma.z2bar + plasma.zbar);
        let t6 = plasma.temp / 1.0e6;
        let h = 0.188
            * Real::from(n1.z())
            * Real::from(n2.z())
            * (plasma.dens * zeta2).sqrt()
            * t6.powf(-1.5);
        let value = h.exp();
        ScreenFactor {
            value,
            dvalue_dt: value * h * (-1.5 / plasma.temp),
        }
    }
}
