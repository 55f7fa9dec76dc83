//! REACLIB-parameterised rates.

use crate::error::{CoreError, CoreResult};
use crate::nuclide::Nuclide;
use crate::numeric::Real;
use crate::rate::{Rate, RateKind, Reaction};

/// Floor applied to `ln(rate)` of each set before exponentiating.
pub const LN_RATE_FLOOR: Real = -230.0;

/// One REACLIB fit: `exp(a0 + a1/T9 + a2 T9^-1/3 + a3 T9^1/3 + a4 T9 + a5 T9^5/3 + a6 ln T9)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaclibSet {
    /// Source label, e.g. `ths8r`.
    pub label: String,
    pub a: [Real; 7],
}

impl ReaclibSet {
    pub fn new(label: impl Into<String>, a: [Real; 7]) -> CoreResult<Self> {
        if let Some(v) = a.iter().find(|v| !v.is_finite()) {
            return Err(CoreError::NonFinite {
                what: "reaclib coefficient",
                value: *v,
            });
        }
        Ok(Self {
            label: label.into(),
            a,
        })
    }

    pub fn ln_rate(&self, t9: Real) -> Real {
        let a = &self.a;
        a[0] + a[1] / t9 + a[2] * t9.powf(-1.0 / 3.0) + a[3] * t9.cbrt() + a[4] * t9
            + a[5] * t9.powf(5.0 / 3.0)
            + a[6] * t9.ln()
    }

    pub fn dln_rate_dt9(&self, t9: Real) -> Real {
        let a = &self.a;
        -a[1] / (t9 * t9) - a[2] / 3.0 * t9.powf(-4.0 / 3.0) + a[3] / 3.0 * t9.powf(-2.0 / 3.0)
            + a[4]
            + 5.0 / 3.0 * a[5] * t9.powf(2.0 / 3.0)
            + a[6] / t9
    }

    pub fn eval(&self, t9: Real) -> Real {
        self.ln_rate(t9).max(LN_RATE_FLOOR).exp()
    }
}

/// Rate given as a sum of REACLIB sets.
#[derive(Debug, Clone)]
pub struct ReaclibRate {
    reaction: Reaction,
    sets: Vec<ReaclibSet>,
}

impl ReaclibRate {
    pub fn new(reaction: Reaction, sets: Vec<ReaclibSet>) -> Self {
        Self { reaction, sets }
    }

    pub fn from_nuclides(
        reactants: Vec<Nuclide>,
        products: Vec<Nuclide>,
        sets: Vec<ReaclibSet>,
    ) -> Self {
        Self::new(Reaction::new(reactants, products), sets)
    }

    pub fn sets(&self) -> &[ReaclibSet] {
        &self.sets
    }

    pub(crate) fn eval_t9(&self, t9: Real) -> Real {
        self.sets.iter().map(|s| s.eval(t9)).sum()
    }

    pub(crate) fn eval_dt9(&self, t9: Real) -> Real {
        self.sets
            .iter()
            .filter(|s| s.ln_rate(t9) > LN_RATE_FLOOR)
            .map(|s| s.eval(t9) * s.dln_rate_dt9(t9))
            .sum()
    }
}

impl Rate for ReaclibRate {
    fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    fn kind(&self) -> RateKind {
        RateKind::Reaclib
    }

    fn eval(&self, t: Real, _rho_ye: Real) -> Real {
        self.eval_t9(t / 1.0e9)
    }

    fn eval_dt(&self, t: Real, _rho_ye: Real) -> Real {
        self.eval_dt9(t / 1.0e9) / 1.0e9
    }

    fn reaclib_sets(&self) -> &[ReaclibSet] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    fn c12_ag() -> ReaclibRate {
        // nac2 resonant set for C12(a,g)O16
        let set = ReaclibSet::new(
            "nac2",
            [69.6526, -1.39254, 58.9128, -148.273, 9.08324, -0.541041, 70.3554],
        )
        .unwrap();
        ReaclibRate::from_nuclides(
            vec![Nuclide::he4(), Nuclide::new("C", 6, 12)],
            vec![Nuclide::new("O", 8, 16)],
            vec![set],
        )
    }

    #[test]
    fn constant_set_evaluates_to_exp_a0() {
        let set = ReaclibSet::new("test", [2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let r = ReaclibRate::from_nuclides(vec![Nuclide::proton()], vec![Nuclide::neutron()], vec![set]);
        assert!((r.eval(3.0e9, 1.0) - 2.0_f64.exp()).abs() < 1e-12);
        assert_eq!(r.eval_dt(3.0e9, 1.0), 0.0);
    }

    #[test]
    fn analytic_derivative_matches_finite_difference() {
        let r = c12_ag();
        let t = 2.0e9;
        let h = 1.0e3;
        let fd = (r.eval(t + h, 0.0) - r.eval(t - h, 0.0)) / (2.0 * h);
        let tol = Tolerances {
            abs: 1e-30,
            rel: 1e-5,
        };
        assert!(nearly_equal(r.eval_dt(t, 0.0), fd, tol));
    }

    #[test]
    fn underflow_is_floored() {
        let set = ReaclibSet::new("low", [-500.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(set.eval(1.0), LN_RATE_FLOOR.exp());
    }

    #[test]
    fn rejects_nan_coefficients() {
        assert!(ReaclibSet::new("bad", [Real::NAN, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
    }
}
