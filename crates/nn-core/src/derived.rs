//! Reverse rates obtained from a forward REACLIB fit by detailed balance.

use crate::nuclide::Nuclide;
use crate::numeric::Real;
use crate::rate::{Rate, RateKind, Reaction};
use crate::reaclib::{ReaclibRate, ReaclibSet};

/// A reverse rate whose sets were derived from a forward rate, optionally
/// corrected by the ratio of partition functions at run time.
#[derive(Debug, Clone)]
pub struct DerivedRate {
    inner: ReaclibRate,
    use_pf: bool,
}

impl DerivedRate {
    /// `reaction` names the derived direction; `sets` are already inverted.
    pub fn new(reaction: Reaction, sets: Vec<ReaclibSet>, use_pf: bool) -> Self {
        let reaction = if reaction.name().ends_with("_derived") {
            reaction
        } else {
            let name = format!("{}_derived", reaction.name());
            reaction.with_name(name)
        };
        Self {
            inner: ReaclibRate::new(reaction, sets),
            use_pf,
        }
    }

    pub fn use_pf(&self) -> bool {
        self.use_pf
    }

    /// `prod(pf(products)) / prod(pf(reactants))`; nuclides without a table count as 1.
    pub fn partition_ratio(&self, t: Real) -> Real {
        let product = |nucs: &[Nuclide]| -> Real {
            nucs.iter()
                .map(|n| n.partition_function().map_or(1.0, |pf| pf.eval(t)))
                .product()
        };
        product(self.products()) / product(self.reactants())
    }
}

impl Rate for DerivedRate {
    fn reaction(&self) -> &Reaction {
        self.inner.reaction()
    }

    fn kind(&self) -> RateKind {
        RateKind::Derived
    }

    fn eval(&self, t: Real, rho_ye: Real) -> Real {
        let base = self.inner.eval(t, rho_ye);
        if self.use_pf {
            base * self.partition_ratio(t)
        } else {
            base
        }
    }

    fn eval_dt(&self, t: Real, rho_ye: Real) -> Real {
        if self.use_pf {
            let h = 1.0e-6 * t.abs().max(1.0);
            (self.eval(t + h, rho_ye) - self.eval(t - h, rho_ye)) / (2.0 * h)
        } else {
            self.inner.eval_dt(t, rho_ye)
        }
    }

    fn reaclib_sets(&self) -> &[ReaclibSet] {
        self.inner.sets()
    }

    fn uses_partition_functions(&self) -> bool {
        self.use_pf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nuclide::PartitionFunction;

    #[test]
    fn name_gets_suffix_once() {
        let reaction = Reaction::new(
            vec![Nuclide::new("Ni", 28, 56)],
            vec![Nuclide::he4(), Nuclide::new("Fe", 26, 52)],
        );
        let r = DerivedRate::new(reaction, vec![], true);
        assert_eq!(r.name(), "Ni56_to_He4_Fe52_derived");
        let again = DerivedRate::new(r.reaction().clone(), vec![], true);
        assert_eq!(again.name(), "Ni56_to_He4_Fe52_derived");
    }

    #[test]
    fn partition_ratio_uses_tables() {
        let pf = PartitionFunction::new(vec![1.0e9, 1.0e10], vec![0.30103, 0.30103]).unwrap();
        let ni56 = Nuclide::new("Ni", 28, 56).with_partition_function(pf);
        let reaction = Reaction::new(vec![ni56], vec![Nuclide::he4(), Nuclide::new("Fe", 26, 52)]);
        let set = ReaclibSet::new("x", [0.0; 7]).unwrap();
        let r = DerivedRate::new(reaction, vec![set], true);
        assert!((r.partition_ratio(5.0e9) - 0.5).abs() < 1e-4);
        assert!((r.eval(5.0e9, 1.0) - 0.5).abs() < 1e-4);
    }
}
