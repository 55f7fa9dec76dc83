//! Composite rates that eliminate a short-lived intermediate nuclide.
//!
//! The only folding supported is `ap_pg`: A(a,g)B together with the
//! A(a,p)X(p,g)B channel through the intermediate X, in either direction.

use crate::error::{CoreError, CoreResult};
use crate::nuclide::Nuclide;
use crate::numeric::Real;
use crate::rate::{LinkKey, Rate, RateHandle, RateKind, Reaction, join_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproxType {
    ApPg,
}

/// Position of each constituent in [`ApproximateRate::children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproxRole {
    /// A(a,g)B
    Ag,
    /// A(a,p)X
    Ap,
    /// X(p,g)B
    Pg,
    /// B(g,a)A
    Ga,
    /// B(g,p)X
    Gp,
    /// X(p,a)A
    Pa,
}

impl ApproxRole {
    pub const ALL: [ApproxRole; 6] = [
        ApproxRole::Ag,
        ApproxRole::Ap,
        ApproxRole::Pg,
        ApproxRole::Ga,
        ApproxRole::Gp,
        ApproxRole::Pa,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Variable stem used for the constituent in generated code (`r_ag`).
    pub fn stem(self) -> &'static str {
        match self {
            ApproxRole::Ag => "ag",
            ApproxRole::Ap => "ap",
            ApproxRole::Pg => "pg",
            ApproxRole::Ga => "ga",
            ApproxRole::Gp => "gp",
            ApproxRole::Pa => "pa",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApproximateRate {
    reaction: Reaction,
    approx_type: ApproxType,
    intermediate: Nuclide,
    /// Constituents indexed by [`ApproxRole`].
    children: Vec<RateHandle>,
}

impl ApproximateRate {
    /// Fold A(a,g)B, A(a,p)X, X(p,g)B and the reverses B(g,a)A, B(g,p)X,
    /// X(p,a)A into one effective rate; `is_reverse` selects B -> A + He4.
    pub fn ap_pg(
        primary: RateHandle,
        secondary: [RateHandle; 2],
        primary_reverse: RateHandle,
        secondary_reverse: [RateHandle; 2],
        is_reverse: bool,
    ) -> CoreResult<Self> {
        let he4 = Nuclide::he4();
        let p = Nuclide::proton();

        let a = primary
            .reactants()
            .iter()
            .filter(|n| **n != he4)
            .max()
            .cloned()
            .ok_or_else(|| invalid(&*primary, "primary rate has no heavy reactant"))?;
        let b = match primary.products() {
            [b] => b.clone(),
            _ => return Err(invalid(&*primary, "primary rate must have a single product")),
        };
        let x = secondary[0]
            .products()
            .iter()
            .find(|n| **n != p)
            .cloned()
            .ok_or_else(|| invalid(&*secondary[0], "(a,p) rate has no intermediate product"))?;

        let a_he4 = [a.clone(), he4.clone()];
        let x_p = [x.clone(), p];
        let b_only = [b.clone()];
        let expected: [(&RateHandle, &[Nuclide], &[Nuclide]); 6] = [
            (&primary, &a_he4, &b_only),
            (&secondary[0], &a_he4, &x_p),
            (&secondary[1], &x_p, &b_only),
            (&primary_reverse, &b_only, &a_he4),
            (&secondary_reverse[0], &b_only, &x_p),
            (&secondary_reverse[1], &x_p, &a_he4),
        ];
        for (rate, reactants, products) in expected {
            if rate.link_key() != LinkKey::new(reactants, products) {
                return Err(invalid(&**rate, "does not fit the ap_pg chain"));
            }
        }

        let [ap, pg] = secondary;
        let [gp, pa] = secondary_reverse;
        let (reactants, products, q) = if is_reverse {
            (vec![b], a_he4.to_vec(), primary_reverse.q())
        } else {
            (a_he4.to_vec(), vec![b], primary.q())
        };
        let name = format!(
            "{}_to_{}_approx",
            join_names(&reactants, "_"),
            join_names(&products, "_")
        );
        let reaction = Reaction::new(reactants, products)
            .with_name(name)
            .with_q(q)
            .reversed(is_reverse);

        Ok(Self {
            reaction,
            approx_type: ApproxType::ApPg,
            intermediate: x,
            children: vec![primary, ap, pg, primary_reverse, gp, pa],
        })
    }

    pub fn approx_type(&self) -> ApproxType {
        self.approx_type
    }

    /// The eliminated nuclide X.
    pub fn intermediate(&self) -> &Nuclide {
        &self.intermediate
    }

    pub fn child(&self, role: ApproxRole) -> &RateHandle {
        &self.children[role.index()]
    }

    /// Roles read by the combination in the current direction.
    pub fn roles(&self) -> [ApproxRole; 4] {
        if self.is_reverse() {
            [ApproxRole::Ga, ApproxRole::Gp, ApproxRole::Pg, ApproxRole::Pa]
        } else {
            [ApproxRole::Ag, ApproxRole::Ap, ApproxRole::Pg, ApproxRole::Pa]
        }
    }

    /// Effective coefficient from constituent values indexed by [`ApproxRole`].
    ///
    /// forward: `r_ag + r_ap r_pg / (r_pg + r_pa)`;
    /// reverse: `r_ga + r_pa r_gp / (r_pg + r_pa)`.
    pub fn combine(&self, r: &[Real; 6]) -> Real {
        let dd = 1.0 / (r[ApproxRole::Pg.index()] + r[ApproxRole::Pa.index()]);
        if self.is_reverse() {
            r[ApproxRole::Ga.index()] + r[ApproxRole::Pa.index()] * r[ApproxRole::Gp.index()] * dd
        } else {
            r[ApproxRole::Ag.index()] + r[ApproxRole::Ap.index()] * r[ApproxRole::Pg.index()] * dd
        }
    }

    /// Temperature derivative of [`ApproximateRate::combine`] given the
    /// constituent values `r` and their derivatives `dr`.
    pub fn combine_dt(&self, r: &[Real; 6], dr: &[Real; 6]) -> Real {
        use ApproxRole::*;
        let dd = 1.0 / (r[Pg.index()] + r[Pa.index()]);
        let dd_dt = -dd * dd * (dr[Pg.index()] + dr[Pa.index()]);
        let (lead, x, y) = if self.is_reverse() { (Ga, Pa, Gp) } else { (Ag, Ap, Pg) };
        let (x, y, lead) = (x.index(), y.index(), lead.index());
        dr[lead] + dr[x] * r[y] * dd + r[x] * dr[y] * dd + r[x] * r[y] * dd_dt
    }

    fn child_values(&self, f: impl Fn(&RateHandle) -> Real) -> [Real; 6] {
        let mut out = [0.0; 6];
        for (slot, child) in out.iter_mut().zip(&self.children) {
            *slot = f(child);
        }
        out
    }
}

fn invalid(rate: &dyn Rate, why: &str) -> CoreError {
    CoreError::InvalidArg {
        what: format!("approximate rate constituent {}: {why}", rate.name()),
    }
}

impl Rate for ApproximateRate {
    fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    fn kind(&self) -> RateKind {
        RateKind::Approximate
    }

    fn eval(&self, t: Real, rho_ye: Real) -> Real {
        self.combine(&self.child_values(|c| c.eval(t, rho_ye)))
    }

    fn eval_dt(&self, t: Real, rho_ye: Real) -> Real {
        let r = self.child_values(|c| c.eval(t, rho_ye));
        let dr = self.child_values(|c| c.eval_dt(t, rho_ye));
        self.combine_dt(&r, &dr)
    }

    fn children(&self) -> &[RateHandle] {
        &self.children
    }

    fn as_approximate(&self) -> Option<&ApproximateRate> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::CustomRate;
    use std::sync::Arc;

    fn nuc(sym: &str, z: u32, a: u32) -> Nuclide {
        Nuclide::new(sym, z, a)
    }

    fn constant(reactants: Vec<Nuclide>, products: Vec<Nuclide>, k: Real) -> RateHandle {
        Arc::new(CustomRate::constant(Reaction::new(reactants, products), k))
    }

    fn chain(is_reverse: bool) -> ApproximateRate {
        let (he4, p) = (Nuclide::he4(), Nuclide::proton());
        let (mg24, al27, si28) = (nuc("Mg", 12, 24), nuc("Al", 13, 27), nuc("Si", 14, 28));
        ApproximateRate::ap_pg(
            constant(vec![he4.clone(), mg24.clone()], vec![si28.clone()], 1.0),
            [
                constant(vec![he4.clone(), mg24.clone()], vec![p.clone(), al27.clone()], 2.0),
                constant(vec![p.clone(), al27.clone()], vec![si28.clone()], 3.0),
            ],
            constant(vec![si28.clone()], vec![he4.clone(), mg24.clone()], 4.0),
            [
                constant(vec![si28], vec![p.clone(), al27.clone()], 5.0),
                constant(vec![p, al27], vec![he4, mg24], 6.0),
            ],
            is_reverse,
        )
        .unwrap()
    }

    #[test]
    fn names_follow_direction() {
        assert_eq!(chain(false).name(), "Mg24_He4_to_Si28_approx");
        assert_eq!(chain(true).name(), "Si28_to_Mg24_He4_approx");
        assert_eq!(chain(false).intermediate().name(), "Al27");
    }

    #[test]
    fn forward_and_reverse_combination() {
        // forward: 1 + 2*3/(3+6); reverse: 4 + 6*5/(3+6)
        assert!((chain(false).eval(1.0e9, 1.0) - (1.0 + 6.0 / 9.0)).abs() < 1e-12);
        assert!((chain(true).eval(1.0e9, 1.0) - (4.0 + 30.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn combine_dt_matches_product_rule() {
        let r = chain(false);
        let vals = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let h = 1e-6;
        let mut dvals = [0.0; 6];
        dvals[ApproxRole::Pg.index()] = 1.0;
        let mut bumped = vals;
        bumped[ApproxRole::Pg.index()] += h;
        let fd = (r.combine(&bumped) - r.combine(&vals)) / h;
        assert!((r.combine_dt(&vals, &dvals) - fd).abs() < 1e-5);
    }

    #[test]
    fn mismatched_chain_is_rejected() {
        let (he4, p) = (Nuclide::he4(), Nuclide::proton());
        let (mg24, al27, si28) = (nuc("Mg", 12, 24), nuc("Al", 13, 27), nuc("Si", 14, 28));
        let wrong = ApproximateRate::ap_pg(
            constant(vec![he4.clone(), mg24.clone()], vec![si28.clone()], 1.0),
            [
                constant(vec![he4.clone(), mg24.clone()], vec![p.clone(), al27.clone()], 2.0),
                constant(vec![p.clone(), al27.clone()], vec![si28.clone()], 3.0),
            ],
            constant(vec![si28.clone()], vec![he4.clone(), mg24.clone()], 4.0),
            [
                constant(vec![si28.clone()], vec![p.clone(), al27.clone()], 5.0),
                constant(vec![p, al27], vec![si28], 6.0),
            ],
            false,
        );
        assert!(matches!(wrong, Err(CoreError::InvalidArg { .. })));
    }
}
