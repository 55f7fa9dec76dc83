//! Direct numeric evaluation of the ODE system at one thermodynamic state.
//!
//! Uses the same sign and stoichiometry conventions as [`crate::compose`]:
//! consuming rates contribute `-count * rate`, producing rates `+count * rate`.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use nn_core::{ApproxRole, Composition, Nuclide, NuclideId, RateId, RateKind, Real, ensure_finite};
use nn_graph::{RateGraph, dedup};
use nn_screening::{PlasmaState, ScreeningFactors, ScreeningPlan, ScreeningProvider};
use tracing::debug;

use crate::error::{SymbolicError, SymbolicResult};
use crate::fd::central_difference_jacobian;

/// Density (g/cm^3), temperature (K) and composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoState {
    pub rho: Real,
    pub temp: Real,
    pub composition: Composition,
}

impl ThermoState {
    pub fn new(rho: Real, temp: Real, composition: Composition) -> Self {
        Self {
            rho,
            temp,
            composition,
        }
    }
}

/// Instantaneous value of one top-level rate, `dY/dt` units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateValue {
    pub id: RateId,
    pub value: Real,
}

struct Screening<'g> {
    plan: ScreeningPlan,
    provider: &'g dyn ScreeningProvider,
}

/// Numeric counterpart of the symbolic system for a frozen graph.
pub struct NetworkEvaluator<'g> {
    graph: &'g RateGraph,
    screening: Option<Screening<'g>>,
}

/// Per top-level rate: everything but the abundances, and the abundances.
struct RateFactors {
    id: RateId,
    coefficient: Real,
    /// `(nuclide index, multiplicity)` over distinct reactants.
    reactants: Vec<(usize, u32)>,
}

impl RateFactors {
    fn value(&self, y: &DVector<Real>) -> Real {
        self.reactants
            .iter()
            .fold(self.coefficient, |acc, &(i, c)| acc * y[i].powi(c as i32))
    }

    fn derivative(&self, y: &DVector<Real>, wrt: usize) -> Real {
        let Some(&(_, power)) = self.reactants.iter().find(|(i, _)| *i == wrt) else {
            return 0.0;
        };
        self.reactants.iter().fold(self.coefficient, |acc, &(i, c)| {
            if i == wrt {
                acc * Real::from(power) * y[i].powi(power as i32 - 1)
            } else {
                acc * y[i].powi(c as i32)
            }
        })
    }
}

impl<'g> NetworkEvaluator<'g> {
    pub fn new(graph: &'g RateGraph) -> Self {
        Self {
            graph,
            screening: None,
        }
    }

    /// Screen rates with `plan`, computing factors through `provider`.
    pub fn with_screening(mut self, plan: ScreeningPlan, provider: &'g dyn ScreeningProvider) -> Self {
        self.screening = Some(Screening { plan, provider });
        self
    }

    pub fn graph(&self) -> &'g RateGraph {
        self.graph
    }

    /// Molar abundances in `graph.nuclides()` order; absent nuclides are zero.
    pub fn abundances(&self, comp: &Composition) -> DVector<Real> {
        let molar: HashMap<Nuclide, Real> = comp.molar();
        DVector::from_iterator(
            self.graph.nuclides().len(),
            self.graph
                .nuclides()
                .iter()
                .map(|n| molar.get(n).copied().unwrap_or(0.0)),
        )
    }

    fn screening_factors(&self, state: &ThermoState) -> SymbolicResult<ScreeningFactors> {
        match &self.screening {
            Some(s) => {
                let plasma = PlasmaState::from_composition(state.temp, state.rho, &state.composition);
                Ok(s.plan.factors(self.graph, &plasma, s.provider)?)
            }
            None => Ok(ScreeningFactors::unity(self.graph.entries().len())),
        }
    }

    /// Screened coefficient of every entry, approximate rates combined from
    /// their screened constituents.
    fn entry_coefficients(&self, state: &ThermoState) -> SymbolicResult<Vec<Real>> {
        let factors = self.screening_factors(state)?;
        let rho_ye = state.rho * state.composition.ye();
        let entries = self.graph.entries();
        let mut out = vec![0.0; entries.len()];

        for entry in entries.iter().filter(|e| e.kind() != RateKind::Approximate) {
            let raw = ensure_finite(entry.rate.eval(state.temp, rho_ye), "rate coefficient")?;
            out[entry.id.index()] = raw * factors.get(entry.id).value;
        }
        for entry in entries.iter().filter(|e| e.kind() == RateKind::Approximate) {
            let Some(approx) = entry.rate.as_approximate() else {
                continue;
            };
            let mut r = [0.0; 6];
            for role in ApproxRole::ALL {
                let child = approx.child(role);
                let id = self.graph.entry_for(child.as_ref()).ok_or_else(|| {
                    SymbolicError::MissingConstituent {
                        rate: entry.name().to_string(),
                        child: child.name().to_string(),
                    }
                })?;
                r[role.index()] = out[id.index()];
            }
            out[entry.id.index()] = approx.combine(&r);
        }
        Ok(out)
    }

    fn rate_factors(&self, state: &ThermoState) -> SymbolicResult<Vec<RateFactors>> {
        let coefficients = self.entry_coefficients(state)?;
        let ye = state.composition.ye();
        let mut out = Vec::with_capacity(self.graph.rates().len());
        for &id in self.graph.rates() {
            let rate = &self.graph.entry(id).rate;
            let coefficient = rate.prefactor()
                * state.rho.powi(rate.dens_exp() as i32)
                * ye.powi(rate.ye_power() as i32)
                * coefficients[id.index()];

            let mut reactants: Vec<(usize, u32)> = Vec::new();
            for nuc in rate.reactants() {
                let i = self
                    .graph
                    .nuclide_id(nuc)
                    .ok_or_else(|| nn_graph::GraphError::UnknownNuclide { name: nuc.name() })?
                    .index();
                match reactants.iter_mut().find(|(j, _)| *j == i) {
                    Some((_, c)) => *c += 1,
                    None => reactants.push((i, 1)),
                }
            }
            out.push(RateFactors {
                id,
                coefficient,
                reactants,
            });
        }
        Ok(out)
    }

    /// Every top-level rate's contribution, `graph.rates()` order.
    pub fn evaluate_rates(&self, state: &ThermoState) -> SymbolicResult<Vec<RateValue>> {
        let y = self.abundances(&state.composition);
        Ok(self
            .rate_factors(state)?
            .iter()
            .map(|f| RateValue {
                id: f.id,
                value: f.value(&y),
            })
            .collect())
    }

    fn weighted_sum(&self, values: &HashMap<RateId, Real>, sign_consumed: Real) -> DVector<Real> {
        let n = self.graph.nuclides().len();
        DVector::from_iterator(
            n,
            self.graph.nuclides().iter().enumerate().map(|(i, nuc)| {
                let nid = NuclideId::from_index(i);
                let mut sum = 0.0;
                for id in dedup(self.graph.consumed(nid)) {
                    let c = Real::from(self.graph.entry(id).rate.reactant_count(nuc));
                    sum += sign_consumed * c * values.get(&id).copied().unwrap_or(0.0);
                }
                for id in dedup(self.graph.produced(nid)) {
                    let c = Real::from(self.graph.entry(id).rate.product_count(nuc));
                    sum += c * values.get(&id).copied().unwrap_or(0.0);
                }
                sum
            }),
        )
    }

    /// dY/dt for every nuclide.
    pub fn evaluate_ydots(&self, state: &ThermoState) -> SymbolicResult<DVector<Real>> {
        let y = self.abundances(&state.composition);
        self.ydots_at(state, &y)
    }

    /// dY/dt with rate coefficients from `state` but abundances `y`.
    pub fn ydots_at(&self, state: &ThermoState, y: &DVector<Real>) -> SymbolicResult<DVector<Real>> {
        if y.len() != self.graph.nuclides().len() {
            return Err(SymbolicError::Numeric {
                what: format!(
                    "{} abundances for {} nuclides",
                    y.len(),
                    self.graph.nuclides().len()
                ),
            });
        }
        let values: HashMap<RateId, Real> = self
            .rate_factors(state)?
            .iter()
            .map(|f| (f.id, f.value(y)))
            .collect();
        Ok(self.weighted_sum(&values, -1.0))
    }

    /// Central-difference Jacobian of [`NetworkEvaluator::ydots_at`], for
    /// checking [`NetworkEvaluator::evaluate_jacobian`].
    pub fn difference_jacobian(&self, state: &ThermoState, epsilon: Real) -> SymbolicResult<DMatrix<Real>> {
        let y = self.abundances(&state.composition);
        central_difference_jacobian(&y, |y| self.ydots_at(state, y), epsilon)
    }

    /// Total creation plus destruction flux through each nuclide.
    pub fn evaluate_activity(&self, state: &ThermoState) -> SymbolicResult<DVector<Real>> {
        let values: HashMap<RateId, Real> = self
            .value_map(state)?
            .into_iter()
            .map(|(id, v)| (id, v.abs()))
            .collect();
        Ok(self.weighted_sum(&values, 1.0))
    }

    /// `J[(row, col)] = d(dY_row/dt)/dY_col`.
    pub fn evaluate_jacobian(&self, state: &ThermoState) -> SymbolicResult<DMatrix<Real>> {
        let y = self.abundances(&state.composition);
        let factors = self.rate_factors(state)?;
        let by_id: HashMap<RateId, &RateFactors> = factors.iter().map(|f| (f.id, f)).collect();
        let n = self.graph.nuclides().len();
        let mut jac = DMatrix::zeros(n, n);

        for (row, nuc) in self.graph.nuclides().iter().enumerate() {
            let nid = NuclideId::from_index(row);
            let mut weighted: Vec<(&RateFactors, Real)> = Vec::new();
            for id in dedup(self.graph.consumed(nid)) {
                if let Some(f) = by_id.get(&id) {
                    let c = Real::from(self.graph.entry(id).rate.reactant_count(nuc));
                    weighted.push((f, -c));
                }
            }
            for id in dedup(self.graph.produced(nid)) {
                if let Some(f) = by_id.get(&id) {
                    let c = Real::from(self.graph.entry(id).rate.product_count(nuc));
                    weighted.push((f, c));
                }
            }
            for col in 0..n {
                jac[(row, col)] = weighted.iter().map(|(f, c)| c * f.derivative(&y, col)).sum();
            }
        }
        Ok(jac)
    }

    /// Rates whose largest share of the fastest rate, over all `states`,
    /// stays below `cutoff`, paired with that share.
    pub fn find_unimportant_rates(
        &self,
        states: &[ThermoState],
        cutoff: Real,
    ) -> SymbolicResult<Vec<(RateId, Real)>> {
        let mut largest: HashMap<RateId, Real> = HashMap::new();
        for state in states {
            let values = self.evaluate_rates(state)?;
            let fastest = values.iter().map(|v| v.value.abs()).fold(0.0, Real::max);
            for v in &values {
                let share = if fastest > 0.0 { v.value.abs() / fastest } else { 0.0 };
                let slot = largest.entry(v.id).or_insert(0.0);
                *slot = slot.max(share);
            }
        }
        let out: Vec<(RateId, Real)> = self
            .graph
            .rates()
            .iter()
            .filter_map(|id| largest.get(id).map(|&s| (*id, s)))
            .filter(|(_, s)| *s < cutoff)
            .collect();
        debug!(unimportant = out.len(), cutoff, "scanned rate importance");
        Ok(out)
    }

    fn value_map(&self, state: &ThermoState) -> SymbolicResult<HashMap<RateId, Real>> {
        Ok(self
            .evaluate_rates(state)?
            .into_iter()
            .map(|v| (v.id, v.value))
            .collect())
    }
}
