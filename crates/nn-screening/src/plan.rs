//! Screening map construction and the ordered emission/evaluation steps.

use nn_core::{Nuclide, Rate, RateId, RateKind, Real};
use nn_graph::RateGraph;
use tracing::debug;

use crate::error::{ScreeningError, ScreeningResult};
use crate::group::{ScreeningGroup, TRIPLE_ALPHA, TRIPLE_ALPHA_DUMMY};
use crate::plasma::{PlasmaState, ScreenFactor, ScreeningProvider};

/// How the screening map is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreeningOptions {
    pub enabled: bool,
    /// Screen reverse rates on their products' charges.
    pub symmetric: bool,
}

impl Default for ScreeningOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            symmetric: false,
        }
    }
}

impl ScreeningOptions {
    /// Options taken from a graph's own symmetric-screening flag.
    pub fn for_graph(graph: &RateGraph) -> Self {
        Self {
            enabled: true,
            symmetric: graph.symmetric_screening(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            symmetric: false,
        }
    }
}

/// One step of applying the screening map, in group order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningStep {
    /// Compute the group's factor and multiply it into its rates.
    Apply { group: usize },
    /// Compute the He4 + He4 factor and hold it for the next step.
    TripleAlphaFirst { group: usize },
    /// Compute the He4 + Be8 factor and apply the product of both legs.
    TripleAlphaSecond { group: usize },
}

/// Ordered screening groups for one graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningPlan {
    groups: Vec<ScreeningGroup>,
}

impl ScreeningPlan {
    /// Group every screenable entry by its charged entrance nuclei.
    ///
    /// Approximate rates are skipped; their constituents carry the screening.
    pub fn build(graph: &RateGraph, options: ScreeningOptions) -> Self {
        if !options.enabled {
            return Self::default();
        }

        let mut groups: Vec<ScreeningGroup> = Vec::new();
        for entry in graph.entries() {
            if entry.kind() == RateKind::Approximate {
                continue;
            }
            let Some(nucs) = screen_nuclides(entry.rate.as_ref(), options.symmetric) else {
                continue;
            };
            let name = nucs
                .iter()
                .map(Nuclide::name)
                .collect::<Vec<_>>()
                .join("_");

            if let Some(existing) = groups.iter_mut().find(|g| g.name == name) {
                existing.add_rate(entry.id);
                if name == TRIPLE_ALPHA
                    && let Some(dummy) = groups.iter_mut().find(|g| g.name == TRIPLE_ALPHA_DUMMY)
                {
                    dummy.add_rate(entry.id);
                }
                continue;
            }

            if name == TRIPLE_ALPHA {
                groups.push(
                    ScreeningGroup::new(name, nucs[0].clone(), nucs[1].clone()).with_rate(entry.id),
                );
                groups.push(
                    ScreeningGroup::new(TRIPLE_ALPHA_DUMMY, nucs[2].clone(), be8_placeholder())
                        .with_rate(entry.id),
                );
            } else {
                groups.push(
                    ScreeningGroup::new(name, nucs[0].clone(), nucs[1].clone()).with_rate(entry.id),
                );
            }
        }

        debug!(groups = groups.len(), symmetric = options.symmetric, "screening plan built");
        Self { groups }
    }

    /// A plan over explicit groups, kept in the given order.
    pub fn from_groups(groups: Vec<ScreeningGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ScreeningGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Size of the screening-call arrays; never zero.
    pub fn effective_group_count(&self) -> usize {
        self.groups.len().max(1)
    }

    /// Walk the groups, pairing each triple-alpha group with its second leg.
    pub fn steps(&self) -> ScreeningResult<Vec<ScreeningStep>> {
        let mut steps = Vec::with_capacity(self.groups.len());
        for (index, group) in self.groups.iter().enumerate() {
            if group.is_triple_alpha() {
                let paired = self
                    .groups
                    .get(index + 1)
                    .is_some_and(ScreeningGroup::is_triple_alpha_dummy);
                if !paired {
                    return Err(ScreeningError::OrphanTripleAlpha { index });
                }
                steps.push(ScreeningStep::TripleAlphaFirst { group: index });
            } else if group.is_triple_alpha_dummy() || group.has_dummy() {
                // only the triple-alpha second leg may be keyed on a placeholder
                let follows = group.is_triple_alpha_dummy()
                    && index > 0
                    && self.groups[index - 1].is_triple_alpha();
                if !follows {
                    return Err(ScreeningError::UnexpectedDummy {
                        index,
                        name: group.name.clone(),
                    });
                }
                steps.push(ScreeningStep::TripleAlphaSecond { group: index });
            } else {
                steps.push(ScreeningStep::Apply { group: index });
            }
        }
        Ok(steps)
    }

    /// Per-entry screening factors at one plasma state.
    ///
    /// Entries outside every group keep [`ScreenFactor::UNITY`].
    pub fn factors(
        &self,
        graph: &RateGraph,
        plasma: &PlasmaState,
        provider: &dyn ScreeningProvider,
    ) -> ScreeningResult<ScreeningFactors> {
        let mut factors = vec![ScreenFactor::UNITY; graph.entries().len()];
        let mut first_leg = ScreenFactor::UNITY;
        for step in self.steps()? {
            match step {
                ScreeningStep::Apply { group } => {
                    let g = &self.groups[group];
                    let f = provider.screen(plasma, &g.n1, &g.n2);
                    for id in &g.rates {
                        factors[id.index()] = f;
                    }
                }
                ScreeningStep::TripleAlphaFirst { group } => {
                    let g = &self.groups[group];
                    first_leg = provider.screen(plasma, &g.n1, &g.n2);
                }
                ScreeningStep::TripleAlphaSecond { group } => {
                    let g = &self.groups[group];
                    let f = first_leg.combine(provider.screen(plasma, &g.n1, &g.n2));
                    for id in &g.rates {
                        factors[id.index()] = f;
                    }
                }
            }
        }
        Ok(ScreeningFactors { factors })
    }
}

/// Screening factors indexed by graph entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningFactors {
    factors: Vec<ScreenFactor>,
}

impl ScreeningFactors {
    /// All-unity factors for a graph with `entries` rates.
    pub fn unity(entries: usize) -> Self {
        Self {
            factors: vec![ScreenFactor::UNITY; entries],
        }
    }

    pub fn get(&self, id: RateId) -> ScreenFactor {
        self.factors
            .get(id.index())
            .copied()
            .unwrap_or(ScreenFactor::UNITY)
    }

    /// Screen a rate coefficient (and derivative) for entry `id`.
    pub fn apply(&self, id: RateId, rate: Real, drate_dt: Real) -> (Real, Real) {
        self.get(id).apply(rate, drate_dt)
    }
}

/// Charged nuclei entering the screening factor, sorted by Z, or `None`
/// when fewer than two are charged.
pub fn screen_nuclides(rate: &dyn Rate, symmetric: bool) -> Option<Vec<Nuclide>> {
    let side = if symmetric && rate.is_reverse() {
        rate.products()
    } else {
        rate.reactants()
    };
    let mut charged: Vec<Nuclide> = side.iter().filter(|n| n.z() != 0).cloned().collect();
    if charged.len() < 2 {
        return None;
    }
    charged.sort_by_key(Nuclide::z);
    charged.truncate(3);
    Some(charged)
}

fn be8_placeholder() -> Nuclide {
    Nuclide::dummy("Be", 4, 8)
}
