//! Owner of a mutable rate set that keeps a matching [`RateGraph`].

use std::sync::Arc;

use nn_core::{ApproximateRate, LinkKey, Nuclide, Rate, RateHandle};
use tracing::debug;

use crate::builder::GraphBuilder;
use crate::error::{GraphError, GraphResult};
use crate::graph::RateGraph;

/// A rate set plus the graph built from it.
///
/// Every mutation rebuilds the graph from scratch; ids taken from the previous
/// graph are meaningless afterwards. A mutation whose rebuild fails leaves the
/// collection unchanged.
#[derive(Debug, Clone)]
pub struct RateCollection {
    builder: GraphBuilder,
    graph: RateGraph,
}

impl RateCollection {
    pub fn new(builder: GraphBuilder) -> GraphResult<Self> {
        let graph = builder.build()?;
        Ok(Self { builder, graph })
    }

    pub fn from_rates(rates: impl IntoIterator<Item = RateHandle>) -> GraphResult<Self> {
        let mut builder = GraphBuilder::new();
        builder.add_rates(rates);
        Self::new(builder)
    }

    pub fn graph(&self) -> &RateGraph {
        &self.graph
    }

    /// The top-level rates in the order they were supplied.
    pub fn rates(&self) -> &[RateHandle] {
        &self.builder.rates
    }

    fn rebuild_with(&mut self, edit: impl FnOnce(&mut GraphBuilder)) -> GraphResult<()> {
        let mut builder = self.builder.clone();
        edit(&mut builder);
        let graph = builder.build()?;
        self.builder = builder;
        self.graph = graph;
        Ok(())
    }

    /// Add rates not already present under the same name.
    pub fn add_rates(&mut self, rates: impl IntoIterator<Item = RateHandle>) -> GraphResult<()> {
        let rates: Vec<RateHandle> = rates.into_iter().collect();
        self.rebuild_with(|b| {
            for rate in rates {
                if !b.rates.iter().any(|r| r.name() == rate.name()) {
                    b.rates.push(rate);
                }
            }
        })
    }

    /// Remove top-level rates by name.
    pub fn remove_rates(&mut self, names: &[&str]) -> GraphResult<()> {
        if let Some(missing) = names
            .iter()
            .find(|n| !self.builder.rates.iter().any(|r| r.name() == **n))
        {
            return Err(GraphError::UnknownRate {
                name: missing.to_string(),
            });
        }
        self.rebuild_with(|b| b.rates.retain(|r| !names.contains(&r.name())))
    }

    /// Remove every top-level rate with one of `nuclides` as an endpoint.
    /// Intermediates hidden inside approximate rates are not affected.
    pub fn remove_nuclides(&mut self, nuclides: &[Nuclide]) -> GraphResult<()> {
        self.rebuild_with(|b| {
            b.rates.retain(|r| {
                let touches = r
                    .reactants()
                    .iter()
                    .chain(r.products())
                    .any(|n| nuclides.contains(n));
                if touches {
                    debug!(rate = r.name(), "removing rate");
                }
                !touches
            })
        })
    }

    /// Last top-level rate with the given endpoints, mirroring a later-wins lookup.
    fn last_by_nuclei(&self, reactants: &[Nuclide], products: &[Nuclide]) -> Option<RateHandle> {
        let want = LinkKey::new(reactants, products);
        self.builder
            .rates
            .iter()
            .rev()
            .find(|r| r.link_key() == want)
            .cloned()
    }

    /// Fold every complete A(a,g)B / A(a,p)X(p,g)B chain (and its reverse)
    /// into a pair of approximate rates, optionally only for intermediates X
    /// in `intermediates`. Returns the approximate rates added.
    pub fn make_ap_pg_approx(
        &mut self,
        intermediates: Option<&[Nuclide]>,
    ) -> GraphResult<Vec<RateHandle>> {
        let he4 = Nuclide::he4();
        let p = Nuclide::proton();

        let ag_rates: Vec<RateHandle> = self
            .builder
            .rates
            .iter()
            .filter(|r| r.reactants().len() == 2 && r.reactants().contains(&he4) && r.products().len() == 1)
            .cloned()
            .collect();

        let mut approx: Vec<RateHandle> = Vec::new();
        for r_ag in ag_rates {
            let Some(a) = r_ag.reactants().iter().max().cloned() else {
                continue;
            };
            let b = r_ag.products()[0].clone();

            // X is (Z+1, A+3) of A; take its metadata from the (a,p) rate that makes it
            let entrance = LinkKey::new(&[a.clone(), he4.clone()], &[]);
            let Some(x) = self.builder.rates.iter().find_map(|r| {
                let link = r.link_key();
                if link.reactants() != entrance.reactants() {
                    return None;
                }
                let [q1, q2] = link.products() else {
                    return None;
                };
                let x = if *q1 == p {
                    q2
                } else if *q2 == p {
                    q1
                } else {
                    return None;
                };
                (x.z() == a.z() + 1 && x.a() == a.a() + 3).then(|| x.clone())
            }) else {
                continue;
            };

            if let Some(filter) = intermediates {
                if !filter.contains(&x) {
                    continue;
                }
            }

            let a_he4 = [a.clone(), he4.clone()];
            let x_p = [x.clone(), p.clone()];
            let b_only = [b.clone()];
            let found = (
                self.last_by_nuclei(&a_he4, &x_p),
                self.last_by_nuclei(&x_p, &b_only),
                self.last_by_nuclei(&b_only, &a_he4),
                self.last_by_nuclei(&b_only, &x_p),
                self.last_by_nuclei(&x_p, &a_he4),
            );
            let (Some(r_ap), Some(r_pg), Some(r_ga), Some(r_gp), Some(r_pa)) = found else {
                continue;
            };

            for is_reverse in [false, true] {
                let ar = ApproximateRate::ap_pg(
                    r_ag.clone(),
                    [r_ap.clone(), r_pg.clone()],
                    r_ga.clone(),
                    [r_gp.clone(), r_pa.clone()],
                    is_reverse,
                )?;
                debug!(rate = ar.name(), "using approximate rate");
                approx.push(Arc::new(ar));
            }
        }

        let added = approx.clone();
        self.rebuild_with(|b| {
            for ar in &approx {
                let child_names: Vec<&str> = ar.children().iter().map(|c| c.name()).collect();
                b.rates.retain(|r| {
                    let drop = child_names.contains(&r.name());
                    if drop {
                        debug!(rate = r.name(), "removing rate");
                    }
                    !drop
                });
            }
            b.rates.extend(approx);
        })?;
        Ok(added)
    }
}
