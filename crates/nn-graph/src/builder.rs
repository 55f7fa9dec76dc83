//! Turns a flat rate set into a [`RateGraph`].

use std::collections::{BTreeSet, HashMap, HashSet};

use nn_core::{LinkKey, Nuclide, RateHandle, RateId, RateKey, RateKind};
use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{RateEntry, RateGraph, RatePair, Visibility};
use crate::indexing::{NuclideIndex, RateIndex};
use crate::validate;

/// Collects rates and options, then validates and freezes them with [`GraphBuilder::build`].
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    pub(crate) rates: Vec<RateHandle>,
    pub(crate) inert: Vec<Nuclide>,
    pub(crate) allowed_duplicates: Vec<LinkKey>,
    pub(crate) symmetric_screening: bool,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rate(&mut self, rate: RateHandle) -> &mut Self {
        self.rates.push(rate);
        self
    }

    pub fn add_rates(&mut self, rates: impl IntoIterator<Item = RateHandle>) -> &mut Self {
        self.rates.extend(rates);
        self
    }

    /// Nuclides integrated even though no rate touches them.
    pub fn add_inert(&mut self, nuc: Nuclide) -> &mut Self {
        self.inert.push(nuc);
        self
    }

    /// Permit several rates to share this link.
    pub fn allow_duplicate(&mut self, link: LinkKey) -> &mut Self {
        self.allowed_duplicates.push(link);
        self
    }

    pub fn symmetric_screening(&mut self, on: bool) -> &mut Self {
        self.symmetric_screening = on;
        self
    }

    pub fn build(&self) -> GraphResult<RateGraph> {
        // tabular rates go last, otherwise input order is kept
        let mut top: Vec<RateHandle> = self.rates.clone();
        top.sort_by_key(|r| r.kind() == RateKind::Tabular);

        validate::validate_children(&top)?;
        validate::validate_links(&top, &self.allowed_duplicates)?;

        let (entries, rates) = classify(&top)?;
        validate::validate_names(&entries)?;

        let nuclides = NuclideIndex::new(unique_nuclides(&top, &self.inert))?;
        let approx_nuclides = approx_nuclides(&top, &nuclides);

        let n = nuclides.len();
        let mut consumed = vec![Vec::new(); n];
        let mut produced = vec![Vec::new(); n];
        for &id in &rates {
            let rate = &entries[id.index()].rate;
            for nuc in rate.reactants() {
                if let Some(i) = nuclides.id(nuc) {
                    consumed[i.index()].push(id);
                }
            }
            for nuc in rate.products() {
                if let Some(i) = nuclides.id(nuc) {
                    produced[i.index()].push(id);
                }
            }
        }

        let pairs = pair_rates(&entries, &rates);
        let nuclide_pairs = (0..n)
            .map(|i| {
                let nuc = &nuclides.nuclides()[i];
                pairs
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| {
                        p.rates().any(|id| {
                            let r = &entries[id.index()].rate;
                            r.reactants().contains(nuc) || r.products().contains(nuc)
                        })
                    })
                    .map(|(k, _)| k)
                    .collect()
            })
            .collect();

        let mut index = RateIndex::default();
        for e in &entries {
            index.insert_name(e.name.clone(), e.id);
            index.insert_key(e.rate.rate_key(), e.id);
        }
        for e in &entries {
            index.insert_name(e.rate.name().to_string(), e.id);
        }

        debug!(
            nuclides = n,
            approx_nuclides = approx_nuclides.len(),
            rates = rates.len(),
            entries = entries.len(),
            pairs = pairs.len(),
            "built rate graph"
        );

        Ok(RateGraph {
            entries,
            rates,
            nuclides,
            approx_nuclides,
            consumed,
            produced,
            pairs,
            nuclide_pairs,
            index,
            symmetric_screening: self.symmetric_screening,
        })
    }
}

fn bucket(kind: RateKind) -> usize {
    match kind {
        RateKind::Reaclib => 0,
        RateKind::Custom => 1,
        RateKind::Tabular => 2,
        RateKind::Approximate => 3,
        RateKind::Derived => 4,
    }
}

/// Sort rates into the kind buckets, pulling in approximate-rate constituents.
///
/// Returns the emission-ordered entries and, for each top-level rate, its entry id.
fn classify(top: &[RateHandle]) -> GraphResult<(Vec<RateEntry>, Vec<RateId>)> {
    let top_keys: HashSet<RateKey> = top.iter().map(|r| r.rate_key()).collect();

    // (rate, visibility, is top-level) per bucket
    let mut buckets: [Vec<(RateHandle, Visibility, bool)>; 5] = Default::default();
    let mut slot_of_key: HashMap<RateKey, (usize, usize)> = HashMap::new();
    let mut top_slots: Vec<(usize, usize)> = Vec::with_capacity(top.len());

    for rate in top {
        let key = rate.rate_key();
        let b = bucket(rate.kind());
        let slot = match slot_of_key.get(&key) {
            // already pulled in as a constituent of an earlier approximate rate
            Some(&slot) if !buckets[slot.0][slot.1].2 => {
                buckets[slot.0][slot.1].2 = true;
                slot
            }
            _ => {
                buckets[b].push((rate.clone(), Visibility::Standalone, true));
                let slot = (b, buckets[b].len() - 1);
                slot_of_key.entry(key).or_insert(slot);
                slot
            }
        };
        top_slots.push(slot);

        let mut stack: Vec<RateHandle> = rate.children().iter().rev().cloned().collect();
        while let Some(child) = stack.pop() {
            let key = child.rate_key();
            if !slot_of_key.contains_key(&key) {
                let visibility = if top_keys.contains(&key) {
                    Visibility::Standalone
                } else {
                    Visibility::Removed
                };
                let b = bucket(child.kind());
                buckets[b].push((child.clone(), visibility, false));
                slot_of_key.insert(key, (b, buckets[b].len() - 1));
            }
            stack.extend(child.children().iter().rev().cloned());
        }
    }

    let mut offsets = [0_usize; 5];
    let mut running = 0;
    for (b, items) in buckets.iter().enumerate() {
        offsets[b] = running;
        running += items.len();
    }
    RateId::try_from_index(running)?;

    let entries = buckets
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, (rate, visibility, _))| {
            let name = match visibility {
                Visibility::Standalone => rate.name().to_string(),
                Visibility::Removed => format!("{}_removed", rate.name()),
            };
            RateEntry {
                id: RateId::from_index(i),
                rate,
                visibility,
                name,
            }
        })
        .collect();
    let rates = top_slots
        .into_iter()
        .map(|(b, pos)| RateId::from_index(offsets[b] + pos))
        .collect();
    Ok((entries, rates))
}

fn unique_nuclides(top: &[RateHandle], inert: &[Nuclide]) -> Vec<Nuclide> {
    let union: BTreeSet<&Nuclide> = top
        .iter()
        .flat_map(|r| r.reactants().iter().chain(r.products()))
        .collect();
    let mut out: Vec<Nuclide> = union.into_iter().cloned().collect();
    for nuc in inert {
        if !out.contains(nuc) {
            out.push(nuc.clone());
        }
    }
    out
}

fn approx_nuclides(top: &[RateHandle], nuclides: &NuclideIndex) -> Vec<Nuclide> {
    let mut out: Vec<Nuclide> = Vec::new();
    for rate in top {
        if let Some(approx) = rate.as_approximate() {
            let x = approx.intermediate();
            if nuclides.id(x).is_none() && !out.contains(x) {
                out.push(x.clone());
            }
        }
    }
    out
}

/// Pair each forward (`Q >= 0`) rate with the first still-unpaired reverse
/// (`Q < 0`) rate whose endpoints are swapped; candidates are scanned in
/// top-level order, so the lowest input position wins ties.
fn pair_rates(entries: &[RateEntry], rates: &[RateId]) -> Vec<RatePair> {
    let q = |id: RateId| entries[id.index()].rate.q();
    let link = |id: RateId| entries[id.index()].rate.link_key();

    let reverse_pool: Vec<RateId> = rates.iter().copied().filter(|&id| q(id) < 0.0).collect();
    let mut taken = vec![false; reverse_pool.len()];
    let mut pairs = Vec::new();

    for fwd in rates.iter().copied().filter(|&id| q(id) >= 0.0) {
        let want = link(fwd).reversed();
        let matched = reverse_pool
            .iter()
            .enumerate()
            .find(|&(k, &rev)| !taken[k] && link(rev) == want)
            .map(|(k, &rev)| {
                taken[k] = true;
                rev
            });
        pairs.push(RatePair {
            forward: Some(fwd),
            reverse: matched,
        });
    }
    for (k, &rev) in reverse_pool.iter().enumerate() {
        if !taken[k] {
            pairs.push(RatePair {
                forward: None,
                reverse: Some(rev),
            });
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn_core::{CustomRate, Reaction};
    use std::sync::Arc;

    fn rate(reactants: Vec<Nuclide>, products: Vec<Nuclide>, q: f64) -> RateHandle {
        Arc::new(CustomRate::constant(
            Reaction::new(reactants, products).with_q(q),
            1.0,
        ))
    }

    #[test]
    fn consumed_keeps_multiplicity() {
        let c12 = Nuclide::new("C", 6, 12);
        let he4 = Nuclide::he4();
        let mut b = GraphBuilder::new();
        b.add_rate(rate(vec![he4.clone(), he4.clone(), he4.clone()], vec![c12], 7.275));
        let g = b.build().unwrap();
        let he4_id = g.nuclide_id(&he4).unwrap();
        assert_eq!(g.consumed(he4_id).len(), 3);
    }

    #[test]
    fn reverse_pool_tie_break_is_input_order() {
        let (n, p) = (Nuclide::neutron(), Nuclide::proton());
        let mut b = GraphBuilder::new();
        b.add_rate(rate(vec![n.clone()], vec![p.clone()], 1.0));
        let rev_a: RateHandle = Arc::new(CustomRate::constant(
            Reaction::new(vec![p.clone()], vec![n.clone()]).with_name("rev_a").with_q(-1.0),
            1.0,
        ));
        let rev_b: RateHandle = Arc::new(CustomRate::constant(
            Reaction::new(vec![p.clone()], vec![n.clone()]).with_name("rev_b").with_q(-1.0),
            1.0,
        ));
        b.add_rate(rev_a).add_rate(rev_b);
        b.allow_duplicate(LinkKey::new(&[p], &[n]));
        let g = b.build().unwrap();
        let pairs = g.rate_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(g.entry(pairs[0].reverse.unwrap()).name(), "rev_a");
        assert_eq!(pairs[1].forward, None);
        assert_eq!(g.entry(pairs[1].reverse.unwrap()).name(), "rev_b");
    }
}
