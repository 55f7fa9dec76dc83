//! The built, immutable rate/nuclide graph.

use core::fmt;

use nn_core::{LinkKey, Nuclide, NuclideId, Rate, RateHandle, RateId, RateKind};

use crate::indexing::{NuclideIndex, RateIndex};

/// Whether a rate is integrated as its own network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Present in the top-level rate set.
    Standalone,
    /// Only reachable as a constituent of an approximate rate.
    Removed,
}

/// One rate in emission order.
#[derive(Debug, Clone)]
pub struct RateEntry {
    pub id: RateId,
    pub rate: RateHandle,
    pub visibility: Visibility,
    /// Emitted identifier (`_removed` appended for removed constituents).
    pub(crate) name: String,
}

impl RateEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RateKind {
        self.rate.kind()
    }

    pub fn is_removed(&self) -> bool {
        self.visibility == Visibility::Removed
    }
}

/// Forward/reverse grouping of two rates joining the same endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RatePair {
    pub forward: Option<RateId>,
    pub reverse: Option<RateId>,
}

impl RatePair {
    pub fn rates(&self) -> impl Iterator<Item = RateId> {
        self.forward.into_iter().chain(self.reverse)
    }
}

/// Validated rate network: nuclides, emission-ordered rates and their links.
///
/// Everything is computed once by [`crate::GraphBuilder::build`]; a changed
/// rate set means a new graph.
#[derive(Debug, Clone)]
pub struct RateGraph {
    /// `all_rates`, grouped by kind in emission order.
    pub(crate) entries: Vec<RateEntry>,
    /// The top-level rate set (tabular rates last), as entry ids.
    pub(crate) rates: Vec<RateId>,
    pub(crate) nuclides: NuclideIndex,
    pub(crate) approx_nuclides: Vec<Nuclide>,
    /// Per nuclide, top-level rates consuming it, once per occurrence.
    pub(crate) consumed: Vec<Vec<RateId>>,
    /// Per nuclide, top-level rates producing it, once per occurrence.
    pub(crate) produced: Vec<Vec<RateId>>,
    pub(crate) pairs: Vec<RatePair>,
    /// Per nuclide, indices into `pairs`.
    pub(crate) nuclide_pairs: Vec<Vec<usize>>,
    pub(crate) index: RateIndex,
    pub(crate) symmetric_screening: bool,
}

impl RateGraph {
    /// `unique_nuclei`: sorted union of all endpoints, then inert nuclides.
    pub fn nuclides(&self) -> &[Nuclide] {
        self.nuclides.nuclides()
    }

    pub fn nuclide_id(&self, nuc: &Nuclide) -> Option<NuclideId> {
        self.nuclides.id(nuc)
    }

    pub fn nuclide(&self, id: NuclideId) -> Option<&Nuclide> {
        self.nuclides.nuclides().get(id.index())
    }

    /// Intermediates eliminated by approximate rates.
    pub fn approx_nuclides(&self) -> &[Nuclide] {
        &self.approx_nuclides
    }

    /// Every rate, in emission order.
    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    pub fn entry(&self, id: RateId) -> &RateEntry {
        &self.entries[id.index()]
    }

    pub fn entries_of_kind(&self, kind: RateKind) -> impl Iterator<Item = &RateEntry> + '_ {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    /// Top-level rates, i.e. the links actually integrated.
    pub fn rates(&self) -> &[RateId] {
        &self.rates
    }

    pub fn rate_id(&self, name: &str) -> Option<RateId> {
        self.index.by_name(name)
    }

    pub fn rate_by_name(&self, name: &str) -> Option<&RateHandle> {
        self.rate_id(name).map(|id| &self.entry(id).rate)
    }

    /// Entry holding a rate with the same link and kind as `rate`.
    pub fn entry_for(&self, rate: &dyn Rate) -> Option<RateId> {
        self.index.by_key(&rate.rate_key())
    }

    pub fn consumed(&self, nuc: NuclideId) -> &[RateId] {
        &self.consumed[nuc.index()]
    }

    pub fn produced(&self, nuc: NuclideId) -> &[RateId] {
        &self.produced[nuc.index()]
    }

    pub fn rate_pairs(&self) -> &[RatePair] {
        &self.pairs
    }

    pub fn nuclide_rate_pairs(&self, nuc: NuclideId) -> impl Iterator<Item = &RatePair> + '_ {
        self.nuclide_pairs[nuc.index()].iter().map(|&i| &self.pairs[i])
    }

    pub fn symmetric_screening(&self) -> bool {
        self.symmetric_screening
    }

    /// Top-level rates with `Q >= 0`.
    pub fn forward_rates(&self) -> impl Iterator<Item = RateId> + '_ {
        self.rates
            .iter()
            .copied()
            .filter(|&id| self.entry(id).rate.q() >= 0.0)
    }

    /// Top-level rates with `Q < 0`.
    pub fn reverse_rates(&self) -> impl Iterator<Item = RateId> + '_ {
        self.rates
            .iter()
            .copied()
            .filter(|&id| self.entry(id).rate.q() < 0.0)
    }

    /// First reverse rate whose endpoints are those of `forward` swapped.
    pub fn find_reverse(&self, forward: RateId) -> Option<RateId> {
        let want = self.entry(forward).rate.link_key().reversed();
        self.reverse_rates()
            .find(|&id| self.entry(id).rate.link_key() == want)
    }

    /// Top-level rates whose endpoints match the given multisets.
    pub fn rates_by_nuclei(&self, reactants: &[Nuclide], products: &[Nuclide]) -> Vec<RateId> {
        let want = LinkKey::new(reactants, products);
        self.rates
            .iter()
            .copied()
            .filter(|&id| self.entry(id).rate.link_key() == want)
            .collect()
    }

    /// Nuclides whose partition functions are read by derived rates, sorted.
    pub fn nuclides_needing_partition_functions(&self) -> Vec<Nuclide> {
        let mut out: Vec<Nuclide> = Vec::new();
        for entry in &self.entries {
            let rate = &entry.rate;
            if rate.kind() != RateKind::Derived || !rate.uses_partition_functions() {
                continue;
            }
            for nuc in rate.reactants().iter().chain(rate.products()) {
                if nuc.partition_function().is_some() && !out.contains(nuc) {
                    out.push(nuc.clone());
                }
            }
        }
        out.sort();
        out
    }

    /// Distinct partition-function temperature grids, and for each nuclide
    /// needing one, the index of its grid.
    pub fn dedupe_partition_function_temperatures(&self) -> (Vec<Vec<f64>>, Vec<(Nuclide, usize)>) {
        let mut grids: Vec<Vec<f64>> = Vec::new();
        let mut indices = Vec::new();
        for nuc in self.nuclides_needing_partition_functions() {
            let Some(pf) = nuc.partition_function() else {
                continue;
            };
            let temp = pf.temperature();
            let i = match grids.iter().position(|g| g.as_slice() == temp) {
                Some(i) => i,
                None => {
                    grids.push(temp.to_vec());
                    grids.len() - 1
                }
            };
            indices.push((nuc, i));
        }
        (grids, indices)
    }

    /// Per nuclide, the rates consuming and producing it.
    pub fn network_overview(&self) -> String {
        let mut out = String::new();
        for (i, nuc) in self.nuclides().iter().enumerate() {
            out.push_str(&format!("{nuc}\n  consumed by:\n"));
            for id in dedup(&self.consumed[i]) {
                out.push_str(&format!("     {}\n", self.entry(id).rate.reaction().equation()));
            }
            out.push_str("  produced by:\n");
            for id in dedup(&self.produced[i]) {
                out.push_str(&format!("     {}\n", self.entry(id).rate.reaction().equation()));
            }
            out.push('\n');
        }
        out
    }

    /// Per nuclide, its forward/reverse pairs.
    pub fn rate_pair_overview(&self) -> String {
        let mut out = String::new();
        for (i, nuc) in self.nuclides().iter().enumerate() {
            out.push_str(&format!("{nuc}\n"));
            for &p in &self.nuclide_pairs[i] {
                out.push_str(&format!("     {}\n", self.describe_pair(&self.pairs[p])));
            }
        }
        out
    }

    pub fn describe_pair(&self, pair: &RatePair) -> String {
        let side = |id: Option<RateId>| id.map_or("None".to_string(), |id| self.entry(id).name.clone());
        format!("forward: {} ; reverse: {}", side(pair.forward), side(pair.reverse))
    }
}

/// Ids in first-seen order without repeats.
pub fn dedup(ids: &[RateId]) -> Vec<RateId> {
    let mut out: Vec<RateId> = Vec::with_capacity(ids.len());
    for &id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl fmt::Display for RateGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nuclides: {}", self.nuclides().len())?;
        for kind in RateKind::EMISSION_ORDER {
            let n = self.entries_of_kind(kind).count();
            if n > 0 {
                writeln!(f, "{kind} rates: {n}")?;
            }
        }
        Ok(())
    }
}
