//! Lookup tables from domain keys to compact ids.

use std::collections::HashMap;

use nn_core::{CoreResult, Nuclide, NuclideId, RateId, RateKey};

/// Ordered nuclide list with O(1) reverse lookup.
#[derive(Debug, Clone, Default)]
pub struct NuclideIndex {
    nuclides: Vec<Nuclide>,
    to_id: HashMap<Nuclide, NuclideId>,
}

impl NuclideIndex {
    pub fn new(nuclides: Vec<Nuclide>) -> CoreResult<Self> {
        NuclideId::try_from_index(nuclides.len())?;
        let to_id = nuclides
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), NuclideId::from_index(i)))
            .collect();
        Ok(Self { nuclides, to_id })
    }

    pub fn nuclides(&self) -> &[Nuclide] {
        &self.nuclides
    }

    pub fn id(&self, nuc: &Nuclide) -> Option<NuclideId> {
        self.to_id.get(nuc).copied()
    }

    pub fn len(&self) -> usize {
        self.nuclides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nuclides.is_empty()
    }
}

/// Rate lookup by emitted name and by structural key.
#[derive(Debug, Clone, Default)]
pub struct RateIndex {
    by_name: HashMap<String, RateId>,
    by_key: HashMap<RateKey, RateId>,
}

impl RateIndex {
    pub(crate) fn insert_key(&mut self, key: RateKey, id: RateId) {
        self.by_key.entry(key).or_insert(id);
    }

    pub(crate) fn insert_name(&mut self, name: String, id: RateId) {
        self.by_name.entry(name).or_insert(id);
    }

    pub fn by_name(&self, name: &str) -> Option<RateId> {
        self.by_name.get(name).copied()
    }

    pub fn by_key(&self, key: &RateKey) -> Option<RateId> {
        self.by_key.get(key).copied()
    }
}
