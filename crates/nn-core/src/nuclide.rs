//! Nuclide identity and the per-nucleus metadata the generators read.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Tabulated partition function, stored as log10 values on a temperature grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFunction {
    temperature: Vec<Real>,
    log10_values: Vec<Real>,
}

impl PartitionFunction {
    /// `temperature` in K, strictly increasing; one log10 value per point.
    pub fn new(temperature: Vec<Real>, log10_values: Vec<Real>) -> CoreResult<Self> {
        if temperature.is_empty() {
            return Err(CoreError::InvalidArg {
                what: "partition function needs at least one temperature".into(),
            });
        }
        if temperature.len() != log10_values.len() {
            return Err(CoreError::InvalidArg {
                what: format!(
                    "partition function has {} temperatures but {} values",
                    temperature.len(),
                    log10_values.len()
                ),
            });
        }
        if temperature
            .iter()
            .chain(log10_values.iter())
            .any(|v| !v.is_finite())
        {
            return Err(CoreError::NonFinite {
                what: "partition function entry",
                value: Real::NAN,
            });
        }
        if temperature.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CoreError::InvalidArg {
                what: "partition function temperatures must be strictly increasing".into(),
            });
        }
        Ok(Self {
            temperature,
            log10_values,
        })
    }

    pub fn temperature(&self) -> &[Real] {
        &self.temperature
    }

    pub fn log10_values(&self) -> &[Real] {
        &self.log10_values
    }

    /// Evaluate at `t` (K), interpolating linearly in log10 and clamping at the grid edges.
    pub fn eval(&self, t: Real) -> Real {
        let n = self.temperature.len();
        let log_pf = if t <= self.temperature[0] {
            self.log10_values[0]
        } else if t >= self.temperature[n - 1] {
            self.log10_values[n - 1]
        } else {
            let hi = self.temperature.partition_point(|&x| x <= t);
            let lo = hi - 1;
            let (t0, t1) = (self.temperature[lo], self.temperature[hi]);
            let (v0, v1) = (self.log10_values[lo], self.log10_values[hi]);
            v0 + (v1 - v0) * (t - t0) / (t1 - t0)
        };
        Real::powf(10.0, log_pf)
    }
}

/// A nucleus participating in the network.
///
/// Identity (equality, hashing, ordering) is the `(Z, A, dummy)` triple, so two
/// nuclides describing the same nucleus compare equal even if one carries
/// partition function data and the other does not. Ordering is by Z, then A,
/// which is the order `unique_nuclei` uses.
#[derive(Debug, Clone)]
pub struct Nuclide {
    symbol: String,
    z: u32,
    a: u32,
    dummy: bool,
    /// Binding energy per nucleon, MeV.
    binding_energy: Real,
    spin_states: Option<u32>,
    partition_function: Option<PartitionFunction>,
}

impl Nuclide {
    /// `symbol` is the element symbol ("He", "Mg", "n" for the neutron).
    pub fn new(symbol: impl Into<String>, z: u32, a: u32) -> Self {
        Self {
            symbol: symbol.into(),
            z,
            a,
            dummy: false,
            binding_energy: 0.0,
            spin_states: None,
            partition_function: None,
        }
    }

    /// A placeholder nucleus (e.g. Be8 in triple-alpha screening) that never
    /// becomes a network species.
    pub fn dummy(symbol: impl Into<String>, z: u32, a: u32) -> Self {
        Self {
            dummy: true,
            ..Self::new(symbol, z, a)
        }
    }

    pub fn proton() -> Self {
        Self::new("H", 1, 1)
    }

    pub fn neutron() -> Self {
        Self::new("n", 0, 1)
    }

    pub fn he4() -> Self {
        Self::new("He", 2, 4)
    }

    pub fn with_binding_energy(mut self, per_nucleon_mev: Real) -> Self {
        self.binding_energy = per_nucleon_mev;
        self
    }

    pub fn with_spin_states(mut self, spin_states: u32) -> Self {
        self.spin_states = Some(spin_states);
        self
    }

    pub fn with_partition_function(mut self, pf: PartitionFunction) -> Self {
        self.partition_function = Some(pf);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn a(&self) -> u32 {
        self.a
    }

    pub fn n(&self) -> u32 {
        self.a - self.z
    }

    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    pub fn is_proton(&self) -> bool {
        self.z == 1 && self.a == 1
    }

    pub fn is_alpha(&self) -> bool {
        self.z == 2 && self.a == 4
    }

    /// Binding energy per nucleon, MeV.
    pub fn binding_energy(&self) -> Real {
        self.binding_energy
    }

    /// Total binding energy, MeV.
    pub fn total_binding_energy(&self) -> Real {
        self.binding_energy * Real::from(self.a)
    }

    pub fn spin_states(&self) -> Option<u32> {
        self.spin_states
    }

    pub fn partition_function(&self) -> Option<&PartitionFunction> {
        self.partition_function.as_ref()
    }

    /// Short name used in rate names and screening group names
    /// ("p", "n", "d", "t", otherwise element+A, e.g. "He4").
    pub fn name(&self) -> String {
        match (self.z, self.a) {
            (0, 1) => "n".into(),
            (1, 1) => "p".into(),
            (1, 2) => "d".into(),
            (1, 3) => "t".into(),
            _ => format!("{}{}", capitalize(&self.symbol), self.a),
        }
    }

    /// Identifier used for array indices in generated code ("H1", "N", "He4").
    pub fn cindex(&self) -> String {
        if self.z == 0 && self.a == 1 {
            "N".into()
        } else {
            format!("{}{}", capitalize(&self.symbol), self.a)
        }
    }

    fn key(&self) -> (u32, u32, bool) {
        (self.z, self.a, self.dummy)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl PartialEq for Nuclide {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Nuclide {}

impl Hash for Nuclide {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Nuclide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Nuclide {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Nuclide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_cindex() {
        assert_eq!(Nuclide::proton().name(), "p");
        assert_eq!(Nuclide::proton().cindex(), "H1");
        assert_eq!(Nuclide::neutron().name(), "n");
        assert_eq!(Nuclide::neutron().cindex(), "N");
        assert_eq!(Nuclide::new("mg", 12, 24).name(), "Mg24");
        assert_eq!(Nuclide::he4().cindex(), "He4");
    }

    #[test]
    fn ordering_is_by_z_then_a() {
        let mut v = vec![
            Nuclide::new("Mg", 12, 24),
            Nuclide::new("Mg", 12, 23),
            Nuclide::he4(),
            Nuclide::proton(),
        ];
        v.sort();
        let names: Vec<_> = v.iter().map(Nuclide::name).collect();
        assert_eq!(names, ["p", "He4", "Mg23", "Mg24"]);
    }

    #[test]
    fn dummy_is_distinct() {
        let be8 = Nuclide::new("Be", 4, 8);
        let be8_dummy = Nuclide::dummy("Be", 4, 8);
        assert_ne!(be8, be8_dummy);
        assert_eq!(be8.name(), be8_dummy.name());
    }

    #[test]
    fn identity_ignores_metadata() {
        let plain = Nuclide::new("Ne", 10, 20);
        let rich = Nuclide::new("Ne", 10, 20)
            .with_binding_energy(8.03)
            .with_spin_states(1);
        assert_eq!(plain, rich);
    }

    #[test]
    fn partition_function_interpolates_in_log() {
        let pf = PartitionFunction::new(vec![1.0e9, 2.0e9], vec![0.0, 1.0]).unwrap();
        assert!((pf.eval(1.5e9) - Real::powf(10.0, 0.5)).abs() < 1e-12);
        assert_eq!(pf.eval(1.0e8), 1.0);
        assert_eq!(pf.eval(5.0e9), 10.0);
    }

    #[test]
    fn partition_function_rejects_bad_grid() {
        assert!(PartitionFunction::new(vec![], vec![]).is_err());
        assert!(PartitionFunction::new(vec![1.0, 2.0], vec![0.0]).is_err());
        assert!(PartitionFunction::new(vec![2.0, 1.0], vec![0.0, 0.0]).is_err());
    }
}
