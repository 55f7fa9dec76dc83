//! The `Rate` abstraction and the reaction data every rate kind shares.

use core::fmt;
use std::sync::Arc;

use crate::approximate::ApproximateRate;
use crate::nuclide::Nuclide;
use crate::numeric::Real;
use crate::reaclib::ReaclibSet;
use crate::tabular::TableMeta;

/// Shared handle to a rate; rates are immutable once built and shared between
/// the top-level list and the approximate rates that reference them.
pub type RateHandle = Arc<dyn Rate>;

/// Kind tag, declared in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateKind {
    Reaclib,
    Custom,
    Tabular,
    Approximate,
    Derived,
}

impl RateKind {
    /// Order in which kinds appear in the emitted rate list.
    pub const EMISSION_ORDER: [RateKind; 5] = [
        RateKind::Reaclib,
        RateKind::Custom,
        RateKind::Tabular,
        RateKind::Approximate,
        RateKind::Derived,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RateKind::Reaclib => "reaclib",
            RateKind::Custom => "custom",
            RateKind::Tabular => "tabular",
            RateKind::Approximate => "approximate",
            RateKind::Derived => "derived",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weak-interaction classification of a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeakType {
    #[default]
    None,
    BetaDecay,
    ElectronCapture,
}

/// Reactants and products as sorted multisets: the identity of a reaction link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    reactants: Vec<Nuclide>,
    products: Vec<Nuclide>,
}

impl LinkKey {
    pub fn new(reactants: &[Nuclide], products: &[Nuclide]) -> Self {
        let mut reactants = reactants.to_vec();
        let mut products = products.to_vec();
        reactants.sort();
        products.sort();
        Self {
            reactants,
            products,
        }
    }

    pub fn reactants(&self) -> &[Nuclide] {
        &self.reactants
    }

    pub fn products(&self) -> &[Nuclide] {
        &self.products
    }

    /// The same link traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            reactants: self.products.clone(),
            products: self.reactants.clone(),
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            join_names(&self.reactants, " + "),
            join_names(&self.products, " + ")
        )
    }
}

/// Structural identity of a rate: its link plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    pub link: LinkKey,
    pub kind: RateKind,
}

/// Data common to every rate kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    name: String,
    reactants: Vec<Nuclide>,
    products: Vec<Nuclide>,
    q: Real,
    reverse: bool,
    weak_type: WeakType,
}

impl Reaction {
    /// Build a reaction named after its sorted endpoints, e.g. `He4_Mg24_to_Si28`,
    /// with Q taken from the binding-energy difference (MeV).
    pub fn new(reactants: Vec<Nuclide>, products: Vec<Nuclide>) -> Self {
        let q = products.iter().map(Nuclide::total_binding_energy).sum::<Real>()
            - reactants
                .iter()
                .map(Nuclide::total_binding_energy)
                .sum::<Real>();
        Self {
            name: link_name(&reactants, &products),
            reactants,
            products,
            q,
            reverse: false,
            weak_type: WeakType::None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_q(mut self, q: Real) -> Self {
        self.q = q;
        self
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_weak_type(mut self, weak_type: WeakType) -> Self {
        self.weak_type = weak_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reactants(&self) -> &[Nuclide] {
        &self.reactants
    }

    pub fn products(&self) -> &[Nuclide] {
        &self.products
    }

    pub fn q(&self) -> Real {
        self.q
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn weak_type(&self) -> WeakType {
        self.weak_type
    }

    /// `A + B --> C` with endpoints in their given order.
    pub fn equation(&self) -> String {
        format!(
            "{} --> {}",
            join_names(&self.reactants, " + "),
            join_names(&self.products, " + ")
        )
    }
}

/// `He4_Mg24_to_Si28` style name from sorted endpoints.
pub fn link_name(reactants: &[Nuclide], products: &[Nuclide]) -> String {
    let key = LinkKey::new(reactants, products);
    format!(
        "{}_to_{}",
        join_names(key.reactants(), "_"),
        join_names(key.products(), "_")
    )
}

pub(crate) fn join_names(nuclides: &[Nuclide], sep: &str) -> String {
    nuclides
        .iter()
        .map(Nuclide::name)
        .collect::<Vec<_>>()
        .join(sep)
}

/// A reaction rate as the network tools see it.
///
/// Implementors only supply their [`Reaction`], kind and evaluation; the
/// stoichiometric helpers have defaults shared by all kinds.
pub trait Rate: fmt::Debug + Send + Sync {
    fn reaction(&self) -> &Reaction;

    fn kind(&self) -> RateKind;

    /// Rate coefficient at temperature `t` (K) and `rho_ye` (g/cm^3).
    fn eval(&self, t: Real, rho_ye: Real) -> Real;

    /// Temperature derivative of [`Rate::eval`]; centred difference unless
    /// the kind knows better.
    fn eval_dt(&self, t: Real, rho_ye: Real) -> Real {
        let h = 1.0e-6 * t.abs().max(1.0);
        (self.eval(t + h, rho_ye) - self.eval(t - h, rho_ye)) / (2.0 * h)
    }

    fn name(&self) -> &str {
        self.reaction().name()
    }

    fn reactants(&self) -> &[Nuclide] {
        self.reaction().reactants()
    }

    fn products(&self) -> &[Nuclide] {
        self.reaction().products()
    }

    fn q(&self) -> Real {
        self.reaction().q()
    }

    fn is_reverse(&self) -> bool {
        self.reaction().is_reverse()
    }

    fn weak_type(&self) -> WeakType {
        self.reaction().weak_type()
    }

    /// Power of the electron fraction multiplying the rate in dY/dt.
    ///
    /// Electron captures carry one, except tabulated ones whose tables already
    /// fold it in.
    fn ye_power(&self) -> u32 {
        u32::from(self.weak_type() == WeakType::ElectronCapture && self.kind() != RateKind::Tabular)
    }

    /// Power of the density multiplying the rate in dY/dt.
    fn dens_exp(&self) -> u32 {
        saturating_u32(self.reactants().len().saturating_sub(1)).saturating_add(self.ye_power())
    }

    /// Identical-particle correction, `1 / prod(count!)` over repeated reactants.
    fn prefactor(&self) -> Real {
        let (num, den) = identical_particle_factor(self.reactants());
        num as Real / den as Real
    }

    /// Constituent rates of a composite, in their fixed role order.
    fn children(&self) -> &[RateHandle] {
        &[]
    }

    fn table(&self) -> Option<&TableMeta> {
        None
    }

    fn reaclib_sets(&self) -> &[ReaclibSet] {
        &[]
    }

    fn uses_partition_functions(&self) -> bool {
        false
    }

    fn as_approximate(&self) -> Option<&ApproximateRate> {
        None
    }

    fn link_key(&self) -> LinkKey {
        LinkKey::new(self.reactants(), self.products())
    }

    fn rate_key(&self) -> RateKey {
        RateKey {
            link: self.link_key(),
            kind: self.kind(),
        }
    }

    /// Number of times `nuc` appears among the reactants.
    fn reactant_count(&self, nuc: &Nuclide) -> u32 {
        saturating_u32(self.reactants().iter().filter(|n| *n == nuc).count())
    }

    /// Number of times `nuc` appears among the products.
    fn product_count(&self, nuc: &Nuclide) -> u32 {
        saturating_u32(self.products().iter().filter(|n| *n == nuc).count())
    }
}

/// `(1, prod(count!))` for the multiset of reactants, as an exact fraction.
pub fn identical_particle_factor(reactants: &[Nuclide]) -> (i64, i64) {
    let mut sorted = reactants.to_vec();
    sorted.sort();
    let mut den = 1_i64;
    let mut run = 0_i64;
    for (i, nuc) in sorted.iter().enumerate() {
        if i > 0 && sorted[i - 1] == *nuc {
            run += 1;
        } else {
            run = 1;
        }
        den *= run;
    }
    (1, den)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
