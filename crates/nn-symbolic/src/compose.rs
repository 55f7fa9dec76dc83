//! Per-nuclide right-hand sides and the Jacobian, as symbolic expressions.

use nn_core::{Nuclide, NuclideId, RateId};
use nn_graph::{GraphError, RateGraph, RatePair, dedup};
use tracing::debug;

use crate::error::SymbolicResult;
use crate::expr::{Expr, Ratio, Symbol, Term};

/// Both sides of one rate pair as they affect one nuclide.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTerms {
    pub forward: Option<Expr>,
    pub reverse: Option<Expr>,
}

/// dY/dt of one nuclide.
#[derive(Debug, Clone, PartialEq)]
pub enum NuclideRhs {
    /// Touched by no rate pair.
    Zero,
    /// One entry per rate pair, in pair order.
    Pairs(Vec<PairTerms>),
}

/// One Jacobian cell `d(dY_row/dt)/dY_col`.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianCell {
    pub expr: Expr,
    /// Every contributing rate's derivative is structurally absent.
    pub null: bool,
}

/// Dense, row-major symbolic Jacobian.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicJacobian {
    n: usize,
    cells: Vec<JacobianCell>,
}

impl SymbolicJacobian {
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn cell(&self, row: usize, col: usize) -> &JacobianCell {
        &self.cells[row * self.n + col]
    }

    pub fn is_null(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).null
    }

    /// `(row, col, cell)` in row-major order, null cells skipped.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize, &JacobianCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.null)
            .map(|(i, c)| (i / self.n, i % self.n, c))
    }
}

/// Right-hand side and Jacobian of a graph, indexed like `graph.nuclides()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicSystem {
    pub rhs: Vec<NuclideRhs>,
    pub jacobian: SymbolicJacobian,
}

impl SymbolicSystem {
    pub fn compose(graph: &RateGraph) -> SymbolicResult<Self> {
        let rhs = compose_rhs(graph)?;
        let jacobian = compose_jacobian(graph)?;
        debug!(
            nuclides = rhs.len(),
            live_cells = jacobian.live_cells().count(),
            "composed symbolic system"
        );
        Ok(Self { rhs, jacobian })
    }
}

/// `prefactor * rate * prod(Y) * rho^d * ye^e` for a top-level rate.
pub fn rate_monomial(graph: &RateGraph, id: RateId) -> SymbolicResult<Term> {
    let rate = &graph.entry(id).rate;
    let (num, den) = nn_core::identical_particle_factor(rate.reactants());
    let mut term = Term::constant(Ratio::new(num, den)).times(Symbol::Rate(id), 1);
    for nuc in rate.reactants() {
        term = term.times(Symbol::Abundance(nuclide_id(graph, nuc)?), 1);
    }
    Ok(term
        .times(Symbol::Density, rate.dens_exp())
        .times(Symbol::ElectronFraction, rate.ye_power()))
}

/// Net contribution of rate `id` to dY/dt of `nuc`; a literal zero when the
/// rate creates and destroys it equally.
pub fn ydot_term(graph: &RateGraph, id: RateId, nuc: &Nuclide) -> SymbolicResult<Expr> {
    let rate = &graph.entry(id).rate;
    let net = i64::from(rate.product_count(nuc)) - i64::from(rate.reactant_count(nuc));
    if net == 0 {
        return Ok(Expr::zero());
    }
    Ok(rate_monomial(graph, id)?.scaled(Ratio::integer(net)).into())
}

pub fn compose_rhs(graph: &RateGraph) -> SymbolicResult<Vec<NuclideRhs>> {
    let mut out = Vec::with_capacity(graph.nuclides().len());
    for (i, nuc) in graph.nuclides().iter().enumerate() {
        let pairs: Vec<&RatePair> = graph.nuclide_rate_pairs(NuclideId::from_index(i)).collect();
        if pairs.is_empty() {
            out.push(NuclideRhs::Zero);
            continue;
        }
        let mut terms = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let side = |id: Option<RateId>| id.map(|id| ydot_term(graph, id, nuc)).transpose();
            terms.push(PairTerms {
                forward: side(pair.forward)?,
                reverse: side(pair.reverse)?,
            });
        }
        out.push(NuclideRhs::Pairs(terms));
    }
    Ok(out)
}

/// Consuming rates contribute `-count * d(rate)/dY_col`, producing rates
/// `+count * d(rate)/dY_col`.
pub fn compose_jacobian(graph: &RateGraph) -> SymbolicResult<SymbolicJacobian> {
    let n = graph.nuclides().len();
    let mut cells = Vec::with_capacity(n * n);
    for (row, nuc) in graph.nuclides().iter().enumerate() {
        let row_id = NuclideId::from_index(row);
        let mut weighted: Vec<(Term, i64)> = Vec::new();
        for id in dedup(graph.consumed(row_id)) {
            let c = i64::from(graph.entry(id).rate.reactant_count(nuc));
            weighted.push((rate_monomial(graph, id)?, -c));
        }
        for id in dedup(graph.produced(row_id)) {
            let c = i64::from(graph.entry(id).rate.product_count(nuc));
            weighted.push((rate_monomial(graph, id)?, c));
        }

        for col in 0..n {
            let wrt = Symbol::Abundance(NuclideId::from_index(col));
            let expr: Expr = weighted
                .iter()
                .filter_map(|(term, c)| term.derivative(wrt).map(|d| d.scaled(Ratio::integer(*c))))
                .collect();
            cells.push(JacobianCell {
                null: expr.is_literal_zero(),
                expr,
            });
        }
    }
    Ok(SymbolicJacobian { n, cells })
}

fn nuclide_id(graph: &RateGraph, nuc: &Nuclide) -> SymbolicResult<NuclideId> {
    graph.nuclide_id(nuc).ok_or_else(|| {
        GraphError::UnknownNuclide {
            name: nuc.name(),
        }
        .into()
    })
}
