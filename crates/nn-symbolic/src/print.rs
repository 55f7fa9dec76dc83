//! C++ rendering of symbolic expressions.

use nn_graph::RateGraph;

use crate::expr::{Expr, Symbol, Term};

/// Names of the runtime quantities in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNames {
    pub rate: String,
    pub abundance: String,
    pub density: String,
    pub electron_fraction: String,
}

impl Default for SymbolNames {
    fn default() -> Self {
        Self {
            rate: "screened_rates".into(),
            abundance: "Y".into(),
            density: "state.rho".into(),
            electron_fraction: "state.y_e".into(),
        }
    }
}

/// Renders [`Expr`]s as C++ against a fixed graph.
#[derive(Debug, Clone, Copy)]
pub struct CxxPrinter<'g> {
    graph: &'g RateGraph,
    names: &'g SymbolNames,
}

impl<'g> CxxPrinter<'g> {
    pub fn new(graph: &'g RateGraph, names: &'g SymbolNames) -> Self {
        Self { graph, names }
    }

    pub fn symbol(&self, symbol: Symbol) -> String {
        match symbol {
            Symbol::Rate(id) => format!("{}(k_{})", self.names.rate, self.graph.entry(id).name()),
            Symbol::Abundance(id) => {
                let cindex = self
                    .graph
                    .nuclide(id)
                    .map_or_else(|| format!("{id}"), |n| n.cindex());
                format!("{}({cindex})", self.names.abundance)
            }
            Symbol::Density => self.names.density.clone(),
            Symbol::ElectronFraction => self.names.electron_fraction.clone(),
        }
    }

    /// A term without its sign.
    fn magnitude(&self, term: &Term) -> String {
        let coeff = term.coeff().abs();
        let mut parts: Vec<String> = Vec::with_capacity(term.factors().len() + 1);
        if coeff.den() != 1 {
            parts.push(format!("({}.0/{}.0)", coeff.num(), coeff.den()));
        } else if coeff.num() != 1 || term.factors().is_empty() {
            parts.push(coeff.num().to_string());
        }
        for &(symbol, power) in term.factors() {
            let base = self.symbol(symbol);
            if power == 1 {
                parts.push(base);
            } else {
                parts.push(format!("std::pow({base}, {power})"));
            }
        }
        parts.join("*")
    }

    pub fn term(&self, term: &Term) -> String {
        if term.coeff().is_zero() {
            return "0.0".into();
        }
        let sign = if term.coeff().is_negative() { "-" } else { "" };
        format!("{sign}{}", self.magnitude(term))
    }

    /// Terms in order, joined with their own signs; the literal zero is `0.0`.
    pub fn expr(&self, expr: &Expr) -> String {
        let mut out = String::new();
        for (i, term) in expr.terms().iter().enumerate() {
            if i == 0 {
                out.push_str(&self.term(term));
            } else if term.coeff().is_negative() {
                out.push_str(" - ");
                out.push_str(&self.magnitude(term));
            } else {
                out.push_str(" + ");
                out.push_str(&self.magnitude(term));
            }
        }
        if out.is_empty() {
            out.push_str("0.0");
        }
        out
    }
}
