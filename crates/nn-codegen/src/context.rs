//! Emission options and the state generators read from.

use std::cell::OnceCell;

use nn_graph::RateGraph;
use nn_screening::{ScreeningOptions, ScreeningPlan};
use nn_symbolic::{CxxPrinter, SymbolNames, SymbolicSystem};
use tracing::debug;

use crate::error::EmitResult;

/// Target-idiom knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitConfig {
    /// One indent level.
    pub indent: String,
    /// Scalar type in generated function signatures.
    pub dtype: String,
    /// Specifier placed before generated functions.
    pub function_specifier: String,
    pub names: SymbolNames,
    pub screening: ScreeningOptions,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: "    ".into(),
            dtype: "double".into(),
            function_specifier: "inline".into(),
            names: SymbolNames::default(),
            screening: ScreeningOptions::default(),
        }
    }
}

impl EmitConfig {
    /// Defaults, with symmetric screening taken from the graph.
    pub fn for_graph(graph: &RateGraph) -> Self {
        Self {
            screening: ScreeningOptions::for_graph(graph),
            ..Self::default()
        }
    }

    pub fn indent(&self, levels: usize) -> String {
        self.indent.repeat(levels)
    }
}

/// A frozen graph plus the derived state markers need.
///
/// The symbolic system is composed on first use and reused for every later
/// marker occurrence.
pub struct EmitContext<'g> {
    graph: &'g RateGraph,
    config: EmitConfig,
    screening: ScreeningPlan,
    symbolic: OnceCell<SymbolicSystem>,
}

impl<'g> EmitContext<'g> {
    pub fn new(graph: &'g RateGraph, config: EmitConfig) -> Self {
        let screening = ScreeningPlan::build(graph, config.screening);
        Self {
            graph,
            config,
            screening,
            symbolic: OnceCell::new(),
        }
    }

    /// Use an already composed system instead of composing lazily.
    pub fn with_symbolic(self, system: SymbolicSystem) -> Self {
        let symbolic = OnceCell::new();
        let _ = symbolic.set(system);
        Self { symbolic, ..self }
    }

    pub fn graph(&self) -> &'g RateGraph {
        self.graph
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    pub fn screening(&self) -> &ScreeningPlan {
        &self.screening
    }

    pub fn printer(&self) -> CxxPrinter<'_> {
        CxxPrinter::new(self.graph, &self.config.names)
    }

    pub fn is_composed(&self) -> bool {
        self.symbolic.get().is_some()
    }

    pub fn symbolic(&self) -> EmitResult<&SymbolicSystem> {
        if let Some(system) = self.symbolic.get() {
            return Ok(system);
        }
        let system = SymbolicSystem::compose(self.graph)?;
        debug!("composed right-hand side and jacobian");
        Ok(self.symbolic.get_or_init(|| system))
    }

    pub fn indent(&self, levels: usize) -> String {
        self.config.indent(levels)
    }
}
