//! nn-codegen: template-driven source generation for a frozen rate graph.
//!
//! Provides:
//! - Marker / MarkerTable (template injection points and their generators)
//! - EmitContext / EmitConfig (graph, screening plan, lazily composed system)
//! - TemplateEmitter (template expansion plus tabular data staging)
//! - EmitError for faults, EmitWarning for recoverable conditions

pub mod context;
pub mod emitter;
pub mod error;
mod generators;
pub mod marker;

pub use context::{EmitConfig, EmitContext};
pub use emitter::{EmitReport, TemplateEmitter, output_name};
pub use error::{EmitError, EmitResult, EmitWarning};
pub use marker::{Generator, Marker, MarkerEntry, MarkerTable, parse_indent};
