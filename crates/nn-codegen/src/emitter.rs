//! Template processing and table staging.

use std::fs;
use std::path::{Path, PathBuf};

use nn_core::RateKind;
use tracing::{info, warn};

use crate::context::EmitContext;
use crate::error::{EmitError, EmitResult, EmitWarning};
use crate::marker::{MarkerTable, parse_indent};

/// What a generation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Generated files, in template order.
    pub written: Vec<PathBuf>,
    /// Table data files copied next to the generated code.
    pub staged_tables: Vec<PathBuf>,
    pub warnings: Vec<EmitWarning>,
}

/// Expands marker lines of template files into generated source.
pub struct TemplateEmitter<'a, 'g> {
    markers: &'a MarkerTable,
    ctx: &'a EmitContext<'g>,
}

impl<'a, 'g> TemplateEmitter<'a, 'g> {
    pub fn new(markers: &'a MarkerTable, ctx: &'a EmitContext<'g>) -> Self {
        Self { markers, ctx }
    }

    /// Write one output per template into `out_dir` (the working directory
    /// when `None`), then stage the tabular rates' data files there.
    pub fn emit(&self, templates: &[PathBuf], out_dir: Option<&Path>) -> EmitResult<EmitReport> {
        self.ctx.symbolic()?;

        let dir = match out_dir {
            Some(dir) => {
                ensure_dir(dir)?;
                dir.to_path_buf()
            }
            None => std::env::current_dir().map_err(|source| EmitError::Io {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let mut report = EmitReport::default();
        for template in templates {
            let target = dir.join(output_name(template));
            let text = fs::read_to_string(template).map_err(|source| EmitError::Io {
                path: template.clone(),
                source,
            })?;
            let expanded = self.expand(template, &text)?;
            fs::write(&target, expanded).map_err(|source| EmitError::Io {
                path: target.clone(),
                source,
            })?;
            info!(template = %template.display(), output = %target.display(), "expanded template");
            report.written.push(target);
        }

        self.stage_tables(&dir, &mut report)?;
        info!(
            files = report.written.len(),
            tables = report.staged_tables.len(),
            warnings = report.warnings.len(),
            "network written"
        );
        Ok(report)
    }

    /// Expand every marker line of `text`; other lines pass through unchanged.
    pub fn expand(&self, template: &Path, text: &str) -> EmitResult<String> {
        let mut out = String::with_capacity(text.len());
        for (i, raw) in text.split_inclusive('\n').enumerate() {
            let stripped = raw.trim();
            let Some(entry) = self.markers.lookup(stripped) else {
                out.push_str(raw);
                continue;
            };
            let Some(indent) = parse_indent(stripped, entry.marker.token()) else {
                return Err(EmitError::MalformedMarker {
                    template: template.to_path_buf(),
                    line: i + 1,
                    text: stripped.to_string(),
                });
            };
            (entry.generator)(self.ctx, indent, &mut out)?;
        }
        Ok(out)
    }

    fn stage_tables(&self, dir: &Path, report: &mut EmitReport) -> EmitResult<()> {
        for entry in self.ctx.graph().entries_of_kind(RateKind::Tabular) {
            let Some(meta) = entry.rate.table() else {
                continue;
            };
            if meta.lives_in(dir) {
                continue;
            }
            let source = meta.source_path();
            if !source.is_file() {
                warn!(file = %meta.table_file, rate = entry.name(), "table data file not found");
                report.warnings.push(EmitWarning::MissingTable { file: source });
                continue;
            }
            let target = dir.join(&meta.table_file);
            if same_file(&source, &target) {
                continue;
            }
            fs::copy(&source, &target).map_err(|source| EmitError::Io {
                path: target.clone(),
                source,
            })?;
            info!(file = %target.display(), "staged table data");
            report.staged_tables.push(target);
        }
        Ok(())
    }
}

/// Template basename with `.template` removed.
pub fn output_name(template: &Path) -> String {
    let base = template
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.replace(".template", "")
}

/// Copying a file onto itself truncates it.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn ensure_dir(dir: &Path) -> EmitResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir(dir).map_err(|source| EmitError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}
