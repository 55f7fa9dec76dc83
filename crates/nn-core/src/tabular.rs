//! Rates read from pre-computed (temperature, rho*Ye) tables.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;
use crate::rate::{Rate, RateKind, Reaction};

/// Where a table lives and how it is shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    /// Directory holding `table_file`.
    pub source_dir: PathBuf,
    pub table_file: String,
    /// Identifier stem used for the generated table variables (`j_na23_ne23`).
    pub index_name: String,
    pub temp_points: usize,
    pub rhoy_points: usize,
    pub num_vars: usize,
    pub header_lines: usize,
}

impl TableMeta {
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.table_file)
    }

    /// Whether `dir` is the table's directory, however either path is spelled.
    pub fn lives_in(&self, dir: &Path) -> bool {
        if self.source_dir == dir {
            return true;
        }
        match (fs::canonicalize(&self.source_dir), fs::canonicalize(dir)) {
            (Ok(source), Ok(dir)) => source == dir,
            _ => false,
        }
    }
}

/// In-memory log10 table for direct evaluation, row-major in (rhoy, temperature).
#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    log_rhoy: Vec<Real>,
    log_t: Vec<Real>,
    log_rate: Vec<Real>,
}

impl TableGrid {
    pub fn new(log_rhoy: Vec<Real>, log_t: Vec<Real>, log_rate: Vec<Real>) -> CoreResult<Self> {
        if log_rhoy.is_empty() || log_t.is_empty() {
            return Err(CoreError::InvalidArg {
                what: "rate table needs at least one density and one temperature".into(),
            });
        }
        if log_rate.len() != log_rhoy.len() * log_t.len() {
            return Err(CoreError::InvalidArg {
                what: format!(
                    "rate table has {} entries, expected {}x{}",
                    log_rate.len(),
                    log_rhoy.len(),
                    log_t.len()
                ),
            });
        }
        Ok(Self {
            log_rhoy,
            log_t,
            log_rate,
        })
    }

    fn at(&self, i: usize, j: usize) -> Real {
        self.log_rate[i * self.log_t.len() + j]
    }

    /// Bilinear interpolation in log10 space, clamped to the table edges.
    pub fn eval(&self, t: Real, rho_ye: Real) -> Real {
        let (i0, i1, fi) = bracket(&self.log_rhoy, rho_ye.log10());
        let (j0, j1, fj) = bracket(&self.log_t, t.log10());
        let lo = self.at(i0, j0) * (1.0 - fj) + self.at(i0, j1) * fj;
        let hi = self.at(i1, j0) * (1.0 - fj) + self.at(i1, j1) * fj;
        Real::powf(10.0, lo * (1.0 - fi) + hi * fi)
    }
}

fn bracket(axis: &[Real], x: Real) -> (usize, usize, Real) {
    let n = axis.len();
    if n == 1 || x <= axis[0] {
        return (0, 0, 0.0);
    }
    if x >= axis[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    let hi = axis.partition_point(|&v| v <= x);
    let lo = hi - 1;
    (lo, hi, (x - axis[lo]) / (axis[hi] - axis[lo]))
}

#[derive(Debug, Clone)]
pub struct TabularRate {
    reaction: Reaction,
    meta: TableMeta,
    grid: Option<TableGrid>,
}

impl TabularRate {
    pub fn new(reaction: Reaction, meta: TableMeta) -> Self {
        Self {
            reaction,
            meta,
            grid: None,
        }
    }

    pub fn with_grid(mut self, grid: TableGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }
}

impl Rate for TabularRate {
    fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    fn kind(&self) -> RateKind {
        RateKind::Tabular
    }

    /// Zero when no in-memory grid was attached; generated code reads the
    /// staged table file instead.
    fn eval(&self, t: Real, rho_ye: Real) -> Real {
        self.grid.as_ref().map_or(0.0, |g| g.eval(t, rho_ye))
    }

    fn table(&self) -> Option<&TableMeta> {
        Some(&self.meta)
    }
}
