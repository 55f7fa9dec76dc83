//! Project validation logic.

use std::collections::HashSet;

use nn_core::Nuclide;

use crate::schema::{ApproxDef, NuclideDef, Project, RateDef, RateLawDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate nuclide: {name}")]
    DuplicateNuclide { name: String },

    #[error("Unknown nuclide: {name} in {context}")]
    UnknownNuclide { name: String, context: String },

    #[error("Rate {rate} has no reactants")]
    EmptyReactants { rate: String },

    #[error("Non-finite value in {field}")]
    NonFinite { field: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Short name a nuclide definition is referenced by.
pub fn nuclide_name(def: &NuclideDef) -> String {
    Nuclide::new(def.symbol.as_str(), def.z, def.a).name()
}

fn finite(field: impl FnOnce() -> String, values: &[f64]) -> Result<(), ValidationError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field: field() })
    }
}

fn known(names: &HashSet<String>, refs: &[String], context: &str) -> Result<(), ValidationError> {
    match refs.iter().find(|r| !names.contains(*r)) {
        Some(name) => Err(ValidationError::UnknownNuclide {
            name: name.clone(),
            context: context.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut names = HashSet::new();
    for def in &project.nuclides {
        let name = nuclide_name(def);
        if def.a == 0 || def.z > def.a {
            return Err(ValidationError::InvalidValue {
                field: format!("nuclides.{name}"),
                value: format!("Z={} A={}", def.z, def.a),
                reason: "need 0 <= Z <= A and A > 0".to_string(),
            });
        }
        finite(|| format!("nuclides.{name}.binding_energy"), &[def.binding_energy])?;
        if let Some(pf) = &def.partition_function {
            finite(|| format!("nuclides.{name}.partition_function"), &pf.temperature)?;
            finite(|| format!("nuclides.{name}.partition_function"), &pf.log10_values)?;
        }
        if !names.insert(name.clone()) {
            return Err(ValidationError::DuplicateNuclide { name });
        }
    }

    for (i, rate) in project.rates.iter().enumerate() {
        validate_rate(&names, i, rate)?;
    }

    known(&names, &project.inert, "inert")?;
    for link in &project.allow_duplicates {
        known(&names, &link.reactants, "allow_duplicates")?;
        known(&names, &link.products, "allow_duplicates")?;
    }
    for approx in &project.approximations {
        match approx {
            ApproxDef::ApPg {
                intermediates: Some(x),
            } => known(&names, x, "approximations")?,
            ApproxDef::ApPg { intermediates: None } => {}
        }
    }

    for (i, cond) in project.conditions.iter().enumerate() {
        let field = format!("conditions[{i}]");
        finite(|| field.clone(), &[cond.rho, cond.temp])?;
        if cond.rho <= 0.0 || cond.temp <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field,
                value: format!("rho={} T={}", cond.rho, cond.temp),
                reason: "density and temperature must be positive".to_string(),
            });
        }
        let refs: Vec<String> = cond.mass_fractions.keys().cloned().collect();
        known(&names, &refs, &field)?;
        let fractions: Vec<f64> = cond.mass_fractions.values().copied().collect();
        finite(|| field.clone(), &fractions)?;
    }

    Ok(())
}

fn validate_rate(names: &HashSet<String>, index: usize, rate: &RateDef) -> Result<(), ValidationError> {
    let label = rate
        .name
        .clone()
        .unwrap_or_else(|| format!("rates[{index}]"));

    if rate.reactants.is_empty() {
        return Err(ValidationError::EmptyReactants { rate: label });
    }
    known(names, &rate.reactants, &label)?;
    known(names, &rate.products, &label)?;
    if let Some(q) = rate.q {
        finite(|| format!("{label}.q"), &[q])?;
    }

    match &rate.law {
        RateLawDef::Reaclib { sets } | RateLawDef::Derived { sets, .. } => {
            for set in sets {
                finite(|| format!("{label}.{}", set.label), &set.a)?;
            }
        }
        RateLawDef::Constant { value } => finite(|| format!("{label}.value"), &[*value])?,
        RateLawDef::Tabular(table) => {
            if table.temp_points == 0 || table.rhoy_points == 0 || table.num_vars == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("{label}.table"),
                    value: format!(
                        "{}x{}x{}",
                        table.temp_points, table.rhoy_points, table.num_vars
                    ),
                    reason: "table dimensions must be positive".to_string(),
                });
            }
            if let Some(grid) = &table.grid {
                finite(|| format!("{label}.grid"), &grid.log_rhoy)?;
                finite(|| format!("{label}.grid"), &grid.log_t)?;
                finite(|| format!("{label}.grid"), &grid.log_rate)?;
            }
        }
    }
    Ok(())
}
