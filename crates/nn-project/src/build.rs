//! Conversion of a validated project into nuclides, rates and a collection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use nn_core::{
    Composition, CustomRate, DerivedRate, LinkKey, Nuclide, PartitionFunction, RateHandle,
    Reaction, ReaclibRate, ReaclibSet, Real, TableGrid, TableMeta, TabularRate, WeakType,
};
use nn_graph::{GraphBuilder, RateCollection};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{
    ApproxDef, ConditionDef, NuclideDef, Project, RateDef, RateLawDef, ReaclibSetDef, WeakTypeDef,
};
use crate::validate::{ValidationError, nuclide_name};

/// Nuclides by reference name.
pub type NuclideTable = HashMap<String, Nuclide>;

pub fn nuclide(def: &NuclideDef) -> ProjectResult<Nuclide> {
    let mut nuc = Nuclide::new(def.symbol.as_str(), def.z, def.a).with_binding_energy(def.binding_energy);
    if let Some(spin) = def.spin_states {
        nuc = nuc.with_spin_states(spin);
    }
    if let Some(pf) = &def.partition_function {
        let pf = PartitionFunction::new(pf.temperature.clone(), pf.log10_values.clone())?;
        nuc = nuc.with_partition_function(pf);
    }
    Ok(nuc)
}

pub fn nuclide_table(project: &Project) -> ProjectResult<NuclideTable> {
    project
        .nuclides
        .iter()
        .map(|def| Ok((nuclide_name(def), nuclide(def)?)))
        .collect()
}

fn lookup(table: &NuclideTable, names: &[String], context: &str) -> ProjectResult<Vec<Nuclide>> {
    names
        .iter()
        .map(|name| {
            table.get(name).cloned().ok_or_else(|| {
                ValidationError::UnknownNuclide {
                    name: name.clone(),
                    context: context.to_string(),
                }
                .into()
            })
        })
        .collect()
}

fn sets(defs: &[ReaclibSetDef]) -> ProjectResult<Vec<ReaclibSet>> {
    defs.iter()
        .map(|s| Ok(ReaclibSet::new(s.label.as_str(), s.a)?))
        .collect()
}

/// One rate; relative table directories are resolved against `base_dir`.
pub fn rate(table: &NuclideTable, def: &RateDef, base_dir: &Path) -> ProjectResult<RateHandle> {
    let context = def.name.as_deref().unwrap_or("rate");
    let reactants = lookup(table, &def.reactants, context)?;
    let products = lookup(table, &def.products, context)?;

    let mut reaction = Reaction::new(reactants, products)
        .reversed(def.reverse)
        .with_weak_type(match def.weak_type {
            WeakTypeDef::None => WeakType::None,
            WeakTypeDef::BetaDecay => WeakType::BetaDecay,
            WeakTypeDef::ElectronCapture => WeakType::ElectronCapture,
        });
    if let Some(name) = &def.name {
        reaction = reaction.with_name(name.as_str());
    }
    if let Some(q) = def.q {
        reaction = reaction.with_q(q);
    }

    let rate: RateHandle = match &def.law {
        RateLawDef::Reaclib { sets: defs } => Arc::new(ReaclibRate::new(reaction, sets(defs)?)),
        RateLawDef::Derived { sets: defs, use_pf } => {
            Arc::new(DerivedRate::new(reaction, sets(defs)?, *use_pf))
        }
        RateLawDef::Constant { value } => Arc::new(CustomRate::constant(reaction, *value)),
        RateLawDef::Tabular(t) => {
            let source_dir = if t.source_dir.is_absolute() {
                t.source_dir.clone()
            } else {
                base_dir.join(&t.source_dir)
            };
            let meta = TableMeta {
                source_dir,
                table_file: t.table_file.clone(),
                index_name: t.index_name.clone(),
                temp_points: t.temp_points,
                rhoy_points: t.rhoy_points,
                num_vars: t.num_vars,
                header_lines: t.header_lines,
            };
            let mut tabular = TabularRate::new(reaction, meta);
            if let Some(g) = &t.grid {
                tabular = tabular.with_grid(TableGrid::new(
                    g.log_rhoy.clone(),
                    g.log_t.clone(),
                    g.log_rate.clone(),
                )?);
            }
            Arc::new(tabular)
        }
    };
    Ok(rate)
}

/// The project's rate set, with every requested approximation folded in.
pub fn build_collection(project: &Project, base_dir: &Path) -> ProjectResult<RateCollection> {
    let table = nuclide_table(project)?;

    let mut builder = GraphBuilder::new();
    for def in &project.rates {
        builder.add_rate(rate(&table, def, base_dir)?);
    }
    for nuc in lookup(&table, &project.inert, "inert")? {
        builder.add_inert(nuc);
    }
    for link in &project.allow_duplicates {
        let reactants = lookup(&table, &link.reactants, "allow_duplicates")?;
        let products = lookup(&table, &link.products, "allow_duplicates")?;
        builder.allow_duplicate(LinkKey::new(&reactants, &products));
    }
    builder.symmetric_screening(project.screening.symmetric);

    let mut collection = RateCollection::new(builder)?;
    for approx in &project.approximations {
        match approx {
            ApproxDef::ApPg { intermediates } => {
                let filter = intermediates
                    .as_ref()
                    .map(|names| lookup(&table, names, "approximations"))
                    .transpose()?;
                let added = collection.make_ap_pg_approx(filter.as_deref())?;
                debug!(added = added.len(), "folded ap_pg approximations");
            }
        }
    }
    debug!(
        project = %project.name,
        nuclides = collection.graph().nuclides().len(),
        rates = collection.graph().rates().len(),
        "built rate collection"
    );
    Ok(collection)
}

/// Density, temperature and composition of one evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub rho: Real,
    pub temp: Real,
    pub composition: Composition,
}

/// `nuclides` is the network the composition covers; unlisted nuclides
/// get zero, an empty listing gets equal fractions.
pub fn condition(table: &NuclideTable, def: &ConditionDef, nuclides: &[Nuclide]) -> ProjectResult<Condition> {
    let mut composition = Composition::new(nuclides.iter().cloned(), 0.0);
    if def.mass_fractions.is_empty() {
        composition.set_equal();
    }
    for (name, x) in &def.mass_fractions {
        let nuc = table.get(name).cloned().ok_or_else(|| ValidationError::UnknownNuclide {
            name: name.clone(),
            context: "conditions".to_string(),
        })?;
        composition.set_nuc(nuc, *x)?;
    }
    Ok(Condition {
        rho: def.rho,
        temp: def.temp,
        composition,
    })
}
