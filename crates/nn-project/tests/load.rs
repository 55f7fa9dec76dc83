//! Integration tests for nn-project.

use std::fs;

use nn_core::{RateKind, Real};
use nn_project::{
    ProjectError, ValidationError, build_collection, condition, load_json, load_yaml,
    nuclide_table, save_json, save_yaml,
};

const HELIUM: &str = r#"
version: 1
name: helium
nuclides:
  - { symbol: He, z: 2, a: 4, binding_energy: 7.074, spin_states: 1 }
  - { symbol: C, z: 6, a: 12, binding_energy: 7.680, spin_states: 1 }
  - { symbol: O, z: 8, a: 16, binding_energy: 7.976, spin_states: 1 }
  - { symbol: Fe, z: 26, a: 56, binding_energy: 8.790 }
rates:
  - reactants: [He4, He4, He4]
    products: [C12]
    law:
      type: reaclib
      sets:
        - { label: fy05, a: [-0.971052, 0.0, -37.06, 29.3493, -115.507, -10.0, -1.33333] }
  - reactants: [He4, C12]
    products: [O16]
    law: { type: constant, value: 2.5e-3 }
  - reactants: [O16]
    products: [He4, C12]
    reverse: true
    law: { type: constant, value: 1.0e-9 }
  - reactants: [C12]
    products: [O16]
    q: 1.0
    law:
      type: tabular
      source_dir: tables
      table_file: c12-o16.dat
      index_name: j_c12_o16
      temp_points: 13
      rhoy_points: 11
      num_vars: 6
      header_lines: 5
inert: [Fe56]
screening: { symmetric: true }
output:
  templates: [templates/actual_network.H.template]
  out_dir: generated
conditions:
  - { rho: 1.0e6, temp: 2.0e8, mass_fractions: { He4: 0.9, C12: 0.1 } }
  - { rho: 1.0e4, temp: 1.0e8 }
"#;

#[test]
fn loads_and_builds_helium_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helium.yaml");
    fs::write(&path, HELIUM).unwrap();

    let project = load_yaml(&path).unwrap();
    assert_eq!(project.rates.len(), 4);
    assert!(project.screening.enabled);
    assert!(project.screening.symmetric);

    let collection = build_collection(&project, dir.path()).unwrap();
    let graph = collection.graph();
    let names: Vec<String> = graph.nuclides().iter().map(|n| n.name()).collect();
    assert_eq!(names, ["He4", "C12", "O16", "Fe56"]);
    assert!(graph.symmetric_screening());

    let kinds: Vec<RateKind> = graph.entries().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        [RateKind::Reaclib, RateKind::Custom, RateKind::Custom, RateKind::Tabular]
    );
    let table = graph.entries()[3].rate.table().unwrap();
    assert_eq!(table.source_dir, dir.path().join("tables"));

    // O16 -> He4 + C12 takes Q from the binding energies
    let reverse = graph.rate_by_name("O16_to_He4_C12").unwrap();
    assert!(reverse.q() < 0.0);
    assert!(reverse.is_reverse());
}

#[test]
fn conditions_cover_the_network() {
    let project: nn_project::Project = serde_yaml::from_str(HELIUM).unwrap();
    let table = nuclide_table(&project).unwrap();
    let collection = build_collection(&project, std::path::Path::new(".")).unwrap();
    let nuclides = collection.graph().nuclides();

    let first = condition(&table, &project.conditions[0], nuclides).unwrap();
    assert_eq!(first.rho, 1.0e6);
    assert!((first.composition.sum_x() - 1.0).abs() < 1e-12);
    assert_eq!(first.composition.mass_fraction(&nuclides[3]), 0.0);

    let second = condition(&table, &project.conditions[1], nuclides).unwrap();
    let each: Real = second.composition.mass_fraction(&nuclides[0]);
    assert!((each - 0.25).abs() < 1e-12);
}

#[test]
fn unknown_reference_fails_before_building() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, HELIUM.replace("inert: [Fe56]", "inert: [Ni56]")).unwrap();
    let err = load_yaml(&path).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Validation(ValidationError::UnknownNuclide { ref name, .. }) if name == "Ni56"
    ));
}

#[test]
fn duplicate_links_surface_as_network_errors() {
    let mut project: nn_project::Project = serde_yaml::from_str(HELIUM).unwrap();
    let mut dup = project.rates[1].clone();
    dup.name = Some("He4_C12_to_O16_second".into());
    project.rates.push(dup);
    let err = build_collection(&project, std::path::Path::new(".")).unwrap_err();
    assert!(matches!(err, ProjectError::Graph(_)));

    project.allow_duplicates.push(nn_project::LinkDef {
        reactants: vec!["He4".into(), "C12".into()],
        products: vec!["O16".into()],
    });
    build_collection(&project, std::path::Path::new(".")).unwrap();
}

#[test]
fn roundtrip_yaml_and_json() {
    let project: nn_project::Project = serde_yaml::from_str(HELIUM).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let yaml = dir.path().join("out.yaml");
    save_yaml(&yaml, &project).unwrap();
    assert_eq!(load_yaml(&yaml).unwrap(), project);

    let json = dir.path().join("out.json");
    save_json(&json, &project).unwrap();
    assert_eq!(load_json(&json).unwrap(), project);
}
