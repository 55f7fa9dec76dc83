//! Integration tests for nn-codegen.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nn_codegen::{
    EmitConfig, EmitContext, EmitError, EmitWarning, MarkerTable, TemplateEmitter,
};
use nn_core::{
    CustomRate, DerivedRate, Nuclide, PartitionFunction, RateHandle, Reaction, ReaclibRate,
    ReaclibSet, TableMeta, TabularRate,
};
use nn_graph::{GraphBuilder, RateGraph};
use nn_screening::ScreeningOptions;

fn nuc(sym: &str, z: u32, a: u32) -> Nuclide {
    Nuclide::new(sym, z, a)
}

fn constant(reactants: Vec<Nuclide>, products: Vec<Nuclide>, q: f64) -> RateHandle {
    let reaction = Reaction::new(reactants, products).with_q(q).reversed(q < 0.0);
    Arc::new(CustomRate::constant(reaction, 1.0))
}

fn two_state() -> RateGraph {
    let (a, b) = (nuc("C", 6, 12), nuc("N", 7, 12));
    GraphBuilder::new()
        .add_rate(constant(vec![a.clone()], vec![b.clone()], 1.0))
        .add_rate(constant(vec![b], vec![a], -1.0))
        .build()
        .unwrap()
}

fn helium_burning() -> RateGraph {
    let he4 = Nuclide::he4();
    let (c12, o16) = (nuc("C", 6, 12), nuc("O", 8, 16));
    let set = ReaclibSet::new("fy05", [-0.9, 0.0, -37.06, 29.3, -115.0, -5.0, 1.0]).unwrap();
    let reaclib = |r: Vec<Nuclide>, p: Vec<Nuclide>, q: f64| -> RateHandle {
        let reaction = Reaction::new(r, p).with_q(q).reversed(q < 0.0);
        Arc::new(ReaclibRate::new(reaction, vec![set.clone()]))
    };
    GraphBuilder::new()
        .add_rate(reaclib(vec![he4.clone(), he4.clone(), he4.clone()], vec![c12.clone()], 7.27))
        .add_rate(reaclib(vec![c12.clone(), he4.clone()], vec![o16.clone()], 7.16))
        .add_rate(reaclib(vec![o16], vec![he4, c12], -7.16))
        .build()
        .unwrap()
}

fn tabular(dir: &Path, file: &str, reactants: Vec<Nuclide>, products: Vec<Nuclide>) -> RateHandle {
    let meta = TableMeta {
        source_dir: dir.to_path_buf(),
        table_file: file.into(),
        index_name: format!("j_{}", file.trim_end_matches(".dat")),
        temp_points: 39,
        rhoy_points: 152,
        num_vars: 6,
        header_lines: 5,
    };
    Arc::new(TabularRate::new(Reaction::new(reactants, products).with_q(1.0), meta))
}

fn context(graph: &RateGraph) -> EmitContext<'_> {
    EmitContext::new(graph, EmitConfig::for_graph(graph))
}

fn expand(ctx: &EmitContext<'_>, text: &str) -> Result<String, EmitError> {
    let table = MarkerTable::cxx();
    TemplateEmitter::new(&table, ctx).expand(Path::new("test.H.template"), text)
}

fn write_template(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn rate_indices_and_names() {
    let graph = two_state();
    let ctx = context(&graph);
    let out = expand(&ctx, "enum {\n<nrxn>(1)\n};\n<rate_names>(1)\n").unwrap();
    let expected = "enum {\n    k_C12_to_N12 = 1,\n    k_N12_to_C12 = 2,\n    NumRates = k_N12_to_C12\n};\n    \"C12_to_N12\",  // 1,\n    \"N12_to_C12\"  // 2,\n";
    assert_eq!(out, expected);
}

#[test]
fn plain_lines_pass_through() {
    let graph = two_state();
    let ctx = context(&graph);
    let text = "#include <cmath>\n  // keep < and >\nno trailing newline";
    assert_eq!(expand(&ctx, text).unwrap(), text);
}

#[test]
fn marker_used_three_times_across_two_templates() {
    let graph = two_state();
    let ctx = context(&graph);
    let templates = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let first = write_template(
        templates.path(),
        "actual_network.H.template",
        "<nrat_reaclib>(0)\n{\n<nrat_tabular>(2)\n}\n<nrat_tabular>(0)\n",
    );
    let second = write_template(templates.path(), "rates.H.template", "  <nrat_tabular>(1)\n");

    let table = MarkerTable::cxx();
    let report = TemplateEmitter::new(&table, &ctx)
        .emit(&[first, second], Some(out.path()))
        .unwrap();

    assert_eq!(
        report.written,
        vec![out.path().join("actual_network.H"), out.path().join("rates.H")]
    );
    let network = fs::read_to_string(out.path().join("actual_network.H")).unwrap();
    assert_eq!(
        network,
        "const int NrateReaclib = 0;\n{\n        const int NrateTabular = 0;\n}\nconst int NrateTabular = 0;\n"
    );
    let rates = fs::read_to_string(out.path().join("rates.H")).unwrap();
    assert_eq!(rates, "    const int NrateTabular = 0;\n");
    assert!(report.warnings.is_empty());
}

#[test]
fn malformed_marker_reports_line() {
    let graph = two_state();
    let ctx = context(&graph);
    let err = expand(&ctx, "ok\n  <ydot>(x)\n").unwrap_err();
    assert!(matches!(err, EmitError::MalformedMarker { line: 2, ref text, .. } if text == "<ydot>(x)"));

    let err = expand(&ctx, "x = <ydot>(1)\n").unwrap_err();
    assert!(matches!(err, EmitError::MalformedMarker { line: 1, .. }));
}

#[test]
fn function_markers_require_top_level() {
    let graph = two_state();
    let ctx = context(&graph);
    for marker in ["<rate_struct>", "<reaclib_rate_functions>", "<approx_rate_functions>"] {
        let err = expand(&ctx, &format!("{marker}(1)\n")).unwrap_err();
        assert!(matches!(err, EmitError::TopLevelOnly { indent: 1, .. }), "{marker}");
    }
    let out = expand(&ctx, "<rate_struct>(0)\n").unwrap();
    assert!(out.starts_with("struct rate_t {\n    Array1D<Real, 1, NumRates>  screened_rates;\n"));
    assert!(out.contains("dscreened_rates_dT;"));
}

#[test]
fn triple_alpha_screening_block() {
    let graph = helium_burning();
    let ctx = context(&graph);
    let out = expand(&ctx, "<compute_screening_factors>(1)\n").unwrap();

    assert!(out.starts_with(
        "\n    {\n        constexpr auto scn_fac = scrn::calculate_screen_factor(2.0_rt, 4.0_rt, 2.0_rt, 4.0_rt);\n\n"
    ));
    assert!(out.contains("static_assert(scn_fac.z1 == 2.0_rt);"));
    assert!(out.contains(
        "constexpr auto scn_fac2 = scrn::calculate_screen_factor(2.0_rt, 4.0_rt, 4.0_rt, 8.0_rt);"
    ));
    assert!(out.contains("actual_screen<do_T_derivatives>(pstate, scn_fac2, scor2, dscor2_dt);\n\n    }\n\n"));
    assert!(out.contains("    rate_eval.screened_rates(k_He4_He4_He4_to_C12) *= scor * scor2;\n"));
    assert!(out.contains(
        "rate_eval.dscreened_rates_dT(k_He4_He4_He4_to_C12) = ratraw * (scor * dscor2_dt + dscor_dt * scor2) + dratraw_dT * scor * scor2;"
    ));
    assert!(out.contains("    rate_eval.screened_rates(k_He4_C12_to_O16) *= scor;\n"));
    // the first leg alone never multiplies into a rate
    assert_eq!(out.matches("*= scor * scor2;").count(), 1);
    assert_eq!(out.matches("*= scor;").count(), 1);
    // the reverse rate has a single charged reactant
    assert!(!out.contains("k_O16_to_He4_C12) *="));

    let calls = expand(&ctx, "<num_screen_calls>(0)\n").unwrap();
    assert_eq!(calls, "const int num_screen_calls = 3;\n");
}

#[test]
fn screening_disabled_still_needs_one_call() {
    let graph = helium_burning();
    let config = EmitConfig {
        screening: ScreeningOptions::disabled(),
        ..EmitConfig::for_graph(&graph)
    };
    let ctx = EmitContext::new(&graph, config);
    assert_eq!(expand(&ctx, "<compute_screening_factors>(1)\n").unwrap(), "");
    assert_eq!(
        expand(&ctx, "<num_screen_calls>(0)\n").unwrap(),
        "const int num_screen_calls = 1;\n"
    );
}

#[test]
fn ydot_and_sparse_jacobian() {
    let (a, b) = (nuc("C", 6, 12), nuc("N", 7, 12));
    let graph = GraphBuilder::new()
        .add_rate(constant(vec![a.clone()], vec![b.clone()], 1.0))
        .add_rate(constant(vec![b], vec![a], -1.0))
        .add_inert(nuc("Fe", 26, 56))
        .build()
        .unwrap();
    let ctx = context(&graph);
    assert!(!ctx.is_composed());

    let ydot = expand(&ctx, "<ydot>(1)\n").unwrap();
    assert!(ctx.is_composed());
    assert!(ydot.contains(
        "    ydot_nuc(C12) =\n        (-screened_rates(k_C12_to_N12)*Y(C12) + screened_rates(k_N12_to_C12)*Y(N12));\n\n"
    ));
    assert!(ydot.contains("    ydot_nuc(Fe56) = 0.0;\n\n"));

    let jac = expand(&ctx, "<jacnuc>(1)\n").unwrap();
    assert_eq!(jac.matches("jac.set(").count(), 4);
    assert!(jac.contains("    scratch = -screened_rates(k_C12_to_N12);\n    jac.set(C12, C12, scratch);\n\n"));
    assert!(!jac.contains("Fe56"));
}

#[test]
fn missing_table_warns_once_and_present_table_is_staged() {
    let tables = tempfile::tempdir().unwrap();
    fs::write(tables.path().join("present.dat"), "table data\n").unwrap();
    let (na23, ne23) = (nuc("Na", 11, 23), nuc("Ne", 10, 23));
    let (f20, o20) = (nuc("F", 9, 20), nuc("O", 8, 20));
    let graph = GraphBuilder::new()
        .add_rate(tabular(tables.path(), "present.dat", vec![na23], vec![ne23]))
        .add_rate(tabular(tables.path(), "absent.dat", vec![f20], vec![o20]))
        .build()
        .unwrap();
    let ctx = context(&graph);

    let templates = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let template = write_template(templates.path(), "table_rates.H.template", "<table_num>(0)\n");
    let table = MarkerTable::cxx();
    let report = TemplateEmitter::new(&table, &ctx)
        .emit(&[template], Some(out.path()))
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        EmitWarning::MissingTable { file } if file.ends_with("absent.dat")
    ));
    assert_eq!(report.staged_tables, vec![out.path().join("present.dat")]);
    assert_eq!(fs::read_to_string(out.path().join("present.dat")).unwrap(), "table data\n");
    assert_eq!(
        fs::read_to_string(out.path().join("table_rates.H")).unwrap(),
        "const int num_tables = 2;\n"
    );
}

#[test]
fn table_already_in_output_dir_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("net")).unwrap();
    fs::write(dir.path().join("t.dat"), "table data\n").unwrap();
    // the same folder as the output directory, spelled another way
    let source_dir = dir.path().join("net").join("..");
    let graph = GraphBuilder::new()
        .add_rate(tabular(&source_dir, "t.dat", vec![nuc("Na", 11, 23)], vec![nuc("Ne", 10, 23)]))
        .build()
        .unwrap();
    let ctx = context(&graph);

    let templates = tempfile::tempdir().unwrap();
    let template = write_template(templates.path(), "table_rates.H.template", "<table_num>(0)\n");
    let table = MarkerTable::cxx();
    let report = TemplateEmitter::new(&table, &ctx)
        .emit(&[template], Some(dir.path()))
        .unwrap();

    assert!(report.staged_tables.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(fs::read_to_string(dir.path().join("t.dat")).unwrap(), "table data\n");
}

#[test]
fn tabular_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let graph = GraphBuilder::new()
        .add_rate(tabular(dir.path(), "na23_ne23.dat", vec![nuc("Na", 11, 23)], vec![nuc("Ne", 10, 23)]))
        .build()
        .unwrap();
    let ctx = context(&graph);

    let decl = expand(&ctx, "<declare_tables>(0)\n").unwrap();
    assert!(decl.starts_with("extern AMREX_GPU_MANAGED table_t j_na23_ne23_meta;\n"));
    assert!(decl.contains("Array3D<Real, 1, 39, 1, 152, 1, 6> j_na23_ne23_data;"));
    assert!(decl.ends_with("Array1D<Real, 1, 39> j_na23_ne23_temp;\n\n"));

    let init = expand(&ctx, "<table_init_meta>(1)\n").unwrap();
    assert!(init.contains("    j_na23_ne23_meta.nheader = 5;\n\n"));
    assert!(init.contains(
        "    init_tab_info(j_na23_ne23_meta, \"na23_ne23.dat\", j_na23_ne23_rhoy, j_na23_ne23_temp, j_na23_ne23_data);\n\n\n"
    ));

    let eval = expand(&ctx, "<compute_tabular_rates>(1)\n").unwrap();
    assert!(eval.contains("    rate_eval.screened_rates(k_Na23_to_Ne23) = rate;\n"));
    assert!(eval.contains("rate_eval.enuc_weak += C::Legacy::n_A * Y(Na23) * (edot_nu + edot_gamma);"));

    let energy = expand(&ctx, "<enuc_add_energy_rate>(1)\n").unwrap();
    assert_eq!(
        energy,
        "    enuc += C::Legacy::n_A * Y(Na23) * rate_eval.add_energy_rate(k_Na23_to_Ne23);\n"
    );
}

#[test]
fn energy_rate_needs_single_reactant() {
    let dir = tempfile::tempdir().unwrap();
    let graph = GraphBuilder::new()
        .add_rate(tabular(
            dir.path(),
            "odd.dat",
            vec![nuc("Na", 11, 23), Nuclide::proton()],
            vec![nuc("Mg", 12, 24)],
        ))
        .build()
        .unwrap();
    let ctx = context(&graph);
    let err = expand(&ctx, "<enuc_add_energy_rate>(1)\n").unwrap_err();
    assert!(matches!(err, EmitError::UnsupportedRate { ref rate, .. } if rate == "p_Na23_to_Mg24"));
}

#[test]
fn output_dir_is_created_once() {
    let graph = two_state();
    let ctx = context(&graph);
    let root = tempfile::tempdir().unwrap();
    let template = write_template(root.path(), "a.H.template", "<table_num>(0)\n");
    let table = MarkerTable::cxx();
    let emitter = TemplateEmitter::new(&table, &ctx);

    let out = root.path().join("generated");
    emitter.emit(std::slice::from_ref(&template), Some(&out)).unwrap();
    assert!(out.join("a.H").is_file());
    emitter.emit(std::slice::from_ref(&template), Some(&out)).unwrap();

    let nested = root.path().join("missing").join("generated");
    let err = emitter.emit(&[template], Some(&nested)).unwrap_err();
    assert!(matches!(err, EmitError::OutputDir { .. }));
}

#[test]
fn reaclib_function_and_fill() {
    let graph = helium_burning();
    let ctx = context(&graph);
    let out = expand(&ctx, "<reaclib_rate_functions>(0)\n").unwrap();
    assert!(out.contains("void rate_He4_He4_He4_to_C12(const tf_t& tfactors, double& rate, double& drate_dT) {"));
    assert!(out.contains("    // He4 + He4 + He4 --> C12\n"));
    assert!(out.contains(
        "    ln_set_rate = -0.9 + -37.06 * tfactors.T913i + 29.3 * tfactors.T913 + -115.0 * tfactors.T9 + -5.0 * tfactors.T953 + 1.0 * tfactors.lnT9;\n"
    ));
    assert!(out.contains(
        "        dln_set_rate_dT9 = -(1.0/3.0) * -37.06 * tfactors.T943i + (1.0/3.0) * 29.3 * tfactors.T923i + -115.0 + (5.0/3.0) * -5.0 * tfactors.T923 + 1.0 * tfactors.T9i;\n"
    ));
    assert_eq!(out.matches("template <int do_T_derivatives>").count(), 3);

    let fill = expand(&ctx, "<fill_reaclib_rates>(1)\n").unwrap();
    assert!(fill.starts_with(
        "    rate_He4_He4_He4_to_C12<do_T_derivatives>(tfactors, rate, drate_dT);\n    rate_eval.screened_rates(k_He4_He4_He4_to_C12) = rate;\n"
    ));
}

#[test]
fn derived_rate_scales_by_partition_functions() {
    let pf = PartitionFunction::new(vec![1.0e9, 2.0e9], vec![0.0, 0.01]).unwrap();
    let ni56 = nuc("Ni", 28, 56).with_partition_function(pf.clone());
    let fe52 = nuc("Fe", 26, 52).with_partition_function(pf);
    let set = ReaclibSet::new("ths8r", [91.6, -92.8, -91.7, -9.5, -0.5, 0.09, 0.83]).unwrap();
    let reaction = Reaction::new(vec![ni56.clone()], vec![Nuclide::he4(), fe52.clone()]).with_q(-7.9);
    let derived: RateHandle = Arc::new(DerivedRate::new(reaction.reversed(true), vec![set], true));
    let graph = GraphBuilder::new().add_rate(derived).build().unwrap();
    let ctx = context(&graph);

    let out = expand(&ctx, "<reaclib_rate_functions>(0)\n").unwrap();
    assert!(out.contains("void rate_Ni56_to_He4_Fe52_derived("));
    assert!(out.contains("    get_partition_function(Ni56, tfactors, Ni56_pf, dNi56_pf_dT);\n"));
    assert!(out.contains("    He4_pf = 1.0_rt;\n"));
    assert!(out.contains("    double z_r = He4_pf * Fe52_pf;\n"));
    assert!(out.contains("    double z_p = Ni56_pf;\n"));
    assert!(out.contains("    double dz_r_dT = dHe4_pf_dT * Fe52_pf + He4_pf * dFe52_pf_dT;\n"));
    assert!(out.contains("    rate *= z_r/z_p;\n"));

    let data = expand(&ctx, "<part_fun_data>(0)\n").unwrap();
    assert_eq!(data.matches("constexpr int npts_").count(), 1);
    assert!(data.contains("amrex::Real temp_array_1[npts_1] = {\n    1.0, 2.0,\n};\n\n\n"));
    assert!(data.contains("amrex::Real Fe52_pf_array[npts_1] = {\n    0.0, 0.01,\n};\n"));

    let cases = expand(&ctx, "<part_fun_cases>(1)\n").unwrap();
    assert!(cases.contains("    case Ni56:\n        part_fun::interpolate_pf<part_fun::npts_1>(tfactors.T9, part_fun::temp_array_1, part_fun::Ni56_pf_array, pf, dpf_dT);\n        break;\n\n"));
}

#[test]
fn spin_cases_group_equal_spins() {
    let a = nuc("C", 6, 12).with_spin_states(1);
    let b = nuc("N", 7, 12).with_spin_states(3);
    let c = nuc("O", 8, 12).with_spin_states(1);
    let graph = GraphBuilder::new()
        .add_rate(constant(vec![a.clone()], vec![b.clone()], 1.0))
        .add_rate(constant(vec![b], vec![c], 1.0))
        .add_inert(nuc("Fe", 26, 56))
        .build()
        .unwrap();
    let ctx = context(&graph);
    let out = expand(&ctx, "<spin_state_cases>(1)\n").unwrap();
    assert_eq!(
        out,
        "    case C12:\n    case O12:\n        spin = 1;\n        break;\n\n    case N12:\n        spin = 3;\n        break;\n\n"
    );
}

#[test]
fn initial_mass_fractions_and_ebind() {
    let (a, b) = (
        nuc("C", 6, 12).with_binding_energy(7.68),
        nuc("N", 7, 12).with_binding_energy(6.17),
    );
    let graph = GraphBuilder::new()
        .add_rate(constant(vec![a], vec![b], 1.0))
        .build()
        .unwrap();
    let ctx = context(&graph);
    assert_eq!(
        expand(&ctx, "<initial_mass_fractions>(1)\n").unwrap(),
        "    unit_test.X1 = 1.0\n    unit_test.X2 = 0.0\n"
    );
    assert_eq!(
        expand(&ctx, "<ebind>(1)\n").unwrap(),
        "    ebind_per_nucleon(C12) = 7.68_rt;\n    ebind_per_nucleon(N12) = 6.17_rt;\n"
    );
}
