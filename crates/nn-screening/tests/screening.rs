//! Integration tests for nn-screening.

use std::sync::Arc;

use nn_core::{Nuclide, RateHandle, Reaction, ReaclibRate};
use nn_graph::{GraphBuilder, RateCollection};
use proptest::prelude::*;
use nn_screening::{
    PlasmaState, ScreenFactor, ScreeningOptions, ScreeningPlan, ScreeningProvider,
    ScreeningStep, TRIPLE_ALPHA, TRIPLE_ALPHA_DUMMY,
};

fn nuc(sym: &str, z: u32, a: u32) -> Nuclide {
    Nuclide::new(sym, z, a)
}

fn reaclib(reactants: Vec<Nuclide>, products: Vec<Nuclide>) -> RateHandle {
    Arc::new(ReaclibRate::new(Reaction::new(reactants, products).with_q(1.0), vec![]))
}

fn reverse(reactants: Vec<Nuclide>, products: Vec<Nuclide>) -> RateHandle {
    let reaction = Reaction::new(reactants, products).with_q(-1.0).reversed(true);
    Arc::new(ReaclibRate::new(reaction, vec![]))
}

fn helium_burning() -> Vec<RateHandle> {
    let he4 = Nuclide::he4();
    let (c12, o16) = (nuc("C", 6, 12), nuc("O", 8, 16));
    vec![
        reaclib(vec![he4.clone(), he4.clone(), he4.clone()], vec![c12.clone()]),
        reaclib(vec![c12.clone(), he4.clone()], vec![o16.clone()]),
        reverse(vec![o16], vec![he4.clone(), c12.clone()]),
        reverse(vec![c12], vec![he4.clone(), he4.clone(), he4]),
    ]
}

/// Factor = Z1 * Z2, derivative = Z1 + Z2.
struct ChargeProduct;

impl ScreeningProvider for ChargeProduct {
    fn screen(&self, _plasma: &PlasmaState, n1: &Nuclide, n2: &Nuclide) -> ScreenFactor {
        ScreenFactor {
            value: f64::from(n1.z() * n2.z()),
            dvalue_dt: f64::from(n1.z() + n2.z()),
        }
    }
}

#[test]
fn triple_alpha_gets_two_groups_in_order() {
    let g = GraphBuilder::new().add_rates(helium_burning()).build().unwrap();
    let plan = ScreeningPlan::build(&g, ScreeningOptions::for_graph(&g));
    let names: Vec<&str> = plan.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, [TRIPLE_ALPHA, TRIPLE_ALPHA_DUMMY, "He4_C12"]);

    let dummy = &plan.groups()[1];
    assert!(dummy.n2.is_dummy());
    assert_eq!((dummy.n2.z(), dummy.n2.a()), (4, 8));
    assert_eq!(dummy.rates, plan.groups()[0].rates);

    let steps = plan.steps().unwrap();
    assert_eq!(steps[0], ScreeningStep::TripleAlphaFirst { group: 0 });
    assert_eq!(steps[1], ScreeningStep::TripleAlphaSecond { group: 1 });
    assert_eq!(steps[2], ScreeningStep::Apply { group: 2 });
    assert_eq!(plan.effective_group_count(), 3);
}

#[test]
fn triple_alpha_factor_is_the_product_of_both_legs() {
    let g = GraphBuilder::new().add_rates(helium_burning()).build().unwrap();
    let plan = ScreeningPlan::build(&g, ScreeningOptions::default());
    let plasma = PlasmaState::new(1.0e8, 1.0e5, [(&Nuclide::he4(), 0.25)]);
    let factors = plan.factors(&g, &plasma, &ChargeProduct).unwrap();

    let triple = g.rate_id("He4_He4_He4_to_C12").unwrap();
    // (2*2) * (2*4); d = 4 * 6 + 4 * 8
    let f = factors.get(triple);
    assert_eq!(f.value, 32.0);
    assert_eq!(f.dvalue_dt, 4.0 * 6.0 + 4.0 * 8.0);

    let capture = g.rate_id("He4_C12_to_O16").unwrap();
    assert_eq!(factors.get(capture).value, 12.0);

    // single charged reactant: unscreened
    let decay = g.rate_id("O16_to_He4_C12").unwrap();
    assert_eq!(factors.get(decay), ScreenFactor::UNITY);
}

#[test]
fn symmetric_screening_uses_reverse_products() {
    let g = GraphBuilder::new()
        .add_rates(helium_burning())
        .symmetric_screening(true)
        .build()
        .unwrap();
    let plan = ScreeningPlan::build(&g, ScreeningOptions::for_graph(&g));
    // reverse rates already share their forward partners' groups
    assert_eq!(plan.groups().len(), 3);
    let reverse = g.rate_id("O16_to_He4_C12").unwrap();
    assert!(plan.groups()[2].rates.contains(&reverse));
}

#[test]
fn disabled_plan_is_empty_but_counts_one_call() {
    let g = GraphBuilder::new().add_rates(helium_burning()).build().unwrap();
    let plan = ScreeningPlan::build(&g, ScreeningOptions::disabled());
    assert!(plan.is_empty());
    assert_eq!(plan.effective_group_count(), 1);
    assert!(plan.steps().unwrap().is_empty());
}

#[test]
fn approximate_constituents_are_screened_in_emission_order() {
    let (he4, p) = (Nuclide::he4(), Nuclide::proton());
    let (mg24, al27, si28) = (nuc("Mg", 12, 24), nuc("Al", 13, 27), nuc("Si", 14, 28));
    let rates = vec![
        reaclib(vec![he4.clone(), mg24.clone()], vec![si28.clone()]),
        reaclib(vec![he4.clone(), mg24.clone()], vec![p.clone(), al27.clone()]),
        reaclib(vec![p.clone(), al27.clone()], vec![si28.clone()]),
        reaclib(vec![si28.clone()], vec![he4.clone(), mg24.clone()]),
        reaclib(vec![si28.clone()], vec![p.clone(), al27.clone()]),
        reaclib(vec![p.clone(), al27.clone()], vec![he4.clone(), mg24.clone()]),
    ];
    let mut rc = RateCollection::from_rates(rates).unwrap();
    rc.make_ap_pg_approx(None).unwrap();
    let g = rc.graph();
    let plan = ScreeningPlan::build(g, ScreeningOptions::default());

    let summary: Vec<(String, Vec<&str>)> = plan
        .groups()
        .iter()
        .map(|grp| {
            (
                grp.name.clone(),
                grp.rates.iter().map(|id| g.entry(*id).name()).collect(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                "He4_Mg24".to_string(),
                vec!["He4_Mg24_to_Si28_removed", "He4_Mg24_to_p_Al27_removed"]
            ),
            (
                "p_Al27".to_string(),
                vec!["p_Al27_to_Si28_removed", "p_Al27_to_He4_Mg24_removed"]
            ),
        ]
    );
}

proptest! {
    #[test]
    fn combined_factor_screens_like_two_sequential_legs(
        f1 in 0.5f64..5.0, d1 in -1.0f64..1.0,
        f2 in 0.5f64..5.0, d2 in -1.0f64..1.0,
        rate in 1e-6f64..1e6, drate in -1e3f64..1e3,
    ) {
        let a = ScreenFactor { value: f1, dvalue_dt: d1 };
        let b = ScreenFactor { value: f2, dvalue_dt: d2 };
        let (once, donce) = a.combine(b).apply(rate, drate);
        let (half, dhalf) = a.apply(rate, drate);
        let (twice, dtwice) = b.apply(half, dhalf);
        prop_assert!((once - twice).abs() <= 1e-12 * twice.abs());
        let scale = 25.0 * (rate + drate.abs());
        prop_assert!((donce - dtwice).abs() <= 1e-12 * scale);
    }
}
