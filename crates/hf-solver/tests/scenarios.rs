//! End-to-end solves: water, electrolytes, solids, cancellation and restarts.

use hf_activity::{ActivityModel, ActivityModelKind, ActivitySettings, IonicStrength};
use hf_core::numeric::LN10;
use hf_solver::{
    Composition, Constraint, EquilibriumSolver, SolidAdmission, SolveError, SolveFlag, SolveRequest,
    SolverConfig,
};
use hf_system::ChemicalSystem;
use proptest::prelude::*;

fn model(system: &ChemicalSystem, kind: ActivityModelKind) -> ActivityModel {
    ActivityModel::new(
        system,
        ActivitySettings {
            kind,
            ..ActivitySettings::default()
        },
    )
    .unwrap()
}

fn solver(system: &ChemicalSystem, kind: ActivityModelKind) -> EquilibriumSolver<'_> {
    EquilibriumSolver::new(system, model(system, kind), SolverConfig::default()).unwrap()
}

fn water() -> ChemicalSystem {
    ChemicalSystem::builder()
        .component("H+", 1.0)
        .component("H2O", 0.0)
        .complex("OH-", -1.0, -14.0, &[("H2O", 1.0), ("H+", -1.0)])
        .build()
        .unwrap()
}

fn silver_chloride(copies: usize) -> ChemicalSystem {
    let mut builder = ChemicalSystem::builder()
        .component("Ag+", 1.0)
        .component("Cl-", -1.0)
        .complex("AgCl", 0.0, 3.3, &[("Ag+", 1.0), ("Cl-", 1.0)]);
    for n in 0..copies {
        builder = builder.solid(&format!("AgCl(s{n})"), 9.75, &[("Ag+", 1.0), ("Cl-", 1.0)]);
    }
    builder.build().unwrap()
}

fn carbonate() -> ChemicalSystem {
    ChemicalSystem::builder()
        .component("H+", 1.0)
        .component("CO3-2", -2.0)
        .component("Na+", 1.0)
        .complex("OH-", -1.0, -14.0, &[("H+", -1.0)])
        .complex("HCO3-", -1.0, 10.33, &[("H+", 1.0), ("CO3-2", 1.0)])
        .complex("H2CO3", 0.0, 16.68, &[("H+", 2.0), ("CO3-2", 1.0)])
        .complex("NaCO3-", -1.0, 1.27, &[("Na+", 1.0), ("CO3-2", 1.0)])
        .build()
        .unwrap()
}

/// Σ a·C over aqueous species plus Σ a·n over solids, per component.
fn total_of(system: &ChemicalSystem, result: &Composition, j: usize) -> f64 {
    let na = system.component_count();
    let mut t = result.species[j].concentration;
    for i in 0..system.complex_count() {
        t += system.coefficient(i, j) * result.species[na + i].concentration;
    }
    for (s, solid) in result.solids.iter().enumerate() {
        t += system.coefficient(system.reaction_of_solid(s), j) * solid.amount;
    }
    t
}

#[test]
fn pure_water_at_zero_ionic_strength() {
    let sys = water();
    let mut solver = solver(&sys, ActivityModelKind::Davies);
    let req = SolveRequest::new(vec![Constraint::Total(0.0), Constraint::LogActivity(0.0)])
        .with_ionic_strength(IonicStrength::from_raw(0.0));
    let result = solver.solve(&req).unwrap();

    for s in &result.species {
        assert_eq!(s.log10_activity_coefficient, 0.0, "{}", s.name);
    }
    assert_eq!(result.properties.osmotic_coefficient, 1.0);
    let ph = -result.species("H+").unwrap().log10_activity;
    assert!((ph - 7.0).abs() < 1e-4, "pH {ph}");
    assert!(result.flags.is_empty());
}

#[test]
fn sodium_chloride_follows_davies() {
    let sys = ChemicalSystem::builder()
        .component("Na+", 1.0)
        .component("Cl-", -1.0)
        .build()
        .unwrap();
    let davies = model(&sys, ActivityModelKind::Davies);
    let a = davies.debye_huckel_a();
    let mut solver = EquilibriumSolver::new(&sys, davies, SolverConfig::default()).unwrap();
    let req = SolveRequest::from_totals(&[0.1, 0.1]).with_ionic_strength(IonicStrength::Calculated);
    let result = solver.solve(&req).unwrap();

    let i: f64 = 0.1;
    let expected = -a * (i.sqrt() / (1.0 + i.sqrt()) - 0.3 * i);
    let na = result.species("Na+").unwrap().log10_activity_coefficient;
    let cl = result.species("Cl-").unwrap().log10_activity_coefficient;
    assert!((result.properties.ionic_strength - i).abs() < 1e-8);
    assert!((na - cl).abs() < 1e-12);
    assert!((na - expected).abs() < 1e-6, "{na} vs {expected}");
    assert!(result.properties.osmotic_coefficient < 1.0);
    assert!(!result.flags.contains(SolveFlag::ActivityNotConverged));
}

#[test]
fn supersaturated_solid_is_admitted() {
    let sys = silver_chloride(1);
    let mut solver = solver(&sys, ActivityModelKind::Ideal);
    let result = solver.solve(&SolveRequest::from_totals(&[0.01, 0.01])).unwrap();

    let solid = &result.solids[0];
    assert!(solid.present);
    assert!(solid.amount > 0.0 && solid.amount < 0.01);
    let product = result.species("Ag+").unwrap().log10_activity + result.species("Cl-").unwrap().log10_activity;
    assert!((product + 9.75).abs() < 1e-9, "log Q = {product}");
    for j in 0..2 {
        let t = total_of(&sys, &result, j);
        assert!((t - 0.01).abs() < 1e-7, "component {j}: {t}");
    }
}

#[test]
fn undersaturated_solid_stays_absent() {
    let sys = silver_chloride(1);
    let mut solver = solver(&sys, ActivityModelKind::Ideal);
    let result = solver.solve(&SolveRequest::from_totals(&[1e-6, 1e-6])).unwrap();
    assert!(!result.solids[0].present);
    assert_eq!(result.solids[0].amount, 0.0);
    assert!(result.solids[0].saturation_index < 0.0);
}

#[test]
fn identical_solids_fall_back_to_a_subset() {
    let sys = silver_chloride(2);
    let config = SolverConfig {
        solid_admission: SolidAdmission::AllSupersaturated,
        ..SolverConfig::default()
    };
    let mut solver = EquilibriumSolver::new(&sys, model(&sys, ActivityModelKind::Ideal), config).unwrap();
    let result = solver.solve(&SolveRequest::from_totals(&[0.01, 0.01])).unwrap();

    let present: Vec<bool> = result.solids.iter().map(|s| s.present).collect();
    assert_eq!(present.iter().filter(|p| **p).count(), 1, "{present:?}");
    assert!(!result.flags.contains(SolveFlag::NoConsistentSolids));
    for s in &result.solids {
        assert!(s.amount >= 0.0);
        assert!(s.saturation_index <= 1e-5 / LN10);
    }
}

#[test]
fn cancellation_keeps_the_committed_point() {
    let sys = carbonate();
    let mut solver = solver(&sys, ActivityModelKind::Davies);
    let req = SolveRequest::from_totals(&[0.0, 1e-3, 2e-3]).with_ionic_strength(IonicStrength::Calculated);
    solver.solve(&req).unwrap();
    let before = solver.state().cloned();
    assert!(before.is_some());

    solver.cancel_token().cancel();
    let moved = SolveRequest::from_totals(&[1e-3, 5e-3, 1e-2]).with_ionic_strength(IonicStrength::Calculated);
    let err = solver.solve(&moved).unwrap_err();
    assert_eq!(err, SolveError::Cancelled);
    assert_eq!(solver.state().cloned(), before);

    solver.cancel_token().reset();
    assert!(solver.solve(&moved).is_ok());
}

#[test]
fn cancelling_from_another_thread_mid_solve() {
    let sys = carbonate();
    let mut solver = solver(&sys, ActivityModelKind::Davies);
    let requests = [
        SolveRequest::from_totals(&[1e-3, 1e-3, 0.05]),
        SolveRequest::from_totals(&[0.0, 1e-2, 0.5]),
    ]
    .map(|r| r.with_ionic_strength(IonicStrength::Calculated));
    solver.solve(&requests[0]).unwrap();

    let remote = solver.cancel_token().clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        remote.cancel();
    });

    let mut solved = 0usize;
    loop {
        let before = solver.state().cloned();
        match solver.solve(&requests[solved % 2]) {
            Ok(_) => solved += 1,
            Err(err) => {
                assert_eq!(err, SolveError::Cancelled);
                assert_eq!(solver.state().cloned(), before);
                break;
            }
        }
    }
    canceller.join().unwrap();

    solver.cancel_token().reset();
    let result = solver.solve(&requests[0]).unwrap();
    assert!(result.flags.is_continuable());
}

#[test]
fn weak_acid_meets_its_mass_balances() {
    let sys = ChemicalSystem::builder()
        .component("H+", 1.0)
        .component("Ac-", -1.0)
        .complex("OH-", -1.0, -14.0, &[("H+", -1.0)])
        .complex("HAc", 0.0, 4.76, &[("H+", 1.0), ("Ac-", 1.0)])
        .build()
        .unwrap();
    let mut solver = solver(&sys, ActivityModelKind::Ideal);
    for c in [0.01, 0.05, 0.1, 0.5, 1.0] {
        let req = SolveRequest::from_totals(&[c, c]);
        let result = solver.solve(&req).unwrap();
        assert!(result.flags.is_empty(), "c = {c}: {}", result.flags);
        for j in 0..2 {
            let err = (total_of(&sys, &result, j) - c).abs() / c;
            assert!(err <= req.tolerance * (1.0 + 1e-3), "c = {c}, component {j}: {err:e}");
        }
    }
}

#[test]
fn calcite_and_gypsum_settle_without_flags() {
    let sys = ChemicalSystem::builder()
        .component("Ca+2", 2.0)
        .component("CO3-2", -2.0)
        .component("SO4-2", -2.0)
        .component("H+", 1.0)
        .complex("OH-", -1.0, -14.0, &[("H+", -1.0)])
        .complex("HCO3-", -1.0, 10.33, &[("H+", 1.0), ("CO3-2", 1.0)])
        .complex("H2CO3", 0.0, 16.68, &[("H+", 2.0), ("CO3-2", 1.0)])
        .complex("CaSO4", 0.0, 2.3, &[("Ca+2", 1.0), ("SO4-2", 1.0)])
        .solid("calcite", 8.48, &[("Ca+2", 1.0), ("CO3-2", 1.0)])
        .solid("gypsum", 4.58, &[("Ca+2", 1.0), ("SO4-2", 1.0)])
        .build()
        .unwrap();
    let totals = [0.05, 0.01, 0.05, 0.002];
    let mut solver = solver(&sys, ActivityModelKind::Ideal);
    let result = solver.solve(&SolveRequest::from_totals(&totals)).unwrap();

    assert!(result.flags.is_continuable(), "{}", result.flags);
    assert!(result.solids.iter().all(|s| s.present), "{:?}", result.solids);
    for (j, &t) in totals.iter().enumerate() {
        assert!((total_of(&sys, &result, j) - t).abs() <= 1e-5 * t, "component {j}");
    }
}

#[test]
fn non_continued_solves_are_idempotent() {
    let sys = carbonate();
    let mut solver = solver(&sys, ActivityModelKind::Davies);
    let req = SolveRequest::from_totals(&[1e-3, 1e-3, 0.05]).with_ionic_strength(IonicStrength::Calculated);
    let first = solver.solve(&req).unwrap();

    let other = SolveRequest::from_totals(&[0.0, 1e-2, 0.5]).with_ionic_strength(IonicStrength::Calculated);
    solver.solve(&other).unwrap();

    let again = solver.solve(&req).unwrap();
    for (a, b) in first.species.iter().zip(&again.species) {
        assert!((a.log10_activity - b.log10_activity).abs() < 1e-9, "{}", a.name);
        assert!((a.log10_activity_coefficient - b.log10_activity_coefficient).abs() < 1e-9);
    }
    assert_eq!(first.flags, again.flags);
}

#[test]
fn mass_balances_hold_with_activity_feedback() {
    let sys = carbonate();
    let totals = [2e-3, 1e-3, 0.2];
    let mut solver = solver(&sys, ActivityModelKind::Davies);
    let req = SolveRequest::from_totals(&totals).with_ionic_strength(IonicStrength::Calculated);
    let result = solver.solve(&req).unwrap();
    assert!(result.flags.is_continuable(), "{}", result.flags);
    for (j, &t) in totals.iter().enumerate() {
        let scale = t.abs().max(1e-3);
        assert!((total_of(&sys, &result, j) - t).abs() < 1e-5 * scale, "component {j}");
    }
    assert!(result.properties.ionic_strength > 0.1);
    assert!(result.species("Na+").unwrap().log10_activity_coefficient < 0.0);
}

#[test]
fn continuation_reaches_the_same_point() {
    let sys = carbonate();
    let mut warm = solver(&sys, ActivityModelKind::Davies);
    let mut cold = solver(&sys, ActivityModelKind::Davies);
    let base = SolveRequest::from_totals(&[1e-3, 1e-3, 0.05]).with_ionic_strength(IonicStrength::Calculated);
    warm.solve(&base).unwrap();

    let next = SolveRequest::from_totals(&[1.2e-3, 1e-3, 0.05]).with_ionic_strength(IonicStrength::Calculated);
    let a = warm.solve(&next.clone().with_continuation(true)).unwrap();
    let b = cold.solve(&next).unwrap();
    for (x, y) in a.species.iter().zip(&b.species) {
        assert!((x.log10_activity - y.log10_activity).abs() < 1e-4, "{}", x.name);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn solid_invariants_hold(log_ag in -6.0f64..-1.0, log_cl in -6.0f64..-1.0) {
        let sys = silver_chloride(1);
        let mut solver = solver(&sys, ActivityModelKind::Ideal);
        let totals = [10f64.powf(log_ag), 10f64.powf(log_cl)];
        let result = solver.solve(&SolveRequest::from_totals(&totals)).unwrap();
        let solid = &result.solids[0];
        prop_assert!(solid.amount >= 0.0);
        if !solid.present {
            prop_assert!(solid.saturation_index <= 1e-5 / LN10);
        }
        for (j, &t) in totals.iter().enumerate() {
            prop_assert!((total_of(&sys, &result, j) - t).abs() <= 1e-5 * t);
        }
    }
}
