//! Inclined-rail E2E tests.
//!
//! Each test is written to falsify a hypothesis about the engine:
//! - runs are deterministic and reproducible
//! - closed-form kinematics bound the numeric result
//! - the energy ledger balances to within integration error

use incline_sim::engine::forces::{effective_gravity, terminal_speed};
use incline_sim::prelude::*;
use incline_sim::scenarios::{drag_free_acceleration, kinematic_final_speed};

const MAX_STEPS: u64 = 2_000_000;

fn run(config: SimConfig) -> (InclineEngine, RunOutcome) {
    let mut engine = InclineEngine::new(config).expect("valid configuration");
    let outcome = engine.run_to_end(MAX_STEPS);
    (engine, outcome)
}

/// A-1: Without drag the final speed matches sqrt(2·a_eff·L) within 1%.
///
/// Hypothesis to falsify: the integrator drifts from constant-acceleration
/// kinematics.
#[test]
fn a1_drag_free_speed_matches_kinematics() {
    let constants = PhysicalConstants {
        drag_coefficient: 0.0,
        ..PhysicalConstants::default()
    };
    for (angle, length) in [(30.0, 10.0), (45.0, 50.0), (60.0, 3.0), (80.0, 200.0)] {
        let config = SimConfig::builder()
            .angle_deg(angle)
            .rail_length_m(length)
            .constants(constants)
            .build();
        let expected = kinematic_final_speed(&config).expect("sphere moves");
        let (engine, outcome) = run(config);

        assert!(outcome.reached_end(), "A-1 FAILED: {angle}° never reached the end");
        let error = (engine.state().speed_mps - expected).abs() / expected;
        assert!(
            error < 0.01,
            "A-1 FAILED: {angle}°/{length} m speed {:.4} vs {:.4} ({:.3}%)",
            engine.state().speed_mps,
            expected,
            error * 100.0
        );
    }
}

/// A-2: With drag the default run finishes below the drag-free bound but
/// within 8% of it.
///
/// Hypothesis to falsify: drag is ignored, or dominates on a short rail.
#[test]
fn a2_default_run_below_drag_free_bound() {
    let config = SimConfig::default();
    let bound = kinematic_final_speed(&config).expect("sphere moves");
    let (engine, outcome) = run(config);

    assert!(outcome.reached_end());
    let speed = engine.state().speed_mps;
    assert!(speed < bound, "A-2 FAILED: {speed:.4} ≥ bound {bound:.4}");
    assert!(speed > bound * 0.92, "A-2 FAILED: {speed:.4} ≪ bound {bound:.4}");
    assert!(engine.state().drag_loss_j > 0.0);
    assert!(engine.state().friction_loss_j > 0.0);
}

/// B-1: A vertical rail carries no normal force, so friction never acts.
#[test]
fn b1_vertical_drop_is_frictionless() {
    let config = SimConfig::builder().angle_deg(90.0).build();
    let (engine, outcome) = run(config);

    assert!(outcome.reached_end());
    assert!(engine.state().friction_loss_j.abs() < f64::EPSILON);
    for sample in engine.samples() {
        assert!(sample.friction_n.abs() < f64::EPSILON);
    }
}

/// B-2: A long vertical drop converges on the drag-limited terminal speed.
///
/// Hypothesis to falsify: speed keeps growing past the force balance.
#[test]
fn b2_long_drop_reaches_terminal_speed() {
    let config = SimConfig::builder()
        .angle_deg(90.0)
        .rail_length_m(1000.0)
        .build();
    let rail = config.rail;
    let g_eff = effective_gravity(rail.gravity_mps2(), rail.mass_kg(), &config.constants);
    let v_t = terminal_speed(rail.mass_kg(), g_eff, &config.constants).expect("drag present");
    let (engine, outcome) = run(config);

    assert!(outcome.reached_end());
    let speed = engine.state().speed_mps;
    assert!(
        (speed - v_t).abs() / v_t < 0.01,
        "B-2 FAILED: {speed:.4} vs terminal {v_t:.4}"
    );
    assert!(speed <= v_t * (1.0 + 1e-9));
}

/// C-1: On a flat rail with no launch speed the sphere never moves.
#[test]
fn c1_flat_rail_never_moves() {
    let config = SimConfig::builder().angle_deg(0.0).build();
    let mut engine = InclineEngine::new(config).expect("valid configuration");
    let outcome = engine.run_to_end(4_000);

    assert_eq!(outcome, RunOutcome::StepLimit { steps: 4_000 });
    assert!(engine.state().displacement_m.abs() < f64::EPSILON);
    assert!(engine.state().speed_mps.abs() < f64::EPSILON);
    assert!(engine.is_running());
}

/// C-2: Friction steeper than the slope keeps the sphere at rest.
#[test]
fn c2_friction_holds_shallow_slope() {
    let config = SimConfig::builder().angle_deg(5.0).build();
    assert!(drag_free_acceleration(&config) < 0.0);
    assert!(kinematic_final_speed(&config).is_none());

    let mut engine = InclineEngine::new(config).expect("valid configuration");
    assert!(!engine.run_to_end(1_000).reached_end());
    assert!(engine.state().displacement_m.abs() < f64::EPSILON);
}

/// D-1: Regular samples are spaced by the sampling interval, with one
/// terminal sample after them.
#[test]
fn d1_sampling_cadence() {
    let (engine, _) = run(SimConfig::default());
    let interval = engine.integration().sample_interval_s;
    let elapsed = engine.state().elapsed_time_s;

    let expected = (elapsed / interval).floor() as i64 + 1;
    let regular = engine.samples().count_kind(SampleKind::Regular) as i64;
    assert!(
        (regular - expected).abs() <= 1,
        "D-1 FAILED: {regular} regular samples, expected about {expected}"
    );
    assert_eq!(engine.samples().count_kind(SampleKind::Terminal), 1);

    let samples = engine.samples().to_vec();
    for pair in samples.windows(2) {
        assert!(pair[1].time_s > pair[0].time_s);
    }
    let terminal = samples.last().expect("terminal sample");
    assert_eq!(terminal.kind, SampleKind::Terminal);
    assert!((terminal.time_s - (elapsed + engine.dt())).abs() < 1e-12);
    assert!(terminal.height_m.abs() < f64::EPSILON);
}

/// E-1: In vacuum on a frictionless rail PE turns into KE within 1%.
#[test]
fn e1_energy_conserved_in_vacuum() {
    for angle in [15.0, 30.0, 60.0, 90.0] {
        let config = SimConfig::builder()
            .angle_deg(angle)
            .constants(PhysicalConstants::frictionless_vacuum())
            .build();
        let initial = InclineEngine::new(config.clone())
            .expect("valid configuration")
            .telemetry()
            .total_j;
        let (engine, _) = run(config);

        let kinetic = engine.telemetry().kinetic_j;
        assert!(
            (kinetic - initial).abs() / initial < 0.01,
            "E-1 FAILED: {angle}° KE {kinetic:.4} J vs PE₀ {initial:.4} J"
        );
        assert!(engine.state().total_loss_j().abs() < f64::EPSILON);
    }
}

/// E-2: With dissipation, KE + PE + losses stays within 2% of the
/// starting energy on every sample.
#[test]
fn e2_energy_ledger_balances_with_losses() {
    let config = SimConfig::builder().angle_deg(45.0).rail_length_m(50.0).build();
    let initial = InclineEngine::new(config.clone())
        .expect("valid configuration")
        .telemetry()
        .total_j;
    let (engine, _) = run(config);

    for sample in engine.samples() {
        let drift = (sample.energy_ledger_j() - initial).abs() / initial;
        assert!(drift < 0.02, "E-2 FAILED: drift {:.3}% at t={:.2}s", drift * 100.0, sample.time_s);
    }
}

/// F-1: Every preset meets its analytic expectation.
#[test]
fn f1_all_scenarios_pass() {
    for scenario in Scenario::all() {
        let (_, outcome) = scenario.run().expect("preset runs");
        assert!(outcome.passed, "F-1 FAILED: {} {outcome:?}", scenario.name);
    }
}
