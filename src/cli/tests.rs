//! CLI module tests.
//!
//! Exercise argument parsing through to formatted output.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::Parser;

use super::*;
use crate::config::{RailUpdate, SimConfig};
use crate::engine::Phase;
use crate::scenarios::Scenario;

// ============================================================================
// Args to options
// ============================================================================

#[test]
fn test_run_args_flow_into_simulation() {
    let args = Args::parse_from([
        "incline-sim",
        "run",
        "--angle",
        "60",
        "--length",
        "4",
        "--frame-rate",
        "30",
    ]);
    let Command::Run {
        rail,
        max_time,
        frame_rate,
        realtime,
        ..
    } = args.command
    else {
        unreachable!("parsed a run command");
    };

    let options = RunOptions {
        rail: rail.to_update(),
        max_time,
        frame_rate,
        realtime,
    };
    let engine = run_simulation(SimConfig::default(), &options).unwrap();

    assert_eq!(engine.phase(), Phase::AtRailEnd);
    assert!((engine.rail().angle_deg() - 60.0).abs() < f64::EPSILON);
    assert!((engine.state().displacement_m - 4.0).abs() < 1e-12);
}

#[test]
fn test_out_of_range_override_is_clamped() {
    let args = Args::parse_from(["incline-sim", "pose", "--angle", "135", "--length", "0.2"]);
    let Command::Pose { rail } = args.command else {
        unreachable!("parsed a pose command");
    };

    let mut config = SimConfig::default();
    rail.to_update().apply_to(&mut config.rail);
    assert!((config.rail.angle_deg() - 90.0).abs() < f64::EPSILON);
    assert!((config.rail.rail_length_m() - 1.0).abs() < f64::EPSILON);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_every_scenario_formats_in_both_formats() {
    for scenario in Scenario::all() {
        let (engine, outcome) = scenario.run().expect("presets are valid");
        for format in [OutputFormat::Table, OutputFormat::Json] {
            let text = format_scenario(&scenario, &outcome, &engine, format);
            assert!(text.is_ok_and(|t| !t.is_empty()), "{}", scenario.name);
        }
    }
}

#[test]
fn test_run_report_json_parses_back() {
    let options = RunOptions {
        rail: RailUpdate {
            angle_deg: Some(45.0),
            ..RailUpdate::default()
        },
        ..RunOptions::default()
    };
    let engine = run_simulation(SimConfig::default(), &options).unwrap();
    let json = format_report(&engine, OutputFormat::Json).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let samples = value["samples"].as_array().map_or(0, Vec::len);
    assert_eq!(samples, engine.samples().len());
    assert_eq!(value["phase"], "AtRailEnd");
}

#[test]
fn test_sub_hertz_frame_rate_is_rejected() {
    for frame_rate in [1e-8, 0.5, f64::MIN_POSITIVE] {
        let args = Args::parse_from([
            "incline-sim".to_string(),
            "run".to_string(),
            "--frame-rate".to_string(),
            frame_rate.to_string(),
        ]);
        let Command::Run { frame_rate, .. } = args.command else {
            unreachable!("parsed a run command");
        };

        let options = RunOptions {
            frame_rate,
            realtime: true,
            ..RunOptions::default()
        };
        let err = run_simulation(SimConfig::default(), &options).unwrap_err();
        assert!(matches!(err, crate::error::SimError::Config { .. }), "{frame_rate}");
    }
}

#[test]
fn test_slowest_frame_rate_finishes_run() {
    let options = RunOptions {
        frame_rate: MIN_FRAME_RATE_HZ,
        ..RunOptions::default()
    };
    let engine = run_simulation(SimConfig::default(), &options).unwrap();
    assert_eq!(engine.phase(), Phase::AtRailEnd);
}
