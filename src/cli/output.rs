//! CLI output formatting.
//!
//! Formatting is kept separate from printing so the text can be tested.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::engine::{InclineEngine, Phase, Telemetry};
use crate::error::SimResult;
use crate::geometry::RailGeometry;
use crate::report::{self, RunReport};
use crate::scenarios::{Scenario, ScenarioOutcome};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Version line including the commit the binary was built from.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("INCLINE_SIM_GIT_HASH"),
    ", built at unix time ",
    env!("INCLINE_SIM_BUILD_TIMESTAMP"),
    ")"
);

/// Final readout of a run.
#[must_use]
pub fn format_telemetry(telemetry: &Telemetry, phase: Phase) -> String {
    let mut out = String::new();
    let status = match phase {
        Phase::AtRailEnd => "reached rail end",
        Phase::Running => "still running",
        Phase::Paused => "paused",
    };

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Status:        {status}");
    let _ = writeln!(out, "Time:          {:.3} s", telemetry.time_s);
    let _ = writeln!(out, "Displacement:  {:.3} m", telemetry.displacement_m);
    let _ = writeln!(out, "Height:        {:.3} m", telemetry.height_m);
    let _ = writeln!(out, "Speed:         {:.3} m/s", telemetry.speed_mps);
    let _ = writeln!(out, "Acceleration:  {:.3} m/s²", telemetry.acceleration_mps2);
    let _ = writeln!(
        out,
        "Forces:        gravity∥ {:.3} N, friction {:.3} N, drag {:.3} N",
        telemetry.gravity_parallel_n, telemetry.friction_n, telemetry.drag_n
    );
    let _ = writeln!(
        out,
        "Energy:        PE {:.3} J, KE {:.3} J, total {:.3} J",
        telemetry.potential_j, telemetry.kinetic_j, telemetry.total_j
    );
    let _ = writeln!(
        out,
        "Losses:        friction {:.3} J, drag {:.3} J",
        telemetry.friction_loss_j, telemetry.drag_loss_j
    );
    let _ = writeln!(out, "{RULE}");
    out
}

/// Sample log in the requested format.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn format_report(engine: &InclineEngine, format: OutputFormat) -> SimResult<String> {
    match format {
        OutputFormat::Table => Ok(report::render_table(engine)),
        OutputFormat::Json => report::to_json(engine),
    }
}

#[derive(Serialize)]
struct ScenarioDocument<'a> {
    outcome: &'a ScenarioOutcome,
    report: RunReport,
}

/// Verdict of a preset run plus its sample log.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn format_scenario(
    scenario: &Scenario,
    outcome: &ScenarioOutcome,
    engine: &InclineEngine,
    format: OutputFormat,
) -> SimResult<String> {
    if format == OutputFormat::Json {
        let document = ScenarioDocument {
            outcome,
            report: RunReport::from_engine(engine),
        };
        return Ok(serde_json::to_string_pretty(&document)?);
    }

    let mut out = String::new();
    let verdict = if outcome.passed { "✓ PASSED" } else { "✗ FAILED" };
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Scenario: {}", scenario.name);
    let _ = writeln!(out, "{}", scenario.description);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Run:            {} after {} ticks",
        if outcome.run.reached_end() { "reached rail end" } else { "step limit" },
        outcome.run.steps()
    );
    let _ = writeln!(out, "Final speed:    {:.3} m/s", outcome.final_speed_mps);
    let _ = writeln!(out, "Displacement:   {:.3} m", outcome.final_displacement_m);
    if let (Some(reference), Some(error)) = (outcome.reference_speed_mps, outcome.relative_error) {
        let _ = writeln!(out, "Reference:      {reference:.3} m/s ({:+.2}%)", error * 100.0);
    }
    let _ = writeln!(out, "Expectation:    {verdict}");
    let _ = writeln!(out);
    out.push_str(&report::render_table(engine));
    Ok(out)
}

/// One line per preset.
#[must_use]
pub fn format_scenario_list(scenarios: &[Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for scenario in scenarios {
        let _ = writeln!(out, "  {:<width$}  {}", scenario.name, scenario.description);
    }
    out
}

/// Rail pose readout.
#[must_use]
pub fn format_pose(geometry: &RailGeometry) -> String {
    let mut out = String::new();
    let (s, e) = (geometry.start, geometry.end);
    let _ = writeln!(out, "Angle:       {:.2}°", geometry.angle_rad.to_degrees());
    let _ = writeln!(out, "Length:      {:.3} m", geometry.length_m);
    let _ = writeln!(out, "Height:      {:.3} m", geometry.height());
    let _ = writeln!(out, "Rail start:  ({:.3}, {:.3}, {:.3})", s.x, s.y, s.z);
    let _ = writeln!(out, "Rail end:    ({:.3}, {:.3}, {:.3})", e.x, e.y, e.z);
    if geometry.is_vertical() {
        let _ = writeln!(out, "Vertical drop: the rail carries no normal force");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geometry::{resolve, DEFAULT_ANCHOR};

    #[test]
    fn test_format_telemetry() {
        let mut engine = InclineEngine::default();
        engine.run_to_end(100_000);
        let text = format_telemetry(engine.telemetry(), engine.phase());

        assert!(text.contains("Status:        reached rail end"));
        assert!(text.contains("Displacement:  10.000 m"));
        assert!(text.contains("Losses:"));
    }

    #[test]
    fn test_format_report_json() {
        let mut engine = InclineEngine::default();
        engine.run_to_end(100_000);
        let json = format_report(&engine, OutputFormat::Json).unwrap();
        assert!(json.trim_start().starts_with('{'));
        let table = format_report(&engine, OutputFormat::Table).unwrap();
        assert!(table.starts_with("Angle:"));
    }

    #[test]
    fn test_format_scenario() {
        let scenario = Scenario::vertical_drop();
        let (engine, outcome) = scenario.run().unwrap();

        let text = format_scenario(&scenario, &outcome, &engine, OutputFormat::Table).unwrap();
        assert!(text.contains("Scenario: vertical-drop"));
        assert!(text.contains("✓ PASSED"));
        assert!(text.contains("Reference:"));

        let json = format_scenario(&scenario, &outcome, &engine, OutputFormat::Json).unwrap();
        assert!(json.contains("\"outcome\""));
        assert!(json.contains("\"samples\""));
    }

    #[test]
    fn test_format_scenario_list() {
        let text = format_scenario_list(&Scenario::all());
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("long-drop"));
    }

    #[test]
    fn test_format_pose() {
        let text = format_pose(&resolve(90.0, 10.0, DEFAULT_ANCHOR));
        assert!(text.contains("Rail end:    (5.000, 0.000, 0.000)"));
        assert!(text.contains("Vertical drop"));

        let text = format_pose(&resolve(30.0, 10.0, DEFAULT_ANCHOR));
        assert!(text.contains("Height:      5.000 m"));
        assert!(!text.contains("Vertical drop"));
    }

    #[test]
    fn test_long_version_mentions_package_version() {
        assert!(LONG_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
    }
}
