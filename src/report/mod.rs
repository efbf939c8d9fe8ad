//! Sample-log reports.
//!
//! Two renderings of a finished (or paused) run: a fixed-width text table
//! with a parameter header, and a JSON document.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::engine::{InclineEngine, Phase, Sample, SampleKind, Telemetry};
use crate::error::SimResult;

/// Run parameters printed above the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    /// Incline angle (degrees).
    pub angle_deg: f64,
    /// Rail length (m).
    pub rail_length_m: f64,
    /// Sphere mass (kg).
    pub mass_kg: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity_mps2: f64,
    /// Launch speed (m/s).
    pub initial_speed_mps: f64,
    /// Dry friction coefficient.
    pub friction_coefficient: f64,
    /// Drag coefficient.
    pub drag_coefficient: f64,
    /// Air density (kg/m³).
    pub air_density: f64,
}

impl ReportParameters {
    /// Collect parameters from an engine.
    #[must_use]
    pub fn from_engine(engine: &InclineEngine) -> Self {
        let rail = engine.rail();
        let constants = engine.constants();
        Self {
            angle_deg: rail.angle_deg(),
            rail_length_m: rail.rail_length_m(),
            mass_kg: rail.mass_kg(),
            gravity_mps2: rail.gravity_mps2(),
            initial_speed_mps: rail.initial_speed_mps(),
            friction_coefficient: constants.friction_coefficient,
            drag_coefficient: constants.drag_coefficient,
            air_density: constants.air_density,
        }
    }
}

/// Everything a consumer needs to rebuild the data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run parameters.
    pub parameters: ReportParameters,
    /// Phase when the report was taken.
    pub phase: Phase,
    /// Final telemetry snapshot.
    pub telemetry: Telemetry,
    /// Samples dropped by the retention cap.
    pub evicted_samples: u64,
    /// Recorded samples.
    pub samples: Vec<Sample>,
}

impl RunReport {
    /// Snapshot an engine.
    #[must_use]
    pub fn from_engine(engine: &InclineEngine) -> Self {
        Self {
            parameters: ReportParameters::from_engine(engine),
            phase: engine.phase(),
            telemetry: *engine.telemetry(),
            evicted_samples: engine.samples().evicted(),
            samples: engine.samples().to_vec(),
        }
    }
}

const COLUMNS: [(&str, usize); 15] = [
    ("t[s]", 8),
    ("h[m]", 9),
    ("v[m/s]", 9),
    ("g[m/s2]", 8),
    ("a[m/s2]", 9),
    ("Fg[N]", 9),
    ("Ff[N]", 8),
    ("Fd[N]", 8),
    ("PE[J]", 10),
    ("KE[J]", 10),
    ("TE[J]", 10),
    ("Wf[J]", 10),
    ("Wd[J]", 10),
    ("vx[m/s]", 9),
    ("vy[m/s]", 9),
];

fn row_values(sample: &Sample) -> [f64; 15] {
    [
        sample.time_s,
        sample.height_m,
        sample.speed_mps,
        sample.gravity_mps2,
        sample.acceleration_mps2,
        sample.gravity_parallel_n,
        sample.friction_n,
        sample.drag_n,
        sample.potential_j,
        sample.kinetic_j,
        sample.total_j,
        sample.friction_loss_j,
        sample.drag_loss_j,
        sample.horizontal_speed_mps,
        sample.vertical_speed_mps,
    ]
}

/// Render the sample log as a text table, two decimals per column.
///
/// The terminal sample is flagged with `*`.
#[must_use]
pub fn render_table(engine: &InclineEngine) -> String {
    let report = RunReport::from_engine(engine);
    let p = &report.parameters;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Angle: {:.1}°  Length: {:.1} m  Mass: {:.1} kg  Gravity: {:.2} m/s²  \
         Initial speed: {:.2} m/s  Friction coeff: {:.2}",
        p.angle_deg, p.rail_length_m, p.mass_kg, p.gravity_mps2, p.initial_speed_mps, p.friction_coefficient
    );
    if report.evicted_samples > 0 {
        let _ = writeln!(out, "({} oldest samples dropped)", report.evicted_samples);
    }

    let header: String = COLUMNS
        .iter()
        .map(|&(name, width)| format!("{name:>width$}"))
        .collect();
    let _ = writeln!(out, "  {header}");
    let _ = writeln!(out, "  {}", "-".repeat(header.chars().count()));

    for sample in &report.samples {
        let marker = if sample.kind == SampleKind::Terminal { '*' } else { ' ' };
        let cells: String = row_values(sample)
            .iter()
            .zip(COLUMNS.iter())
            .map(|(value, &(_, width))| format!("{value:>width$.2}"))
            .collect();
        let _ = writeln!(out, "{marker} {cells}");
    }

    out
}

/// Serialize the run report as pretty JSON.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn to_json(engine: &InclineEngine) -> SimResult<String> {
    Ok(serde_json::to_string_pretty(&RunReport::from_engine(engine))?)
}
