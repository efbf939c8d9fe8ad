//! CLI argument parsing.
//!
//! Declarative clap model for the `incline-sim` binary. Kept in the library
//! so argument handling can be tested with `try_parse_from`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::output::LONG_VERSION;
use crate::config::RailUpdate;

/// Headless simulator of a sphere on an inclined rail.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    name = "incline-sim",
    author,
    version,
    long_version = LONG_VERSION,
    about,
    long_about = None
)]
pub struct Args {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Output format for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Parameter header plus a fixed-width data table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Rail overrides shared by `run` and `pose`.
#[derive(Debug, Clone, Copy, PartialEq, Default, clap::Args)]
pub struct RailArgs {
    /// Incline angle in degrees [0, 90]
    #[arg(long)]
    pub angle: Option<f64>,

    /// Rail length in meters [1, 1000]
    #[arg(long)]
    pub length: Option<f64>,

    /// Gravitational acceleration in m/s² [1, 274]
    #[arg(long)]
    pub gravity: Option<f64>,

    /// Sphere mass in kg [1, 100]
    #[arg(long)]
    pub mass: Option<f64>,

    /// Launch speed along the rail in m/s [0, 1000]
    #[arg(long = "initial-speed")]
    pub initial_speed: Option<f64>,
}

impl RailArgs {
    /// Convert into a partial rail update.
    #[must_use]
    pub const fn to_update(&self) -> RailUpdate {
        RailUpdate {
            angle_deg: self.angle,
            rail_length_m: self.length,
            gravity_mps2: self.gravity,
            mass_kg: self.mass,
            initial_speed_mps: self.initial_speed,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Run a simulation until the sphere reaches the rail end
    Run {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rail parameter overrides
        #[command(flatten)]
        rail: RailArgs,

        /// Stop after this much simulated time (s)
        #[arg(long = "max-time", default_value_t = 120.0)]
        max_time: f64,

        /// Driver frame rate (Hz), at least 1
        #[arg(long = "frame-rate", default_value_t = 60.0)]
        frame_rate: f64,

        /// Pace frames against the wall clock
        #[arg(long)]
        realtime: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run a named preset and compare it with its analytic expectation
    Scenario {
        /// Preset name (see `scenarios`)
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List available presets
    Scenarios,
    /// Print the rail pose for an angle and length
    Pose {
        /// Rail parameter overrides
        #[command(flatten)]
        rail: RailArgs,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let args = Args::try_parse_from(["incline-sim", "run"]).unwrap();
        assert!(!args.verbose);
        match args.command {
            Command::Run {
                config,
                rail,
                max_time,
                frame_rate,
                realtime,
                format,
            } => {
                assert!(config.is_none());
                assert_eq!(rail, RailArgs::default());
                assert!((max_time - 120.0).abs() < f64::EPSILON);
                assert!((frame_rate - 60.0).abs() < f64::EPSILON);
                assert!(!realtime);
                assert_eq!(format, OutputFormat::Table);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_overrides() {
        let args = Args::try_parse_from([
            "incline-sim",
            "run",
            "--angle",
            "45",
            "--length",
            "20",
            "--initial-speed",
            "2.5",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        let Command::Run { rail, format, .. } = args.command else {
            panic!("expected run");
        };
        let update = rail.to_update();
        assert_eq!(update.angle_deg, Some(45.0));
        assert_eq!(update.rail_length_m, Some(20.0));
        assert_eq!(update.initial_speed_mps, Some(2.5));
        assert_eq!(update.mass_kg, None);
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_scenario() {
        let args = Args::try_parse_from(["incline-sim", "scenario", "vertical-drop"]).unwrap();
        assert_eq!(
            args.command,
            Command::Scenario {
                name: "vertical-drop".to_string(),
                format: OutputFormat::Table,
            }
        );
    }

    #[test]
    fn test_parse_pose_and_list() {
        let args = Args::try_parse_from(["incline-sim", "pose", "--angle", "90"]).unwrap();
        assert!(matches!(args.command, Command::Pose { rail } if rail.angle == Some(90.0)));

        let args = Args::try_parse_from(["incline-sim", "scenarios"]).unwrap();
        assert_eq!(args.command, Command::Scenarios);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Args::try_parse_from(["incline-sim"]).is_err());
        assert!(Args::try_parse_from(["incline-sim", "fly"]).is_err());
        assert!(Args::try_parse_from(["incline-sim", "run", "--angle", "steep"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
