//! CLI command handlers.
//!
//! Each handler returns a [`SimResult`]; [`run_cli`] maps errors to exit
//! code 1.

use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use log::{error, info};

use super::args::{Args, Command, OutputFormat, RailArgs};
use super::output::{
    format_pose, format_report, format_scenario, format_scenario_list, format_telemetry,
};
use crate::config::{RailUpdate, SimConfig};
use crate::engine::{FixedStepDriver, GuardResponse, InclineEngine, InvariantGuard};
use crate::error::{SimError, SimResult};
use crate::geometry;
use crate::logging;
use crate::scenarios::Scenario;

/// Slowest accepted driver frame rate (Hz).
pub const MIN_FRAME_RATE_HZ: f64 = 1.0;

/// Options for a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Rail overrides applied on top of the configuration.
    pub rail: RailUpdate,
    /// Simulated-time limit (s).
    pub max_time: f64,
    /// Driver frame rate (Hz).
    pub frame_rate: f64,
    /// Pace frames against the wall clock.
    pub realtime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rail: RailUpdate::default(),
            max_time: 120.0,
            frame_rate: 60.0,
            realtime: false,
        }
    }
}

/// Main CLI entry point.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    logging::init(args.verbose);

    let result = match args.command {
        Command::Run {
            config,
            rail,
            max_time,
            frame_rate,
            realtime,
            format,
        } => {
            let options = RunOptions {
                rail: rail.to_update(),
                max_time,
                frame_rate,
                realtime,
            };
            run_command(config.as_deref(), &options, format)
        }
        Command::Scenario { name, format } => scenario_command(&name, format),
        Command::Scenarios => {
            print!("{}", format_scenario_list(&Scenario::all()));
            Ok(true)
        }
        Command::Pose { rail } => pose_command(&rail),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Load the configuration file (or defaults) and apply rail overrides.
///
/// # Errors
///
/// Returns error if the file cannot be read, parsed or validated.
pub fn load_config(path: Option<&Path>, rail: RailUpdate) -> SimResult<SimConfig> {
    let mut config = match path {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            SimConfig::load(path)?
        }
        None => SimConfig::default(),
    };
    rail.apply_to(&mut config.rail);
    config.check()?;
    Ok(config)
}

/// Run headless through the fixed-step driver until the rail end or the
/// time limit, checking invariants after every tick.
///
/// # Errors
///
/// Returns error if the options are invalid or the invariant guard halts
/// the run.
pub fn run_simulation(config: SimConfig, options: &RunOptions) -> SimResult<InclineEngine> {
    if !(options.frame_rate.is_finite() && options.frame_rate >= MIN_FRAME_RATE_HZ) {
        return Err(SimError::config(format!(
            "frame rate must be at least {MIN_FRAME_RATE_HZ} Hz, got {}",
            options.frame_rate
        )));
    }
    if !(options.max_time.is_finite() && options.max_time > 0.0) {
        return Err(SimError::config(format!(
            "max time must be positive, got {}",
            options.max_time
        )));
    }

    let mut engine = InclineEngine::new(config)?;
    engine.configure(options.rail);

    let frame_secs = options.frame_rate.recip();
    // Headless frames must never drop time.
    let substeps = ((frame_secs / engine.dt()).ceil() as u32).saturating_add(1);
    let frame = Duration::try_from_secs_f64(frame_secs).unwrap_or(Duration::ZERO);
    let mut driver = FixedStepDriver::for_engine(&engine).with_max_substeps(substeps);
    let mut guard = InvariantGuard::for_engine(&engine);

    info!(
        "run: angle {}°, length {} m, dt {} s, {} Hz frames",
        engine.rail().angle_deg(),
        engine.rail().rail_length_m(),
        engine.dt(),
        options.frame_rate
    );

    engine.start();
    while engine.is_running() && engine.state().elapsed_time_s < options.max_time {
        let frame_start = Instant::now();
        let mut halt = None;

        driver.advance_with(&mut engine, frame_secs, |engine| match guard.check(engine) {
            GuardResponse::Halt(err) => {
                halt = Some(err);
                false
            }
            GuardResponse::Continue | GuardResponse::Warning(_) => true,
        });

        if let Some(err) = halt {
            engine.pause();
            return Err(err);
        }

        if options.realtime {
            std::thread::sleep(frame.saturating_sub(frame_start.elapsed()));
        }
    }

    info!(
        "run finished: t={:.4}s, {} samples, {} guard checks",
        engine.state().elapsed_time_s,
        engine.samples().len(),
        guard.checks()
    );
    Ok(engine)
}

fn run_command(path: Option<&Path>, options: &RunOptions, format: OutputFormat) -> SimResult<bool> {
    let config = load_config(path, RailUpdate::default())?;
    let engine = run_simulation(config, options)?;

    let report = format_report(&engine, format)?;
    if format == OutputFormat::Table {
        print!("{}", format_telemetry(engine.telemetry(), engine.phase()));
        println!();
    }
    print!("{report}");
    if format == OutputFormat::Json {
        println!();
    }
    Ok(true)
}

fn scenario_command(name: &str, format: OutputFormat) -> SimResult<bool> {
    let scenario = Scenario::by_name(name)?;
    info!("scenario {}: {}", scenario.name, scenario.description);

    let (engine, outcome) = scenario.run()?;
    print!("{}", format_scenario(&scenario, &outcome, &engine, format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(outcome.passed)
}

fn pose_command(rail: &RailArgs) -> SimResult<bool> {
    let mut config = SimConfig::default();
    rail.to_update().apply_to(&mut config.rail);
    let geometry = geometry::resolve(
        config.rail.angle_deg(),
        config.rail.rail_length_m(),
        config.anchor,
    );
    print!("{}", format_pose(&geometry));
    Ok(true)
}
