//! CLI module for incline-sim.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, OutputFormat, RailArgs};
pub use commands::{load_config, run_cli, run_simulation, RunOptions, MIN_FRAME_RATE_HZ};
pub use output::{
    format_pose, format_report, format_scenario, format_scenario_list, format_telemetry,
    LONG_VERSION,
};

#[cfg(test)]
mod tests;
