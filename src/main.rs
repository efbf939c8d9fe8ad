//! incline-sim CLI
//!
//! Headless runner for the inclined-rail sphere simulator.

use std::process::ExitCode;

use clap::Parser;
use incline_sim::cli::{run_cli, Args};

fn main() -> ExitCode {
    run_cli(Args::parse())
}
