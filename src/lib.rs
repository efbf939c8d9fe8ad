//! # incline-sim
//!
//! Physics engine for a sphere travelling down an inclined rail.
//!
//! The sphere is pulled along the rail by gravity (reduced by buoyancy),
//! opposed by dry friction and quadratic air drag, and integrated with a
//! fixed-step semi-implicit Euler scheme until it reaches the rail end.
//! Every step keeps an energy ledger, and telemetry is sampled at a fixed
//! cadence for tabular or JSON reports.
//!
//! ## Example
//!
//! ```rust
//! use incline_sim::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .angle_deg(45.0)
//!     .rail_length_m(20.0)
//!     .build();
//!
//! let mut engine = InclineEngine::new(config).expect("valid configuration");
//! let outcome = engine.run_to_end(100_000);
//!
//! assert!(outcome.reached_end());
//! assert!(engine.telemetry().speed_mps > 0.0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod report;
pub mod scenarios;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{
        IntegrationConfig, PhysicalConstants, RailConfig, RailUpdate, SimConfig, SimConfigBuilder,
    };
    pub use crate::engine::{
        FixedStepDriver, GuardResponse, InclineEngine, InvariantGuard, Phase, RunOutcome, Sample,
        SampleKind, SharedEngine, Telemetry, TickOutcome,
    };
    pub use crate::error::{SimError, SimResult};
    pub use crate::geometry::{RailGeometry, RailPose, Vec3};
    pub use crate::scenarios::{Scenario, ScenarioOutcome};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
