//! Configuration system with YAML schema and validation.
//!
//! Two policies coexist:
//! - **Rail parameters** (angle, length, gravity, mass, initial speed) are
//!   live-tunable. Out-of-range values are clamped to the nearest bound and
//!   logged, never rejected.
//! - **Physical constants and integration settings** are fixed at
//!   construction and validated strictly; a bad value is a hard error.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::geometry::{Vec3, DEFAULT_ANCHOR};

/// Closed interval a live-tunable parameter is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
}

impl Bound {
    /// Create a new bound.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether `value` lies inside the bound.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `requested` into the bound.
    ///
    /// NaN has no nearest bound, so `current` is kept instead.
    #[must_use]
    pub fn apply(&self, name: &str, requested: f64, current: f64) -> f64 {
        if requested.is_nan() {
            warn!("{name}: rejected NaN, keeping {current}");
            return current;
        }
        let applied = requested.clamp(self.min, self.max);
        if applied != requested {
            warn!(
                "{name}: {requested} outside [{}, {}], clamped to {applied}",
                self.min, self.max
            );
        }
        applied
    }
}

/// Incline angle bound (degrees).
pub const ANGLE_BOUNDS: Bound = Bound::new(0.0, 90.0);
/// Rail length bound (m).
pub const LENGTH_BOUNDS: Bound = Bound::new(1.0, 1000.0);
/// Gravitational acceleration bound (m/s²).
pub const GRAVITY_BOUNDS: Bound = Bound::new(1.0, 274.0);
/// Sphere mass bound (kg).
pub const MASS_BOUNDS: Bound = Bound::new(1.0, 100.0);
/// Initial speed bound (m/s).
pub const INITIAL_SPEED_BOUNDS: Bound = Bound::new(0.0, 1000.0);

/// Live-tunable rail configuration.
///
/// Fields are private so every write goes through a clamping setter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RailConfig {
    #[serde(default = "default_angle")]
    angle_deg: f64,
    #[serde(default = "default_length")]
    rail_length_m: f64,
    #[serde(default = "default_gravity")]
    gravity_mps2: f64,
    #[serde(default = "default_mass")]
    mass_kg: f64,
    #[serde(default)]
    initial_speed_mps: f64,
}

const fn default_angle() -> f64 {
    30.0
}

const fn default_length() -> f64 {
    10.0
}

const fn default_gravity() -> f64 {
    9.81
}

const fn default_mass() -> f64 {
    1.0
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            angle_deg: default_angle(),
            rail_length_m: default_length(),
            gravity_mps2: default_gravity(),
            mass_kg: default_mass(),
            initial_speed_mps: 0.0,
        }
    }
}

impl RailConfig {
    /// Build a configuration, clamping every parameter into its bound.
    #[must_use]
    pub fn new(
        angle_deg: f64,
        rail_length_m: f64,
        gravity_mps2: f64,
        mass_kg: f64,
        initial_speed_mps: f64,
    ) -> Self {
        let mut config = Self::default();
        config.set_angle_deg(angle_deg);
        config.set_rail_length_m(rail_length_m);
        config.set_gravity_mps2(gravity_mps2);
        config.set_mass_kg(mass_kg);
        config.set_initial_speed_mps(initial_speed_mps);
        config
    }

    /// Re-apply all bounds, e.g. after deserializing raw YAML values.
    #[must_use]
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, fallback: f64| if value.is_nan() { fallback } else { value };
        Self::new(
            pick(self.angle_deg, defaults.angle_deg),
            pick(self.rail_length_m, defaults.rail_length_m),
            pick(self.gravity_mps2, defaults.gravity_mps2),
            pick(self.mass_kg, defaults.mass_kg),
            pick(self.initial_speed_mps, defaults.initial_speed_mps),
        )
    }

    /// Incline angle in degrees, within [0, 90].
    #[must_use]
    pub const fn angle_deg(&self) -> f64 {
        self.angle_deg
    }

    /// Incline angle in radians.
    #[must_use]
    pub fn angle_rad(&self) -> f64 {
        self.angle_deg.to_radians()
    }

    /// Rail length in meters, within [1, 1000].
    #[must_use]
    pub const fn rail_length_m(&self) -> f64 {
        self.rail_length_m
    }

    /// Gravitational acceleration in m/s², within [1, 274].
    #[must_use]
    pub const fn gravity_mps2(&self) -> f64 {
        self.gravity_mps2
    }

    /// Sphere mass in kg, within [1, 100].
    #[must_use]
    pub const fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    /// Launch speed along the rail in m/s, within [0, 1000].
    #[must_use]
    pub const fn initial_speed_mps(&self) -> f64 {
        self.initial_speed_mps
    }

    /// Set the incline angle; returns the applied (clamped) value.
    pub fn set_angle_deg(&mut self, deg: f64) -> f64 {
        self.angle_deg = ANGLE_BOUNDS.apply("angle_deg", deg, self.angle_deg);
        self.angle_deg
    }

    /// Set the rail length; returns the applied (clamped) value.
    pub fn set_rail_length_m(&mut self, meters: f64) -> f64 {
        self.rail_length_m = LENGTH_BOUNDS.apply("rail_length_m", meters, self.rail_length_m);
        self.rail_length_m
    }

    /// Set gravitational acceleration; returns the applied (clamped) value.
    pub fn set_gravity_mps2(&mut self, mps2: f64) -> f64 {
        self.gravity_mps2 = GRAVITY_BOUNDS.apply("gravity_mps2", mps2, self.gravity_mps2);
        self.gravity_mps2
    }

    /// Set the sphere mass; returns the applied (clamped) value.
    pub fn set_mass_kg(&mut self, kg: f64) -> f64 {
        self.mass_kg = MASS_BOUNDS.apply("mass_kg", kg, self.mass_kg);
        self.mass_kg
    }

    /// Set the launch speed; returns the applied (clamped) value.
    pub fn set_initial_speed_mps(&mut self, mps: f64) -> f64 {
        self.initial_speed_mps =
            INITIAL_SPEED_BOUNDS.apply("initial_speed_mps", mps, self.initial_speed_mps);
        self.initial_speed_mps
    }

    /// Whether the rail geometry differs from `other`.
    #[must_use]
    pub fn geometry_differs(&self, other: &Self) -> bool {
        self.angle_deg != other.angle_deg || self.rail_length_m != other.rail_length_m
    }
}

/// Partial update merged into a [`RailConfig`]; `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RailUpdate {
    /// New incline angle (degrees).
    pub angle_deg: Option<f64>,
    /// New rail length (m).
    pub rail_length_m: Option<f64>,
    /// New gravitational acceleration (m/s²).
    pub gravity_mps2: Option<f64>,
    /// New sphere mass (kg).
    pub mass_kg: Option<f64>,
    /// New launch speed (m/s).
    pub initial_speed_mps: Option<f64>,
}

impl RailUpdate {
    /// Merge this update into `config`, clamping each provided field.
    pub fn apply_to(&self, config: &mut RailConfig) {
        if let Some(v) = self.angle_deg {
            config.set_angle_deg(v);
        }
        if let Some(v) = self.rail_length_m {
            config.set_rail_length_m(v);
        }
        if let Some(v) = self.gravity_mps2 {
            config.set_gravity_mps2(v);
        }
        if let Some(v) = self.mass_kg {
            config.set_mass_kg(v);
        }
        if let Some(v) = self.initial_speed_mps {
            config.set_initial_speed_mps(v);
        }
    }
}

impl From<RailConfig> for RailUpdate {
    fn from(config: RailConfig) -> Self {
        Self {
            angle_deg: Some(config.angle_deg),
            rail_length_m: Some(config.rail_length_m),
            gravity_mps2: Some(config.gravity_mps2),
            mass_kg: Some(config.mass_kg),
            initial_speed_mps: Some(config.initial_speed_mps),
        }
    }
}

/// Physical constants fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PhysicalConstants {
    /// Density of the surrounding air (kg/m³).
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default = "default_air_density")]
    pub air_density: f64,
    /// Drag coefficient of the sphere.
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default = "default_drag_coefficient")]
    pub drag_coefficient: f64,
    /// Dry (kinetic) friction coefficient between sphere and rail.
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default = "default_friction_coefficient")]
    pub friction_coefficient: f64,
    /// Physical sphere radius (m).
    #[validate(range(exclusive_min = 0.0, max = 10.0))]
    #[serde(default = "default_sphere_radius")]
    pub sphere_radius_m: f64,
}

const fn default_air_density() -> f64 {
    1.225 // sea level
}

const fn default_drag_coefficient() -> f64 {
    0.47 // smooth sphere
}

const fn default_friction_coefficient() -> f64 {
    0.2 // steel on aluminum
}

const fn default_sphere_radius() -> f64 {
    0.1
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            air_density: default_air_density(),
            drag_coefficient: default_drag_coefficient(),
            friction_coefficient: default_friction_coefficient(),
            sphere_radius_m: default_sphere_radius(),
        }
    }
}

impl PhysicalConstants {
    /// Constants with every dissipative and buoyant effect switched off.
    ///
    /// Used to check that PE + KE is conserved up to integration error.
    #[must_use]
    pub fn frictionless_vacuum() -> Self {
        Self {
            air_density: 0.0,
            drag_coefficient: 0.0,
            friction_coefficient: 0.0,
            ..Self::default()
        }
    }

    /// Sphere cross-sectional area πr² (m²).
    #[must_use]
    pub fn cross_section_area(&self) -> f64 {
        std::f64::consts::PI * self.sphere_radius_m * self.sphere_radius_m
    }

    /// Sphere volume (4/3)πr³ (m³).
    #[must_use]
    pub fn sphere_volume(&self) -> f64 {
        4.0 / 3.0 * std::f64::consts::PI * self.sphere_radius_m.powi(3)
    }
}

/// Fixed-step integration and sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Physics time step in seconds.
    #[validate(range(exclusive_min = 0.0, max = 0.1))]
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Interval between regular samples in seconds.
    #[validate(range(exclusive_min = 0.0, max = 3600.0))]
    #[serde(default = "default_sample_interval")]
    pub sample_interval_s: f64,
    /// Retention cap for the sample log (`None` = unbounded).
    #[validate(range(min = 2))]
    #[serde(default)]
    pub max_samples: Option<usize>,
}

const fn default_dt() -> f64 {
    0.0025
}

const fn default_sample_interval() -> f64 {
    0.1
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            sample_interval_s: default_sample_interval(),
            max_samples: None,
        }
    }
}

/// Top-level simulation configuration.
///
/// Loaded from YAML files or built programmatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Live-tunable rail parameters.
    #[serde(default)]
    pub rail: RailConfig,

    /// Physical constants.
    #[validate(nested)]
    #[serde(default)]
    pub constants: PhysicalConstants,

    /// Integration and sampling settings.
    #[validate(nested)]
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// World-space position of the rail's fixed lower end.
    #[serde(default = "default_anchor")]
    pub anchor: Vec3,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_anchor() -> Vec3 {
    DEFAULT_ANCHOR
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            rail: RailConfig::default(),
            constants: PhysicalConstants::default(),
            integration: IntegrationConfig::default(),
            anchor: default_anchor(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        config.rail = config.rail.clamped();
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns error if any fixed constant or integration setting is invalid.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    fn validate_semantic(&self) -> SimResult<()> {
        let integration = &self.integration;
        if integration.sample_interval_s < integration.dt {
            return Err(SimError::config(format!(
                "sample interval {} s is shorter than the time step {} s",
                integration.sample_interval_s, integration.dt
            )));
        }
        if !self.anchor.is_finite() {
            return Err(SimError::config("rail anchor must be finite"));
        }

        // Displaced air must stay lighter than the lightest allowed sphere,
        // or effective gravity and the normal force turn negative.
        let buoyant_mass = self.constants.air_density * self.constants.sphere_volume();
        if buoyant_mass >= MASS_BOUNDS.min {
            return Err(SimError::config(format!(
                "displaced air mass {buoyant_mass:.3} kg must be below the minimum sphere mass {} kg",
                MASS_BOUNDS.min
            )));
        }
        Ok(())
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    rail: RailUpdate,
    constants: Option<PhysicalConstants>,
    dt: Option<f64>,
    sample_interval_s: Option<f64>,
    max_samples: Option<usize>,
    anchor: Option<Vec3>,
}

impl SimConfigBuilder {
    /// Set the incline angle (degrees).
    #[must_use]
    pub const fn angle_deg(mut self, deg: f64) -> Self {
        self.rail.angle_deg = Some(deg);
        self
    }

    /// Set the rail length (m).
    #[must_use]
    pub const fn rail_length_m(mut self, meters: f64) -> Self {
        self.rail.rail_length_m = Some(meters);
        self
    }

    /// Set gravitational acceleration (m/s²).
    #[must_use]
    pub const fn gravity_mps2(mut self, mps2: f64) -> Self {
        self.rail.gravity_mps2 = Some(mps2);
        self
    }

    /// Set the sphere mass (kg).
    #[must_use]
    pub const fn mass_kg(mut self, kg: f64) -> Self {
        self.rail.mass_kg = Some(kg);
        self
    }

    /// Set the launch speed (m/s).
    #[must_use]
    pub const fn initial_speed_mps(mut self, mps: f64) -> Self {
        self.rail.initial_speed_mps = Some(mps);
        self
    }

    /// Apply a partial rail update.
    #[must_use]
    pub fn rail(mut self, update: RailUpdate) -> Self {
        let merged = |new: Option<f64>, old: Option<f64>| new.or(old);
        self.rail = RailUpdate {
            angle_deg: merged(update.angle_deg, self.rail.angle_deg),
            rail_length_m: merged(update.rail_length_m, self.rail.rail_length_m),
            gravity_mps2: merged(update.gravity_mps2, self.rail.gravity_mps2),
            mass_kg: merged(update.mass_kg, self.rail.mass_kg),
            initial_speed_mps: merged(update.initial_speed_mps, self.rail.initial_speed_mps),
        };
        self
    }

    /// Set the physical constants.
    #[must_use]
    pub const fn constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = Some(constants);
        self
    }

    /// Set the physics time step (s).
    #[must_use]
    pub const fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Set the regular sampling interval (s).
    #[must_use]
    pub const fn sample_interval_s(mut self, secs: f64) -> Self {
        self.sample_interval_s = Some(secs);
        self
    }

    /// Cap sample-log retention.
    #[must_use]
    pub const fn max_samples(mut self, max: usize) -> Self {
        self.max_samples = Some(max);
        self
    }

    /// Set the rail's fixed lower end.
    #[must_use]
    pub const fn anchor(mut self, anchor: Vec3) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Build the configuration. Rail parameters are clamped; constants and
    /// integration settings are validated later by [`SimConfig::check`].
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();
        self.rail.apply_to(&mut config.rail);

        if let Some(constants) = self.constants {
            config.constants = constants;
        }
        if let Some(dt) = self.dt {
            config.integration.dt = dt;
        }
        if let Some(secs) = self.sample_interval_s {
            config.integration.sample_interval_s = secs;
        }
        if self.max_samples.is_some() {
            config.integration.max_samples = self.max_samples;
        }
        if let Some(anchor) = self.anchor {
            config.anchor = anchor;
        }

        config
    }
}
