//! Force composition along the incline axis.
//!
//! All forces are signed along the downhill direction of the rail:
//!
//! ```text
//! g_eff   = g · (1 − ρ_air / ρ_sphere)          buoyancy-corrected gravity
//! Fg_par  = m · g_eff · sin θ                    drives the sphere downhill
//! N       = m · g_eff · cos θ                    normal force
//! F_fric  = μ · N            (0 when θ = 90°)    dry friction
//! F_drag  = ½ · ρ_air · Cd · A · v²              quadratic air drag
//! F_net   = Fg_par − F_fric − F_drag
//! ```
//!
//! Friction and drag always oppose motion because the sphere only ever moves
//! downhill (speed is clamped at zero by the integrator).

use serde::{Deserialize, Serialize};

use crate::config::{PhysicalConstants, RailConfig};

/// Every force and derived quantity evaluated at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceBreakdown {
    /// Buoyancy-corrected gravitational acceleration (m/s²).
    pub effective_gravity_mps2: f64,
    /// Gravity component parallel to the rail (N).
    pub gravity_parallel_n: f64,
    /// Normal force from the rail (N).
    pub normal_n: f64,
    /// Dry friction magnitude (N).
    pub friction_n: f64,
    /// Air drag magnitude (N).
    pub drag_n: f64,
    /// Net force along the rail, positive downhill (N).
    pub net_n: f64,
    /// Net acceleration along the rail (m/s²).
    pub acceleration_mps2: f64,
}

impl ForceBreakdown {
    /// Evaluate all forces for the given configuration at `speed_mps`.
    ///
    /// Mass is bounded to [1, 100] kg by [`RailConfig`], so the division is
    /// always defined.
    #[must_use]
    pub fn evaluate(rail: &RailConfig, constants: &PhysicalConstants, speed_mps: f64) -> Self {
        let mass = rail.mass_kg();
        let angle = rail.angle_rad();

        let g_eff = effective_gravity(rail.gravity_mps2(), mass, constants);

        let gravity_parallel = mass * g_eff * angle.sin();
        let normal = mass * g_eff * angle.cos();

        // A vertical rail provides no contact force.
        let friction = if rail.angle_deg() >= 90.0 {
            0.0
        } else {
            constants.friction_coefficient * normal
        };

        let drag = drag_force(speed_mps, constants);

        let net = gravity_parallel - friction - drag;

        Self {
            effective_gravity_mps2: g_eff,
            gravity_parallel_n: gravity_parallel,
            normal_n: normal,
            friction_n: friction,
            drag_n: drag,
            net_n: net,
            acceleration_mps2: net / mass,
        }
    }

    /// Check that every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.effective_gravity_mps2,
            self.gravity_parallel_n,
            self.normal_n,
            self.friction_n,
            self.drag_n,
            self.net_n,
            self.acceleration_mps2,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Sphere density ρ = m / V (kg/m³).
#[must_use]
pub fn sphere_density(mass_kg: f64, constants: &PhysicalConstants) -> f64 {
    mass_kg / constants.sphere_volume()
}

/// Gravity reduced by the buoyant support of the surrounding air.
#[must_use]
pub fn effective_gravity(gravity_mps2: f64, mass_kg: f64, constants: &PhysicalConstants) -> f64 {
    gravity_mps2 * (1.0 - constants.air_density / sphere_density(mass_kg, constants))
}

/// Quadratic drag magnitude ½·ρ·Cd·A·v².
#[must_use]
pub fn drag_force(speed_mps: f64, constants: &PhysicalConstants) -> f64 {
    0.5 * constants.air_density
        * constants.drag_coefficient
        * constants.cross_section_area()
        * speed_mps
        * speed_mps
}

/// Drag-limited speed for a vertical drop, `sqrt(2·m·g / (ρ·Cd·A))`.
///
/// Returns `None` when there is no drag to balance gravity.
#[must_use]
pub fn terminal_speed(mass_kg: f64, gravity_mps2: f64, constants: &PhysicalConstants) -> Option<f64> {
    let k = constants.air_density * constants.drag_coefficient * constants.cross_section_area();
    (k > 0.0).then(|| (2.0 * mass_kg * gravity_mps2 / k).sqrt())
}
