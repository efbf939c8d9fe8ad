//! Rail geometry resolution.
//!
//! The rail pivots about a fixed end anchor: changing the incline angle or
//! the rail length moves the start point while the end point stays put.
//!
//! ```text
//!   start ●
//!         |\
//!  height | \  rail_length
//!         |  \
//!         +---● end (fixed anchor)
//!     horizontal_run
//! ```

use serde::{Deserialize, Serialize};

/// Default world-space anchor of the rail's lower end.
pub const DEFAULT_ANCHOR: Vec3 = Vec3::new(5.0, 0.0, 0.0);

/// 3D vector for rail poses and the sphere position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (horizontal, downhill direction).
    pub x: f64,
    /// Y component (vertical, up).
    pub y: f64,
    /// Z component (depth).
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit vector.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            Self::zero()
        } else {
            self.scale(1.0 / mag)
        }
    }

    /// Scale by scalar.
    #[must_use]
    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

/// Resolved rail pose for a given angle and length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RailGeometry {
    /// Upper end of the rail, where the sphere starts.
    pub start: Vec3,
    /// Lower end of the rail (the fixed anchor).
    pub end: Vec3,
    /// Incline angle in radians.
    pub angle_rad: f64,
    /// Rail length in meters.
    pub length_m: f64,
}

impl RailGeometry {
    /// Vertical rise of the rail.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.length_m * self.angle_rad.sin()
    }

    /// Unit vector pointing down the rail, from start to end.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize()
    }

    /// World position of a point `displacement_m` along the rail.
    ///
    /// The displacement is clamped to the rail so a renderer never draws the
    /// sphere past either end.
    #[must_use]
    pub fn point_at(&self, displacement_m: f64) -> Vec3 {
        let s = displacement_m.clamp(0.0, self.length_m);
        self.start + self.direction() * s
    }

    /// Whether the rail is a vertical drop.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        (self.angle_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12
    }
}

/// Snapshot for the presentation layer: rail ends plus sphere position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RailPose {
    /// Upper end of the rail.
    pub rail_start: Vec3,
    /// Lower (fixed) end of the rail.
    pub rail_end: Vec3,
    /// Sphere center projected onto the rail.
    pub ball_position: Vec3,
}

/// Resolve the rail's start point from the incline angle and rail length.
///
/// Pure function of its inputs; the end point is the fixed anchor.
#[must_use]
pub fn resolve(angle_deg: f64, rail_length_m: f64, fixed_end_point: Vec3) -> RailGeometry {
    let angle_rad = angle_deg.to_radians();
    let height = rail_length_m * angle_rad.sin();
    let horizontal_run = rail_length_m * angle_rad.cos();

    let start = fixed_end_point - Vec3::new(horizontal_run, 0.0, 0.0) + Vec3::new(0.0, height, 0.0);

    RailGeometry {
        start,
        end: fixed_end_point,
        angle_rad,
        length_m: rail_length_m,
    }
}
