//! Kepler orbit solver using Newton's method for the Kepler equation.
//!
//! Orbits lie in the x/z plane of the scene with the focus at the orbit
//! center, then the plane is tilted about the x axis.

use bevy::math::DVec3;
use bevy::prelude::*;
use std::f64::consts::TAU;
use thiserror::Error;

use crate::types::wrap_angle;

/// Iteration cap for the Newton solve before falling back to bisection.
pub const MAX_NEWTON_ITERATIONS: usize = 50;

/// Successive-iterate tolerance for the Newton solve (radians).
pub const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Residual above which a solution is reported as not converged.
const RESIDUAL_LIMIT: f64 = 1e-6;

/// Invalid orbital elements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementsError {
    #[error("semi-major axis must be positive and finite, got {0}")]
    SemiMajorAxis(f64),
    #[error("eccentricity must be in [0, 1), got {0}")]
    Eccentricity(f64),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Orbital elements of a body. Immutable once loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitalElements {
    /// Semi-major axis in scene units
    pub semi_major_axis: f64,
    /// Eccentricity (dimensionless, 0 ≤ e < 1)
    pub eccentricity: f64,
    /// Rotation of the orbital plane about the x axis, radians
    pub plane_tilt: f64,
    /// Mean anomaly advance in radians per simulation-time unit
    pub period_scale: f64,
    /// Mean anomaly at elapsed = 0, radians
    pub mean_anomaly_at_epoch: f64,
}

impl OrbitalElements {
    /// Validated elements with no tilt and zero epoch phase.
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        period_scale: f64,
    ) -> Result<Self, ElementsError> {
        let elements = Self {
            semi_major_axis,
            eccentricity,
            plane_tilt: 0.0,
            period_scale,
            mean_anomaly_at_epoch: 0.0,
        };
        elements.validate()?;
        Ok(elements)
    }

    /// Circular orbit. Unvalidated; used for built-in tables and previews.
    pub const fn circular(radius: f64, period_scale: f64) -> Self {
        Self {
            semi_major_axis: radius,
            eccentricity: 0.0,
            plane_tilt: 0.0,
            period_scale,
            mean_anomaly_at_epoch: 0.0,
        }
    }

    pub const fn with_eccentricity(mut self, eccentricity: f64) -> Self {
        self.eccentricity = eccentricity;
        self
    }

    pub const fn with_tilt(mut self, plane_tilt: f64) -> Self {
        self.plane_tilt = plane_tilt;
        self
    }

    pub const fn with_epoch_anomaly(mut self, mean_anomaly: f64) -> Self {
        self.mean_anomaly_at_epoch = mean_anomaly;
        self
    }

    pub fn validate(&self) -> Result<(), ElementsError> {
        if !(self.semi_major_axis.is_finite() && self.semi_major_axis > 0.0) {
            return Err(ElementsError::SemiMajorAxis(self.semi_major_axis));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(ElementsError::Eccentricity(self.eccentricity));
        }
        for (field, value) in [
            ("plane_tilt", self.plane_tilt),
            ("period_scale", self.period_scale),
            ("mean_anomaly_at_epoch", self.mean_anomaly_at_epoch),
        ] {
            if !value.is_finite() {
                return Err(ElementsError::NonFinite { field, value });
            }
        }
        Ok(())
    }

    /// Mean anomaly at the given elapsed time, wrapped into [0, 2π).
    pub fn mean_anomaly_at(&self, elapsed: f64) -> f64 {
        wrap_angle(self.mean_anomaly_at_epoch + elapsed * self.period_scale)
    }

    /// Position at the given elapsed time around `center`.
    pub fn position_at(&self, center: DVec3, elapsed: f64) -> DVec3 {
        center + self.local_position(self.mean_anomaly_at(elapsed))
    }

    /// Position relative to the focus for a mean anomaly.
    pub fn local_position(&self, mean_anomaly: f64) -> DVec3 {
        position_on_orbit(
            DVec3::ZERO,
            self.semi_major_axis,
            self.eccentricity,
            self.plane_tilt,
            mean_anomaly,
        )
    }

    /// Unit direction of motion at a mean anomaly.
    pub fn velocity_direction(&self, mean_anomaly: f64) -> DVec3 {
        let e = self.eccentricity;
        let solution = solve_kepler(mean_anomaly, e);
        let f = true_anomaly(solution.eccentric_anomaly, e);
        let (sin_f, cos_f) = f.sin_cos();
        let r = focal_radius(self.semi_major_axis, e, f);

        // d/df of (r cos f, r sin f)
        let dr = r * e * sin_f / (1.0 + e * cos_f);
        let tangent = DVec3::new(dr * cos_f - r * sin_f, 0.0, dr * sin_f + r * cos_f);
        tilt_about_x(tangent, self.plane_tilt).normalize_or_zero()
    }

    /// Time for one revolution, infinite for a stationary orbit.
    pub fn period(&self) -> f64 {
        if self.period_scale == 0.0 {
            f64::INFINITY
        } else {
            TAU / self.period_scale.abs()
        }
    }

    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }
}

/// Result of solving Kepler's equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly E in radians
    pub eccentric_anomaly: f64,
    /// Newton iterations used (bisection steps not counted)
    pub iterations: usize,
    /// Whether the residual is within tolerance
    pub converged: bool,
}

/// Solve Kepler's equation M = E - e*sin(E) for eccentric anomaly E.
///
/// Newton's method from E₀ = M. If Newton does not settle within
/// [`MAX_NEWTON_ITERATIONS`] the root is refined by bisection on [0, 2π],
/// where the equation is monotonic for e < 1. The result is always finite.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let m = if mean_anomaly.is_finite() {
        wrap_angle(mean_anomaly)
    } else {
        0.0
    };
    let e = eccentricity;

    if e == 0.0 {
        return KeplerSolution {
            eccentric_anomaly: m,
            iterations: 0,
            converged: true,
        };
    }

    let mut e_anomaly = m;
    for iteration in 1..=MAX_NEWTON_ITERATIONS {
        let (sin_e, cos_e) = e_anomaly.sin_cos();
        let f = e_anomaly - e * sin_e - m;
        let f_prime = 1.0 - e * cos_e;

        let next = e_anomaly - f / f_prime;
        if !next.is_finite() {
            break;
        }

        let delta = (next - e_anomaly).abs();
        e_anomaly = next;
        if delta < CONVERGENCE_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: e_anomaly,
                iterations: iteration,
                converged: true,
            };
        }
    }

    let refined = bisect(m, e);
    let residual = (refined - e * refined.sin() - m).abs();
    if residual <= RESIDUAL_LIMIT {
        return KeplerSolution {
            eccentric_anomaly: refined,
            iterations: MAX_NEWTON_ITERATIONS,
            converged: true,
        };
    }

    warn_once!(
        "Kepler solve did not converge (M={m}, e={e}); residual {residual:.3e}, using last iterate"
    );
    KeplerSolution {
        eccentric_anomaly: if e_anomaly.is_finite() { e_anomaly } else { m },
        iterations: MAX_NEWTON_ITERATIONS,
        converged: false,
    }
}

fn bisect(m: f64, e: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = TAU;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid - e * mid.sin() - m > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
        if hi - lo < CONVERGENCE_TOLERANCE {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// True anomaly f from eccentric anomaly E.
///
/// Uses atan2 of the cos/sin forms for full quadrant coverage.
pub fn true_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let e = eccentricity;
    let (sin_e, cos_e) = eccentric_anomaly.sin_cos();
    let denom = 1.0 - e * cos_e;
    let cos_f = (cos_e - e) / denom;
    let sin_f = (1.0 - e * e).sqrt() * sin_e / denom;
    sin_f.atan2(cos_f)
}

/// Distance from the focus at true anomaly f.
#[inline]
pub fn focal_radius(semi_major_axis: f64, eccentricity: f64, true_anomaly: f64) -> f64 {
    semi_major_axis * (1.0 - eccentricity * eccentricity)
        / (1.0 + eccentricity * true_anomaly.cos())
}

/// Rotate a vector about the x axis.
#[inline]
pub fn tilt_about_x(v: DVec3, tilt: f64) -> DVec3 {
    if tilt == 0.0 {
        return v;
    }
    let (sin_t, cos_t) = tilt.sin_cos();
    DVec3::new(v.x, v.y * cos_t - v.z * sin_t, v.y * sin_t + v.z * cos_t)
}

/// Position of a body on an ellipse around `center` at mean anomaly M.
pub fn position_on_orbit(
    center: DVec3,
    semi_major_axis: f64,
    eccentricity: f64,
    plane_tilt: f64,
    mean_anomaly: f64,
) -> DVec3 {
    let solution = solve_kepler(mean_anomaly, eccentricity);
    let f = true_anomaly(solution.eccentric_anomaly, eccentricity);
    let r = focal_radius(semi_major_axis, eccentricity, f);

    let in_plane = DVec3::new(r * f.cos(), 0.0, r * f.sin());
    center + tilt_about_x(in_plane, plane_tilt)
}
