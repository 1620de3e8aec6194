//! Impulsive transfer estimates in the coplanar, circular limit.
//!
//! Hohmann and bi-elliptic transfers between circular orbit radii around a
//! central body of gravitational parameter μ, and a simplified gravity-assist
//! deflection. All values are in scene units.

use bevy::math::{DQuat, DVec3};
use bevy::prelude::*;
use std::f64::consts::PI;
use thiserror::Error;

use crate::types::UP;

/// Closest approach used for gravity assists, in body radii.
pub const DEFAULT_APPROACH_FACTOR: f64 = 1.5;

/// Speed multiplier applied after a gravity-assist deflection.
pub const DEFAULT_SPEED_BOOST: f64 = 1.1;

/// Rejected transfer inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("incoming velocity must be non-zero and finite")]
    InvalidIncomingVelocity,
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, TransferError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TransferError::NonPositive { name, value })
    }
}

/// Speed of a circular orbit of radius `r`.
pub fn circular_speed(r: f64, mu: f64) -> f64 {
    (mu / r).sqrt()
}

/// Period of an orbit with semi-major axis `a` (Kepler's third law).
pub fn orbital_period(a: f64, mu: f64) -> f64 {
    2.0 * PI * (a.powi(3) / mu).sqrt()
}

/// Vis-viva speed at radius `r` on an orbit of semi-major axis `a`.
fn vis_viva(r: f64, a: f64, mu: f64) -> f64 {
    (mu * (2.0 / r - 1.0 / a)).max(0.0).sqrt()
}

/// Second ellipse of a bi-elliptic transfer and the burn that enters it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateLeg {
    /// Radius where the intermediate burn happens
    pub radius: f64,
    pub delta_v: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Half-period of the second ellipse
    pub duration: f64,
}

/// Delta-v and timing budget for moving between two circular orbits.
///
/// For a bi-elliptic plan `semi_major_axis`/`eccentricity` describe the first
/// ellipse, `delta_v2` is the arrival burn and `transfer_duration` covers
/// both legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferPlan {
    pub origin_radius: f64,
    pub destination_radius: f64,
    pub semi_major_axis: f64,
    pub delta_v1: f64,
    pub delta_v2: f64,
    pub total_delta_v: f64,
    pub transfer_duration: f64,
    pub eccentricity: f64,
    pub intermediate: Option<IntermediateLeg>,
}

impl TransferPlan {
    /// Duration of the first ellipse alone.
    pub fn first_leg_duration(&self) -> f64 {
        self.transfer_duration - self.intermediate.map_or(0.0, |leg| leg.duration)
    }

    pub fn is_bi_elliptic(&self) -> bool {
        self.intermediate.is_some()
    }
}

/// Plan a Hohmann transfer from radius `r1` to `r2`.
///
/// Equal radii give zero delta-v; the duration is still the half-period of
/// the (circular) transfer orbit.
pub fn plan_hohmann(r1: f64, r2: f64, mu: f64) -> Result<TransferPlan, TransferError> {
    let r1 = require_positive("origin radius", r1)?;
    let r2 = require_positive("destination radius", r2)?;
    let mu = require_positive("gravitational parameter", mu)?;

    let a = 0.5 * (r1 + r2);
    let v1 = circular_speed(r1, mu);
    let v2 = circular_speed(r2, mu);
    let vt1 = vis_viva(r1, a, mu);
    let vt2 = vis_viva(r2, a, mu);

    let (delta_v1, delta_v2) = if r1 == r2 {
        (0.0, 0.0)
    } else {
        ((vt1 - v1).abs(), (v2 - vt2).abs())
    };

    Ok(TransferPlan {
        origin_radius: r1,
        destination_radius: r2,
        semi_major_axis: a,
        delta_v1,
        delta_v2,
        total_delta_v: delta_v1 + delta_v2,
        transfer_duration: PI * (a.powi(3) / mu).sqrt(),
        eccentricity: (r2 - r1).abs() / (r2 + r1),
        intermediate: None,
    })
}

/// Plan a bi-elliptic transfer from `r1` to `r2` through `r_b`.
///
/// Does not check that `r_b` is a sensible choice; sweep it to compare
/// against [`plan_hohmann`].
pub fn plan_bi_elliptic(
    r1: f64,
    r2: f64,
    r_b: f64,
    mu: f64,
) -> Result<TransferPlan, TransferError> {
    let r1 = require_positive("origin radius", r1)?;
    let r2 = require_positive("destination radius", r2)?;
    let r_b = require_positive("intermediate radius", r_b)?;
    let mu = require_positive("gravitational parameter", mu)?;

    // First ellipse: r1 -> r_b
    let a1 = 0.5 * (r1 + r_b);
    let delta_v1 = (vis_viva(r1, a1, mu) - circular_speed(r1, mu)).abs();
    let arrive_b = vis_viva(r_b, a1, mu);

    // Second ellipse: r_b -> r2
    let a2 = 0.5 * (r_b + r2);
    let depart_b = vis_viva(r_b, a2, mu);
    let delta_v_b = (depart_b - arrive_b).abs();
    let delta_v2 = (circular_speed(r2, mu) - vis_viva(r2, a2, mu)).abs();

    let t1 = PI * (a1.powi(3) / mu).sqrt();
    let t2 = PI * (a2.powi(3) / mu).sqrt();

    Ok(TransferPlan {
        origin_radius: r1,
        destination_radius: r2,
        semi_major_axis: a1,
        delta_v1,
        delta_v2,
        total_delta_v: delta_v1 + delta_v_b + delta_v2,
        transfer_duration: t1 + t2,
        eccentricity: (r_b - r1).abs() / (r_b + r1),
        intermediate: Some(IntermediateLeg {
            radius: r_b,
            delta_v: delta_v_b,
            semi_major_axis: a2,
            eccentricity: (r_b - r2).abs() / (r_b + r2),
            duration: t2,
        }),
    })
}

/// Tunables for the gravity-assist approximation.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GravityAssistConfig {
    /// Closest approach in body radii
    pub approach_factor: f64,
    /// Multiplier applied to the deflected speed
    pub speed_boost: f64,
}

impl Default for GravityAssistConfig {
    fn default() -> Self {
        Self {
            approach_factor: DEFAULT_APPROACH_FACTOR,
            speed_boost: DEFAULT_SPEED_BOOST,
        }
    }
}

/// Result of a gravity-assist deflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityAssist {
    pub outgoing_velocity: DVec3,
    /// Turn angle in radians
    pub deflection_angle: f64,
    pub rotation_axis: DVec3,
}

impl GravityAssist {
    pub fn speed_gain(&self, incoming: DVec3) -> f64 {
        self.outgoing_velocity.length() - incoming.length()
    }
}

/// Approximate gravity assist.
///
/// Turns `incoming` by `atan(μ / (k·R·|v|²))` about `UP × incoming` and
/// scales the result by the configured boost. This is not a patched-conic
/// flyby; the boost stands in for the body's own orbital motion.
pub fn plan_gravity_assist(
    incoming: DVec3,
    body_mu: f64,
    body_radius: f64,
    config: &GravityAssistConfig,
) -> Result<GravityAssist, TransferError> {
    let body_mu = require_positive("body gravitational parameter", body_mu)?;
    let body_radius = require_positive("body radius", body_radius)?;
    let approach = require_positive("approach factor", config.approach_factor)?;
    let boost = require_positive("speed boost", config.speed_boost)?;

    let speed_sq = incoming.length_squared();
    if !(incoming.is_finite() && speed_sq > 0.0) {
        return Err(TransferError::InvalidIncomingVelocity);
    }

    let deflection_angle = (body_mu / (approach * body_radius * speed_sq)).atan();

    // Incoming parallel to UP has no defined turn plane; fall back to X.
    let rotation_axis = UP
        .cross(incoming)
        .try_normalize()
        .or_else(|| DVec3::X.cross(incoming).try_normalize())
        .unwrap_or(DVec3::Z);

    let outgoing_velocity =
        DQuat::from_axis_angle(rotation_axis, deflection_angle) * incoming * boost;

    Ok(GravityAssist {
        outgoing_velocity,
        deflection_angle,
        rotation_axis,
    })
}
