//! Path preview sampling.
//!
//! Turns orbits, transfer arcs and waypoint paths into polylines. Sampling is
//! pure: the same path and point count always give the same points.

use bevy::math::DVec3;
use bevy::prelude::*;
use std::f64::consts::{PI, TAU};

use crate::ephemeris::kepler::{self, OrbitalElements};

/// Out-of-plane bulge of a flyby path as a fraction of its length.
pub const FLYBY_BULGE: f64 = 0.1;

/// Vertical lift of a gravity-assist arc relative to its radius.
pub const ASSIST_ARC_LIFT: f64 = 0.2;

/// Default number of segments in a preview path.
pub const DEFAULT_PREVIEW_POINTS: usize = 128;

/// Preview tunables.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSettings {
    /// Segments per sampled path
    pub point_count: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            point_count: DEFAULT_PREVIEW_POINTS,
        }
    }
}

/// Something that can be drawn as a path.
#[derive(Clone, Debug, PartialEq)]
pub enum TrajectorySpec {
    /// Full ellipse around a fixed center, sampled by mean anomaly.
    ClosedOrbit {
        center: DVec3,
        elements: OrbitalElements,
    },
    /// Half of a transfer ellipse from `origin_radius` to `destination_radius`,
    /// starting at `departure_angle` (measured from +x toward +z).
    TransferArc {
        center: DVec3,
        origin_radius: f64,
        destination_radius: f64,
        departure_angle: f64,
        plane_tilt: f64,
    },
    /// Straight run from `start` to `end` with a sine bulge along +y.
    Flyby {
        start: DVec3,
        end: DVec3,
        bulge: f64,
    },
    /// Half circle around a body at the closest-approach radius.
    GravityAssistArc {
        body: DVec3,
        radius: f64,
        entry_angle: f64,
    },
    /// Straight line to an explicit position.
    Linear { start: DVec3, end: DVec3 },
}

impl TrajectorySpec {
    /// Whether the first and last samples coincide.
    pub fn is_closed(&self) -> bool {
        matches!(self, TrajectorySpec::ClosedOrbit { .. })
    }

    /// Point at fraction `s` in [0, 1] of the path.
    pub fn point_at(&self, s: f64) -> DVec3 {
        match *self {
            TrajectorySpec::ClosedOrbit { center, elements } => {
                center + elements.local_position(TAU * s)
            }
            TrajectorySpec::TransferArc {
                center,
                origin_radius,
                destination_radius,
                departure_angle,
                plane_tilt,
            } => transfer_arc_point(
                center,
                origin_radius,
                destination_radius,
                departure_angle,
                plane_tilt,
                s,
            ),
            TrajectorySpec::Flyby { start, end, bulge } => {
                let lift = (s * PI).sin() * start.distance(end) * bulge;
                start.lerp(end, s) + DVec3::Y * lift
            }
            TrajectorySpec::GravityAssistArc {
                body,
                radius,
                entry_angle,
            } => {
                let angle = entry_angle + s * PI;
                let (sin_a, cos_a) = angle.sin_cos();
                body + DVec3::new(radius * cos_a, radius * sin_a * ASSIST_ARC_LIFT, radius * sin_a)
            }
            TrajectorySpec::Linear { start, end } => start.lerp(end, s),
        }
    }
}

/// Sample a path into `point_count + 1` points.
///
/// Closed orbits use mean anomaly `2π·i/N`, so the last point repeats the
/// first. Open paths use progress `i/N`. A count of zero is treated as one.
pub fn sample(spec: &TrajectorySpec, point_count: usize) -> Vec<DVec3> {
    let n = point_count.max(1);
    (0..=n)
        .map(|i| spec.point_at(i as f64 / n as f64))
        .collect()
}

fn rotate_in_plane(v: DVec3, angle: f64) -> DVec3 {
    let (sin_a, cos_a) = angle.sin_cos();
    DVec3::new(v.x * cos_a - v.z * sin_a, v.y, v.x * sin_a + v.z * cos_a)
}

fn transfer_arc_point(
    center: DVec3,
    r1: f64,
    r2: f64,
    departure_angle: f64,
    plane_tilt: f64,
    s: f64,
) -> DVec3 {
    let a = 0.5 * (r1 + r2);
    let e = if r1 + r2 > 0.0 {
        (r2 - r1).abs() / (r1 + r2)
    } else {
        0.0
    };

    // Outbound arcs start at periapsis, inbound arcs at apoapsis.
    let (mean_anomaly, periapsis_angle) = if r2 >= r1 {
        (PI * s, departure_angle)
    } else {
        (PI + PI * s, departure_angle + PI)
    };

    let local = kepler::position_on_orbit(DVec3::ZERO, a, e, 0.0, mean_anomaly);
    center + kepler::tilt_about_x(rotate_in_plane(local, periapsis_angle), plane_tilt)
}

/// Position at fraction `progress` along a polyline, interpolating linearly
/// between neighbouring points.
pub fn point_along(points: &[DVec3], progress: f64) -> Option<DVec3> {
    let (index, remainder) = locate(points, progress)?;
    if index + 1 >= points.len() {
        return points.last().copied();
    }
    Some(points[index].lerp(points[index + 1], remainder))
}

/// Unit direction of travel at fraction `progress` along a polyline.
pub fn direction_along(points: &[DVec3], progress: f64) -> Option<DVec3> {
    let (index, _) = locate(points, progress)?;
    let index = index.min(points.len().saturating_sub(2));
    let next = points.get(index + 1)?;
    (*next - points[index]).try_normalize()
}

fn locate(points: &[DVec3], progress: f64) -> Option<(usize, f64)> {
    if points.is_empty() {
        return None;
    }
    let progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = progress * (points.len() - 1) as f64;
    let index = scaled.floor() as usize;
    Some((index, scaled - index as f64))
}
