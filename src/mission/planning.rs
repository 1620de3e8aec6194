//! Leg planning: the maneuver behind a waypoint and the path previewed for it.
//!
//! Legs are planned from body positions at the moment the waypoint is
//! entered. They start at the previous waypoint's target (or the mission's
//! starting body) and end at this waypoint's target or explicit position.

use bevy::math::DVec3;
use thiserror::Error;

use super::{Mission, WaypointKind};
use crate::ephemeris::{OrbitalElements, SolarSystem, SystemError};
use crate::transfer::{
    self, GravityAssist, GravityAssistConfig, TransferError, TransferPlan,
};
use crate::trajectory::{self, FLYBY_BULGE, PreviewSettings, TrajectorySpec};
use crate::types::{BodyIndex, DEG_TO_RAD, GRAVITATIONAL_PARAMETER};

/// Eccentricity of the parking orbit drawn for orbit waypoints.
pub const ORBIT_PREVIEW_ECCENTRICITY: f64 = 0.01;

/// Tilt of the parking orbit drawn for orbit waypoints, in degrees.
pub const ORBIT_PREVIEW_TILT_DEG: f64 = 15.0;

/// Parking orbit radius in body radii when a waypoint sets none.
pub const DEFAULT_ORBIT_RADII: f64 = 3.0;

/// Tunables used while planning legs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LegSettings {
    pub assist: GravityAssistConfig,
    pub preview: PreviewSettings,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LegError {
    #[error("waypoint {0} does not exist")]
    NoWaypoint(usize),
    #[error("unknown body `{0}`")]
    UnknownBody(String),
    #[error(transparent)]
    System(#[from] SystemError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Maneuver planned for a waypoint.
#[derive(Debug, Clone, PartialEq)]
pub enum LegPlan {
    /// Orbit, flyby and landing waypoints carry no burn plan
    None,
    Transfer(TransferPlan),
    GravityAssist(GravityAssist),
}

impl LegPlan {
    /// Planned delta-v, when the maneuver has one.
    pub fn delta_v(&self) -> Option<f64> {
        match self {
            LegPlan::Transfer(plan) => Some(plan.total_delta_v),
            LegPlan::None | LegPlan::GravityAssist(_) => None,
        }
    }
}

/// The active waypoint's plan and preview path.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointLeg {
    pub index: usize,
    pub kind: WaypointKind,
    /// Simulation time the waypoint was entered
    pub entered_at: f64,
    pub plan: LegPlan,
    pub path: Vec<DVec3>,
}

impl WaypointLeg {
    /// Spacecraft marker position at waypoint progress `progress`.
    pub fn position_at(&self, progress: f64) -> Option<DVec3> {
        trajectory::point_along(&self.path, progress)
    }

    pub fn start(&self) -> Option<DVec3> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<DVec3> {
        self.path.last().copied()
    }
}

/// Plan waypoint `index` of `mission` as entered at `entered_at`.
pub fn plan_leg(
    mission: &Mission,
    index: usize,
    entered_at: f64,
    system: &SolarSystem,
    settings: &LegSettings,
) -> Result<WaypointLeg, LegError> {
    let waypoint = mission
        .waypoints
        .get(index)
        .ok_or(LegError::NoWaypoint(index))?;
    let positions = system.positions_at(entered_at)?;
    let locate = |id: &str| -> Result<(BodyIndex, DVec3), LegError> {
        let body = system
            .index_of(id)
            .ok_or_else(|| LegError::UnknownBody(id.to_string()))?;
        Ok((body, positions[body.get()]))
    };

    let origin_id = match index.checked_sub(1) {
        Some(previous) => &mission.waypoints[previous].target_body,
        None => &mission.starting_body,
    };
    let (_, origin) = locate(origin_id)?;
    let (target, target_position) = locate(&waypoint.target_body)?;
    let destination = waypoint.position.unwrap_or(target_position);
    let points = settings.preview.point_count;

    let (plan, path) = match waypoint.kind {
        WaypointKind::HohmannTransfer => {
            let r1 = origin.length();
            let r2 = destination.length();
            let plan = transfer::plan_hohmann(r1, r2, GRAVITATIONAL_PARAMETER)?;
            let arc = TrajectorySpec::TransferArc {
                center: DVec3::ZERO,
                origin_radius: r1,
                destination_radius: r2,
                departure_angle: plane_angle(origin),
                plane_tilt: 0.0,
            };
            (LegPlan::Transfer(plan), trajectory::sample(&arc, points))
        }
        WaypointKind::BiEllipticTransfer => {
            let r1 = origin.length();
            let r2 = destination.length();
            let r_b = waypoint
                .intermediate_radius
                .unwrap_or(2.0 * r1.max(r2));
            let plan = transfer::plan_bi_elliptic(r1, r2, r_b, GRAVITATIONAL_PARAMETER)?;
            let departure_angle = plane_angle(origin);
            let half = (points / 2).max(1);

            let mut path = trajectory::sample(
                &TrajectorySpec::TransferArc {
                    center: DVec3::ZERO,
                    origin_radius: r1,
                    destination_radius: r_b,
                    departure_angle,
                    plane_tilt: 0.0,
                },
                half,
            );
            let second = trajectory::sample(
                &TrajectorySpec::TransferArc {
                    center: DVec3::ZERO,
                    origin_radius: r_b,
                    destination_radius: r2,
                    departure_angle: departure_angle + std::f64::consts::PI,
                    plane_tilt: 0.0,
                },
                half,
            );
            // The second arc starts where the first one ends
            path.extend(second.into_iter().skip(1));
            (LegPlan::Transfer(plan), path)
        }
        WaypointKind::GravityAssist => {
            let def = system
                .definition(target)
                .ok_or_else(|| LegError::UnknownBody(waypoint.target_body.clone()))?;

            let direction = (target_position - origin)
                .try_normalize()
                .or_else(|| {
                    system.orbit_of(target).map(|(elements, _)| {
                        elements.velocity_direction(elements.mean_anomaly_at(entered_at))
                    })
                })
                .and_then(DVec3::try_normalize)
                .unwrap_or(DVec3::X);
            let speed = transfer::circular_speed(target_position.length(), GRAVITATIONAL_PARAMETER);
            let assist = transfer::plan_gravity_assist(
                direction * speed,
                def.gravitational_parameter,
                def.radius,
                &settings.assist,
            )?;

            let arc = TrajectorySpec::GravityAssistArc {
                body: target_position,
                radius: settings.assist.approach_factor * def.radius,
                entry_angle: (-direction.z).atan2(-direction.x),
            };
            (LegPlan::GravityAssist(assist), trajectory::sample(&arc, points))
        }
        WaypointKind::Orbit => {
            let radius = match waypoint.orbit_radius {
                Some(radius) => radius,
                None => system
                    .definition(target)
                    .map_or(1.0, |def| def.radius * DEFAULT_ORBIT_RADII),
            };
            let elements = OrbitalElements::circular(radius, 1.0)
                .with_eccentricity(ORBIT_PREVIEW_ECCENTRICITY)
                .with_tilt(ORBIT_PREVIEW_TILT_DEG * DEG_TO_RAD);
            let orbit = TrajectorySpec::ClosedOrbit {
                center: destination,
                elements,
            };
            (LegPlan::None, trajectory::sample(&orbit, points))
        }
        WaypointKind::Flyby => {
            let flyby = TrajectorySpec::Flyby {
                start: origin,
                end: destination,
                bulge: FLYBY_BULGE,
            };
            (LegPlan::None, trajectory::sample(&flyby, points))
        }
        WaypointKind::Landing => {
            let line = TrajectorySpec::Linear {
                start: origin,
                end: destination,
            };
            (LegPlan::None, trajectory::sample(&line, points))
        }
    };

    Ok(WaypointLeg {
        index,
        kind: waypoint.kind,
        entered_at,
        plan,
        path,
    })
}

/// Angle of `v` in the x/z plane, measured from +x toward +z.
fn plane_angle(v: DVec3) -> f64 {
    v.z.atan2(v.x)
}
