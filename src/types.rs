//! Core types and constants shared by the simulation.
//!
//! All distances are in scene units and all times in simulation-time units
//! (one unit per real second at time scale 1.0).

use bevy::math::DVec3;
use bevy::prelude::*;

/// System sets for the per-tick pipeline.
///
/// Configured as a chain: intents are applied first, then the clock
/// advances, then every body is resolved, then the mission sequencer runs.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pause/scale/mission requests from the presentation layer
    Requests,
    /// Clock advance
    Clock,
    /// Dependency-ordered body resolution
    Bodies,
    /// Mission sequencing
    Mission,
}

/// Order the simulation sets in `Update`. Safe to call from every plugin.
pub fn configure_simulation_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            SimulationSet::Requests,
            SimulationSet::Clock,
            SimulationSet::Bodies,
            SimulationSet::Mission,
        )
            .chain(),
    );
}

/// Gravitational parameter of the central body in scene units.
pub const GRAVITATIONAL_PARAMETER: f64 = 100_000.0;

/// Degrees to radians conversion factor
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees conversion factor
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// "Up" axis of the scene. Orbits lie in the x/z plane before tilt.
pub const UP: DVec3 = DVec3::Y;

/// Dense handle into the body arena of a [`SolarSystem`](crate::ephemeris::SolarSystem).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyIndex(pub u32);

impl BodyIndex {
    /// Position of this body in the arena.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Per-tick state of a body.
///
/// Owned by the simulation core. Consumers read copies.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyState {
    /// Stable string id from configuration
    pub id: String,
    /// World position in scene units
    pub position: DVec3,
    /// Spin angle about the body's own axis, radians in [0, 2π)
    pub rotation_angle: Option<f64>,
}

impl BodyState {
    pub fn new(id: impl Into<String>, position: DVec3) -> Self {
        Self {
            id: id.into(),
            position,
            rotation_angle: None,
        }
    }

    /// Distance from the scene origin.
    pub fn distance_from_origin(&self) -> f64 {
        self.position.length()
    }
}

/// Non-fatal failure surfaced to the presentation layer.
///
/// Emitted for rejected runtime requests and failed resolution passes.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct TickFault {
    pub reason: String,
}

impl TickFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Wrap an angle into [0, 2π).
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(std::f64::consts::TAU);
    // rem_euclid can return TAU itself for tiny negative inputs
    if wrapped >= std::f64::consts::TAU {
        0.0
    } else {
        wrapped
    }
}
