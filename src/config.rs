//! TOML configuration for body tables and missions.
//!
//! The built-in catalogs cover the default scene; these loaders let a host
//! swap in its own tables. Everything is validated on load.
//!
//! ```toml
//! [[body]]
//! id = "earth"
//! name = "Earth"
//! kind = "planet"
//! radius = 4.0
//! gravitational_parameter = 0.3
//! rotation_rate = 0.001
//!
//! [body.orbit]
//! semi_major_axis = 70.0
//! eccentricity = 0.0167
//! period_scale = 0.0003
//! center = "origin"
//! ```

use std::path::Path;

use bevy::math::DVec3;
use serde::Deserialize;
use thiserror::Error;

use crate::ephemeris::data::{DerivedPointDefinition, OrbitDefinition};
use crate::ephemeris::{
    BodyDefinition, BodyKind, CenterRef, OrbitalElements, SolarSystem, SystemCatalog, SystemError,
};
use crate::mission::{
    Difficulty, Mission, MissionCatalog, MissionError, MissionWaypoint, WaypointKind,
};
use crate::types::DEG_TO_RAD;

/// Center id meaning the coordinate origin.
pub const ORIGIN_CENTER: &str = "origin";

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid system: {0}")]
    System(#[from] SystemError),
    #[error("invalid mission: {0}")]
    Mission(#[from] MissionError),
}

/// Top level of a system file.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    #[serde(default, rename = "body")]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub derived: Vec<DerivedPointConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BodyConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: BodyKind,
    pub radius: f64,
    #[serde(default)]
    pub gravitational_parameter: f64,
    #[serde(default)]
    pub rotation_rate: Option<f64>,
    #[serde(default)]
    pub orbit: Option<OrbitConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrbitConfig {
    pub semi_major_axis: f64,
    #[serde(default)]
    pub eccentricity: f64,
    /// Degrees
    #[serde(default)]
    pub plane_tilt_deg: f64,
    pub period_scale: f64,
    #[serde(default)]
    pub mean_anomaly_at_epoch: f64,
    /// `"origin"`, a body id or a derived point id
    #[serde(default = "default_center")]
    pub center: String,
}

fn default_center() -> String {
    ORIGIN_CENTER.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DerivedPointConfig {
    pub id: String,
    /// Omitted means the origin
    #[serde(default)]
    pub primary: Option<String>,
    pub anchor: String,
    pub distance: f64,
}

impl SystemConfig {
    /// Convert to a catalog, classifying each orbit center by id.
    pub fn into_catalog(self) -> SystemCatalog {
        let derived_ids: Vec<&str> = self.derived.iter().map(|d| d.id.as_str()).collect();
        let center_ref = |center: &str| {
            if center == ORIGIN_CENTER {
                CenterRef::Origin
            } else if derived_ids.contains(&center) {
                CenterRef::Derived(center.to_string())
            } else {
                CenterRef::Body(center.to_string())
            }
        };

        let bodies = self
            .bodies
            .iter()
            .map(|body| BodyDefinition {
                id: body.id.clone(),
                name: body.name.clone().unwrap_or_else(|| body.id.clone()),
                kind: body.kind,
                radius: body.radius,
                gravitational_parameter: body.gravitational_parameter,
                rotation_rate: body.rotation_rate,
                orbit: body.orbit.as_ref().map(|orbit| OrbitDefinition {
                    elements: OrbitalElements {
                        semi_major_axis: orbit.semi_major_axis,
                        eccentricity: orbit.eccentricity,
                        plane_tilt: orbit.plane_tilt_deg * DEG_TO_RAD,
                        period_scale: orbit.period_scale,
                        mean_anomaly_at_epoch: orbit.mean_anomaly_at_epoch,
                    },
                    center: center_ref(&orbit.center),
                }),
            })
            .collect();

        let derived = self
            .derived
            .iter()
            .map(|point| DerivedPointDefinition {
                id: point.id.clone(),
                primary: point.primary.clone().filter(|p| p != ORIGIN_CENTER),
                anchor: point.anchor.clone(),
                distance: point.distance,
            })
            .collect();

        SystemCatalog { bodies, derived }
    }
}

/// Top level of a mission file.
#[derive(Debug, Deserialize, Clone)]
pub struct MissionsConfig {
    #[serde(default, rename = "mission")]
    pub missions: Vec<MissionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MissionConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub spacecraft: String,
    pub difficulty: Difficulty,
    pub starting_body: String,
    #[serde(default, rename = "waypoint")]
    pub waypoints: Vec<WaypointConfig>,
    /// Defaults to the sum of waypoint budgets
    #[serde(default)]
    pub total_delta_v: Option<f64>,
    /// Defaults to the sum of waypoint durations
    #[serde(default)]
    pub total_duration: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WaypointConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: WaypointKind,
    pub target_body: String,
    pub duration: f64,
    #[serde(default)]
    pub orbit_radius: Option<f64>,
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    #[serde(default)]
    pub delta_v_budget: Option<f64>,
    #[serde(default)]
    pub intermediate_radius: Option<f64>,
}

impl MissionConfig {
    pub fn into_mission(self) -> Mission {
        let waypoints: Vec<MissionWaypoint> = self
            .waypoints
            .into_iter()
            .map(|w| MissionWaypoint {
                name: w.name,
                description: w.description,
                kind: w.kind,
                target_body: w.target_body,
                duration: w.duration,
                orbit_radius: w.orbit_radius,
                position: w.position.map(DVec3::from_array),
                delta_v_budget: w.delta_v_budget,
                intermediate_radius: w.intermediate_radius,
                completed: false,
            })
            .collect();

        let mut mission = Mission {
            id: self.id,
            name: self.name,
            description: self.description,
            spacecraft: self.spacecraft,
            difficulty: self.difficulty,
            starting_body: self.starting_body,
            waypoints,
            total_delta_v: 0.0,
            total_duration: 0.0,
        };
        mission.total_delta_v = self
            .total_delta_v
            .unwrap_or_else(|| mission.planned_delta_v());
        mission.total_duration = self
            .total_duration
            .unwrap_or_else(|| mission.planned_duration());
        mission
    }
}

/// Parse and validate a system from TOML text.
pub fn load_system_str(contents: &str) -> Result<SolarSystem, ConfigError> {
    let config: SystemConfig = toml::from_str(contents)?;
    Ok(SolarSystem::from_catalog(config.into_catalog())?)
}

/// Load and validate a system file.
pub fn load_system<P: AsRef<Path>>(path: P) -> Result<SolarSystem, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_system_str(&contents)
}

/// Parse missions from TOML text and validate them against `system`.
pub fn load_missions_str(
    contents: &str,
    system: &SolarSystem,
) -> Result<MissionCatalog, ConfigError> {
    let config: MissionsConfig = toml::from_str(contents)?;
    let missions = config
        .missions
        .into_iter()
        .map(MissionConfig::into_mission)
        .collect();
    Ok(MissionCatalog::new(missions, system)?)
}

/// Load a mission file and validate it against `system`.
pub fn load_missions<P: AsRef<Path>>(
    path: P,
    system: &SolarSystem,
) -> Result<MissionCatalog, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_missions_str(&contents, system)
}
