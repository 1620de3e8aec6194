//! Missions: ordered waypoints flown against the simulation clock.
//!
//! A [`MissionCatalog`] holds the selectable missions. Selecting one loads it
//! into the [`MissionSequencer`], which steps through the waypoints as
//! simulation time passes and reports focus changes and completions.

pub mod planning;
pub mod presets;
pub mod sequencer;

pub use planning::{LegError, LegPlan, LegSettings, WaypointLeg};
pub use presets::{MISSIONS, builtin_missions};
pub use sequencer::{MissionSequencer, MissionStatus};

use bevy::math::DVec3;
use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::ephemeris::{FocusTarget, SolarSystem};
use crate::time::SimulationClock;
use crate::trajectory::PreviewSettings;
use crate::transfer::GravityAssistConfig;
use crate::types::{SimulationSet, TickFault, configure_simulation_sets};

/// What happens at a waypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaypointKind {
    Orbit,
    Flyby,
    Landing,
    GravityAssist,
    HohmannTransfer,
    BiEllipticTransfer,
}

impl WaypointKind {
    pub fn label(&self) -> &'static str {
        match self {
            WaypointKind::Orbit => "orbit",
            WaypointKind::Flyby => "flyby",
            WaypointKind::Landing => "landing",
            WaypointKind::GravityAssist => "gravity assist",
            WaypointKind::HohmannTransfer => "Hohmann transfer",
            WaypointKind::BiEllipticTransfer => "bi-elliptic transfer",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One step of a mission.
#[derive(Clone, Debug, PartialEq)]
pub struct MissionWaypoint {
    pub name: String,
    pub description: String,
    pub kind: WaypointKind,
    pub target_body: String,
    /// Simulation time spent on this waypoint
    pub duration: f64,
    pub orbit_radius: Option<f64>,
    /// Explicit destination overriding the target body's position
    pub position: Option<DVec3>,
    pub delta_v_budget: Option<f64>,
    /// Apoapsis of the first ellipse for bi-elliptic transfers
    pub intermediate_radius: Option<f64>,
    /// Set once the waypoint's progress reaches 1.0
    pub completed: bool,
}

/// A selectable mission.
#[derive(Clone, Debug, PartialEq)]
pub struct Mission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub spacecraft: String,
    pub difficulty: Difficulty,
    pub starting_body: String,
    pub waypoints: Vec<MissionWaypoint>,
    /// Delta-v budget for the whole mission
    pub total_delta_v: f64,
    /// Estimated duration
    pub total_duration: f64,
}

impl Mission {
    /// Sum of waypoint durations.
    pub fn planned_duration(&self) -> f64 {
        self.waypoints.iter().map(|w| w.duration).sum()
    }

    /// Sum of the waypoint delta-v budgets that are set.
    pub fn planned_delta_v(&self) -> f64 {
        self.waypoints.iter().filter_map(|w| w.delta_v_budget).sum()
    }

    /// Check the mission against a loaded system.
    pub fn validate(&self, system: &SolarSystem) -> Result<(), MissionError> {
        if self.waypoints.is_empty() {
            return Err(MissionError::NoWaypoints(self.id.clone()));
        }
        if system.index_of(&self.starting_body).is_none() {
            return Err(MissionError::UnknownBody {
                mission: self.id.clone(),
                body: self.starting_body.clone(),
            });
        }
        for (index, waypoint) in self.waypoints.iter().enumerate() {
            if !(waypoint.duration.is_finite() && waypoint.duration > 0.0) {
                return Err(MissionError::InvalidDuration {
                    mission: self.id.clone(),
                    index,
                    duration: waypoint.duration,
                });
            }
            if system.index_of(&waypoint.target_body).is_none() {
                return Err(MissionError::UnknownBody {
                    mission: self.id.clone(),
                    body: waypoint.target_body.clone(),
                });
            }
            for (field, value) in [
                ("orbit_radius", waypoint.orbit_radius),
                ("delta_v_budget", waypoint.delta_v_budget),
                ("intermediate_radius", waypoint.intermediate_radius),
            ] {
                if let Some(value) = value
                    && !(value.is_finite() && value >= 0.0)
                {
                    return Err(MissionError::InvalidValue {
                        mission: self.id.clone(),
                        index,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Mission loading and control errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MissionError {
    #[error("unknown mission `{0}`")]
    UnknownMission(String),
    #[error("duplicate mission id `{0}`")]
    DuplicateMission(String),
    #[error("mission `{0}` has no waypoints")]
    NoWaypoints(String),
    #[error("mission `{mission}` references unknown body `{body}`")]
    UnknownBody { mission: String, body: String },
    #[error("mission `{mission}` waypoint {index} has non-positive duration {duration}")]
    InvalidDuration {
        mission: String,
        index: usize,
        duration: f64,
    },
    #[error("mission `{mission}` waypoint {index} has invalid {field} {value}")]
    InvalidValue {
        mission: String,
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("no mission loaded")]
    NoMission,
    #[error("cannot {action} a mission that is {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: MissionStatus,
    },
}

/// Selectable missions, validated when built.
#[derive(Resource, Clone, Debug)]
pub struct MissionCatalog {
    missions: Vec<Mission>,
}

impl MissionCatalog {
    /// Validate missions against `system`; ids must be unique.
    pub fn new(missions: Vec<Mission>, system: &SolarSystem) -> Result<Self, MissionError> {
        for (i, mission) in missions.iter().enumerate() {
            if missions[..i].iter().any(|m| m.id == mission.id) {
                return Err(MissionError::DuplicateMission(mission.id.clone()));
            }
            mission.validate(system)?;
        }
        Ok(Self { missions })
    }

    /// Built-in missions against the built-in system.
    pub fn builtin(system: &SolarSystem) -> Result<Self, MissionError> {
        Self::new(builtin_missions(), system)
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn get(&self, id: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    /// Look up a mission for selection.
    pub fn select(&self, id: &str) -> Result<&Mission, MissionError> {
        self.get(id)
            .ok_or_else(|| MissionError::UnknownMission(id.to_string()))
    }
}

impl FromWorld for MissionCatalog {
    fn from_world(world: &mut World) -> Self {
        let result = match world.get_resource::<SolarSystem>() {
            Some(system) => Self::builtin(system),
            None => Self::builtin(&SolarSystem::default()),
        };
        result.unwrap_or_else(|err| {
            error!("Built-in missions failed to load: {err}");
            Self {
                missions: Vec::new(),
            }
        })
    }
}

/// Sequencer output, also written as a message each tick.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum MissionEvent {
    /// The presentation layer should bring this body into view
    FocusRequested { body: String },
    WaypointCompleted { index: usize },
    /// Fired once per run
    MissionCompleted { mission: String },
}

/// Request to load a mission by id.
#[derive(Message, Clone, Debug)]
pub struct SelectMission(pub String);

/// Request to start the loaded mission.
#[derive(Message, Clone, Copy, Debug)]
pub struct StartMission;

/// Request to pause the running mission.
#[derive(Message, Clone, Copy, Debug)]
pub struct PauseMission;

/// Request to resume a paused mission.
#[derive(Message, Clone, Copy, Debug)]
pub struct ResumeMission;

/// Request to abandon the running mission.
#[derive(Message, Clone, Copy, Debug)]
pub struct CancelMission;

/// Plugin wiring mission selection and sequencing.
pub struct MissionPlugin;

impl Plugin for MissionPlugin {
    fn build(&self, app: &mut App) {
        configure_simulation_sets(app);
        app.init_resource::<GravityAssistConfig>()
            .init_resource::<PreviewSettings>()
            .init_resource::<MissionCatalog>()
            .init_resource::<MissionSequencer>()
            .init_resource::<FocusTarget>()
            .add_message::<SelectMission>()
            .add_message::<StartMission>()
            .add_message::<PauseMission>()
            .add_message::<ResumeMission>()
            .add_message::<CancelMission>()
            .add_message::<MissionEvent>()
            .add_message::<TickFault>()
            .add_systems(
                Update,
                handle_mission_requests.in_set(SimulationSet::Requests),
            )
            .add_systems(Update, run_sequencer.in_set(SimulationSet::Mission));
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_mission_requests(
    clock: Res<SimulationClock>,
    system: Res<SolarSystem>,
    catalog: Res<MissionCatalog>,
    assist: Res<GravityAssistConfig>,
    preview: Res<PreviewSettings>,
    mut sequencer: ResMut<MissionSequencer>,
    mut focus: ResMut<FocusTarget>,
    mut select: MessageReader<SelectMission>,
    mut start: MessageReader<StartMission>,
    mut pause: MessageReader<PauseMission>,
    mut resume: MessageReader<ResumeMission>,
    mut cancel: MessageReader<CancelMission>,
    mut events: MessageWriter<MissionEvent>,
    mut faults: MessageWriter<TickFault>,
) {
    sequencer.configure(LegSettings {
        assist: *assist,
        preview: *preview,
    });
    let now = clock.elapsed();
    let mut results: Vec<Result<Vec<MissionEvent>, MissionError>> = Vec::new();

    for SelectMission(id) in select.read() {
        results.push(catalog.select(id).map(|mission| {
            info!("Selected mission `{}` ({})", mission.id, mission.name);
            sequencer.load(mission.clone());
            vec![MissionEvent::FocusRequested {
                body: mission.starting_body.clone(),
            }]
        }));
    }
    for _ in start.read() {
        results.push(sequencer.start(now, &system));
    }
    for _ in pause.read() {
        results.push(sequencer.pause(now).map(|()| Vec::new()));
    }
    for _ in resume.read() {
        results.push(sequencer.resume(now).map(|()| Vec::new()));
    }
    for _ in cancel.read() {
        results.push(sequencer.cancel().map(|()| Vec::new()));
    }

    for result in results {
        match result {
            Ok(batch) => {
                apply_focus(&system, &mut focus, &batch);
                events.write_batch(batch);
            }
            Err(err) => {
                warn!("Mission request rejected: {err}");
                faults.write(TickFault::new(err.to_string()));
            }
        }
    }
    for fault in sequencer.drain_faults() {
        faults.write(TickFault::new(fault.to_string()));
    }
}

fn run_sequencer(
    clock: Res<SimulationClock>,
    system: Res<SolarSystem>,
    mut sequencer: ResMut<MissionSequencer>,
    mut focus: ResMut<FocusTarget>,
    mut events: MessageWriter<MissionEvent>,
    mut faults: MessageWriter<TickFault>,
) {
    let batch = sequencer.update(clock.elapsed(), &system);
    apply_focus(&system, &mut focus, &batch);
    events.write_batch(batch);
    for fault in sequencer.drain_faults() {
        faults.write(TickFault::new(fault.to_string()));
    }
}

fn apply_focus(system: &SolarSystem, focus: &mut FocusTarget, events: &[MissionEvent]) {
    for event in events {
        if let MissionEvent::FocusRequested { body } = event {
            focus.body = system.index_of(body);
        }
    }
}
