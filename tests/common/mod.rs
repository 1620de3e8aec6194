//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use orrery::OrreryPlugin;
use orrery::mission::{
    Difficulty, Mission, MissionCatalog, MissionWaypoint, SelectMission, StartMission,
    WaypointKind,
};
use orrery::ephemeris::SolarSystem;
use orrery::time::SimulationClock;

/// Headless app with the simulation plugins where Bevy's frame delta is
/// zero, so simulation time moves only through [`step`].
pub fn manual_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO))
        .add_plugins(OrreryPlugin);
    app
}

/// Headless app where every frame is `frame` of real time.
pub fn timed_app(frame: Duration) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(frame))
        .add_plugins(OrreryPlugin);
    app
}

/// Advance simulation time by `seconds` of real time and run one frame.
pub fn step(app: &mut App, seconds: f64) {
    app.world_mut()
        .resource_mut::<SimulationClock>()
        .advance(seconds);
    app.update();
}

/// Messages of type `M` seen so far, collected in `Last`.
#[derive(Resource)]
pub struct Collected<M: Message>(pub Vec<M>);

impl<M: Message> Default for Collected<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn collect<M: Message + Clone>(mut reader: MessageReader<M>, mut out: ResMut<Collected<M>>) {
    out.0.extend(reader.read().cloned());
}

/// Start recording messages of type `M`.
pub fn collect_messages<M: Message + Clone>(app: &mut App) {
    app.init_resource::<Collected<M>>()
        .add_systems(Last, collect::<M>);
}

pub fn collected<M: Message + Clone>(app: &App) -> Vec<M> {
    app.world().resource::<Collected<M>>().0.clone()
}

/// Flyby waypoints of `(body, duration)` starting from Earth.
pub fn flyby_mission(id: &str, legs: &[(&str, f64)]) -> Mission {
    let waypoints: Vec<MissionWaypoint> = legs
        .iter()
        .map(|&(body, duration)| MissionWaypoint {
            name: format!("{body} flyby"),
            description: String::new(),
            kind: WaypointKind::Flyby,
            target_body: body.to_string(),
            duration,
            orbit_radius: None,
            position: None,
            delta_v_budget: None,
            intermediate_radius: None,
            completed: false,
        })
        .collect();
    Mission {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        spacecraft: "voyager".to_string(),
        difficulty: Difficulty::Easy,
        starting_body: "earth".to_string(),
        total_delta_v: 0.0,
        total_duration: legs.iter().map(|&(_, d)| d).sum(),
        waypoints,
    }
}

/// Replace the app's catalog with `missions`, validated against its system.
pub fn install_missions(app: &mut App, missions: Vec<Mission>) {
    let catalog = {
        let system = app.world().resource::<SolarSystem>();
        MissionCatalog::new(missions, system).unwrap()
    };
    app.insert_resource(catalog);
}

/// Select and start a mission in the next frame.
pub fn launch(app: &mut App, id: &str) {
    app.world_mut().write_message(SelectMission(id.to_string()));
    app.world_mut().write_message(StartMission);
}
