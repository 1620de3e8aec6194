//! Headless Bevy integration tests.
//!
//! These tests verify the plugins' resources, messages and per-tick ordering
//! without a window or GPU.

mod common;

use std::time::Duration;

use bevy::prelude::*;
use orrery::ephemeris::{FocusBody, FocusTarget, SolarSystem};
use orrery::mission::{MissionEvent, MissionSequencer, MissionStatus, SelectMission};
use orrery::time::{MIN_TIME_SCALE, SetPaused, SetTimeScale, SimulationClock};
use orrery::types::TickFault;

use common::{collect_messages, collected, manual_app, step, timed_app};

#[test]
fn test_plugin_initializes_resources() {
    let mut app = manual_app();
    app.update();

    let world = app.world();
    assert!(world.contains_resource::<SimulationClock>());
    assert!(world.contains_resource::<FocusTarget>());
    assert_eq!(
        world.resource::<MissionSequencer>().status(),
        MissionStatus::Idle
    );

    let system = world.resource::<SolarSystem>();
    assert_eq!(system.len(), 13);
    assert!(system.states().iter().all(|s| s.position.is_finite()));
}

#[test]
fn test_bodies_follow_the_clock() {
    let mut app = manual_app();
    app.update();
    let earth_before = app.world().resource::<SolarSystem>().position_by_id("earth").unwrap();

    step(&mut app, 100.0);

    let system = app.world().resource::<SolarSystem>();
    assert_eq!(system.resolved_at(), 100.0);
    let earth_after = system.position_by_id("earth").unwrap();
    assert!(earth_before.distance(earth_after) > 1.0);

    // Same positions a direct evaluation gives
    let direct = system.positions_at(100.0).unwrap();
    let earth = system.index_of("earth").unwrap();
    assert_eq!(direct[earth.get()], earth_after);
}

#[test]
fn test_real_frame_time_drives_clock() {
    let mut app = timed_app(Duration::from_millis(100));
    app.world_mut().write_message(SetTimeScale(10.0));

    for _ in 0..11 {
        app.update();
    }

    // Ten or eleven frames of 0.1 s at 10x, depending on the first frame
    let elapsed = app.world().resource::<SimulationClock>().elapsed();
    assert!(elapsed >= 10.0 - 1e-6, "elapsed {elapsed}");
    assert!(elapsed <= 11.0 + 1e-6, "elapsed {elapsed}");
    assert_eq!(app.world().resource::<SolarSystem>().resolved_at(), elapsed);
}

#[test]
fn test_pause_request_stops_time() {
    let mut app = timed_app(Duration::from_millis(50));
    app.update();
    app.update();

    app.world_mut().write_message(SetPaused(true));
    app.update();
    let paused_at = app.world().resource::<SimulationClock>().elapsed();

    for _ in 0..5 {
        app.update();
    }
    let clock = app.world().resource::<SimulationClock>();
    assert!(clock.is_paused());
    assert_eq!(clock.elapsed(), paused_at);
}

#[test]
fn test_invalid_time_scale_reports_fault() {
    let mut app = manual_app();
    collect_messages::<TickFault>(&mut app);

    app.world_mut().write_message(SetTimeScale(-3.0));
    app.update();

    assert_eq!(
        app.world().resource::<SimulationClock>().time_scale(),
        MIN_TIME_SCALE
    );
    assert_eq!(collected::<TickFault>(&app).len(), 1);
}

#[test]
fn test_focus_requests() {
    let mut app = manual_app();
    collect_messages::<TickFault>(&mut app);

    app.world_mut().write_message(FocusBody(Some("saturn".into())));
    app.update();
    let saturn = app.world().resource::<SolarSystem>().index_of("saturn");
    assert_eq!(app.world().resource::<FocusTarget>().body, saturn);

    // Unknown ids leave focus unchanged
    app.world_mut().write_message(FocusBody(Some("vulcan".into())));
    app.update();
    assert_eq!(app.world().resource::<FocusTarget>().body, saturn);
    assert_eq!(collected::<TickFault>(&app).len(), 1);

    app.world_mut().write_message(FocusBody(None));
    app.update();
    assert_eq!(app.world().resource::<FocusTarget>().body, None);
}

#[test]
fn test_unknown_mission_is_not_fatal() {
    let mut app = manual_app();
    collect_messages::<TickFault>(&mut app);
    collect_messages::<MissionEvent>(&mut app);

    app.world_mut().write_message(SelectMission("to-the-stars".into()));
    step(&mut app, 1.0);

    let faults = collected::<TickFault>(&app);
    assert_eq!(faults.len(), 1);
    assert!(faults[0].reason.contains("to-the-stars"));
    assert!(collected::<MissionEvent>(&app).is_empty());
    assert!(app.world().resource::<MissionSequencer>().mission().is_none());

    // The simulation keeps running
    step(&mut app, 1.0);
    assert_eq!(app.world().resource::<SimulationClock>().elapsed(), 2.0);
}
