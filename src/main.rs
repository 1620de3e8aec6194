//! Orrery - headless mission runner
//!
//! Runs one built-in mission against the built-in solar system and logs its
//! progress until it completes.
//!
//! Usage: `orrery [mission-id] [time-scale]`

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use orrery::OrreryPlugin;
use orrery::mission::{MissionEvent, MissionSequencer, SelectMission, StartMission};
use orrery::time::SetTimeScale;
use orrery::types::TickFault;

const DEFAULT_MISSION: &str = "earth-mars-direct";
const DEFAULT_TIME_SCALE: f64 = 20.0;

/// Command line choices.
#[derive(Resource, Clone, Debug)]
struct RunOptions {
    mission: String,
    time_scale: f64,
}

impl RunOptions {
    fn from_args() -> Self {
        let mut args = std::env::args().skip(1);
        let mission = args.next().unwrap_or_else(|| DEFAULT_MISSION.to_string());
        let time_scale = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIME_SCALE);
        Self {
            mission,
            time_scale,
        }
    }
}

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(RunOptions::from_args())
        .add_plugins(OrreryPlugin)
        .add_systems(Startup, launch)
        .add_systems(Update, report)
        .run();
}

fn launch(
    options: Res<RunOptions>,
    mut scale: MessageWriter<SetTimeScale>,
    mut select: MessageWriter<SelectMission>,
    mut start: MessageWriter<StartMission>,
) {
    info!(
        "Running mission `{}` at {}x",
        options.mission, options.time_scale
    );
    scale.write(SetTimeScale(options.time_scale));
    select.write(SelectMission(options.mission.clone()));
    start.write(StartMission);
}

fn report(
    sequencer: Res<MissionSequencer>,
    mut events: MessageReader<MissionEvent>,
    mut faults: MessageReader<TickFault>,
    mut exit: MessageWriter<AppExit>,
) {
    for event in events.read() {
        match event {
            MissionEvent::FocusRequested { body } => info!("Heading for {body}"),
            MissionEvent::WaypointCompleted { index } => {
                info!(
                    "Waypoint {index} done, delta-v spent {:.2}",
                    sequencer.delta_v_spent()
                );
            }
            MissionEvent::MissionCompleted { mission } => {
                info!("Mission `{mission}` completed");
                exit.write(AppExit::Success);
            }
        }
    }
    for fault in faults.read() {
        // An unknown mission id leaves nothing to run
        error!("{}", fault.reason);
        if sequencer.mission().is_none() {
            exit.write(AppExit::error());
        }
    }
}
