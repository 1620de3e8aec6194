//! Mission state machine.
//!
//! `Idle -> Running <-> Paused -> Completed`, with `Running`/`Paused` able to
//! drop to `Cancelled`. Waypoint timing is measured in simulation time from
//! the moment each waypoint is entered; a waypoint that finishes mid-tick
//! hands over at its exact boundary, so results do not depend on tick size.

use bevy::math::DVec3;
use bevy::prelude::*;

use super::planning::{self, LegError, LegSettings, WaypointLeg};
use super::{Mission, MissionError, MissionEvent, MissionWaypoint};
use crate::ephemeris::SolarSystem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MissionStatus {
    /// Loaded or empty, not yet started
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

/// Steps the selected mission through its waypoints.
#[derive(Resource, Debug, Default)]
pub struct MissionSequencer {
    mission: Option<Mission>,
    status: MissionStatus,
    current_index: usize,
    /// Simulation time the current waypoint started, shifted by pauses
    waypoint_start: f64,
    paused_at: Option<f64>,
    /// Latest time seen by `start`, `update` or `pause`
    now: f64,
    leg: Option<WaypointLeg>,
    settings: LegSettings,
    delta_v_spent: f64,
    faults: Vec<LegError>,
}

impl MissionSequencer {
    /// Load a mission, discarding any previous run.
    pub fn load(&mut self, mut mission: Mission) {
        for waypoint in &mut mission.waypoints {
            waypoint.completed = false;
        }
        *self = Self {
            mission: Some(mission),
            settings: self.settings,
            ..Default::default()
        };
    }

    pub fn configure(&mut self, settings: LegSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &LegSettings {
        &self.settings
    }

    pub fn mission(&self) -> Option<&Mission> {
        self.mission.as_ref()
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    /// Index of the active waypoint, equal to the waypoint count once done.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_waypoint(&self) -> Option<&MissionWaypoint> {
        self.mission.as_ref()?.waypoints.get(self.current_index)
    }

    /// Plan and preview path of the active waypoint.
    pub fn leg(&self) -> Option<&WaypointLeg> {
        self.leg.as_ref()
    }

    /// Begin the loaded mission at `elapsed`.
    ///
    /// Only an idle mission starts. Running it again means selecting it again.
    pub fn start(
        &mut self,
        elapsed: f64,
        system: &SolarSystem,
    ) -> Result<Vec<MissionEvent>, MissionError> {
        let status = self.status;
        let Some(mission) = self.mission.as_ref() else {
            return Err(MissionError::NoMission);
        };
        if status != MissionStatus::Idle {
            return Err(MissionError::InvalidTransition {
                action: "start",
                status,
            });
        }
        if mission.waypoints.is_empty() {
            return Err(MissionError::NoWaypoints(mission.id.clone()));
        }
        info!("Starting mission `{}`", mission.id);

        self.status = MissionStatus::Running;
        self.current_index = 0;
        self.waypoint_start = elapsed;
        self.paused_at = None;
        self.now = elapsed;
        self.delta_v_spent = 0.0;

        let mut events = Vec::new();
        self.enter_waypoint(system, &mut events);
        // Waypoints that are already due finish now
        events.extend(self.update(elapsed, system));
        Ok(events)
    }

    pub fn pause(&mut self, elapsed: f64) -> Result<(), MissionError> {
        if self.status != MissionStatus::Running {
            return Err(MissionError::InvalidTransition {
                action: "pause",
                status: self.status,
            });
        }
        self.now = self.now.max(elapsed);
        self.paused_at = Some(self.now);
        self.status = MissionStatus::Paused;
        info!("Mission paused");
        Ok(())
    }

    /// Continue a paused mission; the paused interval does not count.
    pub fn resume(&mut self, elapsed: f64) -> Result<(), MissionError> {
        let (MissionStatus::Paused, Some(paused_at)) = (self.status, self.paused_at) else {
            return Err(MissionError::InvalidTransition {
                action: "resume",
                status: self.status,
            });
        };
        let elapsed = elapsed.max(paused_at);
        self.waypoint_start += elapsed - paused_at;
        self.now = elapsed;
        self.paused_at = None;
        self.status = MissionStatus::Running;
        info!("Mission resumed");
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), MissionError> {
        if !matches!(self.status, MissionStatus::Running | MissionStatus::Paused) {
            return Err(MissionError::InvalidTransition {
                action: "cancel",
                status: self.status,
            });
        }
        self.status = MissionStatus::Cancelled;
        self.paused_at = None;
        self.leg = None;
        info!("Mission cancelled");
        Ok(())
    }

    /// Advance to `elapsed`, completing every waypoint whose time is up.
    ///
    /// Does nothing unless running.
    pub fn update(&mut self, elapsed: f64, system: &SolarSystem) -> Vec<MissionEvent> {
        let mut events = Vec::new();
        if self.status != MissionStatus::Running {
            return events;
        }
        self.now = self.now.max(elapsed);

        while self.status == MissionStatus::Running {
            let Some(mission) = self.mission.as_mut() else {
                break;
            };
            let Some(waypoint) = mission.waypoints.get_mut(self.current_index) else {
                break;
            };

            let duration = waypoint.duration;
            if duration > 0.0 && self.now - self.waypoint_start < duration {
                break;
            }

            waypoint.completed = true;
            let spent = waypoint.delta_v_budget.or_else(|| {
                self.leg
                    .as_ref()
                    .filter(|leg| leg.index == self.current_index)
                    .and_then(|leg| leg.plan.delta_v())
            });
            self.delta_v_spent += spent.unwrap_or(0.0);
            info!("Waypoint {} ({}) complete", self.current_index, waypoint.name);
            events.push(MissionEvent::WaypointCompleted {
                index: self.current_index,
            });

            self.waypoint_start += duration.max(0.0);
            self.current_index += 1;

            if self.current_index >= mission.waypoints.len() {
                let id = mission.id.clone();
                info!("Mission `{id}` complete");
                self.status = MissionStatus::Completed;
                self.leg = None;
                events.push(MissionEvent::MissionCompleted { mission: id });
            } else {
                self.enter_waypoint(system, &mut events);
            }
        }
        events
    }

    fn enter_waypoint(&mut self, system: &SolarSystem, events: &mut Vec<MissionEvent>) {
        let Some(mission) = self.mission.as_ref() else {
            return;
        };
        let Some(waypoint) = mission.waypoints.get(self.current_index) else {
            return;
        };
        events.push(MissionEvent::FocusRequested {
            body: waypoint.target_body.clone(),
        });

        match planning::plan_leg(
            mission,
            self.current_index,
            self.waypoint_start,
            system,
            &self.settings,
        ) {
            Ok(leg) => self.leg = Some(leg),
            Err(err) => {
                warn!(
                    "Could not plan waypoint {} of `{}`: {err}",
                    self.current_index, mission.id
                );
                self.leg = None;
                self.faults.push(err);
            }
        }
    }

    /// Leg planning failures since the last call.
    pub fn drain_faults(&mut self) -> Vec<LegError> {
        std::mem::take(&mut self.faults)
    }

    /// Progress of the active waypoint in [0, 1].
    pub fn progress(&self) -> f64 {
        match self.status {
            MissionStatus::Completed => 1.0,
            MissionStatus::Idle | MissionStatus::Cancelled => 0.0,
            MissionStatus::Running | MissionStatus::Paused => {
                let Some(waypoint) = self.current_waypoint() else {
                    return 1.0;
                };
                if waypoint.duration <= 0.0 {
                    return 1.0;
                }
                let now = self.paused_at.unwrap_or(self.now);
                ((now - self.waypoint_start) / waypoint.duration).clamp(0.0, 1.0)
            }
        }
    }

    /// Progress of waypoint `index`: 1.0 if completed, live progress if
    /// active, 0.0 otherwise.
    pub fn waypoint_progress(&self, index: usize) -> f64 {
        let Some(waypoint) = self.mission.as_ref().and_then(|m| m.waypoints.get(index)) else {
            return 0.0;
        };
        if waypoint.completed {
            1.0
        } else if index == self.current_index {
            self.progress()
        } else {
            0.0
        }
    }

    /// Fraction of the whole mission done, by waypoint count.
    pub fn mission_progress(&self) -> f64 {
        let Some(mission) = self.mission.as_ref() else {
            return 0.0;
        };
        if mission.waypoints.is_empty() {
            return 0.0;
        }
        let done = mission.waypoints.iter().filter(|w| w.completed).count() as f64;
        let partial = if self.current_index < mission.waypoints.len() {
            self.waypoint_progress(self.current_index)
        } else {
            0.0
        };
        ((done + partial) / mission.waypoints.len() as f64).min(1.0)
    }

    /// Spacecraft marker along the active leg's path.
    pub fn spacecraft_position(&self) -> Option<DVec3> {
        self.leg.as_ref()?.position_at(self.progress())
    }

    /// Delta-v of completed waypoints: the budget when set, otherwise the
    /// planned transfer delta-v.
    pub fn delta_v_spent(&self) -> f64 {
        self.delta_v_spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::planning::LegPlan;
    use crate::test_utils::fixtures::{flyby_mission, hohmann_mission};
    use approx::assert_relative_eq;

    fn running(mission: Mission, system: &SolarSystem) -> MissionSequencer {
        let mut sequencer = MissionSequencer::default();
        sequencer.load(mission);
        sequencer.start(0.0, system).unwrap();
        sequencer
    }

    #[test]
    fn test_start_requires_mission() {
        let system = SolarSystem::default();
        let mut sequencer = MissionSequencer::default();
        assert_eq!(sequencer.start(0.0, &system), Err(MissionError::NoMission));
        assert_eq!(sequencer.status(), MissionStatus::Idle);
    }

    #[test]
    fn test_start_focuses_first_target() {
        let system = SolarSystem::default();
        let mut sequencer = MissionSequencer::default();
        sequencer.load(flyby_mission(&[("mars", 5.0), ("venus", 5.0)]));
        let events = sequencer.start(2.0, &system).unwrap();
        assert_eq!(
            events,
            vec![MissionEvent::FocusRequested { body: "mars".into() }]
        );
        assert_eq!(sequencer.status(), MissionStatus::Running);
        assert_eq!(sequencer.current_index(), 0);
        assert!(sequencer.leg().is_some());
    }

    #[test]
    fn test_waypoint_completes_exactly_at_duration() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 10.0), ("venus", 10.0)]), &system);

        assert!(sequencer.update(9.999, &system).is_empty());
        assert_relative_eq!(sequencer.progress(), 0.9999, epsilon = 1e-9);

        let events = sequencer.update(10.0, &system);
        assert_eq!(
            events,
            vec![
                MissionEvent::WaypointCompleted { index: 0 },
                MissionEvent::FocusRequested { body: "venus".into() },
            ]
        );
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.progress(), 0.0);
        assert_eq!(sequencer.waypoint_progress(0), 1.0);
    }

    #[test]
    fn test_several_waypoints_in_one_tick() {
        let system = SolarSystem::default();
        let mut sequencer = running(
            flyby_mission(&[("mars", 2.0), ("venus", 2.0), ("earth", 2.0)]),
            &system,
        );
        let events = sequencer.update(5.0, &system);
        let completed: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, MissionEvent::WaypointCompleted { .. }))
            .collect();
        assert_eq!(completed.len(), 2);
        assert_eq!(sequencer.current_index(), 2);
        // Third waypoint started at the 4.0 boundary
        assert_relative_eq!(sequencer.progress(), 0.5);
    }

    #[test]
    fn test_mission_completes_once() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 5.0), ("venus", 5.0)]), &system);

        let events = sequencer.update(11.0, &system);
        assert_eq!(
            events.last(),
            Some(&MissionEvent::MissionCompleted {
                mission: "flyby-test".into()
            })
        );
        assert_eq!(sequencer.status(), MissionStatus::Completed);
        assert_eq!(sequencer.current_index(), 2);
        assert_eq!(sequencer.mission_progress(), 1.0);
        assert!(sequencer.update(20.0, &system).is_empty());
        assert!(sequencer.spacecraft_position().is_none());
    }

    #[test]
    fn test_tick_size_does_not_change_timeline() {
        let system = SolarSystem::default();
        let mission = flyby_mission(&[("mars", 3.0), ("venus", 4.0), ("earth", 5.0)]);

        let mut coarse = running(mission.clone(), &system);
        coarse.update(7.5, &system);

        let mut fine = running(mission, &system);
        let mut t = 0.0;
        while t < 7.5 {
            t = (t + 0.1f64).min(7.5);
            fine.update(t, &system);
        }

        assert_eq!(coarse.current_index(), fine.current_index());
        assert_relative_eq!(coarse.progress(), fine.progress(), epsilon = 1e-9);
    }

    #[test]
    fn test_pause_does_not_count() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 10.0)]), &system);

        sequencer.update(4.0, &system);
        sequencer.pause(4.0).unwrap();
        assert!(sequencer.update(100.0, &system).is_empty());
        assert_relative_eq!(sequencer.progress(), 0.4);

        sequencer.resume(104.0).unwrap();
        sequencer.update(109.0, &system);
        assert_relative_eq!(sequencer.progress(), 0.9, epsilon = 1e-12);
        assert_eq!(sequencer.status(), MissionStatus::Running);

        sequencer.update(110.0, &system);
        assert_eq!(sequencer.status(), MissionStatus::Completed);
    }

    #[test]
    fn test_invalid_transitions() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 10.0)]), &system);

        assert!(matches!(
            sequencer.start(1.0, &system),
            Err(MissionError::InvalidTransition { action: "start", .. })
        ));
        assert!(sequencer.resume(1.0).is_err());

        sequencer.cancel().unwrap();
        assert_eq!(sequencer.status(), MissionStatus::Cancelled);
        assert!(sequencer.pause(2.0).is_err());
        assert!(sequencer.cancel().is_err());
        assert!(sequencer.update(50.0, &system).is_empty());

        // Cancelled is terminal until reselected
        assert!(matches!(
            sequencer.start(60.0, &system),
            Err(MissionError::InvalidTransition {
                action: "start",
                status: MissionStatus::Cancelled
            })
        ));
        assert_eq!(sequencer.status(), MissionStatus::Cancelled);
    }

    #[test]
    fn test_completed_mission_does_not_restart() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 5.0)]), &system);
        sequencer.update(5.0, &system);
        assert_eq!(sequencer.status(), MissionStatus::Completed);

        assert!(matches!(
            sequencer.start(6.0, &system),
            Err(MissionError::InvalidTransition {
                action: "start",
                status: MissionStatus::Completed
            })
        ));
        assert_eq!(sequencer.status(), MissionStatus::Completed);
        assert!(sequencer.mission().unwrap().waypoints[0].completed);
        assert!(sequencer.update(20.0, &system).is_empty());
    }

    #[test]
    fn test_reload_resets_progress() {
        let system = SolarSystem::default();
        let mission = flyby_mission(&[("mars", 1.0), ("venus", 1.0)]);
        let mut sequencer = running(mission.clone(), &system);
        sequencer.update(1.5, &system);
        assert!(sequencer.mission().unwrap().waypoints[0].completed);

        sequencer.load(mission);
        assert_eq!(sequencer.status(), MissionStatus::Idle);
        assert_eq!(sequencer.current_index(), 0);
        assert!(!sequencer.mission().unwrap().waypoints[0].completed);
        assert_eq!(sequencer.delta_v_spent(), 0.0);
    }

    #[test]
    fn test_non_positive_duration_completes_immediately() {
        let system = SolarSystem::default();
        let mut mission = flyby_mission(&[("mars", 0.0), ("venus", 5.0)]);
        mission.waypoints[0].duration = 0.0;

        let mut sequencer = MissionSequencer::default();
        sequencer.load(mission);
        let events = sequencer.start(3.0, &system).unwrap();
        assert!(events.contains(&MissionEvent::WaypointCompleted { index: 0 }));
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.progress(), 0.0);
    }

    #[test]
    fn test_spacecraft_moves_along_leg() {
        let system = SolarSystem::default();
        let mut sequencer = running(flyby_mission(&[("mars", 10.0)]), &system);
        let leg = sequencer.leg().unwrap().clone();

        assert_eq!(sequencer.spacecraft_position(), leg.start());
        sequencer.update(5.0, &system);
        let mid = sequencer.spacecraft_position().unwrap();
        assert!((mid - leg.start().unwrap()).length() > 1.0);
        assert!((mid - leg.end().unwrap()).length() > 1.0);
    }

    #[test]
    fn test_delta_v_uses_budget_then_plan() {
        let system = SolarSystem::default();
        let mut mission = hohmann_mission();
        mission.waypoints[0].delta_v_budget = None;
        let mut sequencer = running(mission, &system);

        let LegPlan::Transfer(plan) = sequencer.leg().unwrap().plan.clone() else {
            panic!("expected a transfer plan");
        };
        sequencer.update(1000.0, &system);
        assert_eq!(sequencer.status(), MissionStatus::Completed);
        // Second waypoint is an orbit with a 2.1 budget
        assert_relative_eq!(sequencer.delta_v_spent(), plan.total_delta_v + 2.1, epsilon = 1e-9);
    }
}
