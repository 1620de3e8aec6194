//! Built-in missions.
//!
//! Three missions of increasing difficulty: a direct Hohmann transfer to Mars,
//! a Venus gravity assist down to Mercury, and a Voyager-style grand tour.

use bevy::math::DVec3;

use super::{Difficulty, Mission, MissionWaypoint, WaypointKind};
use WaypointKind::*;

/// Static form of a mission.
#[derive(Clone, Copy, Debug)]
pub struct MissionPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub spacecraft: &'static str,
    pub difficulty: Difficulty,
    pub starting_body: &'static str,
    pub waypoints: &'static [WaypointPreset],
    pub total_delta_v: f64,
    pub total_duration: f64,
}

/// Static form of a waypoint.
#[derive(Clone, Copy, Debug)]
pub struct WaypointPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: WaypointKind,
    pub target_body: &'static str,
    pub duration: f64,
    pub orbit_radius: Option<f64>,
    pub position: Option<DVec3>,
    pub delta_v_budget: Option<f64>,
}

impl WaypointPreset {
    const fn new(
        name: &'static str,
        description: &'static str,
        kind: WaypointKind,
        target_body: &'static str,
        duration: f64,
    ) -> Self {
        Self {
            name,
            description,
            kind,
            target_body,
            duration,
            orbit_radius: None,
            position: None,
            delta_v_budget: None,
        }
    }

    const fn orbit_radius(mut self, radius: f64) -> Self {
        self.orbit_radius = Some(radius);
        self
    }

    const fn delta_v(mut self, budget: f64) -> Self {
        self.delta_v_budget = Some(budget);
        self
    }

    const fn at(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self
    }

    fn to_waypoint(self) -> MissionWaypoint {
        MissionWaypoint {
            name: self.name.to_string(),
            description: self.description.to_string(),
            kind: self.kind,
            target_body: self.target_body.to_string(),
            duration: self.duration,
            orbit_radius: self.orbit_radius,
            position: self.position,
            delta_v_budget: self.delta_v_budget,
            intermediate_radius: None,
            completed: false,
        }
    }
}

impl MissionPreset {
    pub fn to_mission(&self) -> Mission {
        Mission {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            spacecraft: self.spacecraft.to_string(),
            difficulty: self.difficulty,
            starting_body: self.starting_body.to_string(),
            waypoints: self.waypoints.iter().map(|w| w.to_waypoint()).collect(),
            total_delta_v: self.total_delta_v,
            total_duration: self.total_duration,
        }
    }
}

/// All built-in missions.
pub static MISSIONS: &[MissionPreset] = &[MARS_DIRECT, INNER_SYSTEM_EXPLORER, GRAND_TOUR];

/// Owned copies of [`MISSIONS`].
pub fn builtin_missions() -> Vec<Mission> {
    MISSIONS.iter().map(MissionPreset::to_mission).collect()
}

/// Mission 1: Earth to Mars by Hohmann transfer.
pub static MARS_DIRECT: MissionPreset = MissionPreset {
    id: "earth-mars-direct",
    name: "Mars Direct",
    description: "Launch from Earth and perform a Hohmann transfer to reach Mars orbit. \
                  A basic interplanetary mission for understanding transfer orbits.",
    spacecraft: "voyager",
    difficulty: Difficulty::Easy,
    starting_body: "earth",
    waypoints: &[
        WaypointPreset::new(
            "Earth Orbit",
            "Begin in Earth orbit at an altitude of 300km",
            Orbit,
            "earth",
            10.0,
        )
        .orbit_radius(71.5),
        WaypointPreset::new(
            "Trans-Mars Injection",
            "Hohmann transfer burn out of Earth orbit onto a Mars transfer orbit",
            HohmannTransfer,
            "mars",
            120.0,
        )
        .delta_v(3.6),
        WaypointPreset::new(
            "Mars Orbit Insertion",
            "Capture burn into Mars orbit",
            Orbit,
            "mars",
            30.0,
        )
        .orbit_radius(93.5)
        .delta_v(2.1),
    ],
    total_delta_v: 5.7,
    total_duration: 160.0,
};

/// Mission 2: Venus gravity assist to reach Mercury.
pub static INNER_SYSTEM_EXPLORER: MissionPreset = MissionPreset {
    id: "venus-mercury-assist",
    name: "Inner System Explorer",
    description: "Use a Venus gravity assist to cut the delta-v needed to reach Mercury.",
    spacecraft: "jwst",
    difficulty: Difficulty::Medium,
    starting_body: "earth",
    waypoints: &[
        WaypointPreset::new(
            "Earth Departure",
            "Launch from Earth onto a Venus transfer orbit",
            HohmannTransfer,
            "venus",
            80.0,
        )
        .delta_v(3.5),
        WaypointPreset::new(
            "Venus Gravity Assist",
            "Close flyby of Venus to bend the trajectory",
            GravityAssist,
            "venus",
            10.0,
        ),
        WaypointPreset::new(
            "Mercury Transfer",
            "Coast to Mercury after the assist",
            Flyby,
            "mercury",
            100.0,
        ),
        WaypointPreset::new(
            "Mercury Orbit Insertion",
            "Enter orbit around Mercury",
            Orbit,
            "mercury",
            30.0,
        )
        .orbit_radius(37.0)
        .delta_v(2.8),
    ],
    total_delta_v: 6.3,
    total_duration: 220.0,
};

/// Mission 3: outer planets by successive assists, then out of the system.
pub static GRAND_TOUR: MissionPreset = MissionPreset {
    id: "grand-tour",
    name: "Grand Tour",
    description: "A Voyager-style tour of the outer planets using multiple gravity assists.",
    spacecraft: "voyager",
    difficulty: Difficulty::Hard,
    starting_body: "earth",
    waypoints: &[
        WaypointPreset::new(
            "Earth Departure",
            "Launch from Earth toward Jupiter",
            HohmannTransfer,
            "jupiter",
            400.0,
        )
        .delta_v(6.4),
        WaypointPreset::new(
            "Jupiter Flyby",
            "Gravity assist at Jupiter to boost velocity",
            GravityAssist,
            "jupiter",
            20.0,
        ),
        WaypointPreset::new(
            "Saturn Flyby",
            "Second gravity assist at Saturn",
            GravityAssist,
            "saturn",
            800.0,
        ),
        WaypointPreset::new(
            "Uranus Flyby",
            "Continue to Uranus for observations",
            Flyby,
            "uranus",
            1200.0,
        ),
        WaypointPreset::new(
            "Neptune Flyby",
            "Final planetary encounter at Neptune",
            Flyby,
            "neptune",
            1400.0,
        ),
        WaypointPreset::new(
            "Interstellar Space",
            "Leave the solar system",
            Flyby,
            "sun",
            1000.0,
        )
        .at(DVec3::new(500.0, 0.0, 500.0)),
    ],
    // Assists do the rest after the departure burn
    total_delta_v: 6.4,
    total_duration: 4820.0,
};
