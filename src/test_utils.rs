//! Test utilities for simulation tests.
//!
//! Provides mission and catalog fixtures, assertions for orbit geometry, and a
//! headless Bevy app builder.

use bevy::math::DVec3;

use crate::mission::{Difficulty, Mission, MissionWaypoint, WaypointKind};

/// Fixtures for missions and small body catalogs.
pub mod fixtures {
    use super::*;
    use crate::ephemeris::data::{OrbitDefinition, SystemCatalog};
    use crate::ephemeris::{BodyDefinition, BodyKind, CenterRef, OrbitalElements};

    fn waypoint(kind: WaypointKind, target: &str, duration: f64) -> MissionWaypoint {
        MissionWaypoint {
            name: format!("{target} {}", kind.label()),
            description: String::new(),
            kind,
            target_body: target.to_string(),
            duration,
            orbit_radius: None,
            position: None,
            delta_v_budget: None,
            intermediate_radius: None,
            completed: false,
        }
    }

    fn mission(id: &str, waypoints: Vec<MissionWaypoint>) -> Mission {
        let mut mission = Mission {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            spacecraft: "voyager".to_string(),
            difficulty: Difficulty::Easy,
            starting_body: "earth".to_string(),
            waypoints,
            total_delta_v: 0.0,
            total_duration: 0.0,
        };
        mission.total_delta_v = mission.planned_delta_v();
        mission.total_duration = mission.planned_duration();
        mission
    }

    /// Flybys of `(body, duration)` legs starting from Earth.
    ///
    /// The mission id is `flyby-test`.
    pub fn flyby_mission(legs: &[(&str, f64)]) -> Mission {
        mission(
            "flyby-test",
            legs.iter()
                .map(|&(body, duration)| waypoint(WaypointKind::Flyby, body, duration))
                .collect(),
        )
    }

    /// Earth to Mars: a 10-unit Hohmann transfer with a 3.6 budget, then a
    /// 10-unit Mars orbit with a 2.1 budget.
    pub fn hohmann_mission() -> Mission {
        let mut transfer = waypoint(WaypointKind::HohmannTransfer, "mars", 10.0);
        transfer.delta_v_budget = Some(3.6);
        let mut orbit = waypoint(WaypointKind::Orbit, "mars", 10.0);
        orbit.orbit_radius = Some(8.0);
        orbit.delta_v_budget = Some(2.1);
        mission("hohmann-test", vec![transfer, orbit])
    }

    /// A body on a circular orbit around `center`.
    pub fn orbiting(id: &str, center: CenterRef, radius: f64, rate: f64) -> BodyDefinition {
        BodyDefinition {
            id: id.to_string(),
            name: id.to_string(),
            kind: BodyKind::Planet,
            radius: 1.0,
            gravitational_parameter: 1.0,
            rotation_rate: None,
            orbit: Some(OrbitDefinition {
                elements: OrbitalElements::circular(radius, rate),
                center,
            }),
        }
    }

    /// A body fixed at the origin.
    pub fn fixed(id: &str) -> BodyDefinition {
        BodyDefinition {
            id: id.to_string(),
            name: id.to_string(),
            kind: BodyKind::Star,
            radius: 5.0,
            gravitational_parameter: 1000.0,
            rotation_rate: None,
            orbit: None,
        }
    }

    /// Star, planet at radius 40 and a moon at radius 4 around the planet.
    pub fn three_level_catalog() -> SystemCatalog {
        SystemCatalog {
            bodies: vec![
                fixed("star"),
                orbiting("planet", CenterRef::Origin, 40.0, 0.01),
                orbiting("moon", CenterRef::Body("planet".into()), 4.0, 0.1),
            ],
            derived: Vec::new(),
        }
    }
}

/// Assertions for orbit geometry.
pub mod assertions {
    use super::*;

    /// Assert every point lies within `[min, max]` of `center`.
    ///
    /// # Panics
    /// Panics naming the first point outside the band.
    pub fn assert_within_band(points: &[DVec3], center: DVec3, min: f64, max: f64) {
        for (i, p) in points.iter().enumerate() {
            let d = p.distance(center);
            assert!(
                d >= min && d <= max,
                "point {i} at distance {d:.6} outside [{min:.6}, {max:.6}]"
            );
        }
    }

    /// Assert a polyline is closed within `tolerance`.
    pub fn assert_closed(points: &[DVec3], tolerance: f64) {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            panic!("empty polyline");
        };
        let gap = first.distance(*last);
        assert!(gap <= tolerance, "polyline not closed: gap {gap:.3e}");
    }
}

/// Utilities for creating headless Bevy apps for testing.
pub mod bevy_test {
    use bevy::prelude::*;

    use crate::OrreryPlugin;

    /// Create a minimal Bevy app with the simulation plugins.
    pub fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(OrreryPlugin);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::SolarSystem;
    use crate::mission::MissionSequencer;
    use crate::time::SimulationClock;

    #[test]
    fn test_flyby_fixture_totals() {
        let mission = fixtures::flyby_mission(&[("mars", 2.0), ("venus", 3.0)]);
        assert_eq!(mission.id, "flyby-test");
        assert_eq!(mission.total_duration, 5.0);
        assert!(mission.validate(&SolarSystem::default()).is_ok());
    }

    #[test]
    fn test_three_level_catalog_loads() {
        let system = SolarSystem::from_catalog(fixtures::three_level_catalog()).unwrap();
        let planet = system.position_by_id("planet").unwrap();
        let moon = system.position_by_id("moon").unwrap();
        assertions::assert_within_band(&[moon], planet, 4.0 - 1e-9, 4.0 + 1e-9);
    }

    #[test]
    fn test_headless_app_has_resources() {
        let mut app = bevy_test::headless_app();
        app.update();
        assert!(app.world().contains_resource::<SimulationClock>());
        assert!(app.world().contains_resource::<SolarSystem>());
        assert!(app.world().contains_resource::<MissionSequencer>());
    }
}
