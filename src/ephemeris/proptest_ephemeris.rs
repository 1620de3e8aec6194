//! Property-based tests for ephemeris computations using proptest.
//!
//! These tests verify that orbital computations maintain expected properties
//! across a wide range of inputs.

use bevy::math::DVec3;
use proptest::prelude::*;
use std::f64::consts::TAU;

use super::SolarSystem;
use super::kepler::{OrbitalElements, position_on_orbit, solve_kepler};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The solver satisfies M = E - e*sin(E) for all valid eccentricities.
    #[test]
    fn prop_kepler_solver_convergence(
        mean_anomaly_normalized in 0.0f64..1.0,
        eccentricity in 0.0f64..0.99,
    ) {
        let m = mean_anomaly_normalized * TAU;
        let solution = solve_kepler(m, eccentricity);

        let m_check = solution.eccentric_anomaly - eccentricity * solution.eccentric_anomaly.sin();
        let error = (m_check - m.rem_euclid(TAU)).abs();
        prop_assert!(solution.converged);
        prop_assert!(
            error < 1e-8,
            "Kepler solver failed: M={}, e={}, E={}, error={}",
            m, eccentricity, solution.eccentric_anomaly, error
        );
    }

    /// Distance from the center stays within [a(1-e), a(1+e)].
    #[test]
    fn prop_distance_within_apsides(
        a in 0.1f64..500.0,
        e in 0.0f64..0.95,
        tilt in -3.2f64..3.2,
        m in -20.0f64..20.0,
        cx in -300.0f64..300.0,
        cz in -300.0f64..300.0,
    ) {
        let center = DVec3::new(cx, 1.0, cz);
        let p = position_on_orbit(center, a, e, tilt, m);
        let r = (p - center).length();
        let slack = 1e-9 * a;
        prop_assert!(r >= a * (1.0 - e) - slack, "r={} below periapsis {}", r, a * (1.0 - e));
        prop_assert!(r <= a * (1.0 + e) + slack, "r={} above apoapsis {}", r, a * (1.0 + e));
    }

    /// A circular orbit is exactly a circle of radius a.
    #[test]
    fn prop_circular_radius(
        a in 0.1f64..500.0,
        tilt in -3.2f64..3.2,
        m in 0.0f64..TAU,
    ) {
        let p = position_on_orbit(DVec3::ZERO, a, 0.0, tilt, m);
        prop_assert!((p.length() - a).abs() < 1e-9 * a);
    }

    /// Position repeats after a full turn of mean anomaly.
    #[test]
    fn prop_position_periodic(
        a in 1.0f64..300.0,
        e in 0.0f64..0.9,
        m in 0.0f64..TAU,
    ) {
        let p1 = position_on_orbit(DVec3::ZERO, a, e, 0.2, m);
        let p2 = position_on_orbit(DVec3::ZERO, a, e, 0.2, m + TAU);
        prop_assert!((p1 - p2).length() < 1e-6 * a);
    }

    /// Velocity direction is unit length and finite.
    #[test]
    fn prop_velocity_direction_unit(
        e in 0.0f64..0.95,
        m in 0.0f64..TAU,
    ) {
        let elements = OrbitalElements::circular(10.0, 1.0).with_eccentricity(e).with_tilt(0.4);
        let dir = elements.velocity_direction(m);
        prop_assert!((dir.length() - 1.0).abs() < 1e-9);
    }

    /// Every built-in body stays finite for arbitrary simulation times.
    #[test]
    fn prop_builtin_system_finite(time in 0.0f64..1.0e8) {
        let system = SolarSystem::default();
        let positions = system.positions_at(time).unwrap();
        prop_assert!(positions.iter().all(|p| p.is_finite()));
    }
}
