//! Static body table for the built-in solar system.
//!
//! Distances are scene units (the Sun has radius 20, Earth orbits at 70).
//! Angular rates are radians per simulation-time unit.

use super::kepler::OrbitalElements;
use crate::types::{DEG_TO_RAD, GRAVITATIONAL_PARAMETER};

/// Broad category of a body, used for display grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyKind {
    Star,
    Planet,
    DwarfPlanet,
    Moon,
    Spacecraft,
}

/// Orbit center by configuration id, before resolution to indices.
#[derive(Clone, Debug, PartialEq)]
pub enum CenterRef {
    Origin,
    Body(String),
    Derived(String),
}

/// An orbit as written in configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitDefinition {
    pub elements: OrbitalElements,
    pub center: CenterRef,
}

/// Static data for one body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDefinition {
    pub id: String,
    pub name: String,
    pub kind: BodyKind,
    /// Display radius in scene units
    pub radius: f64,
    /// Gravitational parameter in scene units, zero for spacecraft
    pub gravitational_parameter: f64,
    /// Spin rate in radians per simulation-time unit
    pub rotation_rate: Option<f64>,
    /// `None` keeps the body fixed at the origin
    pub orbit: Option<OrbitDefinition>,
}

/// A collinear offset point, by configuration id.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedPointDefinition {
    pub id: String,
    /// `None` means the origin
    pub primary: Option<String>,
    pub anchor: String,
    pub distance: f64,
}

/// Complete static description of a system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemCatalog {
    pub bodies: Vec<BodyDefinition>,
    pub derived: Vec<DerivedPointDefinition>,
}

/// Distance of the Sun–Earth L2 point beyond Earth.
pub const EARTH_L2_DISTANCE: f64 = 25.0;

/// Size is `(radius, mass relative to the Sun)`.
fn body(
    id: &str,
    name: &str,
    kind: BodyKind,
    (radius, mass_ratio): (f64, f64),
    rotation_rate: f64,
    orbit: Option<OrbitDefinition>,
) -> BodyDefinition {
    BodyDefinition {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        radius,
        gravitational_parameter: GRAVITATIONAL_PARAMETER * mass_ratio,
        rotation_rate: (rotation_rate != 0.0).then_some(rotation_rate),
        orbit,
    }
}

fn around(center: CenterRef, elements: OrbitalElements) -> Option<OrbitDefinition> {
    Some(OrbitDefinition { elements, center })
}

fn heliocentric(
    radius: f64,
    rate: f64,
    eccentricity: f64,
    tilt_deg: f64,
    phase: f64,
) -> Option<OrbitDefinition> {
    around(
        CenterRef::Origin,
        OrbitalElements::circular(radius, rate)
            .with_eccentricity(eccentricity)
            .with_tilt(tilt_deg * DEG_TO_RAD)
            .with_epoch_anomaly(phase),
    )
}

/// The built-in Sun, planets, Moon, Pluto, ISS and JWST with the L2 point.
#[rustfmt::skip]
pub fn builtin_catalog() -> SystemCatalog {
    use BodyKind::*;

    let bodies = vec![
        body("sun", "Sun", Star, (20.0, 1.0), 0.0001, None),
        body("mercury", "Mercury", Planet, (2.0, 1.660e-7), 0.0005, heliocentric(35.0, 0.00047, 0.2056, 7.0, 0.0)),
        body("venus", "Venus", Planet, (3.8, 2.448e-6), 0.0002, heliocentric(50.0, 0.00035, 0.0068, 3.4, 0.9)),
        body("earth", "Earth", Planet, (4.0, 3.003e-6), 0.001, heliocentric(70.0, 0.0003, 0.0167, 0.0, 1.8)),
        body(
            "moon",
            "Moon",
            Moon,
            (1.1, 3.694e-8),
            0.0001,
            around(
                CenterRef::Body("earth".into()),
                OrbitalElements::circular(6.0, 0.001)
                    .with_eccentricity(0.0549)
                    .with_tilt(5.1 * DEG_TO_RAD),
            ),
        ),
        body("mars", "Mars", Planet, (3.5, 3.227e-7), 0.0009, heliocentric(90.0, 0.00024, 0.0934, 1.85, 2.6)),
        body("jupiter", "Jupiter", Planet, (8.0, 9.546e-4), 0.002, heliocentric(130.0, 0.00013, 0.0489, 1.3, 3.5)),
        body("saturn", "Saturn", Planet, (7.0, 2.858e-4), 0.0018, heliocentric(170.0, 0.00009, 0.0565, 2.5, 4.3)),
        body("uranus", "Uranus", Planet, (5.5, 4.366e-5), 0.0014, heliocentric(200.0, 0.00006, 0.0457, 0.8, 5.0)),
        body("neptune", "Neptune", Planet, (5.3, 5.151e-5), 0.0015, heliocentric(230.0, 0.00004, 0.0113, 1.8, 5.7)),
        body("pluto", "Pluto", DwarfPlanet, (1.0, 6.58e-9), 0.0003, heliocentric(260.0, 0.00003, 0.2488, 17.2, 0.4)),
        body(
            "iss",
            "International Space Station",
            Spacecraft,
            (0.2, 0.0),
            0.0,
            around(
                CenterRef::Body("earth".into()),
                OrbitalElements::circular(2.0, 0.005).with_tilt(51.6 * DEG_TO_RAD),
            ),
        ),
        body(
            "jwst",
            "James Webb Telescope",
            Spacecraft,
            (0.3, 0.0),
            0.0001,
            around(
                CenterRef::Derived("earth-l2".into()),
                OrbitalElements::circular(3.0, 0.002)
                    .with_eccentricity(0.3)
                    .with_tilt(30.0 * DEG_TO_RAD)
                    .with_epoch_anomaly(3.0),
            ),
        ),
    ];

    let derived = vec![DerivedPointDefinition {
        id: "earth-l2".into(),
        primary: Some("sun".into()),
        anchor: "earth".into(),
        distance: EARTH_L2_DISTANCE,
    }];

    SystemCatalog { bodies, derived }
}
