//! Ephemeris module for computing body positions every tick.
//!
//! Bodies orbit the origin, another body, or a derived point. The dependency
//! graph is validated and topologically sorted once at load time; each pass
//! then walks that order so every center is resolved before the bodies that
//! orbit it.

pub mod data;
pub mod frames;
pub mod kepler;

#[cfg(test)]
mod proptest_ephemeris;

pub use data::{BodyDefinition, BodyKind, CenterRef, SystemCatalog, builtin_catalog};
pub use frames::{DerivedIndex, DerivedPoint, PointAnchor, ReferenceCenter};
pub use kepler::{ElementsError, OrbitalElements};

use bevy::math::DVec3;
use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

use crate::time::SimulationClock;
use crate::trajectory::{self, TrajectorySpec};
use crate::types::{
    BodyIndex, BodyState, SimulationSet, TickFault, configure_simulation_sets, wrap_angle,
};

/// Errors raised while loading or resolving a system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("duplicate id `{0}`")]
    DuplicateId(String),
    #[error("body `{body}` has invalid orbital elements: {source}")]
    InvalidElements {
        body: String,
        #[source]
        source: ElementsError,
    },
    #[error("body `{id}` must have a positive radius, got {radius}")]
    InvalidRadius { id: String, radius: f64 },
    #[error("body `{id}` must have a non-negative gravitational parameter, got {value}")]
    InvalidGravitationalParameter { id: String, value: f64 },
    #[error("derived point `{id}` must have a non-negative finite distance, got {distance}")]
    InvalidDistance { id: String, distance: f64 },
    #[error("`{from}` references unknown id `{to}`")]
    UnknownReference { from: String, to: String },
    #[error("`{0}` is centered on itself")]
    SelfReference(String),
    #[error("orbit dependency cycle through {0:?}")]
    DependencyCycle(Vec<String>),
    #[error("resolution produced a non-finite position for `{id}` at t={time}")]
    NonFinitePosition { id: String, time: f64 },
}

/// One step of the resolution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Body(BodyIndex),
    Point(DerivedIndex),
}

/// Resource holding the static body table and the positions of the last
/// successful resolution pass.
#[derive(Resource, Clone, Debug)]
pub struct SolarSystem {
    definitions: Vec<BodyDefinition>,
    orbits: Vec<Option<(OrbitalElements, ReferenceCenter)>>,
    points: Vec<DerivedPoint>,
    order: Vec<Step>,
    body_ids: HashMap<String, BodyIndex>,
    point_ids: HashMap<String, DerivedIndex>,

    states: Vec<BodyState>,
    point_positions: Vec<DVec3>,
    resolved_at: f64,

    // Reused each pass; committed only when the whole pass is finite.
    scratch_bodies: Vec<DVec3>,
    scratch_points: Vec<DVec3>,
}

impl Default for SolarSystem {
    fn default() -> Self {
        match Self::from_catalog(builtin_catalog()) {
            Ok(system) => system,
            Err(err) => {
                error!("Built-in solar system failed to load: {err}");
                Self::empty()
            }
        }
    }
}

impl SolarSystem {
    /// A system with no bodies.
    pub fn empty() -> Self {
        Self {
            definitions: Vec::new(),
            orbits: Vec::new(),
            points: Vec::new(),
            order: Vec::new(),
            body_ids: HashMap::new(),
            point_ids: HashMap::new(),
            states: Vec::new(),
            point_positions: Vec::new(),
            resolved_at: 0.0,
            scratch_bodies: Vec::new(),
            scratch_points: Vec::new(),
        }
    }

    /// Validate a catalog, build the resolution order and resolve at t=0.
    pub fn from_catalog(catalog: SystemCatalog) -> Result<Self, SystemError> {
        let SystemCatalog { bodies, derived } = catalog;

        let mut body_ids = HashMap::with_capacity(bodies.len());
        for (i, def) in bodies.iter().enumerate() {
            if body_ids.insert(def.id.clone(), BodyIndex(i as u32)).is_some() {
                return Err(SystemError::DuplicateId(def.id.clone()));
            }
        }

        let mut point_ids = HashMap::with_capacity(derived.len());
        for (i, def) in derived.iter().enumerate() {
            if body_ids.contains_key(&def.id)
                || point_ids.insert(def.id.clone(), DerivedIndex(i as u32)).is_some()
            {
                return Err(SystemError::DuplicateId(def.id.clone()));
            }
        }

        let lookup_body = |from: &str, to: &str| {
            body_ids
                .get(to)
                .copied()
                .ok_or_else(|| SystemError::UnknownReference {
                    from: from.to_string(),
                    to: to.to_string(),
                })
        };

        let mut points = Vec::with_capacity(derived.len());
        for def in &derived {
            if !(def.distance.is_finite() && def.distance >= 0.0) {
                return Err(SystemError::InvalidDistance {
                    id: def.id.clone(),
                    distance: def.distance,
                });
            }
            let primary = match &def.primary {
                None => PointAnchor::Origin,
                Some(id) => PointAnchor::Body(lookup_body(&def.id, id)?),
            };
            points.push(DerivedPoint {
                id: def.id.clone(),
                primary,
                anchor: lookup_body(&def.id, &def.anchor)?,
                distance: def.distance,
            });
        }

        let mut orbits = Vec::with_capacity(bodies.len());
        for def in &bodies {
            if !(def.radius.is_finite() && def.radius > 0.0) {
                return Err(SystemError::InvalidRadius {
                    id: def.id.clone(),
                    radius: def.radius,
                });
            }
            if !(def.gravitational_parameter.is_finite() && def.gravitational_parameter >= 0.0) {
                return Err(SystemError::InvalidGravitationalParameter {
                    id: def.id.clone(),
                    value: def.gravitational_parameter,
                });
            }
            let Some(orbit) = &def.orbit else {
                orbits.push(None);
                continue;
            };
            orbit
                .elements
                .validate()
                .map_err(|source| SystemError::InvalidElements {
                    body: def.id.clone(),
                    source,
                })?;
            let center = match &orbit.center {
                CenterRef::Origin => ReferenceCenter::Origin,
                CenterRef::Body(id) if *id == def.id => {
                    return Err(SystemError::SelfReference(def.id.clone()));
                }
                CenterRef::Body(id) => ReferenceCenter::Body(lookup_body(&def.id, id)?),
                CenterRef::Derived(id) => {
                    let index = point_ids.get(id).copied().ok_or_else(|| {
                        SystemError::UnknownReference {
                            from: def.id.clone(),
                            to: id.clone(),
                        }
                    })?;
                    ReferenceCenter::Derived(index)
                }
            };
            orbits.push(Some((orbit.elements, center)));
        }

        let order = resolution_order(&bodies, &orbits, &points)?;

        let mut system = Self {
            states: bodies
                .iter()
                .map(|def| BodyState::new(def.id.clone(), DVec3::ZERO))
                .collect(),
            point_positions: vec![DVec3::ZERO; points.len()],
            scratch_bodies: vec![DVec3::ZERO; bodies.len()],
            scratch_points: vec![DVec3::ZERO; points.len()],
            definitions: bodies,
            orbits,
            points,
            order,
            body_ids,
            point_ids,
            resolved_at: 0.0,
        };
        system.resolve_all(0.0)?;

        info!(
            "Loaded solar system: {} bodies, {} derived points",
            system.definitions.len(),
            system.points.len()
        );
        Ok(system)
    }

    /// Recompute every body at `elapsed`.
    ///
    /// The pass writes into scratch buffers. On failure the positions of the
    /// previous successful pass are kept and the error is returned.
    pub fn resolve_all(&mut self, elapsed: f64) -> Result<(), SystemError> {
        let mut bodies = std::mem::take(&mut self.scratch_bodies);
        let mut points = std::mem::take(&mut self.scratch_points);
        let result = self.evaluate(elapsed, &mut bodies, &mut points);

        if result.is_ok() {
            for ((state, position), def) in self
                .states
                .iter_mut()
                .zip(&bodies)
                .zip(&self.definitions)
            {
                state.position = *position;
                state.rotation_angle = def.rotation_rate.map(|rate| wrap_angle(elapsed * rate));
            }
            std::mem::swap(&mut self.point_positions, &mut points);
            self.resolved_at = elapsed;
        }

        self.scratch_bodies = bodies;
        self.scratch_points = points;
        result
    }

    /// Positions of every body at an arbitrary time, indexed by [`BodyIndex`].
    ///
    /// Does not touch the per-tick state; used for previews.
    pub fn positions_at(&self, time: f64) -> Result<Vec<DVec3>, SystemError> {
        let mut bodies = vec![DVec3::ZERO; self.definitions.len()];
        let mut points = vec![DVec3::ZERO; self.points.len()];
        self.evaluate(time, &mut bodies, &mut points)?;
        Ok(bodies)
    }

    fn evaluate(
        &self,
        time: f64,
        bodies: &mut [DVec3],
        points: &mut [DVec3],
    ) -> Result<(), SystemError> {
        for step in &self.order {
            match *step {
                Step::Body(index) => {
                    let position = match &self.orbits[index.get()] {
                        None => DVec3::ZERO,
                        Some((elements, center)) => {
                            let center = frames::resolve_center(*center, bodies, points);
                            elements.position_at(center, time)
                        }
                    };
                    if !position.is_finite() {
                        return Err(SystemError::NonFinitePosition {
                            id: self.definitions[index.get()].id.clone(),
                            time,
                        });
                    }
                    bodies[index.get()] = position;
                }
                Step::Point(index) => {
                    let point = &self.points[index.get()];
                    let primary = frames::resolve_anchor(point.primary, bodies);
                    let anchor = bodies[point.anchor.get()];
                    points[index.get()] = point.resolve(primary, anchor);
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Elapsed time of the last successful pass.
    pub fn resolved_at(&self) -> f64 {
        self.resolved_at
    }

    pub fn index_of(&self, id: &str) -> Option<BodyIndex> {
        self.body_ids.get(id).copied()
    }

    pub fn definition(&self, index: BodyIndex) -> Option<&BodyDefinition> {
        self.definitions.get(index.get())
    }

    pub fn definitions(&self) -> &[BodyDefinition] {
        &self.definitions
    }

    pub fn states(&self) -> &[BodyState] {
        &self.states
    }

    pub fn state(&self, index: BodyIndex) -> Option<&BodyState> {
        self.states.get(index.get())
    }

    pub fn position(&self, index: BodyIndex) -> Option<DVec3> {
        self.states.get(index.get()).map(|s| s.position)
    }

    pub fn position_by_id(&self, id: &str) -> Option<DVec3> {
        self.index_of(id).and_then(|index| self.position(index))
    }

    /// Current position of a derived point such as `earth-l2`.
    pub fn derived_position(&self, id: &str) -> Option<DVec3> {
        let index = self.point_ids.get(id)?;
        self.point_positions.get(index.get()).copied()
    }

    /// Elements and center of a body's orbit, `None` for fixed bodies.
    pub fn orbit_of(&self, index: BodyIndex) -> Option<&(OrbitalElements, ReferenceCenter)> {
        self.orbits.get(index.get())?.as_ref()
    }

    /// Polyline of a body's orbit around its center as resolved at `time`.
    ///
    /// Returns `point_count + 1` points with the last equal to the first.
    pub fn orbit_path(
        &self,
        id: &str,
        time: f64,
        point_count: usize,
    ) -> Option<Result<Vec<DVec3>, SystemError>> {
        let index = self.index_of(id)?;
        let (elements, center) = *self.orbit_of(index)?;

        let center = match center {
            ReferenceCenter::Origin => DVec3::ZERO,
            ReferenceCenter::Body(_) | ReferenceCenter::Derived(_) => {
                let mut bodies = vec![DVec3::ZERO; self.definitions.len()];
                let mut points = vec![DVec3::ZERO; self.points.len()];
                if let Err(err) = self.evaluate(time, &mut bodies, &mut points) {
                    return Some(Err(err));
                }
                frames::resolve_center(center, &bodies, &points)
            }
        };

        Some(Ok(trajectory::sample(
            &TrajectorySpec::ClosedOrbit { center, elements },
            point_count,
        )))
    }
}

/// Kahn's algorithm over bodies and derived points.
fn resolution_order(
    bodies: &[BodyDefinition],
    orbits: &[Option<(OrbitalElements, ReferenceCenter)>],
    points: &[DerivedPoint],
) -> Result<Vec<Step>, SystemError> {
    let body_count = bodies.len();
    let node_count = body_count + points.len();
    let point_node = |index: DerivedIndex| body_count + index.get();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];
    let mut add_edge = |before: usize, after: usize| {
        dependents[before].push(after);
        in_degree[after] += 1;
    };

    for (i, orbit) in orbits.iter().enumerate() {
        match orbit {
            Some((_, ReferenceCenter::Body(center))) => add_edge(center.get(), i),
            Some((_, ReferenceCenter::Derived(point))) => add_edge(point_node(*point), i),
            _ => {}
        }
    }
    for (k, point) in points.iter().enumerate() {
        let node = point_node(DerivedIndex(k as u32));
        if let PointAnchor::Body(primary) = point.primary {
            add_edge(primary.get(), node);
        }
        add_edge(point.anchor.get(), node);
    }

    let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();
    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = queue.pop_front() {
        order.push(if node < body_count {
            Step::Body(BodyIndex(node as u32))
        } else {
            Step::Point(DerivedIndex((node - body_count) as u32))
        });
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < node_count {
        let stuck = (0..node_count)
            .filter(|&n| in_degree[n] > 0)
            .map(|n| {
                if n < body_count {
                    bodies[n].id.clone()
                } else {
                    points[n - body_count].id.clone()
                }
            })
            .collect();
        return Err(SystemError::DependencyCycle(stuck));
    }

    Ok(order)
}

/// Body the presentation layer should keep in view.
#[derive(Resource, Default, Clone, Debug, PartialEq)]
pub struct FocusTarget {
    pub body: Option<BodyIndex>,
}

/// Request to focus a body by id, or clear focus with `None`.
#[derive(Message, Clone, Debug)]
pub struct FocusBody(pub Option<String>);

/// Plugin resolving body positions each tick.
pub struct EphemerisPlugin;

impl Plugin for EphemerisPlugin {
    fn build(&self, app: &mut App) {
        configure_simulation_sets(app);
        app.init_resource::<SolarSystem>()
            .init_resource::<FocusTarget>()
            .add_message::<FocusBody>()
            .add_message::<TickFault>()
            .add_systems(Update, apply_focus_requests.in_set(SimulationSet::Requests))
            .add_systems(Update, resolve_bodies.in_set(SimulationSet::Bodies));
    }
}

fn apply_focus_requests(
    system: Res<SolarSystem>,
    mut focus: ResMut<FocusTarget>,
    mut requests: MessageReader<FocusBody>,
    mut faults: MessageWriter<TickFault>,
) {
    for FocusBody(id) in requests.read() {
        match id {
            None => focus.body = None,
            Some(id) => match system.index_of(id) {
                Some(index) => focus.body = Some(index),
                None => {
                    warn!("Ignoring focus request for unknown body `{id}`");
                    faults.write(TickFault::new(format!("unknown body `{id}`")));
                }
            },
        }
    }
}

/// One dependency-ordered pass per tick.
fn resolve_bodies(
    clock: Res<SimulationClock>,
    mut system: ResMut<SolarSystem>,
    mut faults: MessageWriter<TickFault>,
) {
    if system.resolved_at() == clock.elapsed() && clock.is_paused() {
        return;
    }
    if let Err(err) = system.resolve_all(clock.elapsed()) {
        warn!("Resolution pass failed, keeping previous positions: {err}");
        faults.write(TickFault::new(err.to_string()));
    }
}
