//! Orbit centers that move.
//!
//! A body orbits the origin, another body, or a derived point whose position
//! is computed from two bodies each pass (a collinear offset such as the
//! Sun–Earth L2 point).

use bevy::math::DVec3;

use crate::types::BodyIndex;

/// Index of a derived point in the resolver's point table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedIndex(pub u32);

impl DerivedIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// What an orbit is centered on, resolved to a dense index at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceCenter {
    /// Scene origin
    Origin,
    /// Current position of another body
    Body(BodyIndex),
    /// Current position of a derived point
    Derived(DerivedIndex),
}

/// Either end of a derived-point offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointAnchor {
    Origin,
    Body(BodyIndex),
}

/// A synthetic point placed `distance` beyond `anchor` on the line from
/// `primary` through `anchor`.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedPoint {
    pub id: String,
    pub primary: PointAnchor,
    pub anchor: BodyIndex,
    pub distance: f64,
}

impl DerivedPoint {
    /// Position of the point given the current primary and anchor positions.
    ///
    /// When the two coincide there is no direction; the anchor is returned.
    pub fn resolve(&self, primary: DVec3, anchor: DVec3) -> DVec3 {
        collinear_offset(primary, anchor, self.distance)
    }
}

/// `anchor + normalize(anchor - primary) * distance`, or `anchor` when the
/// direction is undefined.
pub fn collinear_offset(primary: DVec3, anchor: DVec3, distance: f64) -> DVec3 {
    match (anchor - primary).try_normalize() {
        Some(direction) => anchor + direction * distance,
        None => anchor,
    }
}

/// Resolve a center against positions already computed in this pass.
///
/// Dependency order guarantees that every referenced body and point has
/// been written before it is read.
pub fn resolve_center(center: ReferenceCenter, bodies: &[DVec3], points: &[DVec3]) -> DVec3 {
    match center {
        ReferenceCenter::Origin => DVec3::ZERO,
        ReferenceCenter::Body(index) => bodies[index.get()],
        ReferenceCenter::Derived(index) => points[index.get()],
    }
}

/// Resolve a derived-point end against the current pass.
pub fn resolve_anchor(anchor: PointAnchor, bodies: &[DVec3]) -> DVec3 {
    match anchor {
        PointAnchor::Origin => DVec3::ZERO,
        PointAnchor::Body(index) => bodies[index.get()],
    }
}
