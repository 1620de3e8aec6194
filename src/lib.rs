//! Orrery - Solar System orbital mechanics core
//!
//! Simulation time, Keplerian body positions with hierarchical reference
//! frames, impulsive transfer planning, path previews and mission
//! sequencing, packaged as Bevy plugins. Rendering and UI live elsewhere;
//! they read the resources and messages exposed here.

pub mod config;
pub mod ephemeris;
pub mod mission;
pub mod time;
pub mod trajectory;
pub mod transfer;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use bevy::prelude::*;

use ephemeris::EphemerisPlugin;
use mission::MissionPlugin;
use time::TimePlugin;

/// Everything: clock, body resolution and missions, chained per tick in
/// [`types::SimulationSet`] order.
pub struct OrreryPlugin;

impl Plugin for OrreryPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((TimePlugin, EphemerisPlugin, MissionPlugin));
    }
}
