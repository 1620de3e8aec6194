//! Simulation clock.
//!
//! The clock is the single source of "now" for a tick. Every orbit
//! computation, preview and mission update reads the same `elapsed` value.

use bevy::prelude::*;
use thiserror::Error;

use crate::types::{SimulationSet, TickFault, configure_simulation_sets};

/// Smallest time scale the clock accepts.
pub const MIN_TIME_SCALE: f64 = 0.01;

/// Rejected time-scale request. The clock still applies a usable value.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TimeScaleError {
    #[error("time scale {requested} is not a positive finite number, clamped to {applied}")]
    Clamped { requested: f64, applied: f64 },
}

/// Simulation time resource.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SimulationClock {
    elapsed: f64,
    time_scale: f64,
    paused: bool,
    /// Elapsed value restored by [`SimulationClock::reset`]
    initial: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::starting_at(0.0)
    }
}

/// Copy of the clock state handed to consumers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockSnapshot {
    pub elapsed: f64,
    pub time_scale: f64,
    pub paused: bool,
}

impl SimulationClock {
    /// Create a running clock at the given elapsed time.
    pub fn starting_at(elapsed: f64) -> Self {
        Self {
            elapsed,
            time_scale: 1.0,
            paused: false,
            initial: elapsed,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            elapsed: self.elapsed,
            time_scale: self.time_scale,
            paused: self.paused,
        }
    }

    /// Advance by a real-time delta in seconds.
    ///
    /// No-op while paused. Negative or non-finite deltas are ignored so that
    /// `elapsed` never decreases.
    pub fn advance(&mut self, real_delta_seconds: f64) {
        if self.paused || !real_delta_seconds.is_finite() || real_delta_seconds <= 0.0 {
            return;
        }
        self.elapsed += real_delta_seconds * self.time_scale;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    /// Set the time multiplier.
    ///
    /// Non-positive or non-finite values are clamped to [`MIN_TIME_SCALE`];
    /// the clamp is reported through the returned error.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), TimeScaleError> {
        if scale.is_finite() && scale > 0.0 {
            self.time_scale = scale;
            return Ok(());
        }
        self.time_scale = MIN_TIME_SCALE;
        Err(TimeScaleError::Clamped {
            requested: scale,
            applied: MIN_TIME_SCALE,
        })
    }

    /// Return to the initial elapsed time and pause.
    pub fn reset(&mut self) {
        self.elapsed = self.initial;
        self.paused = true;
    }
}

/// Request to pause or resume simulation time.
#[derive(Message, Clone, Copy, Debug)]
pub struct SetPaused(pub bool);

/// Request to change the time multiplier.
#[derive(Message, Clone, Copy, Debug)]
pub struct SetTimeScale(pub f64);

/// Plugin providing time advancement.
pub struct TimePlugin;

impl Plugin for TimePlugin {
    fn build(&self, app: &mut App) {
        configure_simulation_sets(app);
        app.init_resource::<SimulationClock>()
            .add_message::<SetPaused>()
            .add_message::<SetTimeScale>()
            .add_message::<TickFault>()
            .add_systems(Update, apply_clock_requests.in_set(SimulationSet::Requests))
            .add_systems(Update, advance_clock.in_set(SimulationSet::Clock));
    }
}

fn apply_clock_requests(
    mut clock: ResMut<SimulationClock>,
    mut pause_requests: MessageReader<SetPaused>,
    mut scale_requests: MessageReader<SetTimeScale>,
    mut faults: MessageWriter<TickFault>,
) {
    for SetPaused(paused) in pause_requests.read() {
        if clock.is_paused() != *paused {
            info!("Simulation {}", if *paused { "paused" } else { "resumed" });
        }
        clock.set_paused(*paused);
    }

    for SetTimeScale(scale) in scale_requests.read() {
        match clock.set_time_scale(*scale) {
            Ok(()) => info!("Time scale set to {scale}x"),
            Err(err) => {
                warn!("{err}");
                faults.write(TickFault::new(err.to_string()));
            }
        }
    }
}

/// Advance the clock by the frame's real delta.
fn advance_clock(mut clock: ResMut<SimulationClock>, time: Res<Time>) {
    clock.advance(time.delta_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut clock = SimulationClock::starting_at(12.5);
        clock.set_paused(true);
        clock.advance(3.0);
        clock.advance(100.0);
        assert_eq!(clock.elapsed(), 12.5);
    }

    #[test]
    fn test_doubling_scale_doubles_accumulation() {
        let mut slow = SimulationClock::default();
        let mut fast = SimulationClock::default();
        fast.set_time_scale(2.0).unwrap();

        for _ in 0..60 {
            slow.advance(1.0 / 60.0);
            fast.advance(1.0 / 60.0);
        }

        assert!((fast.elapsed() - 2.0 * slow.elapsed()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_scale_is_clamped() {
        let mut clock = SimulationClock::default();

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = clock.set_time_scale(bad).unwrap_err();
            let TimeScaleError::Clamped { applied, .. } = err;
            assert_eq!(applied, MIN_TIME_SCALE);
            assert_eq!(clock.time_scale(), MIN_TIME_SCALE);
        }

        clock.advance(1.0);
        assert!((clock.elapsed() - MIN_TIME_SCALE).abs() < 1e-12);
    }

    #[test]
    fn test_negative_delta_ignored() {
        let mut clock = SimulationClock::default();
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_reset_restores_initial_and_pauses() {
        let mut clock = SimulationClock::starting_at(5.0);
        clock.advance(10.0);
        clock.reset();
        assert_eq!(clock.elapsed(), 5.0);
        assert!(clock.is_paused());
        clock.toggle_paused();
        assert!(!clock.is_paused());
    }
}
