//! Time system - pause, speed multipliers and the per-tick scaled delta

use serde::{Deserialize, Serialize};

use crate::error::TimeError;
use crate::events::{EventBus, GameEvent};

/// Simulation clock state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSystem {
    paused: bool,
    /// Scale applied while running; kept while paused
    scale: f32,
    /// Scaled seconds elapsed since the start of the simulation
    sim_time: f64,
}

impl TimeSystem {
    pub fn new() -> Self {
        Self {
            paused: false,
            scale: 1.0,
            sim_time: 0.0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Configured scale, regardless of pause
    pub fn time_scale(&self) -> f32 {
        self.scale
    }

    /// Scale actually applied to wall-clock time (0 while paused)
    pub fn effective_scale(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            self.scale
        }
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn pause(&mut self, events: &EventBus) {
        let old = self.effective_scale();
        self.paused = true;
        self.notify(old, events);
    }

    pub fn resume(&mut self, events: &EventBus) {
        let old = self.effective_scale();
        self.paused = false;
        self.notify(old, events);
    }

    /// Change the scale. While paused the new value is stored and applies on resume.
    pub fn set_time_scale(&mut self, scale: f32, events: &EventBus) -> Result<(), TimeError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TimeError::InvalidScale(scale));
        }
        let old = self.effective_scale();
        self.scale = scale;
        self.notify(old, events);
        Ok(())
    }

    /// Move to the next preset after the current scale, wrapping around
    pub fn cycle_speed(&mut self, presets: &[f32], events: &EventBus) -> Result<f32, TimeError> {
        let next = presets
            .iter()
            .copied()
            .find(|p| *p > self.scale)
            .or_else(|| presets.first().copied())
            .unwrap_or(self.scale);
        self.set_time_scale(next, events)?;
        Ok(next)
    }

    /// Convert a wall-clock delta to simulation seconds and advance the clock
    pub fn advance(&mut self, wall_delta: f32) -> f32 {
        let scaled = wall_delta.max(0.0) * self.effective_scale();
        self.sim_time += scaled as f64;
        scaled
    }

    fn notify(&self, old: f32, events: &EventBus) {
        let new = self.effective_scale();
        if old != new {
            tracing::debug!(old, new, "time scale changed");
            events.emit(GameEvent::TimeScaleChanged { old, new });
        }
    }
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self::new()
    }
}
