//! Gauge (HP) readings and the learned maximum.

mod learner;

pub use learner::{GaugeLearner, MaxUpdate, STABLE_EPSILON};

use std::time::Instant;

/// One value read from the target, stamped with the time it was read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeReading {
    pub value: f32,
    pub timestamp: Instant,
}

impl GaugeReading {
    pub fn new(value: f32, timestamp: Instant) -> Self {
        Self { value, timestamp }
    }
}

/// Learned state for one monitoring session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaugeState {
    pub current_max: Option<f32>,
    pub threshold: Option<f32>,
    pub last_stable_value: Option<f32>,
    pub stable_since: Option<Instant>,
    /// Set when the action fired against the current maximum
    pub triggered: bool,
}

impl GaugeState {
    /// Drop stability tracking (the next reading starts a fresh timer).
    pub fn clear_stability(&mut self) {
        self.last_stable_value = None;
        self.stable_since = None;
    }

    /// Back to fully unknown.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Set a new maximum and derive the threshold from it.
    pub fn adopt_max(&mut self, max: f32, threshold_pct: f32) {
        self.current_max = Some(max);
        self.threshold = Some(max * threshold_pct);
        self.triggered = false;
        self.clear_stability();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adopt_max_sets_threshold() {
        let mut state = GaugeState::default();
        state.triggered = true;
        state.last_stable_value = Some(10.0);

        state.adopt_max(1000.0, 0.6);

        assert_eq!(state.current_max, Some(1000.0));
        assert_eq!(state.threshold, Some(600.0));
        assert!(!state.triggered);
        assert_eq!(state.last_stable_value, None);
    }

    #[test]
    fn test_clear_stability_keeps_max() {
        let mut state = GaugeState::default();
        state.adopt_max(500.0, 0.5);
        state.last_stable_value = Some(400.0);
        state.stable_since = Some(Instant::now());

        state.clear_stability();

        assert_eq!(state.current_max, Some(500.0));
        assert_eq!(state.stable_since, None);
    }
}
