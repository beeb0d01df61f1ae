use std::time::Duration;

use crate::gauge::{GaugeReading, GaugeState};

/// Two readings closer than this are the same value.
pub const STABLE_EPSILON: f32 = 0.01;

/// A maximum adopted by [`GaugeLearner::observe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxUpdate {
    pub previous: Option<f32>,
    pub max: f32,
    pub threshold: f32,
}

/// Learns the gauge maximum from readings that hold still.
///
/// Two hysteresis windows:
/// - `quick_stable`: a stable value above the known maximum (or with no maximum
///   yet) is adopted after this long. Catches buffs and level-ups quickly.
/// - `required_stable`: any stable value differing from the maximum is adopted
///   after this long, in either direction. Corrects a stale maximum.
///
/// Only increases take the fast path.
#[derive(Debug, Clone)]
pub struct GaugeLearner {
    quick_stable: Duration,
    required_stable: Duration,
    threshold_pct: f32,
}

impl GaugeLearner {
    pub fn new(quick_stable: Duration, required_stable: Duration, threshold_pct: f32) -> Self {
        Self {
            quick_stable,
            required_stable,
            threshold_pct,
        }
    }

    /// Seed the maximum from a single reading (first read after resolving).
    ///
    /// Returns `None` for non-positive readings, which leave `state` untouched.
    pub fn seed(&self, value: f32, state: &mut GaugeState) -> Option<MaxUpdate> {
        if value <= 0.0 {
            return None;
        }
        Some(self.adopt(value, state))
    }

    /// Feed one reading. Returns the new maximum if one was adopted.
    pub fn observe(&self, reading: &GaugeReading, state: &mut GaugeState) -> Option<MaxUpdate> {
        let value = reading.value;

        // Between valid game states (dead, loading)
        if value <= 0.0 {
            state.clear_stability();
            return None;
        }

        let changed = state
            .last_stable_value
            .is_none_or(|last| (value - last).abs() > STABLE_EPSILON);
        if changed {
            state.last_stable_value = Some(value);
            state.stable_since = Some(reading.timestamp);
            return None;
        }

        let since = state.stable_since?;
        let stable_for = reading.timestamp.saturating_duration_since(since);

        let above_max = state.current_max.is_none_or(|max| value > max);
        if stable_for >= self.quick_stable && above_max {
            return Some(self.adopt(value, state));
        }

        let differs = state
            .current_max
            .is_none_or(|max| (value - max).abs() > STABLE_EPSILON);
        if stable_for >= self.required_stable && differs {
            return Some(self.adopt(value, state));
        }

        None
    }

    fn adopt(&self, value: f32, state: &mut GaugeState) -> MaxUpdate {
        let previous = state.current_max;
        state.adopt_max(value, self.threshold_pct);
        MaxUpdate {
            previous,
            max: value,
            threshold: value * self.threshold_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const STEP: Duration = Duration::from_millis(100);

    fn learner() -> GaugeLearner {
        GaugeLearner::new(Duration::from_secs(1), Duration::from_secs(5), 0.6)
    }

    /// Feed `value` every 100ms for `duration`, starting at `start`.
    /// Returns the time of the last reading.
    fn feed(
        learner: &GaugeLearner,
        state: &mut GaugeState,
        value: f32,
        start: Instant,
        duration: Duration,
    ) -> Instant {
        let mut t = start;
        let end = start + duration;
        loop {
            learner.observe(&GaugeReading::new(value, t), state);
            if t >= end {
                return t;
            }
            t += STEP;
        }
    }

    #[test]
    fn test_first_reading_starts_timer() {
        let learner = learner();
        let mut state = GaugeState::default();
        let t0 = Instant::now();

        let update = learner.observe(&GaugeReading::new(800.0, t0), &mut state);

        assert_eq!(update, None);
        assert_eq!(state.last_stable_value, Some(800.0));
        assert_eq!(state.stable_since, Some(t0));
        assert_eq!(state.current_max, None);
    }

    #[test]
    fn test_fast_adopt_when_no_max() {
        let learner = learner();
        let mut state = GaugeState::default();

        feed(&learner, &mut state, 900.0, Instant::now(), Duration::from_secs(1));

        assert_eq!(state.current_max, Some(900.0));
        assert_eq!(state.threshold, Some(900.0 * 0.6));
    }

    #[test]
    fn test_fast_adopt_rising_value() {
        let learner = learner();
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);

        let t0 = Instant::now();
        learner.observe(&GaugeReading::new(1200.0, t0), &mut state);
        let update = learner.observe(
            &GaugeReading::new(1200.0, t0 + Duration::from_secs(1)),
            &mut state,
        );

        assert_eq!(
            update,
            Some(MaxUpdate {
                previous: Some(1000.0),
                max: 1200.0,
                threshold: 1200.0 * 0.6,
            })
        );
        assert_eq!(state.current_max, Some(1200.0));
        assert_eq!(state.threshold, Some(720.0));
    }

    #[test]
    fn test_rising_value_not_adopted_before_quick_duration() {
        let learner = learner();
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);

        feed(&learner, &mut state, 1200.0, Instant::now(), Duration::from_millis(900));

        assert_eq!(state.current_max, Some(1000.0));
    }

    #[test]
    fn test_lower_value_waits_for_required_duration() {
        let learner = learner();
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);
        let t0 = Instant::now();

        // Fast path only applies to increases
        feed(&learner, &mut state, 700.0, t0, Duration::from_millis(4900));
        assert_eq!(state.current_max, Some(1000.0));

        learner.observe(
            &GaugeReading::new(700.0, t0 + Duration::from_secs(5)),
            &mut state,
        );
        assert_eq!(state.current_max, Some(700.0));
        assert_eq!(state.threshold, Some(700.0 * 0.6));
    }

    #[test]
    fn test_slow_adopt_any_direction() {
        let learner = learner();
        for value in [400.0_f32, 1600.0] {
            let mut state = GaugeState::default();
            state.adopt_max(1000.0, 0.6);

            feed(&learner, &mut state, value, Instant::now(), Duration::from_secs(5));

            assert_eq!(state.current_max, Some(value));
        }
    }

    #[test]
    fn test_same_as_max_does_not_readopt() {
        let learner = learner();
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);
        state.triggered = true;

        feed(&learner, &mut state, 1000.0, Instant::now(), Duration::from_secs(6));

        assert_eq!(state.current_max, Some(1000.0));
        assert!(state.triggered);
    }

    #[test]
    fn test_fluctuating_value_never_adopted() {
        let learner = learner();
        let mut state = GaugeState::default();
        let mut t = Instant::now();

        for i in 0..100 {
            let value = if i % 2 == 0 { 500.0 } else { 510.0 };
            learner.observe(&GaugeReading::new(value, t), &mut state);
            t += STEP;
        }

        assert_eq!(state.current_max, None);
    }

    #[test]
    fn test_non_positive_reading_clears_stability() {
        let learner = learner();
        let mut state = GaugeState::default();
        let t0 = Instant::now();

        learner.observe(&GaugeReading::new(800.0, t0), &mut state);
        learner.observe(&GaugeReading::new(0.0, t0 + STEP), &mut state);

        assert_eq!(state.last_stable_value, None);
        assert_eq!(state.stable_since, None);

        // Timer restarts: 800 is fresh again
        learner.observe(
            &GaugeReading::new(800.0, t0 + Duration::from_secs(2)),
            &mut state,
        );
        assert_eq!(state.current_max, None);
        assert_eq!(state.stable_since, Some(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_adopt_clears_triggered() {
        let learner = learner();
        let mut state = GaugeState::default();
        state.adopt_max(1000.0, 0.6);
        state.triggered = true;

        feed(&learner, &mut state, 1500.0, Instant::now(), Duration::from_secs(1));

        assert_eq!(state.current_max, Some(1500.0));
        assert!(!state.triggered);
    }

    #[test]
    fn test_seed() {
        let learner = learner();
        let mut state = GaugeState::default();

        assert_eq!(learner.seed(0.0, &mut state), None);
        assert_eq!(learner.seed(-5.0, &mut state), None);
        assert_eq!(state.current_max, None);

        let update = learner.seed(1000.0, &mut state).unwrap();
        assert_eq!(update.previous, None);
        assert_eq!(state.current_max, Some(1000.0));
        assert_eq!(state.threshold, Some(600.0));
    }
}
