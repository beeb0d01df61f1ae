//! Potion trigger: threshold plus cooldown.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::gauge::GaugeState;
use crate::input::{InputSink, PotionKey};

/// Decides when to press the potion key and remembers when it last did.
#[derive(Debug, Clone)]
pub struct TriggerController {
    cooldown: Duration,
    key: PotionKey,
    last_trigger: Option<Instant>,
}

impl TriggerController {
    pub fn new(key: PotionKey, cooldown: Duration) -> Self {
        Self {
            cooldown,
            key,
            last_trigger: None,
        }
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Whether the cooldown has elapsed at `now` (inclusive).
    pub fn cooled_down(&self, now: Instant) -> bool {
        self.last_trigger
            .is_none_or(|last| now.saturating_duration_since(last) >= self.cooldown)
    }

    /// Press the key if `current` is below the learned threshold and the
    /// cooldown has elapsed. Returns whether the key was pressed.
    ///
    /// A failed key press still counts as fired so a broken input path cannot
    /// spam retries every poll.
    pub fn maybe_trigger<I>(
        &mut self,
        input: &I,
        current: f32,
        state: &GaugeState,
        now: Instant,
    ) -> bool
    where
        I: InputSink + ?Sized,
    {
        let (Some(max), Some(threshold)) = (state.current_max, state.threshold) else {
            return false;
        };
        if current >= threshold || !self.cooled_down(now) {
            return false;
        }

        if let Err(e) = input.send_key(&self.key) {
            warn!("Failed to press potion key '{}': {}", self.key, e);
        }
        self.last_trigger = Some(now);
        info!("Potion used at HP {:.0}/{:.0}", current, max);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mock::RecordingInput;

    fn controller() -> TriggerController {
        TriggerController::new("1".parse().unwrap(), Duration::from_millis(200))
    }

    fn learned(max: f32) -> GaugeState {
        let mut state = GaugeState::default();
        state.adopt_max(max, 0.6);
        state
    }

    #[test]
    fn test_cooldown_limits_firings() {
        let mut trigger = controller();
        let input = RecordingInput::new();
        let state = learned(1000.0);
        let t0 = Instant::now();

        let fired = (0..=10)
            .filter(|i| {
                let now = t0 + Duration::from_millis(100 * i);
                trigger.maybe_trigger(&input, 100.0, &state, now)
            })
            .count();

        // t = 0.0, 0.2, 0.4, 0.6, 0.8, 1.0
        assert_eq!(fired, 6);
        assert_eq!(input.count(), 6);
    }

    #[test]
    fn test_no_trigger_without_max() {
        let mut trigger = controller();
        let input = RecordingInput::new();

        assert!(!trigger.maybe_trigger(&input, 1.0, &GaugeState::default(), Instant::now()));
        assert_eq!(input.count(), 0);
    }

    #[test]
    fn test_only_below_threshold() {
        let mut trigger = controller();
        let input = RecordingInput::new();
        let state = learned(1000.0);
        let t0 = Instant::now();

        assert!(!trigger.maybe_trigger(&input, 600.0, &state, t0));
        assert!(!trigger.maybe_trigger(&input, 900.0, &state, t0));
        assert!(trigger.maybe_trigger(&input, 599.0, &state, t0));
        assert_eq!(trigger.last_trigger(), Some(t0));
        assert_eq!(input.sent(), vec!["1"]);
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let mut trigger = controller();
        let input = RecordingInput::new();
        let state = learned(1000.0);
        let t0 = Instant::now();

        assert!(trigger.maybe_trigger(&input, 100.0, &state, t0));
        assert!(!trigger.maybe_trigger(&input, 100.0, &state, t0 + Duration::from_millis(199)));
        assert!(trigger.maybe_trigger(&input, 100.0, &state, t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_failed_press_still_counts() {
        let mut trigger = controller();
        let input = RecordingInput::new();
        input.set_failing(true);
        let state = learned(1000.0);
        let t0 = Instant::now();

        assert!(trigger.maybe_trigger(&input, 100.0, &state, t0));
        assert!(!trigger.maybe_trigger(&input, 100.0, &state, t0 + Duration::from_millis(100)));
        assert_eq!(input.count(), 1);
    }
}
