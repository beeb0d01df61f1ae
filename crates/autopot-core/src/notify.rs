//! Throttling for repeated diagnostics.

use std::time::{Duration, Instant};

/// Suppresses identical diagnostics inside a cooldown window.
///
/// A message passes if its text differs from the last emitted one, or if the
/// cooldown has elapsed since that emission. Retries are never throttled,
/// only the log lines they produce.
#[derive(Debug, Clone)]
pub struct RateLimitedNotifier {
    cooldown: Duration,
    last: Option<(String, Instant)>,
    suppressed: usize,
}

impl RateLimitedNotifier {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
            suppressed: 0,
        }
    }

    /// Returns `true` if `message` should be emitted now, and records it if so.
    pub fn should_emit(&mut self, message: &str, now: Instant) -> bool {
        let emit = match &self.last {
            Some((text, at)) => {
                text != message || now.saturating_duration_since(*at) > self.cooldown
            }
            None => true,
        };
        if emit {
            self.last = Some((message.to_string(), now));
            self.suppressed = 0;
        } else {
            self.suppressed += 1;
        }
        emit
    }

    /// Messages held back since the last one that passed.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Forget the last message so the next one always passes.
    pub fn clear(&mut self) {
        self.last = None;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_passes() {
        let mut notifier = RateLimitedNotifier::new(Duration::from_secs(15));
        assert!(notifier.should_emit("Module not found", Instant::now()));
    }

    #[test]
    fn test_duplicate_suppressed_until_cooldown() {
        let mut notifier = RateLimitedNotifier::new(Duration::from_secs(15));
        let t0 = Instant::now();

        assert!(notifier.should_emit("broken", t0));
        assert!(!notifier.should_emit("broken", t0 + Duration::from_secs(1)));
        assert!(!notifier.should_emit("broken", t0 + Duration::from_secs(15)));
        assert_eq!(notifier.suppressed(), 2);
        assert!(notifier.should_emit("broken", t0 + Duration::from_millis(15_001)));
        assert_eq!(notifier.suppressed(), 0);
    }

    #[test]
    fn test_changed_text_passes_immediately() {
        let mut notifier = RateLimitedNotifier::new(Duration::from_secs(15));
        let t0 = Instant::now();

        assert!(notifier.should_emit("hop 1", t0));
        assert!(notifier.should_emit("hop 2", t0));
        assert!(notifier.should_emit("hop 1", t0));
    }

    #[test]
    fn test_clear() {
        let mut notifier = RateLimitedNotifier::new(Duration::from_secs(15));
        let t0 = Instant::now();

        assert!(notifier.should_emit("x", t0));
        notifier.clear();
        assert!(notifier.should_emit("x", t0));
    }
}
