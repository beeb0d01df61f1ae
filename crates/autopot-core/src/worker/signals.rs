use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Requests {
    reset: bool,
    shutdown: bool,
}

/// Flags shared between the controller (UI, hotkeys, Ctrl+C) and the worker.
///
/// `enabled` is owned by the controller; the worker only reads it. Reset and
/// shutdown requests are set and read under one mutex. A poisoned mutex
/// reads as shutdown.
#[derive(Debug)]
pub struct ControlSignals {
    enabled: AtomicBool,
    requests: Mutex<Requests>,
}

impl ControlSignals {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            requests: Mutex::new(Requests::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip `enabled` and return the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn request_reset(&self) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.reset = true;
        }
    }

    /// Whether a reset is pending, without consuming it.
    pub fn reset_pending(&self) -> bool {
        self.requests.lock().map(|r| r.reset).unwrap_or(false)
    }

    /// Consume a pending reset.
    pub fn take_reset(&self) -> bool {
        match self.requests.lock() {
            Ok(mut requests) => std::mem::take(&mut requests.reset),
            Err(_) => false,
        }
    }

    /// Ask the worker to stop. Sticky: never cleared.
    pub fn request_shutdown(&self) {
        match self.requests.lock() {
            Ok(mut requests) => requests.shutdown = true,
            Err(poisoned) => poisoned.into_inner().shutdown = true,
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.requests.lock().map(|r| r.shutdown).unwrap_or(true)
    }
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let signals = ControlSignals::new(true);
        assert!(signals.is_enabled());
        assert!(!signals.reset_pending());
        assert!(!signals.is_shutting_down());
    }

    #[test]
    fn test_toggle() {
        let signals = ControlSignals::default();
        assert!(signals.toggle());
        assert!(signals.is_enabled());
        assert!(!signals.toggle());
        assert!(!signals.is_enabled());
    }

    #[test]
    fn test_take_reset_consumes() {
        let signals = ControlSignals::default();
        signals.request_reset();

        assert!(signals.reset_pending());
        assert!(signals.take_reset());
        assert!(!signals.take_reset());
        assert!(!signals.reset_pending());
    }

    #[test]
    fn test_shutdown_is_sticky() {
        let signals = ControlSignals::default();
        signals.request_shutdown();
        signals.take_reset();

        assert!(signals.is_shutting_down());
    }

    #[test]
    fn test_poisoned_lock_reads_as_shutdown() {
        let signals = Arc::new(ControlSignals::default());
        let clone = Arc::clone(&signals);

        let _ = thread::spawn(move || {
            let _guard = clone.requests.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(signals.is_shutting_down());
        assert!(!signals.take_reset());
    }
}
