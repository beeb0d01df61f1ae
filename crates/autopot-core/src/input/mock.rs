//! Mock input and window collaborators for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::input::{InputSink, PotionKey, WindowQuery};

type Hook = Box<dyn Fn() + Send + Sync>;

/// Records every key sent. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingInput {
    sent: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
    on_send: Arc<Mutex<Option<Hook>>>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all keys sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.sent).len()
    }

    /// Make subsequent sends fail (the key is still recorded).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Run `hook` after every recorded send.
    pub fn on_send(&self, hook: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_send) = Some(Box::new(hook));
    }
}

impl InputSink for RecordingInput {
    fn send_key(&self, key: &PotionKey) -> Result<()> {
        lock(&self.sent).push(key.name().to_string());
        if let Some(hook) = lock(&self.on_send).as_ref() {
            hook();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::InputFailed("mock failure".to_string()));
        }
        Ok(())
    }
}

/// Window whose focus follows a script, then a fixed default.
#[derive(Debug, Clone)]
pub struct ScriptedWindow {
    script: Arc<Mutex<VecDeque<bool>>>,
    default: Arc<AtomicBool>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedWindow {
    /// Always answers `focused`.
    pub fn fixed(focused: bool) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default: Arc::new(AtomicBool::new(focused)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers from `script` first, then `default`.
    pub fn scripted(script: impl IntoIterator<Item = bool>, default: bool) -> Self {
        let window = Self::fixed(default);
        lock(&window.script).extend(script);
        window
    }

    pub fn set_focused(&self, focused: bool) {
        self.default.store(focused, Ordering::SeqCst);
    }

    /// Titles queried so far.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl WindowQuery for ScriptedWindow {
    fn is_foreground(&self, window_title: &str) -> bool {
        lock(&self.queries).push(window_title.to_string());
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| self.default.load(Ordering::SeqCst))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_input() {
        let input = RecordingInput::new();
        let key: PotionKey = "1".parse().unwrap();

        input.send_key(&key).unwrap();
        input.set_failing(true);
        assert!(input.send_key(&key).is_err());

        assert_eq!(input.sent(), vec!["1", "1"]);
    }

    #[test]
    fn test_scripted_window() {
        let window = ScriptedWindow::scripted([false, true], false);

        assert!(!window.is_foreground("Game"));
        assert!(window.is_foreground("Game"));
        assert!(!window.is_foreground("Game"));

        window.set_focused(true);
        assert!(window.is_foreground("Game"));
        assert_eq!(window.queries().len(), 4);
    }
}
