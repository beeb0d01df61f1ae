//! The auto-potion worker.
//!
//! A single dedicated thread runs [`WorkerStateMachine`]. The only state
//! shared with the rest of the program is [`ControlSignals`]; everything the
//! worker wants to report goes out through an [`EventSink`].

mod events;
mod signals;
mod state;

#[doc(hidden)]
pub mod mock;

pub use events::{EventSink, StatusEvent, StatusKind, format_hp_status};
pub use signals::ControlSignals;
pub use state::{WorkerPhase, WorkerStateMachine};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::clock::{Clock, SystemClock};
use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::input::{ForegroundWindow, InputSink, KeyboardInput, WindowQuery};
use crate::process::ProcessProvider;

/// Everything the worker talks to besides the target process.
pub struct Collaborators {
    pub window: Box<dyn WindowQuery + Send>,
    pub input: Box<dyn InputSink + Send>,
    pub sink: Box<dyn EventSink + Send>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Real desktop window, real keyboard, wall clock.
    pub fn system(sink: impl EventSink + Send + 'static) -> Self {
        Self {
            window: Box::new(ForegroundWindow),
            input: Box::new(KeyboardInput),
            sink: Box::new(sink),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Owner of the worker thread.
pub struct WorkerHandle {
    signals: Arc<ControlSignals>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl WorkerHandle {
    /// Spawn the worker on a thread named `autopot-worker`.
    ///
    /// The state machine is built on the new thread, so process handles never
    /// cross threads.
    pub fn spawn<P>(
        config: WorkerConfig,
        provider: P,
        collaborators: Collaborators,
        signals: Arc<ControlSignals>,
    ) -> Result<Self>
    where
        P: ProcessProvider + Send + 'static,
    {
        let worker_signals = Arc::clone(&signals);
        let thread = thread::Builder::new()
            .name("autopot-worker".to_string())
            .spawn(move || {
                WorkerStateMachine::new(config, provider, worker_signals, collaborators).run()
            })?;

        Ok(Self {
            signals,
            thread: Some(thread),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.signals.is_enabled()
    }

    pub fn enable(&self) {
        self.signals.set_enabled(true);
    }

    pub fn disable(&self) {
        self.signals.set_enabled(false);
    }

    /// Returns the new enabled state.
    pub fn toggle(&self) -> bool {
        self.signals.toggle()
    }

    pub fn reset(&self) {
        self.signals.request_reset();
    }

    pub fn shutdown(&self) {
        self.signals.request_shutdown();
    }

    /// Request shutdown and wait for the thread to exit.
    pub fn join(mut self) -> Result<()> {
        self.shutdown();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| Error::WorkerPanicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.signals.request_shutdown();
            if thread.join().is_err() {
                error!("Worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::input::mock::{RecordingInput, ScriptedWindow};
    use crate::process::mock::MockProcessProvider;
    use crate::worker::mock::RecordingSink;
    use std::time::{Duration, Instant};

    #[test]
    fn test_handle_shutdown_joins_thread() {
        let sink = RecordingSink::new();
        let collaborators = Collaborators {
            window: Box::new(ScriptedWindow::fixed(true)),
            input: Box::new(RecordingInput::new()),
            sink: Box::new(sink.clone()),
            clock: Arc::new(SystemClock),
        };
        let handle = WorkerHandle::spawn(
            Settings::default().worker_config().unwrap(),
            MockProcessProvider::new("Last Epoch.exe"),
            collaborators,
            Arc::new(ControlSignals::new(false)),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(handle.toggle());
        assert!(handle.is_enabled());
        handle.disable();
        assert!(!handle.is_enabled());
        handle.enable();
        assert!(handle.is_enabled());
        handle.reset();

        handle.join().unwrap();
        assert!(!sink.is_empty());
    }
}
