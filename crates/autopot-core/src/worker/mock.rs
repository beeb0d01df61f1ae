//! Mock event sinks for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::worker::{EventSink, StatusEvent, StatusKind};

/// Keeps every event. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<StatusEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// `(text, kind)` of every `StatusChanged`, in order.
    pub fn statuses(&self) -> Vec<(String, StatusKind)> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::StatusChanged { text, kind } => Some((text.clone(), *kind)),
                _ => None,
            })
            .collect()
    }

    /// `(value, max)` of every `PotionLogged`, in order.
    pub fn potion_logs(&self) -> Vec<(f32, Option<f32>)> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::PotionLogged { value, max } => Some((*value, *max)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<(String, StatusKind)> {
        self.statuses().pop()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StatusEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: StatusEvent) -> Result<()> {
        self.lock().push(event);
        Ok(())
    }
}

/// Accepts `accept` events, then fails like a closed channel.
#[derive(Debug, Clone)]
pub struct FailingSink {
    remaining: Arc<AtomicUsize>,
    inner: RecordingSink,
}

impl FailingSink {
    pub fn after(accept: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(accept)),
            inner: RecordingSink::new(),
        }
    }

    /// Events accepted before the failure.
    pub fn accepted(&self) -> Vec<StatusEvent> {
        self.inner.events()
    }
}

impl EventSink for FailingSink {
    fn emit(&self, event: StatusEvent) -> Result<()> {
        let took = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match took {
            Ok(_) => self.inner.emit(event),
            Err(_) => Err(Error::ObserverSinkFailure),
        }
    }
}
