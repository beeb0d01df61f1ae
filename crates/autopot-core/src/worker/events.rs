use crossbeam_channel::Sender;
use strum::{AsRefStr, Display};

use crate::error::{Error, Result};

/// Colour class of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum StatusKind {
    #[strum(serialize = "OFF")]
    Off,
    #[strum(serialize = "ON")]
    On,
    #[strum(serialize = "WAITING")]
    Waiting,
    #[strum(serialize = "ERROR")]
    Error,
    #[strum(serialize = "PAUSED")]
    Paused,
}

/// Everything the worker tells its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    StatusChanged { text: String, kind: StatusKind },
    HpChanged { current: f32, max: Option<f32> },
    ThresholdChanged { value: Option<f32> },
    PotionLogged { value: f32, max: Option<f32> },
}

/// One-directional event channel out of the worker.
///
/// A failed emit means the observer is gone; the worker treats it as fatal.
pub trait EventSink {
    fn emit(&self, event: StatusEvent) -> Result<()>;
}

impl EventSink for Sender<StatusEvent> {
    fn emit(&self, event: StatusEvent) -> Result<()> {
        self.send(event).map_err(|_| Error::ObserverSinkFailure)
    }
}

/// One-line HP summary, e.g. `HP: 450/1000 ( 45.0%) | Threshold: 600`.
pub fn format_hp_status(current: f32, max: Option<f32>, threshold: Option<f32>) -> String {
    let threshold = threshold.map_or_else(|| "-".to_string(), |t| format!("{:.0}", t));
    match max {
        Some(max) if max > 0.0 => format!(
            "HP: {:.0}/{:.0} ({:5.1}%) | Threshold: {}",
            current,
            max,
            current / max * 100.0,
            threshold
        ),
        Some(max) => format!("HP: {:.0}/{:.0} | Threshold: {}", current, max, threshold),
        None => format!("HP: Determining Max HP... (Current: {:.0})", current),
    }
}
