//! # autopot-core
//!
//! Engine for the autopot HP monitor.
//!
//! This crate provides:
//! - Pointer-chain resolution against a running game process
//! - Max HP learning from stable readings
//! - Threshold and cooldown based potion triggering
//! - A worker state machine driven by enable/reset/shutdown signals
//! - Windows implementations of process access, window focus and key input

pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod focus;
pub mod gauge;
pub mod input;
pub mod notify;
pub mod process;
pub mod trigger;
pub mod worker;

// Re-export from chain module
pub use chain::{AddressResolver, PointerChain, ResolvedAddress};

// Re-export from clock module
pub use clock::{Clock, SystemClock};

// Re-export from config module
pub use config::{Settings, WorkerConfig};

// Re-export from error module
pub use error::{Error, Result};

pub use focus::{FocusGate, FocusStatus};

// Re-export from gauge module
pub use gauge::{GaugeLearner, GaugeReading, GaugeState, MaxUpdate};

// Re-export from input module
pub use input::{ForegroundWindow, InputSink, KeyboardInput, PotionKey, WindowQuery};

pub use notify::RateLimitedNotifier;

// Re-export from process module
pub use process::{ProcessInfo, ProcessProvider, ReadMemory, WindowsProcessProvider};

pub use trigger::TriggerController;

// Re-export from worker module
pub use worker::{
    Collaborators, ControlSignals, EventSink, StatusEvent, StatusKind, WorkerHandle, WorkerPhase,
    WorkerStateMachine, format_hp_status,
};
