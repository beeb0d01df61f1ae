//! Input simulation and window focus.
//!
//! The worker only sees the [`InputSink`] and [`WindowQuery`] traits; the
//! Windows implementations live in `keyboard` and `window`.

pub mod keyboard;
pub mod window;

#[doc(hidden)]
pub mod mock;

pub use keyboard::{KeyboardInput, PotionKey, send_key_press};
pub use window::ForegroundWindow;

use crate::error::Result;

/// Destination for the potion key press.
pub trait InputSink {
    fn send_key(&self, key: &PotionKey) -> Result<()>;
}

/// Answers whether the game window is the foreground window.
pub trait WindowQuery {
    fn is_foreground(&self, window_title: &str) -> bool;
}
