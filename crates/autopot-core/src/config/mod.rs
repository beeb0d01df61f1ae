//! Configuration.
//!
//! - `Settings` - user-editable TOML file
//! - `WorkerConfig` - typed, validated values handed to the worker
//! - Fixed engine timing constants

mod settings;

pub use settings::*;

/// Engine timing that is not user-configurable.
pub mod timing {
    use std::time::Duration;

    /// Granularity of interruptible waits.
    pub const WAIT_CHUNK: Duration = Duration::from_millis(10);

    /// How often the pointer chain is re-walked while monitoring.
    pub const RERESOLVE_INTERVAL: Duration = Duration::from_secs(2);

    /// Pause after a monitoring error before searching for the process again.
    pub const RECOVERY_PAUSE: Duration = Duration::from_millis(500);

    /// Sleep per loop iteration while disabled.
    pub const DISABLED_PAUSE: Duration = Duration::from_millis(100);

    /// Identical diagnostics are repeated at most this often.
    pub const NOTIFIER_COOLDOWN: Duration = Duration::from_secs(15);

    /// How often the "off" status is re-sent while disabled.
    pub const OFF_STATUS_REFRESH: Duration = Duration::from_secs(1);
}
