//! Process provider abstraction for testability.
//!
//! These traits abstract process discovery and access so the worker can run
//! against mock processes without a running game.

use crate::error::Result;
use crate::process::{ProcessHandle, ReadMemory};

/// An attached process.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Base address of a loaded module, matched case-insensitively by file name.
    ///
    /// Fails with `Error::ModuleNotFound` when the module is not (or no longer) loaded,
    /// which is also how a vanished process shows up.
    fn module_base(&self, module_name: &str) -> Result<u64>;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;
}

/// Trait for finding and opening processes.
pub trait ProcessProvider {
    /// The type of process returned by this provider.
    type Process: ProcessInfo + ReadMemory;

    /// Find the process by executable name and attach to it.
    fn attach(&self, process_name: &str) -> Result<Self::Process>;
}

/// Provider backed by the real OS process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsProcessProvider;

impl ProcessProvider for WindowsProcessProvider {
    type Process = ProcessHandle;

    fn attach(&self, process_name: &str) -> Result<ProcessHandle> {
        ProcessHandle::find_and_open(process_name)
    }
}
