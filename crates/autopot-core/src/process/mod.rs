mod handle;
pub mod provider;
mod reader;

// Mock process for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::*;
pub use provider::{ProcessInfo, ProcessProvider, WindowsProcessProvider};
pub use reader::ReadMemory;

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockProcess, MockProcessProvider};
