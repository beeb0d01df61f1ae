//! Mock process for testing
//!
//! Provides configurable implementations of `ReadMemory`, `ProcessInfo` and
//! `ProcessProvider` backed by a sparse in-memory address space instead of a
//! real process. Clones share state, so a test can keep a handle and change
//! memory while the worker reads it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::process::{ProcessInfo, ProcessProvider, ReadMemory};

#[derive(Debug, Default)]
struct MockState {
    pid: u32,
    alive: bool,
    modules: HashMap<String, u64>,
    bytes: HashMap<u64, u8>,
    reads: usize,
}

/// Mock process with a sparse byte-addressed memory map
#[derive(Debug, Clone, Default)]
pub struct MockProcess {
    state: Arc<Mutex<MockState>>,
}

impl MockProcess {
    /// Create a running process with no modules and no mapped memory
    pub fn new(pid: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                pid,
                alive: true,
                ..Default::default()
            })),
        }
    }

    /// Register a loaded module at the given base address
    pub fn with_module(self, name: &str, base: u64) -> Self {
        self.load_module(name, base);
        self
    }

    /// Load a module into a running process (simulates a late DLL load)
    pub fn load_module(&self, name: &str, base: u64) {
        self.lock().modules.insert(name.to_ascii_lowercase(), base);
    }

    /// Unload a module (simulates the game tearing down)
    pub fn unload_module(&self, name: &str) {
        self.lock().modules.remove(&name.to_ascii_lowercase());
    }

    /// Write raw bytes at an absolute address
    pub fn write_bytes(&self, address: u64, bytes: &[u8]) {
        let mut state = self.lock();
        for (i, &b) in bytes.iter().enumerate() {
            state.bytes.insert(address + i as u64, b);
        }
    }

    /// Write an unsigned 64-bit integer at an absolute address
    pub fn write_u64(&self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a 32-bit float at an absolute address
    pub fn write_f32(&self, address: u64, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Unmap a range so reads from it fail
    pub fn unmap(&self, address: u64, size: usize) {
        let mut state = self.lock();
        for i in 0..size as u64 {
            state.bytes.remove(&(address + i));
        }
    }

    /// Mark the process as exited; all modules disappear with it
    pub fn kill(&self) {
        let mut state = self.lock();
        state.alive = false;
        state.modules.clear();
    }

    /// Number of successful and failed reads performed so far
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadMemory for MockProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut state = self.lock();
        state.reads += 1;
        if !state.alive {
            return Err(Error::MemoryReadFailed {
                address,
                message: "Process has exited".to_string(),
            });
        }
        (0..size as u64)
            .map(|i| {
                state
                    .bytes
                    .get(&(address + i))
                    .copied()
                    .ok_or_else(|| Error::MemoryReadFailed {
                        address,
                        message: format!("Unmapped byte at 0x{:X}", address + i),
                    })
            })
            .collect()
    }
}

impl ProcessInfo for MockProcess {
    fn pid(&self) -> u32 {
        self.lock().pid
    }

    fn module_base(&self, module_name: &str) -> Result<u64> {
        self.lock()
            .modules
            .get(&module_name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| Error::ModuleNotFound(module_name.to_string()))
    }

    fn is_alive(&self) -> bool {
        self.lock().alive
    }
}

/// Mock provider whose single target process can appear and disappear
#[derive(Debug, Clone)]
pub struct MockProcessProvider {
    process_name: String,
    running: Arc<Mutex<Option<MockProcess>>>,
}

impl MockProcessProvider {
    pub fn new(process_name: &str) -> Self {
        Self {
            process_name: process_name.to_string(),
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Start (or replace) the running target process
    pub fn spawn(&self, process: MockProcess) {
        *self.lock() = Some(process);
    }

    /// Terminate the running target process, if any
    pub fn kill(&self) {
        if let Some(process) = self.lock().take() {
            process.kill();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<MockProcess>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProcessProvider for MockProcessProvider {
    type Process = MockProcess;

    fn attach(&self, process_name: &str) -> Result<MockProcess> {
        if !process_name.eq_ignore_ascii_case(&self.process_name) {
            return Err(Error::ProcessNotFound(format!(
                "Process '{}' not found",
                process_name
            )));
        }
        self.lock()
            .clone()
            .ok_or_else(|| Error::ProcessNotFound(format!("Process '{}' not found", process_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_memory() {
        let process = MockProcess::new(7);
        let view = process.clone();

        process.write_f32(0x5000, 42.0);
        assert_eq!(view.read_f32(0x5000).unwrap(), 42.0);

        process.write_f32(0x5000, 7.5);
        assert_eq!(view.read_f32(0x5000).unwrap(), 7.5);
    }

    #[test]
    fn test_unmap() {
        let process = MockProcess::new(7);
        process.write_u64(0x5000, 1);
        process.unmap(0x5004, 1);

        assert!(process.read_u64(0x5000).is_err());
        assert!(process.read_f32(0x5000).is_ok());
    }

    #[test]
    fn test_dead_process_fails_reads() {
        let process = MockProcess::new(7);
        process.write_u64(0x5000, 1);
        process.kill();

        assert!(process.read_u64(0x5000).is_err());
        assert_eq!(process.read_count(), 1);
    }

    #[test]
    fn test_module_lookup_case_insensitive() {
        let process = MockProcess::new(7).with_module("GameAssembly.dll", 0x1_0000_0000);

        assert_eq!(process.module_base("GAMEASSEMBLY.DLL").unwrap(), 0x1_0000_0000);

        process.unload_module("gameassembly.dll");
        assert!(process.module_base("GameAssembly.dll").is_err());
    }
}
