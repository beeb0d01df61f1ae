use std::time::Instant;

use tracing::{debug, warn};

use crate::chain::{PointerChain, ResolvedAddress};
use crate::config::timing;
use crate::error::{Error, Result};
use crate::notify::RateLimitedNotifier;
use crate::process::{ProcessInfo, ReadMemory};

/// Pointers below this are never valid in a user-mode address space.
pub const LOW_MEMORY_GUARD: u64 = 4096;

/// Walks a [`PointerChain`] and validates every hop.
///
/// Keeps the last successfully resolved pointer path so the full chain is only
/// traced when it actually moves (e.g. after a game restart).
#[derive(Debug)]
pub struct AddressResolver {
    last_pointer_path: Option<Vec<u64>>,
    notifier: RateLimitedNotifier,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self {
            last_pointer_path: None,
            notifier: RateLimitedNotifier::new(timing::NOTIFIER_COOLDOWN),
        }
    }

    /// Resolve `chain` in `process`.
    ///
    /// Fails with `ModuleNotFound` if the module is gone, `ChainBroken` if a hop
    /// lands on a null or low address, and `MemoryReadFailed` if a pointer read
    /// fails. No partial result is ever returned.
    pub fn resolve<P>(
        &mut self,
        process: &P,
        chain: &PointerChain,
        now: Instant,
    ) -> Result<ResolvedAddress>
    where
        P: ProcessInfo + ReadMemory + ?Sized,
    {
        match walk(process, chain) {
            Ok(resolved) => {
                self.notifier.clear();
                if self.last_pointer_path.as_deref() != Some(resolved.pointer_path()) {
                    trace_chain(chain, &resolved);
                    self.last_pointer_path = Some(resolved.pointer_path().to_vec());
                }
                Ok(resolved)
            }
            Err(e) => {
                let message = e.to_string();
                let repeats = self.notifier.suppressed();
                if self.notifier.should_emit(&message, now) {
                    if repeats > 0 {
                        warn!("{} ({} earlier failures not shown)", message, repeats);
                    } else {
                        warn!("{}", message);
                    }
                }
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn suppressed_warnings(&self) -> usize {
        self.notifier.suppressed()
    }

    /// Forget the remembered chain so the next success is traced again.
    pub fn reset(&mut self) {
        self.last_pointer_path = None;
        self.notifier.clear();
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn walk<P>(process: &P, chain: &PointerChain) -> Result<ResolvedAddress>
where
    P: ProcessInfo + ReadMemory + ?Sized,
{
    let module_base = process.module_base(&chain.module_name)?;
    let mut address = module_base.wrapping_add(chain.base_offset);
    let mut hop_addresses = Vec::with_capacity(chain.hops.len() + 1);
    hop_addresses.push(address);

    let last = chain.hops.len().saturating_sub(1);
    for (i, &offset) in chain.hops.iter().enumerate() {
        let next = process.read_u64(address)?.wrapping_add(offset);

        // A zero pointer: the structure is not allocated (loading screen, menu).
        if next == offset {
            return Err(Error::chain_broken(
                i,
                address,
                format!("next address equals offset 0x{:X}", offset),
            ));
        }
        // The leaf is a field value, not a pointer, so it may be small.
        if next < LOW_MEMORY_GUARD && i < last {
            return Err(Error::chain_broken(
                i,
                address,
                format!("next address too low (0x{:X})", next),
            ));
        }

        address = next;
        hop_addresses.push(address);
    }

    Ok(ResolvedAddress {
        address,
        hop_addresses,
    })
}

/// Step 0 is `module + base_offset` and is labelled with `base_offset`.
fn trace_chain(chain: &PointerChain, resolved: &ResolvedAddress) {
    debug!("Pointer chain resolved ({}):", chain.module_name);
    let offsets = std::iter::once(chain.base_offset).chain(chain.hops.iter().copied());
    for (i, (address, offset)) in resolved.hop_addresses.iter().zip(offsets).enumerate() {
        debug!("  Step {}: addr=0x{:X} offset=0x{:X}", i, address, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::process::mock::MockProcess;

    const MODULE: &str = "GameAssembly.dll";
    const MODULE_BASE: u64 = 0x7FF6_0000_0000;

    fn chain() -> PointerChain {
        PointerChain::new(MODULE, 0xB8, vec![0x0, 0xA0, 0x6C])
    }

    /// module+0xB8 -> A1, A1+0x0 -> A2, A2+0xA0 -> A3, leaf = A3+0x6C
    fn process() -> MockProcess {
        let process = MockProcess::new(1).with_module(MODULE, MODULE_BASE);
        process.write_u64(MODULE_BASE + 0xB8, 0x1_0000_0000);
        process.write_u64(0x1_0000_0000, 0x2_0000_0000);
        process.write_u64(0x2_0000_00A0, 0x3_0000_0000);
        process.write_f32(0x3_0000_006C, 1000.0);
        process
    }

    #[test]
    fn test_resolve_full_chain() {
        let mut resolver = AddressResolver::new();
        let resolved = resolver.resolve(&process(), &chain(), Instant::now()).unwrap();

        assert_eq!(resolved.address, 0x3_0000_006C);
        assert_eq!(
            resolved.hop_addresses,
            vec![MODULE_BASE + 0xB8, 0x1_0000_0000, 0x2_0000_00A0, 0x3_0000_006C]
        );
        assert_eq!(resolved.hop_addresses.len(), chain().hops.len() + 1);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let mut resolver = AddressResolver::new();
        let process = process();
        let now = Instant::now();

        let a = resolver.resolve(&process, &chain(), now).unwrap();
        let b = resolver.resolve(&process, &chain(), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_pointer_breaks_chain() {
        let process = process();
        process.write_u64(0x1_0000_0000, 0);

        let mut resolver = AddressResolver::new();
        let result = resolver.resolve(&process, &chain(), Instant::now());
        assert!(matches!(result, Err(Error::ChainBroken { hop: 1, .. })));
    }

    #[test]
    fn test_low_address_on_intermediate_hop() {
        let process = process();
        process.write_u64(0x1_0000_0000, 0x200);

        let mut resolver = AddressResolver::new();
        let result = resolver.resolve(&process, &chain(), Instant::now());
        assert!(matches!(result, Err(Error::ChainBroken { hop: 1, .. })));
    }

    #[test]
    fn test_low_value_on_final_hop_is_allowed() {
        let process = process();
        process.write_u64(0x2_0000_00A0, 0x10);

        let mut resolver = AddressResolver::new();
        let resolved = resolver.resolve(&process, &chain(), Instant::now()).unwrap();
        assert_eq!(resolved.address, 0x10 + 0x6C);
    }

    #[test]
    fn test_missing_module() {
        let process = MockProcess::new(1);
        let mut resolver = AddressResolver::new();

        let result = resolver.resolve(&process, &chain(), Instant::now());
        assert!(matches!(result, Err(Error::ModuleNotFound(_))));
    }

    #[test]
    fn test_unreadable_pointer() {
        let process = process();
        process.unmap(0x1_0000_0000, 8);

        let mut resolver = AddressResolver::new();
        let result = resolver.resolve(&process, &chain(), Instant::now());
        assert!(matches!(result, Err(Error::MemoryReadFailed { .. })));
    }

    #[test]
    fn test_remembers_last_pointer_path() {
        let process = process();
        let mut resolver = AddressResolver::new();
        let now = Instant::now();

        resolver.resolve(&process, &chain(), now).unwrap();
        let first = resolver.last_pointer_path.clone().unwrap();
        assert_eq!(first.len(), 3);

        // Structures relocated after a restart
        process.write_u64(0x1_0000_0000, 0x4_0000_0000);
        process.write_u64(0x4_0000_00A0, 0x5_0000_0000);
        let resolved = resolver.resolve(&process, &chain(), now).unwrap();

        assert_eq!(resolved.address, 0x5_0000_006C);
        assert_ne!(resolver.last_pointer_path.as_deref(), Some(first.as_slice()));
        assert_eq!(
            resolver.last_pointer_path.as_deref(),
            Some(resolved.pointer_path())
        );
    }

    #[test]
    fn test_repeated_chain_break_warns_once_per_cooldown() {
        let process = process();
        process.write_u64(0x1_0000_0000, 0);
        let mut resolver = AddressResolver::new();
        let t0 = Instant::now();

        // One attempt per second, as the worker retries after memory_wait
        for secs in 0..10 {
            let result = resolver.resolve(&process, &chain(), t0 + Duration::from_secs(secs));
            assert!(matches!(result, Err(Error::ChainBroken { hop: 1, .. })));
        }
        assert_eq!(resolver.notifier.suppressed(), 9);

        let later = t0 + timing::NOTIFIER_COOLDOWN + Duration::from_secs(1);
        assert!(resolver.resolve(&process, &chain(), later).is_err());
        assert_eq!(resolver.notifier.suppressed(), 0);
    }

    #[test]
    fn test_success_clears_throttled_warning() {
        let process = process();
        process.write_u64(0x1_0000_0000, 0);
        let mut resolver = AddressResolver::new();
        let now = Instant::now();

        assert!(resolver.resolve(&process, &chain(), now).is_err());
        assert!(resolver.resolve(&process, &chain(), now).is_err());
        assert_eq!(resolver.notifier.suppressed(), 1);

        process.write_u64(0x1_0000_0000, 0x2_0000_0000);
        resolver.resolve(&process, &chain(), now).unwrap();
        assert_eq!(resolver.notifier.suppressed(), 0);
    }

    #[test]
    fn test_reset_forgets_path() {
        let mut resolver = AddressResolver::new();
        resolver.resolve(&process(), &chain(), Instant::now()).unwrap();

        resolver.reset();
        assert!(resolver.last_pointer_path.is_none());
    }
}
