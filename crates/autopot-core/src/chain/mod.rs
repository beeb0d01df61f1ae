//! Pointer chains into the target process.

mod resolver;

pub use resolver::{AddressResolver, LOW_MEMORY_GUARD};

use serde::{Deserialize, Serialize};

/// Location of a field as `module base + base_offset`, followed by hops.
///
/// Each hop dereferences the current address as a 64-bit pointer and adds the
/// hop offset to the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerChain {
    pub module_name: String,
    pub base_offset: u64,
    pub hops: Vec<u64>,
}

impl PointerChain {
    pub fn new(module_name: impl Into<String>, base_offset: u64, hops: Vec<u64>) -> Self {
        Self {
            module_name: module_name.into(),
            base_offset,
            hops,
        }
    }
}

/// Result of one successful chain walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Address of the leaf field
    pub address: u64,
    /// `module base + base_offset` followed by the address produced by every hop
    pub hop_addresses: Vec<u64>,
}

impl ResolvedAddress {
    /// The pointer part of the chain (leaf excluded).
    pub fn pointer_path(&self) -> &[u64] {
        &self.hop_addresses[..self.hop_addresses.len().saturating_sub(1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_path_excludes_leaf() {
        let resolved = ResolvedAddress {
            address: 0x3000_006C,
            hop_addresses: vec![0x1000_00B8, 0x2000_0000, 0x3000_006C],
        };
        assert_eq!(resolved.pointer_path(), &[0x1000_00B8, 0x2000_0000]);
    }

    #[test]
    fn test_pointer_chain_toml_roundtrip_shape() {
        let chain = PointerChain::new("GameAssembly.dll", 0xB8, vec![0x0, 0xA0, 0x6C]);
        let text = toml::to_string(&chain).unwrap();
        let back: PointerChain = toml::from_str(&text).unwrap();
        assert_eq!(back, chain);
    }
}
