//! FNV-1a hashing for block keys.
//!
//! Block keys are small fixed-size integer triples; FNV-1a spreads them well
//! enough for hash map lookups and is much cheaper than SipHash.

use core::hash::{BuildHasherDefault, Hasher};

use crate::types::BlockKey;

const FNV_OFFSET_64: u64 = 0xcbf29ce484222325;
const FNV_PRIME_64: u64 = 0x00000100000001b3;

/// FNV-1a 64-bit hash of a block key (little-endian component bytes).
#[inline]
pub fn fnv1a_64(key: BlockKey) -> u64 {
    let mut hash = FNV_OFFSET_64;
    for component in key.as_array() {
        for byte in component.to_le_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME_64);
        }
    }
    hash
}

/// Streaming FNV-1a hasher for use with `HashMap`.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    #[inline]
    fn default() -> Self {
        Self(FNV_OFFSET_64)
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME_64);
        }
    }
}

/// `BuildHasher` producing [`FnvHasher`]s.
pub type BuildFnvHasher = BuildHasherDefault<FnvHasher>;
