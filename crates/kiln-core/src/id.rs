//! Stable asset identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable 32-bit identity binding a logical asset to its compiled resource.
///
/// An identity is assigned once, persisted in the asset's sidecar and reused
/// by every later conversion. Zero is reserved and never handed out, so a
/// zero read from old data means "unbound".
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u32);

impl AssetId {
    /// Generate a fresh random identity (never zero)
    pub fn generate() -> Self {
        loop {
            let bytes = uuid::Uuid::new_v4().into_bytes();
            let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            if raw != 0 {
                return Self(raw);
            }
        }
    }

    /// Generate a fresh identity that is not rejected by `taken`
    pub fn generate_unique(taken: impl Fn(AssetId) -> bool) -> Self {
        loop {
            let id = Self::generate();
            if !taken(id) {
                return id;
            }
        }
    }

    /// Create an AssetId from a raw value (for deserialization/testing)
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:08x})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_never_zero() {
        for _ in 0..256 {
            assert!(AssetId::generate().is_valid());
        }
    }

    #[test]
    fn test_generate_unique_skips_taken() {
        let first = AssetId::generate();
        let second = AssetId::generate_unique(|id| id == first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(AssetId::from_raw(0xbeef).to_string(), "0000beef");
        assert_eq!(AssetId::from_raw(42).raw(), 42);
    }
}
