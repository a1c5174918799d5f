//! # Addresses
//!
//! Every account the ledger knows about (holders, wallets, the pool pair,
//! the router, the ledger contract itself, each founders timelock) is an
//! opaque 20-byte [`Address`]. Contract addresses are derived
//! deterministically from the deployer and a label, so the same deployment
//! always lands on the same addresses.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Errors raised when parsing an address from text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressError {
    /// The input was not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded input had the wrong length.
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// An opaque account identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The zero address. Mints originate here and burns are sent here.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Creates an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Derives a contract address from its deployer and a label.
    ///
    /// The preimage is `deployer || 0x00 || label`, hashed with BLAKE3 and
    /// truncated to 20 bytes. The separator keeps `("ab", "c")` and
    /// `("a", "bc")`-style collisions out.
    pub fn derive(deployer: &Address, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(deployer.as_bytes());
        hasher.update(&[0x00]);
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    /// Convenience for tests and fixtures: an address from a human label.
    pub fn from_label(label: &str) -> Self {
        Self::derive(&Address::ZERO, label)
    }

    /// Returns the `0x`-prefixed lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Serialized as a hex string so addresses can key JSON objects.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_with_and_without_prefix() {
        let addr = Address::from_label("alice");
        let hex = addr.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Address::from_hex(&hex).unwrap(), addr);
        assert_eq!(Address::from_hex(&hex[2..]).unwrap(), addr);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = Address::from_hex("0xdeadbeef").unwrap_err();
        assert_eq!(err, AddressError::InvalidLength(4));
    }

    #[test]
    fn derive_is_deterministic_and_label_sensitive() {
        let deployer = Address::from_label("deployer");
        assert_eq!(
            Address::derive(&deployer, "token"),
            Address::derive(&deployer, "token")
        );
        assert_ne!(
            Address::derive(&deployer, "token"),
            Address::derive(&deployer, "pair")
        );
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("x").is_zero());
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address::from_label("bob");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
