//! # Value Objects
//!
//! Immutable domain primitives for submessage dispatch.
//! These types represent concepts that are defined by their value, not identity.

use crate::errors::AddressError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

// Re-export U256 from primitive-types for coin amounts
pub use primitive_types::U256;

/// Gas units, as charged to a gas meter.
pub type Gas = u64;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte contract or account address.
///
/// The canonical string form is the EIP-55 mixed-case checksummed hex
/// encoding. That form is what ends up in the `_contract_address` event
/// attribute and in protocol (port) identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Returns the canonical (EIP-55 checksummed) string form.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parses an address from its string form.
    ///
    /// All-lowercase and all-uppercase hex are accepted as is. Mixed-case
    /// input must carry a valid checksum.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] when the prefix, the hex digits, the length
    /// or the checksum are wrong.
    pub fn from_canonical(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;
        let raw = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let address = Self::from_slice(&raw).ok_or(AddressError::InvalidLength(raw.len()))?;

        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_canonical_string() != s {
            return Err(AddressError::InvalidChecksum(s.to_string()));
        }
        Ok(address)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// BYTES (variable length)
// =============================================================================

/// Variable-length byte vector for payloads, message bodies and response data.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Bytes from a vector.
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(vec)
    }

    /// Creates Bytes from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 8 {
            write!(f, "0x")?;
            for byte in &self.0 {
                write!(f, "{byte:02x}")?;
            }
        } else {
            write!(f, "0x")?;
            for byte in &self.0[..4] {
                write!(f, "{byte:02x}")?;
            }
            write!(f, "..({} bytes)", self.0.len())?;
        }
        Ok(())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl From<&str> for Bytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// COIN
// =============================================================================

/// A denominated token amount carried by bank, contract and IBC messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Token denomination.
    pub denom: String,
    /// Amount in base units.
    pub amount: U256,
}

impl Coin {
    /// Creates a new coin.
    #[must_use]
    pub fn new(amount: impl Into<U256>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_canonical_string_eip55_vector() {
        // Reference vector from EIP-55.
        let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let addr = Address::from_slice(&raw).unwrap();
        assert_eq!(
            addr.to_canonical_string(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(addr.to_string(), addr.to_canonical_string());
    }

    #[test]
    fn test_from_canonical_accepts_checksummed_and_lowercase() {
        let addr = Address::new([0xab; 20]);
        let canonical = addr.to_canonical_string();
        assert_eq!(Address::from_canonical(&canonical).unwrap(), addr);
        assert_eq!(
            Address::from_canonical(&canonical.to_lowercase()).unwrap(),
            addr
        );
    }

    #[test]
    fn test_from_canonical_rejects_bad_input() {
        assert!(matches!(
            Address::from_canonical("abcd"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::from_canonical("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
        assert!(matches!(
            Address::from_canonical("0xabcd"),
            Err(AddressError::InvalidLength(2))
        ));
        assert!(matches!(
            Address::from_canonical("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            Err(AddressError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_bytes_debug_truncates() {
        let short = Bytes::from_slice(&[1, 2]);
        assert_eq!(format!("{short:?}"), "0x0102");

        let long = Bytes::from_vec(vec![0xaa; 16]);
        assert_eq!(format!("{long:?}"), "0xaaaaaaaa..(16 bytes)");
    }

    #[test]
    fn test_coin_display() {
        let coin = Coin::new(1000u64, "uqc");
        assert_eq!(coin.to_string(), "1000uqc");
    }
}
