//! Account addresses and transaction hashes.
//!
//! Both are fixed-length, `0x`-prefixed hexadecimal identifiers. They share the
//! prefix but not the length, which makes pasting a deployment transaction hash
//! where the contract address belongs a common misconfiguration. Parsing an
//! [`Address`] therefore reports that case with its own error variant.
//!
//! # Example
//!
//! ```
//! use poll_core::address::{Address, AddressError};
//!
//! let addr: Address = "0xB7F2754297F9DA369029ADB875510DBA55DEA0B4".parse()?;
//! assert_eq!(addr.to_string(), "0xb7f2754297f9da369029adb875510dba55dea0b4");
//! assert_eq!(addr.short(), "0xb7f2…a0b4");
//!
//! let tx_hash = format!("0x{}", "ab".repeat(32));
//! assert_eq!(Address::parse(&tx_hash), Err(AddressError::LooksLikeTxHash));
//! # Ok::<(), AddressError>(())
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of hex digits in an account address (20 bytes).
pub const ADDRESS_HEX_LEN: usize = 40;

/// Number of hex digits in a transaction hash (32 bytes).
pub const TX_HASH_HEX_LEN: usize = 64;

/// Address parsing error with user-friendly messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Input was empty
    #[error("Address cannot be empty")]
    Empty,
    /// Input does not start with `0x`
    #[error("Address must start with 0x")]
    MissingPrefix,
    /// Input has the length of a transaction hash, not an address
    #[error("Value is a 66-character transaction hash; use the 42-character contract address")]
    LooksLikeTxHash,
    /// Input has neither address nor hash length (total characters)
    #[error("Address must be 42 characters, got {0}")]
    WrongLength(usize),
    /// Input contains non-hex characters
    #[error("Address contains non-hex characters")]
    InvalidHex,
}

/// A 20-byte account or contract address.
///
/// Equality is byte equality, so two textual forms that differ only in letter
/// case compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parse a `0x`-prefixed, 40-hex-digit address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if input.is_empty() {
            return Err(AddressError::Empty);
        }
        let digits = input.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if digits.len() == TX_HASH_HEX_LEN {
            return Err(AddressError::LooksLikeTxHash);
        }
        if digits.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::WrongLength(input.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Build an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Abbreviated display form, e.g. `0x1234…abcd`.
    #[must_use]
    pub fn short(&self) -> String {
        short_hex(&self.to_string())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}

/// Transaction hash parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transaction hash '{0}'")]
pub struct TxHashError(pub String);

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Build a hash from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Abbreviated display form, e.g. `0xabcd…1234`.
    #[must_use]
    pub fn short(&self) -> String {
        short_hex(&self.to_string())
    }
}

impl FromStr for TxHash {
    type Err = TxHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .filter(|d| d.len() == TX_HASH_HEX_LEN)
            .ok_or_else(|| TxHashError(s.to_string()))?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| TxHashError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Shorten a hex identifier to its first 6 and last 4 characters.
#[must_use]
pub fn short_hex(text: &str) -> String {
    if text.len() <= 10 || !text.is_ascii() {
        return text.to_string();
    }
    format!("{}…{}", &text[..6], &text[text.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xb7f2754297f9da369029adb875510dba55dea0b4";

    #[test]
    fn test_parse_valid_address() {
        let addr = Address::parse(ADDR).unwrap();
        assert_eq!(addr.to_string(), ADDR);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let upper = Address::parse("0xB7F2754297F9DA369029ADB875510DBA55DEA0B4").unwrap();
        assert_eq!(upper, Address::parse(ADDR).unwrap());
    }

    #[test]
    fn test_rejects_tx_hash_length() {
        let hash = format!("0x{}", "1".repeat(64));
        assert_eq!(Address::parse(&hash), Err(AddressError::LooksLikeTxHash));
        // Even when the digits are not valid hex
        let junk = format!("0x{}", "z".repeat(64));
        assert_eq!(Address::parse(&junk), Err(AddressError::LooksLikeTxHash));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(
            Address::parse("b7f2754297f9da369029adb875510dba55dea0b4"),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(Address::parse("0x1234"), Err(AddressError::WrongLength(6)));
        assert_eq!(
            Address::parse(&format!("0x{}", "g".repeat(40))),
            Err(AddressError::InvalidHex)
        );
        // Surrounding whitespace is not silently accepted
        assert!(Address::parse(&format!(" {ADDR}")).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AddressError::WrongLength(6).to_string(),
            "Address must be 42 characters, got 6"
        );
        assert!(AddressError::LooksLikeTxHash
            .to_string()
            .contains("42-character contract address"));
        let err: Box<dyn std::error::Error> = Box::new(AddressError::MissingPrefix);
        assert_eq!(err.to_string(), "Address must start with 0x");
    }

    #[test]
    fn test_short_forms() {
        let addr = Address::parse(ADDR).unwrap();
        assert_eq!(addr.short(), "0xb7f2…a0b4");
        assert_eq!(short_hex("0x12"), "0x12");
    }

    #[test]
    fn test_tx_hash_roundtrip_text() {
        let text = format!("0x{}", "0a".repeat(32));
        let hash: TxHash = text.parse().unwrap();
        assert_eq!(hash.to_string(), text);
        assert!("0x1234".parse::<TxHash>().is_err());
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = Address::parse(ADDR).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{ADDR}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
