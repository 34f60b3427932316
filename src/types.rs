//! Core Types
//!
//! Shared value types for signing and verification.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AuthError, AuthResult};
use crate::utils::crypto::{keccak256, secure_compare, strip_hex_prefix, to_checksum_address};

/// A 32-byte keccak256 output. Always opaque bytes, never text.
pub type Digest = [u8; 32];

/// 20-byte account identifier derived from a secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build from a slice that must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> AuthResult<Self> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| {
            AuthError::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Derive the address of a public key:
    /// last 20 bytes of keccak256 over the uncompressed X||Y coordinates.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        // 65 bytes, 0x04 prefix first
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Self(address)
    }

    /// Parse `0x`-optional, case-insensitive 40-hex text
    pub fn parse(text: &str) -> AuthResult<Self> {
        let trimmed = strip_hex_prefix(text.trim());

        if trimmed.len() != 40 {
            return Err(AuthError::InvalidAddress(format!(
                "invalid length: expected 40 hex chars, got {}",
                trimmed.len()
            )));
        }

        let bytes = hex::decode(trimmed)
            .map_err(|e| AuthError::InvalidAddress(format!("invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x` + 40 hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case form
    pub fn to_checksum(&self) -> String {
        to_checksum_address(&self.0)
    }

    /// ABI head encoding: 12 zero bytes followed by the address
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    /// Equality that does not short-circuit on the first differing byte
    pub fn ct_eq(&self, other: &Address) -> bool {
        secure_compare(&self.0, &other.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Check that `text` is a well-formed address
pub fn validate_address(text: &str) -> AuthResult<()> {
    Address::parse(text).map(|_| ())
}
