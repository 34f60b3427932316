//! Recoverable Signature Wire Format
//!
//! 65 bytes: `r[32] || s[32] || v[1]`. On the wire `v` is 27 or 28;
//! recovery math uses 0 or 1. [`normalize_v`] is the only place that maps
//! between the two forms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AuthError, AuthResult};
use crate::utils::crypto::strip_hex_prefix;

/// Length of a recoverable signature in bytes
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery index in the wire form of `v`
const V_OFFSET: u8 = 27;

/// Parity of the nonce point's Y coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryParity {
    Even,
    Odd,
}

impl RecoveryParity {
    /// Recovery index used by the curve math (0 or 1)
    pub fn index(self) -> u8 {
        match self {
            RecoveryParity::Even => 0,
            RecoveryParity::Odd => 1,
        }
    }

    /// Canonical wire value (27 or 28)
    pub fn wire(self) -> u8 {
        self.index() + V_OFFSET
    }
}

/// Map any accepted `v` (0, 1, 27, 28) to its parity.
///
/// Used by both the signer and the recoverer.
pub fn normalize_v(v: u8) -> AuthResult<RecoveryParity> {
    match v {
        0 | 27 => Ok(RecoveryParity::Even),
        1 | 28 => Ok(RecoveryParity::Odd),
        other => Err(AuthError::InvalidSignature(format!(
            "invalid recovery byte: {}",
            other
        ))),
    }
}

/// A 65-byte recoverable ECDSA signature
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl Signature {
    /// Build from components; `v` may be in either form
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> AuthResult<Self> {
        normalize_v(v)?;
        Ok(Self { r, s, v })
    }

    /// Build from a compact `r || s` and a parity, canonicalizing `v`
    pub(crate) fn from_compact(compact: &[u8; 64], parity: RecoveryParity) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Self { r, s, v: parity.wire() }
    }

    /// Parse `r || s || v`; the input must be exactly 65 bytes
    pub fn from_bytes(bytes: &[u8]) -> AuthResult<Self> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(AuthError::InvalidSignatureLength(bytes.len()));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self::new(r, s, bytes[64])
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Compact `r || s` used by the recovery math
    pub(crate) fn compact(&self) -> [u8; 64] {
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        compact
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// `v` exactly as stored
    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn parity(&self) -> RecoveryParity {
        // `v` is validated on every constructor
        match self.v {
            0 | 27 => RecoveryParity::Even,
            _ => RecoveryParity::Odd,
        }
    }

    /// Recovery index (0 or 1)
    pub fn recovery_id(&self) -> u8 {
        self.parity().index()
    }

    /// Copy with `v` in wire form (27 or 28)
    pub fn canonical(&self) -> Self {
        Self {
            v: self.parity().wire(),
            ..*self
        }
    }

    /// `0x` + 130 lowercase hex characters
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse `0x`-prefixed hex (prefix optional)
    pub fn from_hex(text: &str) -> AuthResult<Self> {
        let bytes = hex::decode(strip_hex_prefix(text.trim()))
            .map_err(|e| AuthError::InvalidSignature(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Hex-encode a signature (`0x` + 130 lowercase hex)
pub fn encode_hex(signature: &Signature) -> String {
    signature.to_hex()
}

/// Decode a hex signature
pub fn decode_hex(text: &str) -> AuthResult<Signature> {
    Signature::from_hex(text)
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = AuthError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Signature::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
