//! Key Material
//!
//! Owns a secp256k1 private scalar and its derived public key.
//!
//! SECURITY: The scalar is held in a `Zeroizing` buffer and wiped on drop.
//! `KeyMaterial` is deliberately not `Clone`.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};
use crate::signature::{ecdsa, Signature};
use crate::types::{Address, Digest};
use crate::utils::crypto::{keccak256, strip_hex_prefix};

/// Upper bound on rejected draws before `generate` gives up.
/// A uniformly random 32-byte value is out of range with probability ~2^-128.
const MAX_GENERATE_ATTEMPTS: usize = 8;

/// A private scalar and its public key
pub struct KeyMaterial {
    scalar: Zeroizing<[u8; 32]>,
    public_key: PublicKey,
}

impl KeyMaterial {
    /// Construct key material from a private scalar.
    ///
    /// Fails with `InvalidKey` when the scalar is zero or not below the
    /// curve order.
    pub fn derive(scalar: [u8; 32]) -> AuthResult<(Self, Address)> {
        let key = Self::from_scalar(Zeroizing::new(scalar))?;
        let address = key.address();
        Ok((key, address))
    }

    /// Construct from a 32-byte slice
    pub fn from_bytes(bytes: &[u8]) -> AuthResult<Self> {
        if bytes.len() != 32 {
            return Err(AuthError::invalid_key(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut scalar = Zeroizing::new([0u8; 32]);
        scalar.copy_from_slice(bytes);
        Self::from_scalar(scalar)
    }

    /// Parse a hex scalar with an optional `0x` prefix
    pub fn from_hex(text: &str) -> AuthResult<Self> {
        let trimmed = strip_hex_prefix(text.trim());
        if trimmed.len() != 64 {
            return Err(AuthError::invalid_key(format!(
                "expected 64 hex chars, got {}",
                trimmed.len()
            )));
        }

        let mut scalar = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(trimmed, &mut scalar[..])
            .map_err(|e| AuthError::invalid_key(format!("invalid hex: {}", e)))?;
        Self::from_scalar(scalar)
    }

    /// Draw a fresh scalar from the operating system RNG
    pub fn generate() -> AuthResult<Self> {
        for _ in 0..MAX_GENERATE_ATTEMPTS {
            let mut scalar = Zeroizing::new([0u8; 32]);
            OsRng
                .try_fill_bytes(&mut scalar[..])
                .map_err(|e| AuthError::entropy_exhausted(format!("entropy source failed: {}", e)))?;

            match Self::from_scalar(scalar) {
                Ok(key) => return Ok(key),
                Err(AuthError::InvalidKey(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::signing_failed(
            "entropy source produced no valid scalar",
        ))
    }

    fn from_scalar(scalar: Zeroizing<[u8; 32]>) -> AuthResult<Self> {
        let mut secret_key = SecretKey::from_slice(&scalar[..])
            .map_err(|e| AuthError::invalid_key(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(ecdsa::context(), &secret_key);
        secret_key.non_secure_erase();

        Ok(Self { scalar, public_key })
    }

    /// The secp256k1 secret key for a single signing call.
    /// Callers erase it once the signature is produced.
    pub(crate) fn secret_key(&self) -> AuthResult<SecretKey> {
        SecretKey::from_slice(&self.scalar[..])
            .map_err(|e| AuthError::invalid_key(e.to_string()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Address derived from the public key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Lowercase `0x` + 40 hex address
    pub fn address_hex(&self) -> String {
        self.address().to_hex()
    }

    /// Export the scalar as `0x` + 64 hex
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(&self.scalar[..])))
    }

    /// Sign a 32-byte digest; `v` is 27 or 28
    pub fn sign_hash(&self, digest: &Digest) -> AuthResult<Signature> {
        ecdsa::sign(digest, self)
    }

    /// Sign keccak256(message) with no message prefix
    pub fn sign_message(&self, message: &[u8]) -> AuthResult<Signature> {
        self.sign_hash(&keccak256(message))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Check that `text` is a usable hex private key without keeping it
pub fn validate_private_key(text: &str) -> AuthResult<()> {
    KeyMaterial::from_hex(text).map(|_| ())
}
