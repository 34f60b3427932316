//! L1 Wallet Attestation
//!
//! Proves control of a wallet by signing a `ClobAuth` message under the
//! `ClobAuthDomain` EIP-712 domain. The resulting signature travels with
//! the address, timestamp and nonce so the server can recover the signer.

use serde::{Deserialize, Serialize};

use crate::config::{AuthSettings, Chain};
use crate::eip712::{ClobAuth, Eip712Domain};
use crate::error::{AuthError, AuthResult};
use crate::signature::{ecdsa, Signature};
use crate::types::{Address, Digest};
use crate::wallet::KeyMaterial;
use crate::{log_debug, log_info};

/// Everything the server needs to check an L1 attestation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Attestation {
    pub address: Address,
    pub timestamp: String,
    pub nonce: u64,
    pub signature: Signature,
}

impl L1Attestation {
    /// Check the signature against the attested address on `chain_id`,
    /// assuming the standard domain and attestation text
    pub fn verify(&self, chain_id: u64) -> AuthResult<bool> {
        self.verify_with(&AuthSettings::for_chain(Chain::from_chain_id(chain_id)))
    }

    /// Check the signature under the domain and text in `settings`
    pub fn verify_with(&self, settings: &AuthSettings) -> AuthResult<bool> {
        let digest = settings
            .clob_auth(self.address, self.timestamp.clone(), self.nonce)
            .signing_digest(&settings.domain())?;
        ecdsa::verify(&digest, &self.signature.to_bytes(), &self.address)
    }
}

/// Signs ClobAuth attestations with one key and one set of settings
pub struct ClobAuthSigner {
    key: KeyMaterial,
    settings: AuthSettings,
}

impl ClobAuthSigner {
    pub fn new(key: KeyMaterial, settings: AuthSettings) -> Self {
        Self { key, settings }
    }

    /// Signer for `chain_id` with default domain settings
    pub fn for_chain(key: KeyMaterial, chain_id: u64) -> Self {
        let settings = AuthSettings {
            chain_id,
            ..AuthSettings::default()
        };
        Self::new(key, settings)
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    fn message(&self, timestamp: u64, nonce: u64) -> ClobAuth {
        self.settings.clob_auth(self.key.address(), timestamp.to_string(), nonce)
    }

    /// The digest that [`attest`](Self::attest) signs
    pub fn digest(&self, timestamp: u64, nonce: u64) -> AuthResult<Digest> {
        self.message(timestamp, nonce)
            .signing_digest(&self.settings.domain())
    }

    /// Sign an attestation for `timestamp` (unix seconds) and `nonce`
    pub fn attest(&self, timestamp: u64, nonce: u64) -> AuthResult<L1Attestation> {
        let message = self.message(timestamp, nonce);
        let digest = message.signing_digest(&self.settings.domain())?;

        log_debug!(
            "auth",
            "Signing ClobAuth attestation",
            schema = "ClobAuth",
            chain_id = self.settings.chain_id,
            address = message.address,
            nonce = nonce
        );

        let signature = ecdsa::sign(&digest, &self.key)?;

        Ok(L1Attestation {
            address: message.address,
            timestamp: message.timestamp,
            nonce,
            signature,
        })
    }

    /// Check an attestation under this signer's settings
    pub fn verify(&self, attestation: &L1Attestation) -> AuthResult<bool> {
        attestation.verify_with(&self.settings)
    }

    /// Sign an attestation stamped with the current time
    pub fn attest_now(&self, nonce: u64) -> AuthResult<L1Attestation> {
        let now = chrono::Utc::now().timestamp();
        let timestamp = u64::try_from(now)
            .map_err(|_| AuthError::Config(format!("system clock before epoch: {}", now)))?;
        self.attest(timestamp, nonce)
    }
}

/// Sign the canonical ClobAuth message and return the `0x` hex signature
pub fn build_clob_auth_signature(
    key: &KeyMaterial,
    chain_id: u64,
    timestamp: u64,
    nonce: u64,
) -> AuthResult<String> {
    let digest = ClobAuth::new(key.address(), timestamp.to_string(), nonce)
        .signing_digest(&Eip712Domain::clob(chain_id))?;

    log_debug!(
        "auth",
        "Building ClobAuth signature",
        chain_id = chain_id,
        signer = key.address()
    );

    Ok(ecdsa::sign(&digest, key)?.to_hex())
}

/// Check a hex ClobAuth signature against the claimed address
pub fn verify_clob_auth_signature(
    address: &Address,
    chain_id: u64,
    timestamp: u64,
    nonce: u64,
    signature: &str,
) -> AuthResult<bool> {
    let signature = Signature::from_hex(signature)?;
    let digest = ClobAuth::new(*address, timestamp.to_string(), nonce)
        .signing_digest(&Eip712Domain::clob(chain_id))?;

    let valid = ecdsa::verify(&digest, &signature.to_bytes(), address)?;
    if !valid {
        log_info!(
            "auth",
            "ClobAuth signature does not match address",
            address = address,
            chain_id = chain_id
        );
    }

    Ok(valid)
}
