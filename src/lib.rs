//! CLOB Authentication Core
//!
//! Wallet attestations and request tags for the CLOB trading API.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: secp256k1 key material and address derivation
//! - **eip712**: domain separators, struct hashes and typed-data digests
//! - **signature**: 65-byte recoverable signatures, signing and recovery
//! - **request**: HMAC-SHA256 request tags
//! - **auth**: the end-to-end L1 `ClobAuth` attestation
//! - **config**: domain settings and chain presets
//!
//! # Security
//!
//! Private scalars and decoded secrets live in `zeroize` buffers and are
//! wiped on drop. Log fields are redacted by key name.
//!
//! # Example
//!
//! ```rust,ignore
//! use clob_auth::{build_clob_auth_signature, build_hmac_signature, KeyMaterial};
//!
//! let key = KeyMaterial::from_hex(private_key_hex)?;
//! let l1 = build_clob_auth_signature(&key, 137, 1_700_000_000, 0)?;
//! let l2 = build_hmac_signature(api_secret, 1_700_000_000, "GET", "/orders", None)?;
//! ```

pub mod error;
pub mod types;
pub mod utils;
pub mod wallet;
pub mod eip712;
pub mod signature;
pub mod request;
pub mod auth;
pub mod config;

// Re-export key types for convenience
pub use error::{AuthError, AuthResult, ErrorCode};
pub use types::{validate_address, Address, Digest};

pub use wallet::{validate_private_key, KeyMaterial};

pub use eip712::{
    domain_separator, hash_typed_data, AuthMessage, ClobAuth, Eip712Domain, TypedData,
    CLOB_AUTH_MESSAGE,
};

pub use signature::{decode_hex, encode_hex, normalize_v, recover, sign, verify, Signature};

pub use request::{build_hmac_signature, verify_hmac_signature, HmacRequest, RequestSigner, SharedSecret};

pub use auth::{build_clob_auth_signature, verify_clob_auth_signature, ClobAuthSigner, L1Attestation};

pub use config::{AuthConfig, AuthSettings, Chain};

pub use utils::crypto::{keccak256, to_checksum_address};
