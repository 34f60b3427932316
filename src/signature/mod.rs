//! Signature Codec
//!
//! Produces and parses 65-byte recoverable secp256k1 signatures and
//! recovers signer addresses from them.
//!
//! # Example
//! ```rust,ignore
//! use clob_auth::{signature, KeyMaterial};
//!
//! let key = KeyMaterial::from_hex(private_key_hex)?;
//! let sig = signature::sign(&digest, &key)?;
//! assert!(signature::verify(&digest, &sig.to_bytes(), &key.address())?);
//! ```

pub mod codec;
pub mod ecdsa;

pub use codec::{decode_hex, encode_hex, normalize_v, RecoveryParity, Signature, SIGNATURE_LENGTH};
pub use ecdsa::{
    recover, recover_hex, recover_message_signer, recover_signature, sign, verify,
    verify_message,
};
