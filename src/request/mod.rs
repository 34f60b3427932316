//! Request Authentication
//!
//! Symmetric HMAC tags for individual API calls. Independent of the
//! key-pair signing modules.

pub mod signer;

pub use signer::{
    build_hmac_signature, canonical_message, verify_hmac_signature, HmacRequest, HmacSha256,
    RequestSigner, SharedSecret,
};
