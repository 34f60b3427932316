//! Wallet Module
//!
//! Key material ownership and address derivation.

pub mod keys;

pub use keys::{validate_private_key, KeyMaterial};
