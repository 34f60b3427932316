//! EIP-712 Typed Data Hashing
//!
//! Two paths share one set of encoding rules:
//! - the canonical path hashes fixed schemas ([`ClobAuth`]) under the narrow
//!   name/version/chainId domain
//! - the generic path hashes arbitrary [`TypedData`] documents with full
//!   recursive struct and array encoding
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use clob_auth::eip712::{ClobAuth, Eip712Domain};
//!
//! let auth = ClobAuth::new(key.address(), "1700000000", 0);
//! let digest = auth.signing_digest(&Eip712Domain::clob(137))?;
//! ```

pub mod types;
pub mod encoder;
pub mod hasher;
pub mod schema;
pub mod signer;

pub use types::*;
pub use encoder::{encode_data, encode_field, encode_type, type_hash, TypeMap};
pub use hasher::*;
pub use schema::*;
pub use signer::*;
