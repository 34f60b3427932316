//! Unified error types for CLOB authentication
//!
//! Every signing, hashing and verification path reports failures through
//! [`AuthError`]. Each variant carries a stable [`ErrorCode`] so callers can
//! forward failures across a JSON boundary without string matching.

use serde::{Deserialize, Serialize};

/// Main error type for all authentication operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Malformed or out-of-range private scalar, or bad key hex
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// ECDSA signing failed (entropy or curve failure)
    #[error("Signing failed: {message}")]
    SigningFailed {
        message: String,
        /// Set when the failure came from a transient entropy shortage
        transient: bool,
    },

    /// Signature input was not exactly 65 bytes
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Signature could not be parsed or recovery yielded no point
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A referenced struct type has no schema
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A declared field is absent from the message tree
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field value cannot be coerced to its declared ABI type
    #[error("Type mismatch for {type_name}: {value}")]
    TypeMismatch { type_name: String, value: String },

    /// Malformed textual address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed hex text
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Typed-data document could not be parsed or serialized
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),
}

impl AuthError {
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::SigningFailed {
            message: msg.into(),
            transient: false,
        }
    }

    /// Signing failure caused by the entropy source running dry
    pub fn entropy_exhausted(msg: impl Into<String>) -> Self {
        Self::SigningFailed {
            message: msg.into(),
            transient: true,
        }
    }

    pub fn type_mismatch(type_name: impl Into<String>, value: impl ToString) -> Self {
        Self::TypeMismatch {
            type_name: type_name.into(),
            value: value.to_string(),
        }
    }

    /// Stable error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::InvalidKey(_) => ErrorCode::InvalidKey,
            AuthError::SigningFailed { .. } => ErrorCode::SigningFailed,
            AuthError::InvalidSignatureLength(_) => ErrorCode::InvalidSignatureLength,
            AuthError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AuthError::UnknownType(_) => ErrorCode::UnknownType,
            AuthError::MissingField(_) => ErrorCode::MissingField,
            AuthError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            AuthError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            AuthError::InvalidHex(_) => ErrorCode::HexError,
            AuthError::InvalidJson(_) => ErrorCode::JsonError,
            AuthError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether the caller may retry the same call.
    ///
    /// Only a signing failure caused by a transient entropy shortage
    /// qualifies; no component in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::SigningFailed { transient: true, .. })
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Key material
    InvalidKey,
    InvalidAddress,

    // Signatures
    SigningFailed,
    InvalidSignatureLength,
    InvalidSignature,

    // Typed data schema
    UnknownType,
    MissingField,
    TypeMismatch,

    // Parse errors
    JsonError,
    HexError,

    ConfigError,
}

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::InvalidJson(e.to_string())
    }
}

impl From<hex::FromHexError> for AuthError {
    fn from(e: hex::FromHexError) -> Self {
        AuthError::InvalidHex(e.to_string())
    }
}
