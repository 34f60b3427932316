//! Fixed Message Schemas
//!
//! Every canonical message type is a [`StructSchema`] table entry plus a
//! list of [`FieldValue`]s. One encoder walks the table, so a new message
//! type needs a table entry and an [`AuthMessage`] variant, nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::encoder::word_from_u64;
use super::hasher::{domain_separator, signing_digest};
use super::types::*;
use crate::error::{AuthError, AuthResult};
use crate::types::{Address, Digest};
use crate::utils::crypto::keccak256;

/// Attestation text signed by every L1 authentication message
pub const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

/// Name of the CLOB authentication signing domain
pub const CLOB_DOMAIN_NAME: &str = "ClobAuthDomain";

/// Version of the CLOB authentication signing domain
pub const CLOB_DOMAIN_VERSION: &str = "1";

/// An ordered `(fieldName, abiType)` layout for one struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructSchema {
    pub name: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
}

/// `ClobAuth(address address,string timestamp,uint256 nonce,string message)`
pub const CLOB_AUTH_SCHEMA: StructSchema = StructSchema {
    name: "ClobAuth",
    fields: &[
        ("address", "address"),
        ("timestamp", "string"),
        ("nonce", "uint256"),
        ("message", "string"),
    ],
};

/// All known canonical schemas
pub const SCHEMAS: &[StructSchema] = &[CLOB_AUTH_SCHEMA];

/// Look up a canonical schema by struct name
pub fn lookup_schema(name: &str) -> Option<&'static StructSchema> {
    SCHEMAS.iter().find(|schema| schema.name == name)
}

impl StructSchema {
    /// `Name(type1 name1,type2 name2,...)`
    pub fn type_string(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, type_name)| format!("{} {}", type_name, name))
            .collect();
        format!("{}({})", self.name, fields.join(","))
    }

    pub fn type_hash(&self) -> Digest {
        keccak256(self.type_string().as_bytes())
    }

    /// Field list in the generic typed-data form
    pub fn to_fields(&self) -> Vec<TypedDataField> {
        self.fields
            .iter()
            .map(|(name, type_name)| TypedDataField::new(*name, *type_name))
            .collect()
    }

    /// keccak256(typeHash || enc(field)...) with values in schema order
    pub fn hash_struct(&self, values: &[FieldValue]) -> AuthResult<Digest> {
        if values.len() < self.fields.len() {
            let (missing, _) = self.fields[values.len()];
            return Err(AuthError::MissingField(format!("{}.{}", self.name, missing)));
        }
        if values.len() > self.fields.len() {
            return Err(AuthError::type_mismatch(
                self.name,
                format!("expected {} fields, got {}", self.fields.len(), values.len()),
            ));
        }

        let mut encoded = Vec::with_capacity(32 * (values.len() + 1));
        encoded.extend_from_slice(&self.type_hash());
        for ((_, type_name), value) in self.fields.iter().zip(values) {
            encoded.extend_from_slice(&value.encode(type_name)?);
        }

        Ok(keccak256(&encoded))
    }
}

/// A field value for a fixed schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Address(Address),
    String(String),
    Uint(u64),
}

impl FieldValue {
    /// Encode into a 32-byte slot, checking the value against `type_name`
    pub fn encode(&self, type_name: &str) -> AuthResult<[u8; 32]> {
        match (type_name, self) {
            ("address", FieldValue::Address(address)) => Ok(address.to_word()),
            ("string", FieldValue::String(text)) => Ok(keccak256(text.as_bytes())),
            (_, FieldValue::Uint(n)) if fits_uint(type_name, *n) => Ok(word_from_u64(*n)),
            _ => Err(AuthError::type_mismatch(type_name, self)),
        }
    }
}

fn fits_uint(type_name: &str, n: u64) -> bool {
    match int_bits(type_name) {
        Some((bits, false)) => bits >= 64 || n >> bits == 0,
        _ => false,
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Address(address) => write!(f, "{}", address),
            FieldValue::String(text) => write!(f, "{:?}", text),
            FieldValue::Uint(n) => write!(f, "{}", n),
        }
    }
}

/// The L1 authentication message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClobAuth {
    pub address: Address,
    pub timestamp: String,
    pub nonce: u64,
    pub message: String,
}

impl ClobAuth {
    /// Build the message with the fixed attestation text
    pub fn new(address: Address, timestamp: impl Into<String>, nonce: u64) -> Self {
        Self {
            address,
            timestamp: timestamp.into(),
            nonce,
            message: CLOB_AUTH_MESSAGE.to_string(),
        }
    }

    /// Override the attestation text
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Address(self.address),
            FieldValue::String(self.timestamp.clone()),
            FieldValue::Uint(self.nonce),
            FieldValue::String(self.message.clone()),
        ]
    }

    pub fn struct_hash(&self) -> AuthResult<Digest> {
        CLOB_AUTH_SCHEMA.hash_struct(&self.field_values())
    }

    /// Final digest under the narrow name/version/chainId domain
    pub fn signing_digest(&self, domain: &Eip712Domain) -> AuthResult<Digest> {
        Ok(signing_digest(&domain_separator(domain), &self.struct_hash()?))
    }

    /// Render as a generic typed-data document
    pub fn to_typed_data(&self, domain: &Eip712Domain) -> TypedData {
        let mut types = std::collections::BTreeMap::new();
        types.insert(DOMAIN_TYPE_NAME.to_string(), vec![
            TypedDataField::new("name", "string"),
            TypedDataField::new("version", "string"),
            TypedDataField::new("chainId", "uint256"),
        ]);
        types.insert(CLOB_AUTH_SCHEMA.name.to_string(), CLOB_AUTH_SCHEMA.to_fields());

        TypedData {
            types,
            primary_type: CLOB_AUTH_SCHEMA.name.to_string(),
            domain: Eip712Domain {
                salt: None,
                verifying_contract: None,
                ..domain.clone()
            },
            message: serde_json::json!({
                "address": self.address.to_hex(),
                "timestamp": self.timestamp,
                "nonce": self.nonce,
                "message": self.message,
            }),
        }
    }
}

/// A canonical message tagged with its schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMessage {
    ClobAuth(ClobAuth),
}

impl AuthMessage {
    pub fn schema(&self) -> &'static StructSchema {
        match self {
            AuthMessage::ClobAuth(_) => &CLOB_AUTH_SCHEMA,
        }
    }

    pub fn field_values(&self) -> Vec<FieldValue> {
        match self {
            AuthMessage::ClobAuth(auth) => auth.field_values(),
        }
    }

    pub fn struct_hash(&self) -> AuthResult<Digest> {
        self.schema().hash_struct(&self.field_values())
    }

    pub fn signing_digest(&self, domain: &Eip712Domain) -> AuthResult<Digest> {
        Ok(signing_digest(&domain_separator(domain), &self.struct_hash()?))
    }
}

impl From<ClobAuth> for AuthMessage {
    fn from(auth: ClobAuth) -> Self {
        AuthMessage::ClobAuth(auth)
    }
}

impl Eip712Domain {
    /// The CLOB authentication domain on `chain_id`
    pub fn clob(chain_id: u64) -> Self {
        Self::new(CLOB_DOMAIN_NAME, CLOB_DOMAIN_VERSION, chain_id)
    }
}

/// ClobAuth digest for `(address, chain_id, timestamp, nonce)`
pub fn clob_auth_digest(address: Address, chain_id: u64, timestamp: &str, nonce: u64) -> AuthResult<Digest> {
    ClobAuth::new(address, timestamp, nonce).signing_digest(&Eip712Domain::clob(chain_id))
}
