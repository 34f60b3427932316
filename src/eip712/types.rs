//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data hashing.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::types::Address;

/// Reserved name of the domain struct
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "bytes32")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 signing domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(default)]
    pub name: String,

    /// The current major version of the signing domain
    #[serde(default)]
    pub version: String,

    /// The EIP-155 chain ID. Generic documents may omit it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_chain_id"
    )]
    pub chain_id: Option<u64>,

    /// An optional disambiguating salt
    #[serde(default, skip_serializing_if = "Option::is_none", with = "salt_hex")]
    pub salt: Option<[u8; 32]>,

    /// The address of the contract that will verify the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
}

impl Eip712Domain {
    pub fn new(name: impl Into<String>, version: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: Some(chain_id),
            salt: None,
            verifying_contract: None,
        }
    }

    pub fn with_verifying_contract(mut self, contract: Address) -> Self {
        self.verifying_contract = Some(contract);
        self
    }

    pub fn with_salt(mut self, salt: [u8; 32]) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Chain ID as a 32-byte big-endian word, if set
    pub fn chain_id_word(&self) -> Option<[u8; 32]> {
        self.chain_id.map(|id| {
            let mut bytes = [0u8; 32];
            bytes[24..].copy_from_slice(&id.to_be_bytes());
            bytes
        })
    }

    /// Domain fields implied by which values are present, in standard order
    pub fn present_fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if !self.name.is_empty() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if !self.version.is_empty() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }
}

/// Accepts a JSON number, a decimal string, or a `0x` hex string
fn deserialize_chain_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;

    if value.is_null() {
        return Ok(None);
    }
    if let Some(n) = value.as_u64() {
        return Ok(Some(n));
    }
    if let Some(s) = value.as_str() {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        return parsed
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid chainId: {}", s)));
    }

    Err(D::Error::custom(format!("invalid chainId: {}", value)))
}

mod salt_hex {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::crypto::strip_hex_prefix;

    pub fn serialize<S: Serializer>(salt: &Option<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error> {
        match salt {
            Some(bytes) => serializer.serialize_str(&format!("0x{}", hex::encode(bytes))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        let Some(text) = text else { return Ok(None) };

        let bytes = hex::decode(strip_hex_prefix(&text)).map_err(D::Error::custom)?;
        let salt: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("salt must be 32 bytes"))?;
        Ok(Some(salt))
    }
}

/// Complete EIP-712 typed data document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: BTreeMap<String, Vec<TypedDataField>>,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The message tree to hash
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> AuthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> AuthResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that the primary type and every referenced type are known
    pub fn validate(&self) -> AuthResult<()> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(AuthError::UnknownType(self.primary_type.clone()));
        }

        for fields in self.types.values() {
            for field in fields {
                self.validate_type(&field.type_name)?;
            }
        }

        Ok(())
    }

    /// A type is valid if it is built-in or declared, optionally as an array
    fn validate_type(&self, type_name: &str) -> AuthResult<()> {
        let base_type = super::encoder::get_base_type(type_name);

        if is_atomic_type(base_type) || is_dynamic_type(base_type) {
            return Ok(());
        }

        if self.types.contains_key(base_type) {
            return Ok(());
        }

        Err(AuthError::UnknownType(type_name.to_string()))
    }
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    if type_name == "address" || type_name == "bool" {
        return true;
    }

    if int_bits(type_name).is_some() {
        return true;
    }

    fixed_bytes_len(type_name).is_some()
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}

/// Bit width and signedness of `uintN`/`intN`
pub(crate) fn int_bits(type_name: &str) -> Option<(u32, bool)> {
    let (bits, signed) = if let Some(rest) = type_name.strip_prefix("uint") {
        (rest, false)
    } else if let Some(rest) = type_name.strip_prefix("int") {
        (rest, true)
    } else {
        return None;
    };

    let n: u32 = bits.parse().ok()?;
    (n > 0 && n <= 256 && n % 8 == 0).then_some((n, signed))
}

/// Length of `bytesN` (1..=32)
pub(crate) fn fixed_bytes_len(type_name: &str) -> Option<usize> {
    let size = type_name.strip_prefix("bytes")?;
    let n: usize = size.parse().ok()?;
    (n > 0 && n <= 32).then_some(n)
}
