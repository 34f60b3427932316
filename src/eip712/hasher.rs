//! EIP-712 Hashing
//!
//! Domain separators, struct hashes and the final signing digest:
//! `keccak256(0x19 0x01 || domainSeparator || hashStruct(message))`.

use lazy_static::lazy_static;

use super::encoder::{encode_data, format_type_string, TypeMap};
use super::types::*;
use crate::error::{AuthError, AuthResult};
use crate::types::Digest;
use crate::utils::crypto::{keccak256, keccak256_concat};

/// Magic prefix for EIP-712 encoding
pub const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// Domain type used by the CLOB authentication domain
pub const CLOB_DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId)";

lazy_static! {
    static ref CLOB_DOMAIN_TYPE_HASH: Digest = keccak256(CLOB_DOMAIN_TYPE.as_bytes());
}

/// Domain separator over `name`, `version` and `chainId` only.
///
/// `verifyingContract` and `salt` are ignored even when set. An unset
/// chain id encodes as zero.
pub fn domain_separator(domain: &Eip712Domain) -> Digest {
    keccak256_concat(&[
        &CLOB_DOMAIN_TYPE_HASH[..],
        &keccak256(domain.name.as_bytes()),
        &keccak256(domain.version.as_bytes()),
        &domain.chain_id_word().unwrap_or_default(),
    ])
}

/// Domain separator for a generic typed-data document.
///
/// Uses the declared `EIP712Domain` fields when the document has them,
/// otherwise the fields implied by which domain values are present.
pub fn typed_domain_separator(domain: &Eip712Domain, types: &TypeMap) -> AuthResult<Digest> {
    let fields = match types.get(DOMAIN_TYPE_NAME) {
        Some(declared) => declared.clone(),
        None => domain.present_fields(),
    };

    let type_string = format_type_string(DOMAIN_TYPE_NAME, &fields);

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&keccak256(type_string.as_bytes()));

    for field in &fields {
        encoded.extend_from_slice(&domain_field_slot(domain, &field.name)?);
    }

    Ok(keccak256(&encoded))
}

fn domain_field_slot(domain: &Eip712Domain, name: &str) -> AuthResult<[u8; 32]> {
    let missing = || AuthError::MissingField(format!("{}.{}", DOMAIN_TYPE_NAME, name));

    match name {
        "name" => Ok(keccak256(domain.name.as_bytes())),
        "version" => Ok(keccak256(domain.version.as_bytes())),
        "chainId" => domain.chain_id_word().ok_or_else(missing),
        "verifyingContract" => domain
            .verifying_contract
            .map(|address| address.to_word())
            .ok_or_else(missing),
        "salt" => domain.salt.ok_or_else(missing),
        _ => Err(missing()),
    }
}

/// Hash a struct according to EIP-712
///
/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn hash_struct(type_name: &str, data: &serde_json::Value, types: &TypeMap) -> AuthResult<Digest> {
    let encoded = encode_data(type_name, data, types)?;
    Ok(keccak256(&encoded))
}

/// keccak256(0x19 0x01 || domainSeparator || structHash)
pub fn signing_digest(domain_separator: &Digest, struct_hash: &Digest) -> Digest {
    keccak256_concat(&[EIP712_PREFIX, domain_separator, struct_hash])
}

/// Calculate the final EIP-712 hash for signing
pub fn hash_typed_data(typed_data: &TypedData) -> AuthResult<Digest> {
    Ok(get_pre_image(typed_data)?.final_hash)
}

/// The pre-image components (for external signing)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: Digest,
    pub struct_hash: Digest,
    pub final_hash: Digest,
}

/// Calculate the pre-image components for EIP-712
pub fn get_pre_image(typed_data: &TypedData) -> AuthResult<Eip712PreImage> {
    typed_data.validate()?;

    let domain_separator = typed_domain_separator(&typed_data.domain, &typed_data.types)?;
    let struct_hash = hash_struct(&typed_data.primary_type, &typed_data.message, &typed_data.types)?;

    Ok(Eip712PreImage {
        domain_separator,
        struct_hash,
        final_hash: signing_digest(&domain_separator, &struct_hash),
    })
}

impl TypedData {
    /// Domain separator, struct hash and final digest
    pub fn pre_image(&self) -> AuthResult<Eip712PreImage> {
        get_pre_image(self)
    }

    /// The final signing digest
    pub fn encode_hash(&self) -> AuthResult<Digest> {
        hash_typed_data(self)
    }
}
