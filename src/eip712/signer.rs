//! EIP-712 Signing
//!
//! ECDSA signing and verification for generic typed data.

use super::hasher::hash_typed_data;
use super::types::*;
use crate::error::AuthResult;
use crate::log_debug;
use crate::signature::{ecdsa, Signature};
use crate::types::Address;
use crate::wallet::KeyMaterial;

/// Sign EIP-712 typed data.
///
/// `v` is always returned as 27 or 28.
pub fn sign_typed_data(key: &KeyMaterial, typed_data: &TypedData) -> AuthResult<Signature> {
    let hash = hash_typed_data(typed_data)?;

    log_debug!(
        "eip712",
        "Signing typed data",
        primary_type = typed_data.primary_type,
        chain_id = typed_data.domain.chain_id.map_or_else(|| "none".to_string(), |id| id.to_string()),
        signer = key.address(),
        digest = hex::encode(hash)
    );

    ecdsa::sign(&hash, key)
}

/// Recover the address that signed `typed_data`
pub fn recover_typed_data_signer(typed_data: &TypedData, signature: &[u8]) -> AuthResult<Address> {
    let hash = hash_typed_data(typed_data)?;
    ecdsa::recover(&hash, signature)
}

/// Verify an EIP-712 signature against an expected signer
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &[u8],
    expected_address: &Address,
) -> AuthResult<bool> {
    let hash = hash_typed_data(typed_data)?;
    ecdsa::verify(&hash, signature, expected_address)
}

#[cfg(test)]
mod signer_tests {
    use super::*;
    use crate::error::AuthError;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn create_test_typed_data() -> TypedData {
        let json = r#"{
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"},
                    {"name": "verifyingContract", "type": "address"}
                ],
                "Person": [
                    {"name": "name", "type": "string"},
                    {"name": "wallet", "type": "address"}
                ],
                "Mail": [
                    {"name": "from", "type": "Person"},
                    {"name": "to", "type": "Person"},
                    {"name": "contents", "type": "string"}
                ]
            },
            "primaryType": "Mail",
            "domain": {
                "name": "Ether Mail",
                "version": "1",
                "chainId": 1,
                "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
            },
            "message": {
                "from": {
                    "name": "Cow",
                    "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
                },
                "to": {
                    "name": "Bob",
                    "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"
                },
                "contents": "Hello, Bob!"
            }
        }"#;

        TypedData::from_json(json).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let typed_data = create_test_typed_data();
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();

        let signature = sign_typed_data(&key, &typed_data).unwrap();
        assert!(signature.v() == 27 || signature.v() == 28);

        let bytes = signature.to_bytes();
        assert_eq!(recover_typed_data_signer(&typed_data, &bytes).unwrap(), key.address());
        assert!(verify_typed_data(&typed_data, &bytes, &key.address()).unwrap());
        assert!(!verify_typed_data(&typed_data, &bytes, &Address::ZERO).unwrap());
    }

    #[test]
    fn test_tampered_message_fails() {
        let mut typed_data = create_test_typed_data();
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let bytes = sign_typed_data(&key, &typed_data).unwrap().to_bytes();

        typed_data.message["contents"] = serde_json::json!("Hello, Eve!");
        assert!(!verify_typed_data(&typed_data, &bytes, &key.address()).unwrap());
    }

    #[test]
    fn test_schema_errors_surface() {
        let mut typed_data = create_test_typed_data();
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();

        typed_data.primary_type = "Letter".to_string();
        assert_eq!(
            sign_typed_data(&key, &typed_data).unwrap_err(),
            AuthError::UnknownType("Letter".into())
        );
    }
}
