//! Cross-checks against ethers-rs as an independent implementation.

use clob_auth::eip712::{ClobAuth, Eip712Domain};
use clob_auth::{hash_typed_data, KeyMaterial, TypedData};
use ethers_core::types::transaction::eip712::{Eip712, TypedData as EthersTypedData};
use ethers_core::types::H256;
use ethers_signers::{LocalWallet, Signer};

const KEYS: [&str; 2] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
];

fn ethers_digest(json: &str) -> [u8; 32] {
    let typed: EthersTypedData = serde_json::from_str(json).unwrap();
    typed.encode_eip712().unwrap()
}

#[test]
fn derived_addresses_match() {
    for hex_key in KEYS {
        let ours = KeyMaterial::from_hex(hex_key).unwrap();
        let wallet: LocalWallet = hex_key.parse().unwrap();
        assert_eq!(ours.address().as_bytes(), wallet.address().as_bytes());
    }
}

#[test]
fn clob_auth_digest_matches() {
    let key = KeyMaterial::from_hex(KEYS[0]).unwrap();

    for (chain_id, nonce) in [(137u64, 0u64), (80002, 7), (1, u64::MAX)] {
        let auth = ClobAuth::new(key.address(), "1700000000", nonce);
        let domain = Eip712Domain::clob(chain_id);

        let json = auth.to_typed_data(&domain).to_json().unwrap();
        assert_eq!(auth.signing_digest(&domain).unwrap(), ethers_digest(&json));
    }
}

#[test]
fn signatures_match() {
    let key = KeyMaterial::from_hex(KEYS[1]).unwrap();
    let wallet: LocalWallet = KEYS[1].parse().unwrap();

    let digest = ClobAuth::new(key.address(), "1700000000", 0)
        .signing_digest(&Eip712Domain::clob(137))
        .unwrap();

    let ours = key.sign_hash(&digest).unwrap();
    let theirs = wallet.sign_hash(H256::from(digest)).unwrap();
    assert_eq!(ours.to_bytes().to_vec(), theirs.to_vec());
}

#[test]
fn nested_typed_data_matches() {
    let json = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Item": [
                {"name": "id", "type": "uint256"},
                {"name": "label", "type": "string"}
            ],
            "Order": [
                {"name": "maker", "type": "address"},
                {"name": "items", "type": "Item[]"},
                {"name": "amounts", "type": "uint256[]"},
                {"name": "expiry", "type": "uint64"},
                {"name": "memo", "type": "bytes"},
                {"name": "salt", "type": "bytes32"}
            ]
        },
        "primaryType": "Order",
        "domain": {
            "name": "Exchange",
            "version": "2",
            "chainId": 137,
            "verifyingContract": "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E"
        },
        "message": {
            "maker": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "items": [
                {"id": 1, "label": "YES"},
                {"id": 2, "label": "NO"}
            ],
            "amounts": [1000000, 2500000],
            "expiry": 1893456000,
            "memo": "0xdeadbeef",
            "salt": "0x0000000000000000000000000000000000000000000000000000000000000001"
        }
    }"#;

    let ours = TypedData::from_json(json).unwrap();
    assert_eq!(hash_typed_data(&ours).unwrap(), ethers_digest(json));
}

#[test]
fn domain_without_chain_id_matches() {
    let json = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"}
            ],
            "Ping": [
                {"name": "seq", "type": "uint64"},
                {"name": "note", "type": "string"}
            ]
        },
        "primaryType": "Ping",
        "domain": {"name": "Relay", "version": "1"},
        "message": {"seq": 1, "note": "hello"}
    }"#;

    let ours = TypedData::from_json(json).unwrap();
    assert_eq!(hash_typed_data(&ours).unwrap(), ethers_digest(json));
}
