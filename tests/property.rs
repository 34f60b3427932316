use clob_auth::auth::verify_clob_auth_signature;
use clob_auth::eip712::clob_auth_digest;
use clob_auth::{
    build_clob_auth_signature, build_hmac_signature, decode_hex, domain_separator, encode_hex,
    keccak256, recover, to_checksum_address, verify_hmac_signature, Eip712Domain, KeyMaterial,
};
use proptest::prelude::*;
use secp256k1::SecretKey;

fn any_scalar() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>()).prop_filter("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(bytes).is_ok()
    })
}

fn flip_byte(text: &str, index: usize) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let i = index % bytes.len();
    // stay within ASCII so the result is still a valid string
    bytes[i] = if bytes[i] == b'a' { b'b' } else { b'a' };
    String::from_utf8(bytes).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));

        let tail = checksummed.trim_start_matches("0x");
        let lower_expected = hex::encode(bytes);
        prop_assert_eq!(tail.to_ascii_lowercase(), lower_expected.clone());

        let hash = keccak256(lower_expected.as_bytes());
        let mut expected = String::from("0x");
        for (i, ch) in lower_expected.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_digit() || nibble < 8 {
                expected.push(ch);
            } else {
                expected.push(ch.to_ascii_uppercase());
            }
        }
        prop_assert_eq!(checksummed, expected);
    }

    #[test]
    fn clob_auth_sign_recover(
        scalar in any_scalar(),
        chain_id in 1u64..1_000_000,
        timestamp in 0u64..4_000_000_000,
        nonce in any::<u64>(),
    ) {
        let (key, address) = KeyMaterial::derive(scalar).unwrap();
        let digest = clob_auth_digest(address, chain_id, &timestamp.to_string(), nonce).unwrap();

        let signature = key.sign_hash(&digest).unwrap();
        let bytes = signature.to_bytes();
        prop_assert_eq!(bytes.len(), 65);
        prop_assert!(bytes[64] == 27 || bytes[64] == 28);
        prop_assert_eq!(recover(&digest, &bytes).unwrap(), address);

        let hex = build_clob_auth_signature(&key, chain_id, timestamp, nonce).unwrap();
        prop_assert_eq!(hex.len(), 132);
        prop_assert!(verify_clob_auth_signature(&address, chain_id, timestamp, nonce, &hex).unwrap());
    }

    #[test]
    fn signature_hex_roundtrip(scalar in any_scalar(), digest in prop::array::uniform32(any::<u8>())) {
        let (key, _) = KeyMaterial::derive(scalar).unwrap();
        let signature = key.sign_hash(&digest).unwrap();

        let hex = encode_hex(&signature);
        prop_assert_eq!(hex.clone(), hex.to_lowercase());
        prop_assert_eq!(decode_hex(&hex).unwrap(), signature);
    }

    #[test]
    fn domain_separator_is_pure(name in "[A-Za-z ]{0,24}", version in "[0-9.]{0,6}", chain_id in any::<u64>()) {
        let a = domain_separator(&Eip712Domain::new(name.clone(), version.clone(), chain_id));
        let b = domain_separator(&Eip712Domain::new(name, version, chain_id));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn hmac_verify_and_tamper(
        secret in "[A-Za-z0-9_-]{8,44}",
        timestamp in 0u64..4_000_000_000,
        method in prop::sample::select(vec!["GET", "POST", "DELETE"]),
        path in "/[a-z]{1,16}",
        body in proptest::option::of("\\{\"[a-z]{1,8}\":[0-9]{1,6}\\}"),
        index in any::<usize>(),
    ) {
        let tag = build_hmac_signature(&secret, timestamp, method, &path, body.as_deref()).unwrap();
        prop_assert!(verify_hmac_signature(&secret, timestamp, method, &path, body.as_deref(), &tag).unwrap());

        prop_assert!(!verify_hmac_signature(&secret, timestamp + 1, method, &path, body.as_deref(), &tag).unwrap());

        let tampered_path = flip_byte(&path, index);
        prop_assert!(!verify_hmac_signature(&secret, timestamp, method, &tampered_path, body.as_deref(), &tag).unwrap());

        let tampered_secret = flip_byte(&secret, index);
        prop_assert!(!verify_hmac_signature(&tampered_secret, timestamp, method, &path, body.as_deref(), &tag).unwrap());

        if let Some(body) = &body {
            let tampered_body = flip_byte(body, index);
            prop_assert!(!verify_hmac_signature(&secret, timestamp, method, &path, Some(&tampered_body), &tag).unwrap());
        }

        let tampered_tag = flip_byte(&tag, index);
        prop_assert!(!verify_hmac_signature(&secret, timestamp, method, &path, body.as_deref(), &tampered_tag).unwrap());
    }
}
