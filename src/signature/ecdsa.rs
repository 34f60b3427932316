//! ECDSA Signing and Recovery
//!
//! Deterministic-nonce (RFC 6979) secp256k1 signatures over 32-byte digests,
//! and signer recovery from `(digest, signature)`.

use lazy_static::lazy_static;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1};

use super::codec::{normalize_v, Signature};
use crate::error::{AuthError, AuthResult};
use crate::types::{Address, Digest};
use crate::utils::crypto::keccak256;
use crate::wallet::KeyMaterial;

lazy_static! {
    static ref SECP256K1: Secp256k1<All> = Secp256k1::new();
}

/// Shared signing/verification context
pub(crate) fn context() -> &'static Secp256k1<All> {
    &SECP256K1
}

/// Sign a digest. The returned signature always carries `v` in {27, 28}.
pub fn sign(digest: &Digest, key: &KeyMaterial) -> AuthResult<Signature> {
    let mut secret_key = key
        .secret_key()
        .map_err(|e| AuthError::signing_failed(e.to_string()))?;
    let message = Message::from_digest(*digest);

    let recoverable = context().sign_ecdsa_recoverable(&message, &secret_key);
    secret_key.non_secure_erase();
    let (recovery_id, compact) = recoverable.serialize_compact();

    // Ids 2 and 3 only occur when r overflowed the curve order
    let id = recovery_id.to_i32();
    let parity = u8::try_from(id)
        .map_err(|_| AuthError::signing_failed(format!("unsupported recovery id: {}", id)))
        .and_then(|v| {
            normalize_v(v).map_err(|_| {
                AuthError::signing_failed(format!("unsupported recovery id: {}", id))
            })
        })?;

    Ok(Signature::from_compact(&compact, parity))
}

/// Recover the signer address from a digest and raw signature bytes.
///
/// The input must be exactly 65 bytes; `v` may be 0, 1, 27 or 28.
pub fn recover(digest: &Digest, signature: &[u8]) -> AuthResult<Address> {
    let signature = Signature::from_bytes(signature)?;
    recover_signature(digest, &signature)
}

/// Recover the signer address from a parsed signature
pub fn recover_signature(digest: &Digest, signature: &Signature) -> AuthResult<Address> {
    let parity = normalize_v(signature.v())?;
    let recovery_id = RecoveryId::from_i32(i32::from(parity.index()))
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

    let recoverable = RecoverableSignature::from_compact(&signature.compact(), recovery_id)
        .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest(*digest);
    let public_key = context()
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| AuthError::InvalidSignature(format!("recovery failed: {}", e)))?;

    Ok(Address::from_public_key(&public_key))
}

/// Recover the signer address from a hex signature
pub fn recover_hex(digest: &Digest, signature: &str) -> AuthResult<Address> {
    let signature = Signature::from_hex(signature)?;
    recover_signature(digest, &signature)
}

/// Recover, then compare against `expected` without short-circuiting.
///
/// Malformed signatures propagate the same errors as [`recover`].
pub fn verify(digest: &Digest, signature: &[u8], expected: &Address) -> AuthResult<bool> {
    let recovered = recover(digest, signature)?;
    Ok(recovered.ct_eq(expected))
}

/// Recover the signer of keccak256(message) (no message prefix)
pub fn recover_message_signer(message: &[u8], signature: &[u8]) -> AuthResult<Address> {
    recover(&keccak256(message), signature)
}

/// Verify a raw-message signature against an expected signer
pub fn verify_message(message: &[u8], signature: &[u8], expected: &Address) -> AuthResult<bool> {
    verify(&keccak256(message), signature, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    // ClobAuth digest for chain 137, timestamp 1700000000, nonce 0
    const DIGEST: &str = "c85352894b3c41f3ea6152479d64b9233fbaf2de87eabc7e4bba3a161fd28493";
    const EXPECTED_SIG: &str = "0x659ed4b28ae28e0f038fdf0023c00863c9559caacb9ebc83f44eea87059a099a36f1e1dee110e7faa1c4f65d17489b2da1333ebef78bbe2116d81207b975052d1c";

    fn digest() -> Digest {
        let mut d = [0u8; 32];
        hex::decode_to_slice(DIGEST, &mut d).unwrap();
        d
    }

    #[test]
    fn test_sign_is_deterministic() {
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let sig = sign(&digest(), &key).unwrap();
        assert_eq!(sig.to_hex(), EXPECTED_SIG);
        assert_eq!(sign(&digest(), &key).unwrap(), sig);
        assert!(sig.v() == 27 || sig.v() == 28);
    }

    #[test]
    fn test_erasing_signing_copy_keeps_key() {
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let first = sign(&digest(), &key).unwrap();

        // only the per-call copy is wiped
        let copy = key.secret_key().unwrap();
        assert_eq!(hex::encode(copy.secret_bytes()), TEST_KEY);
        assert_eq!(sign(&digest(), &key).unwrap(), first);
        assert_eq!(recover(&digest(), &first.to_bytes()).unwrap(), key.address());
    }

    #[test]
    fn test_recover_accepts_both_v_forms() {
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let sig = sign(&digest(), &key).unwrap();

        let mut bytes = sig.to_bytes();
        assert_eq!(recover(&digest(), &bytes).unwrap(), key.address());

        bytes[64] -= 27;
        assert_eq!(recover(&digest(), &bytes).unwrap(), key.address());
    }

    #[test]
    fn test_recover_wrong_length() {
        let sig = [0u8; 64];
        assert_eq!(
            recover(&digest(), &sig).unwrap_err(),
            AuthError::InvalidSignatureLength(64)
        );
        assert_eq!(
            verify(&digest(), &sig, &Address::ZERO).unwrap_err(),
            AuthError::InvalidSignatureLength(64)
        );
    }

    #[test]
    fn test_recover_unrecoverable() {
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        assert!(matches!(
            recover(&digest(), &bytes),
            Err(AuthError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_verify() {
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let sig = sign(&digest(), &key).unwrap().to_bytes();

        assert!(verify(&digest(), &sig, &key.address()).unwrap());
        assert!(!verify(&digest(), &sig, &Address::ZERO).unwrap());

        let mut other = digest();
        other[0] ^= 1;
        assert!(!verify(&other, &sig, &key.address()).unwrap());
    }

    #[test]
    fn test_message_signing() {
        let key = KeyMaterial::from_hex(TEST_KEY).unwrap();
        let sig = key.sign_message(b"hello polymarket").unwrap();
        assert_eq!(
            sig.to_hex(),
            "0x79cd1e749007ed1b6c65a1d8f154012eb2b0c8554c85ef59ad0fd67c2cf79abf0edf3e1950d805c1ccd56f50e510015a744c5c0b42b9d7b6dc956556de4f17141b"
        );

        let bytes = sig.to_bytes();
        assert_eq!(recover_message_signer(b"hello polymarket", &bytes).unwrap(), key.address());
        assert!(verify_message(b"hello polymarket", &bytes, &key.address()).unwrap());
        assert!(!verify_message(b"hello polymarket!", &bytes, &key.address()).unwrap());
    }

    #[test]
    fn test_recover_hex() {
        let recovered = recover_hex(&digest(), EXPECTED_SIG).unwrap();
        assert_eq!(recovered.to_hex(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }
}
