//! HMAC Request Signing
//!
//! Per-request authentication tags for the trading API:
//! `HMAC-SHA256(secret, "{timestamp}{method}{path}{body?}")`, encoded as
//! standard base64 with `+` -> `-` and `/` -> `_`. Padding is kept.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};
use crate::log_debug;
use crate::utils::crypto::secure_compare;

/// HMAC-SHA256 type alias
pub type HmacSha256 = Hmac<Sha256>;

/// URL-safe, padded, and lenient about non-zero trailing bits
const SECRET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// API secret used as HMAC key material.
///
/// Decoded once as URL-safe base64, ignoring line breaks. Text that does
/// not decode is used as raw bytes instead; this is not an error.
pub struct SharedSecret {
    key: Zeroizing<Vec<u8>>,
    decoded: bool,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::from_secret(SecretString::from(secret.into()))
    }

    pub fn from_secret(secret: SecretString) -> Self {
        let text = secret.expose_secret();
        let compact: Zeroizing<String> =
            Zeroizing::new(text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect());

        match SECRET_ENGINE.decode(compact.as_bytes()) {
            Ok(bytes) => Self {
                key: Zeroizing::new(bytes),
                decoded: true,
            },
            Err(_) => {
                log_debug!(
                    "request",
                    "Secret is not URL-safe base64, using raw bytes",
                    input_len = text.len()
                );
                Self {
                    key: Zeroizing::new(text.as_bytes().to_vec()),
                    decoded: false,
                }
            }
        }
    }

    /// True when the secret decoded as base64
    pub fn was_decoded(&self) -> bool {
        self.decoded
    }

    fn mac(&self) -> AuthResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuthError::signing_failed(format!("HMAC initialization failed: {}", e)))
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("key", &"[REDACTED]")
            .field("decoded", &self.decoded)
            .finish()
    }
}

/// Request metadata covered by the tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmacRequest {
    pub timestamp: u64,
    pub method: String,
    pub path: String,
    pub body: Option<String>,
}

impl HmacRequest {
    pub fn new(timestamp: u64, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp,
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `{timestamp}{method}{path}{body?}` with no separators
    pub fn canonical_message(&self) -> Vec<u8> {
        canonical_message(self.timestamp, &self.method, &self.path, self.body.as_deref())
    }
}

/// Build the exact byte string the tag authenticates.
///
/// An absent body is omitted entirely.
pub fn canonical_message(timestamp: u64, method: &str, path: &str, body: Option<&str>) -> Vec<u8> {
    let mut message = format!("{}{}{}", timestamp, method, path);
    if let Some(body) = body {
        message.push_str(body);
    }
    message.into_bytes()
}

/// Standard base64 with `+`/`/` swapped for `-`/`_`; `=` padding untouched
fn encode_tag(mac: &[u8]) -> String {
    STANDARD.encode(mac).replace('+', "-").replace('/', "_")
}

/// Signs requests with one shared secret
#[derive(Debug)]
pub struct RequestSigner {
    secret: SharedSecret,
}

impl RequestSigner {
    pub fn new(secret: SharedSecret) -> Self {
        Self { secret }
    }

    pub fn from_text(secret: impl Into<String>) -> Self {
        Self::new(SharedSecret::new(secret))
    }

    /// Compute the tag for `request`
    pub fn sign(&self, request: &HmacRequest) -> AuthResult<String> {
        let mut mac = self.secret.mac()?;
        mac.update(&request.canonical_message());
        Ok(encode_tag(&mac.finalize().into_bytes()))
    }

    /// Recompute and compare in constant time
    pub fn verify(&self, request: &HmacRequest, candidate: &str) -> AuthResult<bool> {
        let expected = self.sign(request)?;
        Ok(secure_compare(expected.as_bytes(), candidate.as_bytes()))
    }
}

/// Sign one request with a textual secret
pub fn build_hmac_signature(
    secret: &str,
    timestamp: u64,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> AuthResult<String> {
    let request = HmacRequest {
        timestamp,
        method: method.to_string(),
        path: path.to_string(),
        body: body.map(str::to_string),
    };
    RequestSigner::from_text(secret).sign(&request)
}

/// Verify a tag produced by [`build_hmac_signature`]
pub fn verify_hmac_signature(
    secret: &str,
    timestamp: u64,
    method: &str,
    path: &str,
    body: Option<&str>,
    candidate: &str,
) -> AuthResult<bool> {
    let expected = build_hmac_signature(secret, timestamp, method, path, body)?;
    Ok(secure_compare(expected.as_bytes(), candidate.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c29tZXNlY3JldA==";
    const TS: u64 = 1_700_000_000;

    #[test]
    fn test_canonical_message_layout() {
        assert_eq!(canonical_message(TS, "GET", "/orders", None), b"1700000000GET/orders");
        assert_eq!(
            canonical_message(TS, "POST", "/order", Some("{}")),
            b"1700000000POST/order{}"
        );

        // an empty body is still appended, but adds nothing
        assert_eq!(
            canonical_message(TS, "GET", "/orders", Some("")),
            canonical_message(TS, "GET", "/orders", None)
        );
    }

    #[test]
    fn test_known_tags() {
        assert_eq!(
            build_hmac_signature(SECRET, TS, "GET", "/orders", None).unwrap(),
            "9zi79YAZWtJMahdt4wqC9kRFvTbRICzg3qYmCBImmVQ="
        );
        assert_eq!(
            build_hmac_signature(SECRET, TS, "POST", "/orders", None).unwrap(),
            "pnoEFqdwzTuFrQ-Et0q7h9NUwuuANspLD6w62gSrMUM="
        );
        assert_eq!(
            build_hmac_signature(SECRET, TS, "POST", "/order", Some(r#"{"side":"BUY"}"#)).unwrap(),
            "EsAspz2P4sPQYpF7MGehaXjo5_WZBJGRRPedRCejD9M="
        );
    }

    #[test]
    fn test_alphabet_translation_keeps_padding() {
        let tag = build_hmac_signature(SECRET, 1_700_000_004, "GET", "/orders", None).unwrap();
        assert_eq!(tag, "p61BqVy6NPgUNSqw_kmYxjox9ghq-WZ0-nUl0vewA8I=");
        assert!(!tag.contains('+'));
        assert!(!tag.contains('/'));
        assert!(tag.ends_with('='));
    }

    #[test]
    fn test_raw_secret_fallback() {
        let secret = SharedSecret::new("not base64!");
        assert!(!secret.was_decoded());
        assert!(SharedSecret::new(SECRET).was_decoded());

        assert_eq!(
            build_hmac_signature("not base64!", TS, "GET", "/orders", None).unwrap(),
            "KUrjUcklzqsHCONBLdnXgTOT2JzrczQwq_j8fvEMcfk="
        );
    }

    #[test]
    fn test_lenient_secret_decoding() {
        let expected = build_hmac_signature(SECRET, TS, "GET", "/orders", None).unwrap();

        // non-zero trailing bits decode to the same key
        let loose = SharedSecret::new("c29tZXNlY3JldB==");
        assert!(loose.was_decoded());
        assert_eq!(
            build_hmac_signature("c29tZXNlY3JldB==", TS, "GET", "/orders", None).unwrap(),
            expected
        );

        // line breaks are skipped
        assert!(SharedSecret::new("c29tZXNl\r\nY3JldA==\n").was_decoded());
        assert_eq!(
            build_hmac_signature("c29tZXNl\r\nY3JldA==\n", TS, "GET", "/orders", None).unwrap(),
            expected
        );
    }

    #[test]
    fn test_signer_verify() {
        let signer = RequestSigner::from_text(SECRET);
        let request = HmacRequest::new(TS, "POST", "/order").with_body(r#"{"side":"BUY"}"#);
        let tag = signer.sign(&request).unwrap();

        assert!(signer.verify(&request, &tag).unwrap());
        assert!(!signer.verify(&request, &tag[..tag.len() - 1]).unwrap());

        let other = HmacRequest::new(TS, "POST", "/order").with_body(r#"{"side":"SELL"}"#);
        assert!(!signer.verify(&other, &tag).unwrap());

        assert!(verify_hmac_signature(SECRET, TS, "POST", "/order", Some(r#"{"side":"BUY"}"#), &tag).unwrap());
        assert!(!verify_hmac_signature(SECRET, TS + 1, "POST", "/order", Some(r#"{"side":"BUY"}"#), &tag).unwrap());
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", SharedSecret::new(SECRET));
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("somesecret"));
    }
}
