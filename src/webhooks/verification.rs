use crate::error::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefixes accepted in front of the hex digest. Only the first match is stripped.
const SIGNATURE_PREFIXES: [&str; 2] = ["sha256=", "sha256:"];

/// Trait for verifying webhook signatures
///
/// Implementations must fail closed: malformed input yields `Ok(false)`,
/// never `Ok(true)`.
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    /// Verify `signature` (the raw header value) against the raw `payload` bytes
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool>;
}

/// HMAC-SHA256 verifier for hex signatures, optionally prefixed with
/// `sha256=` or `sha256:`
///
/// # Example
///
/// ```rust
/// use ageverify::webhooks::{HmacSha256Verifier, sign_payload};
///
/// let verifier = HmacSha256Verifier::new("whsec_test");
/// let body = br#"{"event":"verification_complete"}"#;
/// let header = format!("sha256={}", sign_payload("whsec_test", body));
/// assert!(verifier.verify(body, &header));
/// ```
#[derive(Clone)]
pub struct HmacSha256Verifier {
    secret: Vec<u8>,
}

impl HmacSha256Verifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check a header value against `payload`; `false` on any mismatch or bad input
    pub fn verify(&self, payload: &[u8], header_value: &str) -> bool {
        if self.secret.is_empty() || header_value.is_empty() {
            return false;
        }

        let provided = strip_signature_prefix(header_value);

        let Some(expected) = compute_hex_signature(&self.secret, payload) else {
            tracing::debug!("Failed to initialise HMAC for webhook signature");
            return false;
        };

        let is_valid = constant_time_compare(expected.as_bytes(), provided.as_bytes());
        if !is_valid {
            tracing::debug!("Webhook signature verification failed");
        }
        is_valid
    }
}

impl std::fmt::Debug for HmacSha256Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Verifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl WebhookVerifier for HmacSha256Verifier {
    async fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        Ok(self.verify(payload, signature))
    }
}

/// Verify that `raw_body` was signed with `secret`
///
/// Returns `false` when either the secret or the header is empty.
pub fn verify_signature(secret: &str, raw_body: &[u8], header_value: &str) -> bool {
    HmacSha256Verifier::new(secret.as_bytes()).verify(raw_body, header_value)
}

/// Sign a payload and return the lowercase hex HMAC-SHA256 digest (no prefix)
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    compute_hex_signature(secret.as_bytes(), payload).unwrap_or_default()
}

fn compute_hex_signature(secret: &[u8], payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn strip_signature_prefix(header_value: &str) -> &str {
    SIGNATURE_PREFIXES
        .iter()
        .find_map(|prefix| header_value.strip_prefix(prefix))
        .unwrap_or(header_value)
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
