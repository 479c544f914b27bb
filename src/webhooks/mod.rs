//! Inbound webhook handling.
//!
//! Signature verification for webhook bodies signed with a shared secret, and
//! lenient parsing of the verification events the service reacts to.

pub mod event;
pub mod verification;

pub use event::{VERIFICATION_COMPLETE, WebhookAck, WebhookEvent, parse_payload};
pub use verification::{HmacSha256Verifier, WebhookVerifier, sign_payload, verify_signature};
