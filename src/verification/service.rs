use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

use super::store::{ResultStore, SessionStore};
use super::types::{
    CreateSessionRequest, Outcome, Session, SessionStatus, VerificationResult,
};
use crate::config::{SessionConfig, WebhookConfig};
use crate::error::{AgeVerifyError, Result};
use crate::webhooks::{HmacSha256Verifier, WebhookAck, WebhookEvent, WebhookVerifier, parse_payload};

/// Lifetime of a session in seconds. Expiry is advisory only.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 900;

/// What to do with a completion event for a result that is already complete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// The first completion is final; later deliveries are acknowledged and ignored
    #[default]
    FirstWins,
    /// Every completion overwrites status, outcome and reason
    LastWins,
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first_wins" | "first-wins" | "first" => Ok(Self::FirstWins),
            "last_wins" | "last-wins" | "last" => Ok(Self::LastWins),
            other => Err(format!(
                "unknown completion policy '{}', expected 'first_wins' or 'last_wins'",
                other
            )),
        }
    }
}

/// What to do with an event whose signature check failed
///
/// Only applies when a shared secret is configured. Either way the webhook
/// is acknowledged with `verified: false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnverifiedPolicy {
    /// Apply the event anyway
    #[default]
    Process,
    /// Leave state untouched
    Reject,
}

/// Effect a webhook delivery had on the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied(Outcome),
    AlreadyComplete,
    UnknownSession,
    NotACompletion,
    RejectedUnverified,
}

/// Session/result lifecycle: creation, webhook-driven completion, lookup
///
/// Both stores are injected, so the same maps can be shared with other
/// components or inspected in tests. Every multi-store operation locks
/// sessions before results.
#[derive(Clone)]
pub struct VerificationService {
    sessions: SessionStore,
    results: ResultStore,
    verifier: Option<Arc<dyn WebhookVerifier>>,
    ttl_seconds: u64,
    completion_policy: CompletionPolicy,
    unverified_policy: UnverifiedPolicy,
}

impl VerificationService {
    /// Create a service without signature checking
    pub fn new(sessions: SessionStore, results: ResultStore) -> Self {
        Self {
            sessions,
            results,
            verifier: None,
            ttl_seconds: DEFAULT_SESSION_TTL_SECS,
            completion_policy: CompletionPolicy::default(),
            unverified_policy: UnverifiedPolicy::default(),
        }
    }

    /// Build a service with fresh stores from configuration
    pub fn from_config(webhook: &WebhookConfig, sessions: &SessionConfig) -> Self {
        let mut service = Self::new(SessionStore::new(), ResultStore::new())
            .with_ttl_seconds(sessions.ttl_seconds)
            .with_completion_policy(webhook.completion_policy)
            .with_unverified_policy(webhook.unverified_policy);

        if let Some(secret) = webhook.shared_secret.as_deref() {
            service = service.with_shared_secret(secret);
        }
        service
    }

    /// Enable HMAC-SHA256 checking. An empty secret leaves checking disabled.
    pub fn with_shared_secret(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        self.with_verifier(Arc::new(HmacSha256Verifier::new(secret)))
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        self
    }

    pub fn with_unverified_policy(mut self, policy: UnverifiedPolicy) -> Self {
        self.unverified_policy = policy;
        self
    }

    pub fn signature_checking_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Number of sessions and results, read in one critical section
    pub async fn store_sizes(&self) -> (usize, usize) {
        let sessions = self.sessions.read().await;
        let results = self.results.read().await;
        (sessions.len(), results.len())
    }

    /// Create a session and its pending result in one critical section
    pub async fn create_session(&self, request: CreateSessionRequest) -> Session {
        let policy = request.policy.unwrap_or_default();
        let created_at = Utc::now();
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut sessions = self.sessions.write().await;
        let mut results = self.results.write().await;

        let mut id = uuid::Uuid::new_v4().to_string();
        while sessions.contains(&id) || results.contains(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        let session = Session {
            id: id.clone(),
            created_at,
            status: SessionStatus::Created,
            policy,
            reference: request.reference,
            callback_url: request.callback_url,
            ttl_seconds: self.ttl_seconds,
            expires_at,
        };
        let result = VerificationResult::pending(id.clone(), &session.policy);

        sessions.put(id.clone(), session.clone());
        results.put(id, result);

        tracing::info!(
            session_id = %session.id,
            policy_type = session.policy.policy_type().unwrap_or("unknown"),
            "Verification session created"
        );

        session
    }

    pub async fn get_result(&self, session_id: &str) -> Result<VerificationResult> {
        self.results
            .get(session_id)
            .await
            .ok_or_else(|| AgeVerifyError::not_found("Unknown session id"))
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| AgeVerifyError::not_found("Unknown session id"))
    }

    /// Parse a raw webhook body and apply it
    pub async fn handle_raw_webhook(&self, raw_body: &[u8], signature: &str) -> WebhookAck {
        let payload = parse_payload(raw_body);
        self.handle_webhook(raw_body, signature, payload).await
    }

    /// Verify and apply a webhook delivery
    ///
    /// Never fails: unknown events, unknown sessions and bad signatures are
    /// all acknowledged. `verified` is `None` when no secret is configured.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: &str,
        payload: Value,
    ) -> WebhookAck {
        let verified = self.verify(raw_body, signature).await;
        let event = WebhookEvent::from_payload(&payload);

        let transition = self.apply_event(&event, verified).await;

        tracing::info!(
            event = event.event.as_deref().unwrap_or(""),
            session_id = event.session_id.as_deref().unwrap_or(""),
            verified = ?verified,
            transition = ?transition,
            "Webhook received"
        );

        WebhookAck::new(verified, payload)
    }

    async fn verify(&self, raw_body: &[u8], signature: &str) -> Option<bool> {
        let verifier = self.verifier.as_ref()?;
        match verifier.verify_signature(raw_body, signature).await {
            Ok(valid) => Some(valid),
            Err(e) => {
                tracing::warn!(error = %e, "Signature verifier failed, treating as unverified");
                Some(false)
            }
        }
    }

    async fn apply_event(&self, event: &WebhookEvent, verified: Option<bool>) -> Transition {
        let Some(session_id) = event.completion_target() else {
            return Transition::NotACompletion;
        };

        if verified == Some(false) && self.unverified_policy == UnverifiedPolicy::Reject {
            tracing::warn!(session_id, "Ignoring completion event with invalid signature");
            return Transition::RejectedUnverified;
        }

        let mut sessions = self.sessions.write().await;
        let mut results = self.results.write().await;

        let Some(result) = results.get_mut(session_id) else {
            tracing::debug!(session_id, "Completion event for unknown session");
            return Transition::UnknownSession;
        };

        if result.is_complete() && self.completion_policy == CompletionPolicy::FirstWins {
            tracing::debug!(session_id, "Result already complete, keeping first outcome");
            return Transition::AlreadyComplete;
        }

        let outcome = Outcome::from_approved(event.approved);
        result.complete(outcome, event.reason.clone());

        if let Some(session) = sessions.get_mut(session_id) {
            session.status = SessionStatus::Complete;
        }

        tracing::info!(session_id, outcome = ?outcome, "Verification completed");
        Transition::Applied(outcome)
    }
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new(SessionStore::new(), ResultStore::new())
    }
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("signature_checking", &self.verifier.is_some())
            .field("ttl_seconds", &self.ttl_seconds)
            .field("completion_policy", &self.completion_policy)
            .field("unverified_policy", &self.unverified_policy)
            .finish()
    }
}
