//! Session and result records exchanged with API clients.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Policy type applied when the caller does not send one
pub const DEFAULT_POLICY_TYPE: &str = "age_over";
/// Age threshold applied when the caller does not send a policy
pub const DEFAULT_AGE_THRESHOLD: u64 = 18;

/// Verification policy as supplied by the caller
///
/// Kept as a raw JSON object so that fields this service doesn't know about
/// are echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy(pub Map<String, Value>);

impl Policy {
    pub fn age_threshold(&self) -> Option<&Value> {
        self.0.get("age_threshold")
    }

    pub fn policy_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }
}

impl Default for Policy {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert("age_threshold".into(), json!(DEFAULT_AGE_THRESHOLD));
        map.insert("type".into(), json!(DEFAULT_POLICY_TYPE));
        Self(map)
    }
}

/// Body of `POST /sessions`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub reference: Option<Value>,
    #[serde(default)]
    pub callback_url: Option<Value>,
}

impl CreateSessionRequest {
    /// Lenient parse: a missing, malformed or non-object body is an empty request,
    /// and a `policy` that isn't an object falls back to the default policy
    pub fn from_body(raw_body: &[u8]) -> Self {
        let Ok(Value::Object(mut obj)) = serde_json::from_slice::<Value>(raw_body) else {
            return Self::default();
        };

        Self {
            policy: match obj.remove("policy") {
                Some(Value::Object(map)) => Some(Policy(map)),
                _ => None,
            },
            reference: obj.remove("reference").filter(|v| !v.is_null()),
            callback_url: obj.remove("callback_url").filter(|v| !v.is_null()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Rejected,
}

impl Outcome {
    pub fn from_approved(approved: bool) -> Self {
        if approved { Self::Approved } else { Self::Rejected }
    }
}

/// A request to verify someone's age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub policy: Policy,
    pub reference: Option<Value>,
    pub callback_url: Option<Value>,
    pub ttl_seconds: u64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the advisory expiry has passed. Expired sessions are not removed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Stub attributes attached to every result at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub age_over: bool,
    pub age_threshold: Value,
}

impl Attributes {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            age_over: true,
            age_threshold: policy.age_threshold().cloned().unwrap_or(Value::Null),
        }
    }
}

/// The outcome record paired one-to-one with a [`Session`]
///
/// `outcome` and `reason` are only ever set together with `status = complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub session_id: String,
    pub status: ResultStatus,
    pub outcome: Option<Outcome>,
    pub reason: Option<Value>,
    pub attributes: Attributes,
}

impl VerificationResult {
    pub fn pending(session_id: impl Into<String>, policy: &Policy) -> Self {
        Self {
            session_id: session_id.into(),
            status: ResultStatus::Pending,
            outcome: None,
            reason: None,
            attributes: Attributes::from_policy(policy),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == ResultStatus::Complete
    }

    /// Apply the pending -> complete transition
    pub fn complete(&mut self, outcome: Outcome, reason: Option<Value>) {
        self.status = ResultStatus::Complete;
        self.outcome = Some(outcome);
        self.reason = reason;
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    // `+00:00` rather than `Z`
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, false))
}
