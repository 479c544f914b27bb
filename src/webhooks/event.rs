use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event name that completes a verification
pub const VERIFICATION_COMPLETE: &str = "verification_complete";

/// Fields of an inbound webhook the service acts on, read leniently from JSON
///
/// Any field may be missing or of an unexpected type; the event is simply
/// ignored by the state machine in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event: Option<String>,
    pub session_id: Option<String>,
    pub approved: bool,
    pub reason: Option<Value>,
}

impl WebhookEvent {
    /// Extract the event from a parsed payload. Non-object values yield an empty event.
    pub fn from_payload(payload: &Value) -> Self {
        let empty = Map::new();
        let obj = payload.as_object().unwrap_or(&empty);

        Self {
            event: obj.get("event").and_then(Value::as_str).map(str::to_owned),
            session_id: obj
                .get("session_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
            approved: obj.get("approved").map(is_truthy).unwrap_or(true),
            reason: obj.get("reason").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// The session this event completes, if it is a completion event
    pub fn completion_target(&self) -> Option<&str> {
        match self.event.as_deref() {
            Some(VERIFICATION_COMPLETE) => self.session_id.as_deref(),
            _ => None,
        }
    }
}

/// Acknowledgement returned for every webhook delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
    /// `None` when no shared secret is configured
    pub verified: Option<bool>,
    pub json: Value,
}

impl WebhookAck {
    pub fn new(verified: Option<bool>, json: Value) -> Self {
        Self {
            received: true,
            verified,
            json,
        }
    }
}

/// Parse a raw webhook body; anything that isn't a JSON object becomes `{}`
pub fn parse_payload(raw_body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => Value::Object(Map::new()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
