//! Age-verification sessions and their results.
//!
//! A client creates a [`Session`]; a paired [`VerificationResult`] starts out
//! `pending` and is completed by a `verification_complete` webhook. Clients
//! poll the result by session id.

pub mod routes;
pub mod service;
pub mod store;
pub mod types;

pub use routes::VerificationModule;
pub use service::{
    CompletionPolicy, DEFAULT_SESSION_TTL_SECS, Transition, UnverifiedPolicy,
    VerificationService,
};
pub use store::{InMemoryStore, ResultStore, SessionStore, StoreGuard, StoreReadGuard};
pub use types::{
    Attributes, CreateSessionRequest, Outcome, Policy, ResultStatus, Session, SessionStatus,
    VerificationResult,
};
