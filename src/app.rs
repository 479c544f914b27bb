use std::path::PathBuf;

use crate::config::Config;
use crate::verification::VerificationService;

/// Shared state handed to every request handler
///
/// Cloning is cheap: the service only holds handles to its stores.
#[derive(Clone, Debug)]
pub struct AppContext {
    pub verification: VerificationService,
    /// Header the webhook signature is read from
    pub signature_header: String,
    /// Static API description served at `/openapi.yaml`
    pub openapi_path: PathBuf,
}

impl AppContext {
    pub fn new(verification: VerificationService) -> Self {
        Self {
            verification,
            signature_header: "X-Signature".to_string(),
            openapi_path: PathBuf::from("openapi.yaml"),
        }
    }

    /// Build the context, and a fresh service with empty stores, from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::builder()
            .with_verification(VerificationService::from_config(
                &config.webhook,
                &config.sessions,
            ))
            .with_signature_header(config.webhook.signature_header.clone())
            .with_openapi_path(config.openapi.path.clone())
            .build()
    }

    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(VerificationService::default())
    }
}

/// Builder for AppContext
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    context: AppContext,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            context: AppContext::default(),
        }
    }

    pub fn with_verification(mut self, verification: VerificationService) -> Self {
        self.context.verification = verification;
        self
    }

    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.context.signature_header = header.into();
        self
    }

    pub fn with_openapi_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.openapi_path = path.into();
        self
    }

    pub fn build(self) -> AppContext {
        self.context
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
