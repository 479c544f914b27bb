use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AgeVerifyError;
use crate::utils::get_env_with_prefix;
use crate::verification::{CompletionPolicy, UnverifiedPolicy};

/// Main configuration for the verification service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub openapi: OpenApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Inbound webhook settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret. `None` disables signature checking and every
    /// acknowledgement reports `verified: null`.
    #[serde(default)]
    pub shared_secret: Option<String>,
    /// Header carrying the hex signature
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
    #[serde(default)]
    pub completion_policy: CompletionPolicy,
    #[serde(default)]
    pub unverified_policy: UnverifiedPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

/// Location of the static API description served at `/openapi.yaml`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenApiConfig {
    #[serde(default = "default_openapi_path")]
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            signature_header: default_signature_header(),
            completion_policy: CompletionPolicy::default(),
            unverified_policy: UnverifiedPolicy::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            path: default_openapi_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_signature_header() -> String {
    "X-Signature".to_string()
}

fn default_ttl_seconds() -> u64 {
    crate::verification::DEFAULT_SESSION_TTL_SECS
}

fn default_openapi_path() -> PathBuf {
    PathBuf::from("openapi.yaml")
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    /// Set the webhook shared secret. An empty string is treated as "not configured".
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.config.webhook.shared_secret = (!secret.is_empty()).then_some(secret);
        self
    }

    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.config.webhook.signature_header = header.into();
        self
    }

    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.config.webhook.completion_policy = policy;
        self
    }

    pub fn with_unverified_policy(mut self, policy: UnverifiedPolicy) -> Self {
        self.config.webhook.unverified_policy = policy;
        self
    }

    pub fn with_session_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.sessions.ttl_seconds = ttl_seconds;
        self
    }

    pub fn with_openapi_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.openapi.path = path.into();
        self
    }

    /// Load configuration from environment variables with the `AGEVERIFY_` prefix
    ///
    /// Unparseable values are ignored and the previous setting is kept.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(secret) = get_env_with_prefix("WEBHOOK_SHARED_SECRET") {
            self = self.with_shared_secret(secret);
        }
        if let Some(header) = get_env_with_prefix("SIGNATURE_HEADER") {
            self.config.webhook.signature_header = header;
        }
        if let Some(policy) = get_env_with_prefix("COMPLETION_POLICY") {
            match policy.parse::<CompletionPolicy>() {
                Ok(p) => self.config.webhook.completion_policy = p,
                Err(e) => tracing::warn!(value = %policy, error = %e, "Ignoring COMPLETION_POLICY"),
            }
        }
        if let Some(reject) = get_env_with_prefix("REJECT_UNVERIFIED") {
            if reject.parse().unwrap_or(false) {
                self.config.webhook.unverified_policy = UnverifiedPolicy::Reject;
            }
        }
        if let Some(ttl) = get_env_with_prefix("SESSION_TTL_SECONDS") {
            if let Ok(t) = ttl.parse() {
                self.config.sessions.ttl_seconds = t;
            }
        }
        if let Some(path) = get_env_with_prefix("OPENAPI_PATH") {
            self.config.openapi.path = PathBuf::from(path);
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an invalid host/port, unknown log level, zero
    /// body limit, zero session TTL or an invalid signature header name.
    pub fn build(self) -> crate::error::Result<Config> {
        self.config.server.addr().map_err(|e| {
            AgeVerifyError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(AgeVerifyError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.server.port == 0 {
            return Err(AgeVerifyError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        if self.config.server.max_body_size == 0 {
            return Err(AgeVerifyError::bad_request(
                "Maximum body size must be greater than 0",
            ));
        }

        if self.config.sessions.ttl_seconds == 0 {
            return Err(AgeVerifyError::bad_request(
                "Session TTL must be greater than 0",
            ));
        }

        if axum::http::HeaderName::from_bytes(self.config.webhook.signature_header.as_bytes())
            .is_err()
        {
            return Err(AgeVerifyError::bad_request(format!(
                "Invalid signature header name: {}",
                self.config.webhook.signature_header
            )));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
