//! Generative client configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::GenAiError;
use crate::retry::RetryPolicy;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default proxy server address.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Which client implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientMode {
    /// Call the Gemini REST API directly with an API key
    Direct,
    /// Call the `clab-api` proxy with a bearer token
    #[default]
    Proxy,
}

impl ClientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::Direct => "direct",
            ClientMode::Proxy => "proxy",
        }
    }
}

impl FromStr for ClientMode {
    type Err = GenAiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(ClientMode::Direct),
            "proxy" | "backend" => Ok(ClientMode::Proxy),
            other => Err(GenAiError::config(format!("unknown GENAI_MODE: {}", other))),
        }
    }
}

/// Generative client configuration.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub mode: ClientMode,
    /// API key for direct mode
    pub api_key: Option<String>,
    pub gemini_base_url: String,
    /// Proxy server base URL
    pub backend_url: String,
    /// Bearer token for proxy mode
    pub auth_token: Option<String>,
    /// Per-request timeout for everything except video generation
    pub request_timeout: Duration,
    /// Interval between video status polls
    pub video_poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::default(),
            api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(120),
            video_poll_interval: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl GenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: std::env::var("GENAI_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.mode),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            backend_url: std::env::var("CLAB_BACKEND_URL").unwrap_or(defaults.backend_url),
            auth_token: std::env::var("CLAB_AUTH_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout: Duration::from_secs(
                std::env::var("GENAI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            video_poll_interval: Duration::from_secs(
                std::env::var("GENAI_VIDEO_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            retry: RetryPolicy::from_env(),
        }
    }

    pub fn with_mode(mut self, mode: ClientMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_video_poll_interval(mut self, interval: Duration) -> Self {
        self.video_poll_interval = interval;
        self
    }
}
