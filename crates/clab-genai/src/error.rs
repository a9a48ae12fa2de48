//! Generative service error types.

use thiserror::Error;

/// Result type for generative service calls.
pub type GenAiResult<T> = Result<T, GenAiError>;

/// Message tokens the generative service uses for quota exhaustion.
const RATE_LIMIT_TOKENS: [&str; 3] = ["429", "quota", "resource_exhausted"];

/// Failures surfaced by a generative service call.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// No credential available; no request was sent.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Remote service error: {message}")]
    Remote { status: Option<u16>, message: String },

    /// 2xx response without a payload in the expected place.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure. The request URL is stripped on conversion.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GenAiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}

impl GenAiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: msg.into(),
        }
    }

    pub fn empty_result(msg: impl Into<String>) -> Self {
        Self::EmptyResult(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-2xx HTTP response.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            429 => Self::RateLimited(message),
            401 | 403 => Self::Unauthorized(message),
            _ => Self::Remote {
                status: Some(status),
                message,
            },
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GenAiError::RateLimited(_) => Some(429),
            GenAiError::Unauthorized(_) => Some(401),
            GenAiError::Remote { status, .. } => *status,
            GenAiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for rate-limit or quota failures, the only retryable kind.
    ///
    /// Matches the 429 status as well as the message tokens the service is
    /// known to use, case-insensitively.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GenAiError::RateLimited(_) => true,
            GenAiError::Unauthorized(_) | GenAiError::Config(_) => false,
            other => {
                if other.http_status() == Some(429) {
                    return true;
                }
                let msg = other.to_string().to_lowercase();
                RATE_LIMIT_TOKENS.iter().any(|token| msg.contains(token))
            }
        }
    }

    /// Whether [`RetryPolicy`](crate::RetryPolicy) may retry this failure.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited()
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GenAiError::Unauthorized(_) => "unauthorized",
            GenAiError::RateLimited(_) => "rate_limited",
            GenAiError::Remote { .. } | GenAiError::Network(_) | GenAiError::Json(_) => "remote_error",
            GenAiError::EmptyResult(_) => "empty_result",
            GenAiError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_429() {
        let err = GenAiError::from_http_status(429, "too many requests");
        assert!(matches!(err, GenAiError::RateLimited(_)));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_from_http_status_500() {
        let err = GenAiError::from_http_status(500, "internal");
        assert!(matches!(err, GenAiError::Remote { status: Some(500), .. }));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_from_http_status_401() {
        let err = GenAiError::from_http_status(401, "missing token");
        assert!(matches!(err, GenAiError::Unauthorized(_)));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_rate_limit_detected_from_message() {
        let cases = [
            "RESOURCE_EXHAUSTED: try later",
            "You exceeded your current Quota",
            "upstream returned 429",
            "resource_exhausted",
        ];
        for msg in cases {
            assert!(GenAiError::remote(msg).is_rate_limited(), "{msg}");
        }
    }

    #[test]
    fn test_other_messages_not_rate_limited() {
        assert!(!GenAiError::remote("model overloaded").is_rate_limited());
        assert!(!GenAiError::empty_result("No image generated").is_rate_limited());
        assert!(!GenAiError::unauthorized("quota of tokens").is_rate_limited());
    }

    #[test]
    fn test_empty_result_message_is_distinct() {
        let empty = GenAiError::empty_result("no inline data").to_string();
        let remote = GenAiError::remote("no inline data").to_string();
        assert_ne!(empty, remote);
        assert!(empty.starts_with("Empty result"));
    }
}
