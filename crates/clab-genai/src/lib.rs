//! Generative service access for the ContentLabs pipeline.
//!
//! This crate provides:
//! - The [`GenerationClient`] trait with direct (Gemini REST) and proxied
//!   implementations
//! - [`RetryPolicy`] with exponential backoff for rate-limit failures
//! - Prompt construction and tolerant parsing of analysis text

pub mod client;
pub mod config;
pub mod credentials;
pub mod direct;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod prompts;
pub mod proxy;
pub mod retry;
pub mod types;

pub use client::{build_client, generate_image_batch, GenerationClient};
pub use config::{ClientMode, GenAiConfig};
pub use credentials::{CredentialSource, StaticCredentials};
pub use direct::DirectClient;
pub use error::{GenAiError, GenAiResult};
pub use parser::{parse_analysis, Field, ParsedAnalysis};
pub use proxy::ProxyClient;
pub use retry::{with_retry, RetryPolicy};
