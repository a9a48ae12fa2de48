//! The generation client trait and helpers shared by its implementations.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clab_models::{InlineMedia, Language};
use futures::future::join_all;
use tracing::{debug, info};

use crate::config::{ClientMode, GenAiConfig};
use crate::credentials::StaticCredentials;
use crate::direct::DirectClient;
use crate::error::{GenAiError, GenAiResult};
use crate::metrics::record_request;
use crate::proxy::ProxyClient;
use crate::retry::RetryPolicy;

/// One logical request per generation stage.
///
/// Implementations return normalized payloads or a classified
/// [`GenAiError`]; they do not retry on their own. Callers wrap each call in
/// a [`RetryPolicy`].
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Implementation name for logs.
    fn name(&self) -> &'static str;

    /// Research the product page and return labeled analysis text.
    async fn analyze(&self, url: &str, language: Language) -> GenAiResult<String>;

    /// Generate one portrait image.
    async fn generate_image(&self, prompt: &str) -> GenAiResult<InlineMedia>;

    /// Generate raw script text.
    async fn generate_script(&self, prompt: &str) -> GenAiResult<String>;

    /// Synthesize speech; returns base64 PCM (24 kHz, mono, 16-bit LE).
    async fn generate_audio(&self, text: &str, voice: &str) -> GenAiResult<String>;

    /// Animate `image` into a short clip. Runs until the remote job finishes.
    async fn generate_video(&self, prompt: &str, image: &InlineMedia) -> GenAiResult<InlineMedia>;
}

/// Build the client selected by `config.mode`.
pub fn build_client(config: &GenAiConfig) -> GenAiResult<Arc<dyn GenerationClient>> {
    info!(mode = config.mode.as_str(), "Building generation client");

    match config.mode {
        ClientMode::Direct => Ok(Arc::new(DirectClient::new(config)?)),
        ClientMode::Proxy => {
            let credentials = Arc::new(StaticCredentials::new(config.auth_token.clone()));
            Ok(Arc::new(ProxyClient::new(config, credentials)?))
        }
    }
}

/// Issue one image request per prompt concurrently, each under `policy`.
///
/// Results keep the order of `prompts`; one failure does not affect the
/// others.
pub async fn generate_image_batch(
    client: &dyn GenerationClient,
    policy: &RetryPolicy,
    prompts: &[String],
) -> Vec<GenAiResult<InlineMedia>> {
    let calls = prompts
        .iter()
        .map(|prompt| policy.run("image", || client.generate_image(prompt)));
    join_all(calls).await
}

/// Run `fut`, recording the outcome metric and call duration.
pub(crate) async fn observed<T, Fut>(operation: &'static str, fut: Fut) -> GenAiResult<T>
where
    Fut: Future<Output = GenAiResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_request(operation, outcome);
    debug!(
        operation,
        outcome,
        duration_ms = start.elapsed().as_millis() as u64,
        "Generation call finished"
    );
    result
}

/// Reject a blank payload as an empty result.
pub(crate) fn non_empty(value: String, what: &str) -> GenAiResult<String> {
    if value.trim().is_empty() {
        Err(GenAiError::empty_result(format!("No {} generated", what)))
    } else {
        Ok(value)
    }
}
