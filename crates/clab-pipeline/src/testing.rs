//! Scripted generation client for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use clab_genai::{GenAiError, GenAiResult, GenerationClient};
use clab_models::{InlineMedia, Language};

pub const CANNED_SCRIPT: &str = "Meet the mug that keeps up with you.";

/// Returns canned payloads, optionally failing or delaying per operation.
#[derive(Default)]
pub struct ScriptedClient {
    analysis: String,
    failures: HashMap<&'static str, String>,
    delays: HashMap<&'static str, Duration>,
    calls: Mutex<HashMap<&'static str, u32>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            analysis: "Name: Mug".to_string(),
            ..Default::default()
        }
    }

    pub fn with_analysis(mut self, text: &str) -> Self {
        self.analysis = text.to_string();
        self
    }

    pub fn failing(mut self, operation: &'static str, message: &str) -> Self {
        self.failures.insert(operation, message.to_string());
        self
    }

    pub fn delayed(mut self, operation: &'static str, delay: Duration) -> Self {
        self.delays.insert(operation, delay);
        self
    }

    pub fn calls(&self, operation: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    async fn enter(&self, operation: &'static str) -> GenAiResult<()> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        if let Some(delay) = self.delays.get(operation) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(operation) {
            Some(message) => Err(GenAiError::remote(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn analyze(&self, _url: &str, _language: Language) -> GenAiResult<String> {
        self.enter("analyze").await?;
        Ok(self.analysis.clone())
    }

    async fn generate_image(&self, _prompt: &str) -> GenAiResult<InlineMedia> {
        self.enter("image").await?;
        Ok(InlineMedia::new("aW1n", "image/png"))
    }

    async fn generate_script(&self, _prompt: &str) -> GenAiResult<String> {
        self.enter("script").await?;
        Ok(CANNED_SCRIPT.to_string())
    }

    async fn generate_audio(&self, _text: &str, _voice: &str) -> GenAiResult<String> {
        self.enter("audio").await?;
        Ok("AAAAAA==".to_string())
    }

    async fn generate_video(&self, _prompt: &str, _image: &InlineMedia) -> GenAiResult<InlineMedia> {
        self.enter("video").await?;
        Ok(InlineMedia::new("dmlk", "video/mp4"))
    }
}
