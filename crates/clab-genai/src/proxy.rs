//! Client for the `clab-api` proxy server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clab_models::{InlineMedia, Language};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{non_empty, observed, GenerationClient};
use crate::config::GenAiConfig;
use crate::credentials::CredentialSource;
use crate::error::{GenAiError, GenAiResult};
use crate::types::{
    AnalyzeRequest, AudioRequest, AudioResponse, ErrorResponse, ImageResponse, PromptRequest,
    TextResponse, VideoRequest, VideoResponse,
};

/// Posts generation requests to the proxy with a bearer credential.
pub struct ProxyClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
    request_timeout: Duration,
}

impl ProxyClient {
    pub fn new(config: &GenAiConfig, credentials: Arc<dyn CredentialSource>) -> GenAiResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            credentials,
            request_timeout: config.request_timeout,
        })
    }

    /// POST `body` to `/api/generate/{endpoint}`.
    ///
    /// `timeout` of `None` leaves the request unbounded (video).
    async fn post<B, T>(&self, endpoint: &str, body: &B, timeout: Option<Duration>) -> GenAiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self
            .credentials
            .bearer_token()
            .ok_or_else(|| GenAiError::unauthorized("Sign in required"))?;

        let url = format!("{}/api/generate/{}", self.base_url, endpoint);
        debug!(url = %url, "Posting to proxy");

        let mut request = self.http.post(&url).bearer_auth(token).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            warn!(status = status.as_u16(), endpoint, error = %message, "Proxy call failed");
            return Err(GenAiError::from_http_status(status.as_u16(), message));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl GenerationClient for ProxyClient {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn analyze(&self, url: &str, language: Language) -> GenAiResult<String> {
        observed("analyze", async {
            let body = AnalyzeRequest {
                url: url.to_string(),
                lang: language.code().to_string(),
            };
            let resp: TextResponse = self.post("analyze", &body, Some(self.request_timeout)).await?;
            non_empty(resp.text, "analysis")
        })
        .await
    }

    async fn generate_image(&self, prompt: &str) -> GenAiResult<InlineMedia> {
        observed("image", async {
            let body = PromptRequest {
                prompt: prompt.to_string(),
            };
            let resp: ImageResponse = self.post("image", &body, Some(self.request_timeout)).await?;
            if resp.raw_base64.is_empty() {
                return Err(GenAiError::empty_result("No image generated"));
            }
            Ok(InlineMedia::new(resp.raw_base64, resp.mime_type))
        })
        .await
    }

    async fn generate_script(&self, prompt: &str) -> GenAiResult<String> {
        observed("script", async {
            let body = PromptRequest {
                prompt: prompt.to_string(),
            };
            let resp: TextResponse = self.post("script", &body, Some(self.request_timeout)).await?;
            non_empty(resp.text, "script")
        })
        .await
    }

    async fn generate_audio(&self, text: &str, voice: &str) -> GenAiResult<String> {
        observed("audio", async {
            let body = AudioRequest {
                text: text.to_string(),
                voice_name: voice.to_string(),
            };
            let resp: AudioResponse = self.post("audio", &body, Some(self.request_timeout)).await?;
            non_empty(resp.audio_base64, "audio")
        })
        .await
    }

    async fn generate_video(&self, prompt: &str, image: &InlineMedia) -> GenAiResult<InlineMedia> {
        observed("video", async {
            let body = VideoRequest {
                prompt: prompt.to_string(),
                image_base64: image.data.clone(),
                mime_type: image.mime_type.clone(),
            };
            let resp: VideoResponse = self.post("video", &body, None).await?;
            if resp.video_base64.is_empty() {
                return Err(GenAiError::empty_result("No video generated"));
            }
            Ok(InlineMedia::new(resp.video_base64, resp.mime_type))
        })
        .await
    }
}
