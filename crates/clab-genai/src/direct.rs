//! Direct Gemini REST client.

use std::time::Duration;

use async_trait::async_trait;
use clab_models::{InlineMedia, Language};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::client::{non_empty, observed, GenerationClient};
use crate::config::GenAiConfig;
use crate::error::{GenAiError, GenAiResult};
use crate::prompts::analyze_prompt;
use crate::retry::RetryPolicy;
use crate::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, PredictVideoRequest,
    VideoImage, VideoInstance, VideoOperation, VideoParameters,
};

pub const TEXT_MODEL: &str = "gemini-2.5-flash";
pub const IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Header carrying the API key. Keeping the key out of URLs keeps it out of
/// transport error messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls the Gemini API with an API key.
pub struct DirectClient {
    http: Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
    poll_interval: Duration,
    poll_retry: RetryPolicy,
}

impl DirectClient {
    /// Create a client; fails when no API key is configured.
    pub fn new(config: &GenAiConfig) -> GenAiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenAiError::config("GEMINI_API_KEY not set"))?;

        // No client-wide timeout: video generation runs as long as the job does.
        let http = Client::builder().build()?;

        Ok(Self {
            http,
            api_key,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            poll_interval: config.video_poll_interval,
            poll_retry: config.retry.clone(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn check(response: Response) -> GenAiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Gemini API returned an error");
        Err(GenAiError::from_http_status(
            status.as_u16(),
            format!("Gemini API returned {}: {}", status, body),
        ))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> GenAiResult<T> {
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GenAiResult<GenerateContentResponse> {
        debug!(model, "Calling generateContent");
        let response = self
            .http
            .post(self.model_url(model, "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn submit_video(&self, prompt: &str, image: &InlineMedia) -> GenAiResult<VideoOperation> {
        let request = PredictVideoRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: VideoImage {
                    bytes_base64_encoded: image.data.clone(),
                    mime_type: image.mime_type.clone(),
                },
            }],
            parameters: VideoParameters::default(),
        };
        let response = self
            .http
            .post(self.model_url(VIDEO_MODEL, "predictLongRunning"))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn poll_video(&self, operation: &str) -> GenAiResult<VideoOperation> {
        let url = format!("{}/{}", self.base_url, operation);
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn download_video(&self, uri: &str) -> GenAiResult<InlineMedia> {
        let response = self
            .http
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or(DEFAULT_VIDEO_MIME)
            .to_string();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenAiError::empty_result("Video download returned no data"));
        }
        Ok(InlineMedia::from_bytes(&bytes, mime_type))
    }

    /// Polling failures must not be retryable: retrying `generate_video`
    /// would submit another job.
    fn poll_failure(operation: &str, error: GenAiError) -> GenAiError {
        if !error.is_retryable() {
            return error;
        }
        warn!(operation, "Video status polling stayed throttled, giving up");
        GenAiError::remote(format!(
            "Gave up waiting for video operation {} after repeated throttling",
            operation
        ))
    }

    async fn run_video(&self, prompt: &str, image: &InlineMedia) -> GenAiResult<InlineMedia> {
        let mut operation = self.submit_video(prompt, image).await?;
        info!(operation = %operation.name, "Video generation submitted");

        let mut polls = 0u32;
        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;
            let name = operation.name.clone();
            operation = self
                .poll_retry
                .run("video_poll", || self.poll_video(&name))
                .await
                .map_err(|e| Self::poll_failure(&name, e))?;
            polls += 1;
            debug!(operation = %name, polls, done = operation.done, "Polled video operation");
        }

        if let Some(error) = &operation.error {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| "Unknown video generation error".to_string());
            return Err(GenAiError::Remote {
                status: error.code.and_then(|c| u16::try_from(c).ok()),
                message,
            });
        }

        let uri = operation.video_uri().ok_or_else(|| {
            GenAiError::empty_result("Video generation completed but no link returned")
        })?;
        info!(polls, "Video generation finished, downloading");
        self.download_video(uri).await
    }
}

#[async_trait]
impl GenerationClient for DirectClient {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn analyze(&self, url: &str, language: Language) -> GenAiResult<String> {
        observed("analyze", async {
            let request = GenerateContentRequest::text(analyze_prompt(url, language))
                .with_google_search();
            let response = self.generate_content(TEXT_MODEL, &request).await?;
            non_empty(response.text().unwrap_or_default(), "analysis")
        })
        .await
    }

    async fn generate_image(&self, prompt: &str) -> GenAiResult<InlineMedia> {
        observed("image", async {
            let request = GenerateContentRequest::text(prompt)
                .with_generation_config(GenerationConfig::portrait_image());
            let response = self.generate_content(IMAGE_MODEL, &request).await?;
            let data = response
                .inline_data()
                .filter(|d| !d.data.is_empty())
                .ok_or_else(|| GenAiError::empty_result("No image generated"))?;
            Ok::<_, GenAiError>(InlineMedia::new(data.data.clone(), data.mime_type.clone()))
        })
        .await
    }

    async fn generate_script(&self, prompt: &str) -> GenAiResult<String> {
        observed("script", async {
            let request = GenerateContentRequest::text(prompt);
            let response = self.generate_content(TEXT_MODEL, &request).await?;
            non_empty(response.text().unwrap_or_default(), "script")
        })
        .await
    }

    async fn generate_audio(&self, text: &str, voice: &str) -> GenAiResult<String> {
        observed("audio", async {
            let request = GenerateContentRequest::text(text)
                .with_generation_config(GenerationConfig::speech(voice));
            let response = self.generate_content(TTS_MODEL, &request).await?;
            let data = response
                .inline_data()
                .map(|d| d.data.clone())
                .unwrap_or_default();
            non_empty(data, "audio")
        })
        .await
    }

    async fn generate_video(&self, prompt: &str, image: &InlineMedia) -> GenAiResult<InlineMedia> {
        observed("video", self.run_video(prompt, image)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> DirectClient {
        let config = GenAiConfig::default()
            .with_api_key("test-key")
            .with_gemini_base_url(server.uri())
            .with_video_poll_interval(Duration::from_millis(5))
            .with_retry(RetryPolicy::new(2, Duration::from_millis(5)));
        DirectClient::new(&config).unwrap()
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[tokio::test]
    async fn test_analyze_uses_search_tool_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"tools": [{"google_search": {}}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Name: Mug")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .analyze("https://shop.example/mug", Language::En)
            .await
            .unwrap();
        assert_eq!(text, "Name: Mug");
    }

    #[tokio::test]
    async fn test_image_without_inline_data_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-3-pro-image-preview:generateContent"))
            .and(body_partial_json(
                json!({"generationConfig": {"imageConfig": {"aspectRatio": "9:16", "imageSize": "1K"}}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("sorry")))
            .mount(&server)
            .await;

        let err = client(&server).generate_image("prompt").await.unwrap_err();
        assert!(matches!(err, GenAiError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_quota_error_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate_script("p").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_audio_returns_inline_pcm() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
            .and(body_partial_json(json!({"generationConfig": {"responseModalities": ["AUDIO"]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "audio/L16;rate=24000", "data": "AAAA"}}]}}]
            })))
            .mount(&server)
            .await;

        let pcm = client(&server).generate_audio("Halo", "Kore").await.unwrap();
        assert_eq!(pcm, "AAAA");
    }

    #[tokio::test]
    async fn test_video_submit_poll_download() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
            .and(body_partial_json(json!({"parameters": {"aspectRatio": "9:16", "resolution": "720p"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op1"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/op1",
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": [
                    {"video": {"uri": format!("{}/files/v1:download?alt=media", server.uri())}}
                ]}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/v1:download"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let image = InlineMedia::new("aW1n", "image/png");
        let video = client(&server).generate_video("prompt", &image).await.unwrap();
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.decode().unwrap(), vec![1u8, 2, 3]);
    }

    #[tokio::test]
    async fn test_video_operation_error_is_remote() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/op2",
                "done": true,
                "error": {"code": 400, "message": "Image rejected"}
            })))
            .mount(&server)
            .await;

        let image = InlineMedia::new("aW1n", "image/png");
        let err = client(&server).generate_video("p", &image).await.unwrap_err();
        assert!(matches!(err, GenAiError::Remote { status: Some(400), .. }));
        assert!(err.to_string().contains("Image rejected"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = GenAiConfig::default()
            .with_api_key("SECRET-KEY-123")
            .with_gemini_base_url(server.uri());
        config.request_timeout = Duration::from_millis(100);
        let client = DirectClient::new(&config).unwrap();

        let err = client.generate_script("p").await.unwrap_err();
        assert!(matches!(err, GenAiError::Network(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn test_throttled_polling_never_resubmits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.1-fast-generate-preview:predictLongRunning"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op3"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op3"))
            .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
            .mount(&server)
            .await;

        let client = client(&server);
        let image = InlineMedia::new("aW1n", "image/png");
        let outer = RetryPolicy::new(3, Duration::from_millis(5));
        let err = outer
            .run("video", || client.generate_video("p", &image))
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("operations/op3"));
        let requests = server.received_requests().await.unwrap();
        let submits = requests.iter().filter(|r| r.method.as_str() == "POST").count();
        let polls = requests.iter().filter(|r| r.method.as_str() == "GET").count();
        assert_eq!(submits, 1);
        assert_eq!(polls, 3);
    }
}
