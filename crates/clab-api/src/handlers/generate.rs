//! Generation proxy handlers.
//!
//! Each handler forwards one call to the configured [`GenerationClient`]
//! using the server-side credential.
//!
//! [`GenerationClient`]: clab_genai::GenerationClient

use axum::extract::State;
use axum::{Extension, Json};
use clab_genai::types::{
    AnalyzeRequest, AudioRequest, AudioResponse, ImageResponse, PromptRequest, TextResponse,
    VideoRequest, VideoResponse,
};
use clab_models::{InlineMedia, Language};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::Caller;
use crate::state::AppState;

/// Charge one credit. The balance is informational only.
async fn charge(state: &AppState, caller: &Caller, operation: &str) {
    let remaining = state.credits.charge(&caller.token).await;
    metrics::record_credit_charged(operation);
    if remaining < 0 {
        warn!(operation, remaining, "Credit balance below zero");
    }
}

fn require(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    Ok(())
}

/// `POST /api/generate/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<AnalyzeRequest>,
) -> ApiResult<Json<TextResponse>> {
    require(&body.url, "url")?;
    let language: Language = body.lang.parse().map_err(ApiError::bad_request)?;

    charge(&state, &caller, "analyze").await;
    info!(url = %body.url, lang = language.code(), "Analyzing product");

    let text = state.client.analyze(&body.url, language).await?;
    Ok(Json(TextResponse { text }))
}

/// `POST /api/generate/image`
pub async fn image(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<PromptRequest>,
) -> ApiResult<Json<ImageResponse>> {
    require(&body.prompt, "prompt")?;
    charge(&state, &caller, "image").await;

    let media = state.client.generate_image(&body.prompt).await?;
    Ok(Json(ImageResponse {
        raw_base64: media.data,
        mime_type: media.mime_type,
    }))
}

/// `POST /api/generate/script`
pub async fn script(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<PromptRequest>,
) -> ApiResult<Json<TextResponse>> {
    require(&body.prompt, "prompt")?;
    charge(&state, &caller, "script").await;

    let text = state.client.generate_script(&body.prompt).await?;
    Ok(Json(TextResponse { text }))
}

/// `POST /api/generate/audio`
pub async fn audio(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<AudioRequest>,
) -> ApiResult<Json<AudioResponse>> {
    require(&body.text, "text")?;
    require(&body.voice_name, "voiceName")?;
    charge(&state, &caller, "audio").await;

    let audio_base64 = state
        .client
        .generate_audio(&body.text, &body.voice_name)
        .await?;
    Ok(Json(AudioResponse { audio_base64 }))
}

/// `POST /api/generate/video`
///
/// Blocks until the upstream job finishes; there is no server-side timeout.
pub async fn video(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<VideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    require(&body.prompt, "prompt")?;
    require(&body.image_base64, "imageBase64")?;
    charge(&state, &caller, "video").await;

    let image = InlineMedia::new(body.image_base64, body.mime_type);
    info!(prompt_len = body.prompt.len(), "Generating video");

    let video = state.client.generate_video(&body.prompt, &image).await?;
    Ok(Json(VideoResponse {
        video_base64: video.data,
        mime_type: video.mime_type,
    }))
}
