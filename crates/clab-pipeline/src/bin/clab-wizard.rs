//! Headless link-to-video wizard.
//!
//! Runs every stage for one product URL and writes the render bundle to the
//! output directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clab_genai::{build_client, ClientMode};
use clab_models::{BackgroundMusicSelection, Gender, Language, ScriptEdit, ScriptStyle};
use clab_pipeline::{
    ApplyOutcome, AssetComposer, DirectoryRenderer, HttpMusicFetcher, MixSettings, MusicLibrary,
    PipelineConfig, PipelineResult, StageRunner, WizardController,
};

#[derive(Debug, Parser)]
#[command(name = "clab-wizard", about = "Turn a product URL into a marketing video bundle")]
struct Args {
    /// Product page URL
    url: String,

    /// Output language (id, en)
    #[arg(long, default_value = "id")]
    lang: Language,

    /// Presenter gender (female, male)
    #[arg(long, default_value = "female")]
    gender: Gender,

    /// Script length (short, normal)
    #[arg(long, default_value = "short")]
    style: ScriptStyle,

    /// Rewrite the generated script before voicing it (shorten, expand, regenerate)
    #[arg(long)]
    edit: Option<ScriptEdit>,

    /// Prebuilt voice name
    #[arg(long, env = "CLAB_VOICE")]
    voice: Option<String>,

    /// Catalog track id for background music
    #[arg(long, default_value = "stock1", conflicts_with = "music_file")]
    music: String,

    /// Local audio file to use as background music
    #[arg(long)]
    music_file: Option<PathBuf>,

    /// Background music volume (0.0 - 1.0)
    #[arg(long, default_value_t = 0.3)]
    volume: f32,

    /// Seconds into the music track to start from
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Client mode (direct, proxy)
    #[arg(long, env = "GENAI_MODE")]
    mode: Option<ClientMode>,

    /// Output directory
    #[arg(long, env = "CLAB_OUTPUT_DIR")]
    out: Option<PathBuf>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clab=info,info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

fn require_applied(step: &str, outcome: PipelineResult<ApplyOutcome>) -> Result<()> {
    match outcome.with_context(|| format!("{} could not start", step))? {
        ApplyOutcome::Applied { .. } => Ok(()),
        ApplyOutcome::Failed(message) => bail!("{} failed: {}", step, message),
        ApplyOutcome::Stale => bail!("{} result was discarded", step),
    }
}

fn music_mime(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "audio/mpeg",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let mut config = PipelineConfig::from_env();
    if let Some(mode) = args.mode {
        config.genai.mode = mode;
    }
    if let Some(out) = &args.out {
        config.output_dir = out.clone();
    }
    let voice = args.voice.clone().unwrap_or_else(|| config.voice.clone());

    info!(mode = config.genai.mode.as_str(), url = %args.url, "Starting clab-wizard");

    let client = build_client(&config.genai)?;
    let runner = StageRunner::new(client, config.genai.retry.clone());
    let composer = AssetComposer::new(
        MusicLibrary::new(Arc::new(HttpMusicFetcher::new(config.music_fetch_timeout)?)),
        Arc::new(DirectoryRenderer::new(&config.output_dir)),
    );
    let wizard = WizardController::new(runner, composer);

    wizard.set_language(args.lang).await;
    wizard.set_gender(args.gender).await;
    wizard.set_script_style(args.style).await;

    require_applied("Product analysis", wizard.analyze(&args.url).await)?;
    let product = wizard.snapshot().await.product.context("no product data")?;
    info!(name = %product.name, points = product.selling_points.len(), "Product analyzed");

    wizard.proceed_to_model().await?;
    require_applied("Model image", wizard.generate_model().await)?;

    let session = wizard.snapshot().await;
    if session.script.is_empty() {
        let reason = session
            .notice()
            .map(|n| n.message.clone())
            .unwrap_or_else(|| "no script".to_string());
        bail!("Script generation failed: {}", reason);
    }
    if let Some(edit) = args.edit {
        require_applied("Script rewrite", wizard.modify_script(edit).await)?;
    }

    let (video, audio) = wizard.generate_media(&voice).await;
    require_applied("Video", video)?;
    require_applied("Voiceover", audio)?;
    wizard.proceed_to_editor().await?;

    match &args.music_file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            wizard
                .select_music(BackgroundMusicSelection::upload(name, bytes, music_mime(path)))
                .await?;
        }
        None => wizard.select_stock_music(&args.music).await?,
    }

    let receipt = wizard
        .compose(MixSettings::new(args.volume, args.offset)?)
        .await?;

    let project = wizard.snapshot().await.to_saved();
    let project_file = PathBuf::from(&receipt.location).join("project.json");
    tokio::fs::write(&project_file, serde_json::to_vec_pretty(&project)?).await?;

    info!(location = %receipt.location, "Bundle ready");
    println!("{}", receipt.location);
    Ok(())
}
