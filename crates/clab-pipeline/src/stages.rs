//! Stage execution.
//!
//! Every stage action follows the same protocol:
//! 1. [`StageRunner::begin`] validates inputs against the session, marks the
//!    action's slot busy, clears the previous notice and snapshots what the
//!    remote call needs into a [`Ticket`].
//! 2. [`StageRunner::run`] performs the remote call under the retry policy
//!    without touching the session.
//! 3. [`StageRunner::apply`] merges the result: success replaces the slot's
//!    field wholesale (and may advance the wizard); failure records a notice
//!    and leaves prior state untouched. The busy flag is always cleared,
//!    unless the session was replaced in the meantime, in which case the
//!    result is discarded. A result is also discarded when any slot it was
//!    derived from was written after `begin`.

use std::sync::Arc;

use clab_genai::prompts::{
    image_variations, model_image_prompt, modify_script_prompt, script_prompt, video_prompt,
};
use clab_genai::{generate_image_batch, parse_analysis, GenerationClient, RetryPolicy};
use clab_models::{
    parse_product_url, AudioAsset, Gender, GeneratedModel, InlineMedia, Language, ProductData,
    ScriptEdit, ScriptOrigin, Stage, VideoAsset, DEFAULT_VOICE,
};
use tracing::{warn, Instrument};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::StageLogger;
use crate::metrics::record_stage_action;
use crate::session::{Action, Slot, WizardSession};

/// A user-triggered stage action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageRequest {
    Analyze { url: String },
    GenerateModel,
    GenerateScript,
    ModifyScript(ScriptEdit),
    GenerateAudio { voice: String },
    GenerateVideo,
}

impl StageRequest {
    pub fn analyze(url: impl Into<String>) -> Self {
        StageRequest::Analyze { url: url.into() }
    }

    /// Voiceover with the default voice.
    pub fn audio() -> Self {
        StageRequest::GenerateAudio {
            voice: DEFAULT_VOICE.to_string(),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            StageRequest::Analyze { .. } => Action::Analyze,
            StageRequest::GenerateModel => Action::GenerateModel,
            StageRequest::GenerateScript => Action::GenerateScript,
            StageRequest::ModifyScript(_) => Action::ModifyScript,
            StageRequest::GenerateAudio { .. } => Action::GenerateAudio,
            StageRequest::GenerateVideo => Action::GenerateVideo,
        }
    }
}

#[derive(Debug, Clone)]
enum Job {
    Analyze { url: String, language: Language },
    Image { prompt: String },
    Script { prompt: String, origin: ScriptOrigin },
    Audio { text: String, voice: String },
    Video { prompt: String, image: InlineMedia },
}

/// Inputs captured by [`StageRunner::begin`] for one remote call.
#[derive(Debug, Clone)]
pub struct Ticket {
    epoch: u64,
    /// Revisions of the slots the result depends on, taken at `begin`.
    revisions: Vec<(Slot, u64)>,
    action: Action,
    logger: StageLogger,
    job: Job,
}

impl Ticket {
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Result of a remote stage call, ready to merge into the session.
#[derive(Debug, Clone)]
pub enum StageOutput {
    Product(ProductData),
    Model(GeneratedModel),
    Script { text: String, origin: ScriptOrigin },
    Audio(AudioAsset),
    Video(VideoAsset),
}

/// What [`StageRunner::apply`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Merged. `follow_up` is an action the merge made due (script
    /// auto-generation on entering the video stage).
    Applied { follow_up: Option<StageRequest> },
    /// The action failed; the message is stored as the session notice.
    Failed(String),
    /// The session was reset or replaced while the call ran, or an input
    /// of the result changed in the meantime.
    Stale,
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Runs stage actions against a generation client.
#[derive(Clone)]
pub struct StageRunner {
    client: Arc<dyn GenerationClient>,
    retry: RetryPolicy,
}

fn require<'a, T>(value: &'a Option<T>, what: &str) -> PipelineResult<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| PipelineError::precondition(format!("{} is required", what)))
}

fn require_script(session: &WizardSession) -> PipelineResult<String> {
    let script = session.script.trim();
    if script.is_empty() {
        return Err(PipelineError::precondition("script is required"));
    }
    Ok(script.to_string())
}

impl StageRunner {
    pub fn new(client: Arc<dyn GenerationClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn client(&self) -> &Arc<dyn GenerationClient> {
        &self.client
    }

    /// Validate and mark the action busy. On error the session is unchanged.
    pub fn begin(
        &self,
        session: &mut WizardSession,
        request: StageRequest,
    ) -> PipelineResult<Ticket> {
        let action = request.action();
        if session.is_busy(action.slot()) {
            return Err(PipelineError::Busy(action));
        }

        let job = match request {
            StageRequest::Analyze { url } => {
                let parsed = parse_product_url(&url).map_err(|e| {
                    PipelineError::precondition(format!("invalid product URL '{}': {}", url, e))
                })?;
                session.url = url.trim().to_string();
                Job::Analyze {
                    url: parsed.to_string(),
                    language: session.language,
                }
            }
            StageRequest::GenerateModel => {
                let product = require(&session.product, "product data")?;
                Job::Image {
                    prompt: model_image_prompt(product, session.gender),
                }
            }
            StageRequest::GenerateScript => {
                let product = require(&session.product, "product data")?;
                Job::Script {
                    prompt: script_prompt(
                        product,
                        session.gender,
                        session.language,
                        session.script_style,
                    ),
                    origin: ScriptOrigin::Generated,
                }
            }
            StageRequest::ModifyScript(edit) => {
                let script = require_script(session)?;
                Job::Script {
                    prompt: modify_script_prompt(&script, edit, session.language),
                    origin: ScriptOrigin::Modified,
                }
            }
            StageRequest::GenerateAudio { voice } => Job::Audio {
                text: require_script(session)?,
                voice,
            },
            StageRequest::GenerateVideo => {
                let product = require(&session.product, "product data")?;
                let model = require(&session.model, "model image")?;
                Job::Video {
                    prompt: video_prompt(&product.video_subject()),
                    image: model.image.clone(),
                }
            }
        };

        session.mark_busy(action)?;
        session.dismiss_error();
        if action == Action::GenerateVideo {
            session.set_video_error(None);
        }
        let revisions = action
            .depends_on()
            .iter()
            .map(|slot| (*slot, session.revision(*slot)))
            .collect();

        let logger = StageLogger::new(session.id.as_str(), action);
        logger.log_start(session.stage().as_str());

        Ok(Ticket {
            epoch: session.epoch(),
            revisions,
            action,
            logger,
            job,
        })
    }

    /// Perform the remote call for `ticket`.
    pub async fn run(&self, ticket: &Ticket) -> PipelineResult<StageOutput> {
        let span = ticket.logger.create_span();
        self.run_job(&ticket.job).instrument(span).await
    }

    async fn run_job(&self, job: &Job) -> PipelineResult<StageOutput> {
        let client = self.client.as_ref();
        match job {
            Job::Analyze { url, language } => {
                let text = self
                    .retry
                    .run("analyze", || client.analyze(url, *language))
                    .await?;
                let parsed = parse_analysis(url, &text);
                if parsed.is_degraded() {
                    let fields: Vec<&str> = parsed.degraded.iter().map(|f| f.label()).collect();
                    warn!(fields = ?fields, "Analysis parse degraded");
                }
                Ok(StageOutput::Product(parsed.product))
            }
            Job::Image { prompt } => {
                let image = self
                    .retry
                    .run("image", || client.generate_image(prompt))
                    .await?;
                Ok(StageOutput::Model(GeneratedModel::new(image, prompt.clone())))
            }
            Job::Script { prompt, origin } => {
                let text = self
                    .retry
                    .run("script", || client.generate_script(prompt))
                    .await?;
                Ok(StageOutput::Script {
                    text: text.trim().to_string(),
                    origin: *origin,
                })
            }
            Job::Audio { text, voice } => {
                let pcm = self
                    .retry
                    .run("audio", || client.generate_audio(text, voice))
                    .await?;
                Ok(StageOutput::Audio(AudioAsset::from_base64(pcm)?))
            }
            Job::Video { prompt, image } => {
                let media = self
                    .retry
                    .run("video", || client.generate_video(prompt, image))
                    .await?;
                Ok(StageOutput::Video(VideoAsset::completed(media, prompt.clone())))
            }
        }
    }

    /// Merge `result` into `session`.
    pub fn apply(
        &self,
        session: &mut WizardSession,
        ticket: Ticket,
        result: PipelineResult<StageOutput>,
    ) -> ApplyOutcome {
        let Ticket {
            epoch,
            revisions,
            action,
            logger,
            ..
        } = ticket;

        if epoch != session.epoch() {
            logger.log_stale(epoch, session.epoch());
            record_stage_action(action.as_str(), "stale");
            return ApplyOutcome::Stale;
        }
        session.clear_busy(action);

        if let Some((slot, _)) = revisions
            .iter()
            .find(|(slot, revision)| session.revision(*slot) != *revision)
        {
            logger.log_superseded(slot.as_str());
            record_stage_action(action.as_str(), "superseded");
            return ApplyOutcome::Stale;
        }

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let message = e.to_string();
                logger.log_failure(&message);
                record_stage_action(action.as_str(), e.kind());
                if action == Action::GenerateVideo {
                    session.set_video_error(Some(message.clone()));
                }
                session.set_notice(action, message.clone());
                return ApplyOutcome::Failed(message);
            }
        };
        session.touch(action.slot());

        let mut follow_up = None;
        match output {
            StageOutput::Product(product) => {
                session.product = Some(product);
                session.wizard_mut().advance_to(Stage::ReviewProduct);
            }
            StageOutput::Model(model) => {
                session.model = Some(model);
                session.wizard_mut().advance_to(Stage::GenerateVideos);
                if session.script.trim().is_empty() && !session.is_busy(Slot::Script) {
                    follow_up = Some(StageRequest::GenerateScript);
                }
            }
            StageOutput::Script { text, origin } => {
                session.script = text;
                session.script_origin = origin;
            }
            StageOutput::Audio(audio) => {
                session.audio = Some(audio);
            }
            StageOutput::Video(video) => {
                session.video = Some(video);
            }
        }

        logger.log_completion(session.stage().as_str());
        record_stage_action(action.as_str(), "ok");
        ApplyOutcome::Applied { follow_up }
    }

    /// Run one action with exclusive access to the session.
    pub async fn execute(
        &self,
        session: &mut WizardSession,
        request: StageRequest,
    ) -> PipelineResult<ApplyOutcome> {
        let ticket = self.begin(session, request)?;
        let result = self.run(&ticket).await;
        Ok(self.apply(session, ticket, result))
    }

    /// Generate `count` image variations of the model shot. Each variation is
    /// an independent call; the session is not modified.
    pub async fn generate_shots(
        &self,
        product: &ProductData,
        gender: Gender,
        count: usize,
    ) -> Vec<PipelineResult<GeneratedModel>> {
        let prompts = image_variations(&model_image_prompt(product, gender), count);
        let results = generate_image_batch(self.client.as_ref(), &self.retry, &prompts).await;
        prompts
            .into_iter()
            .zip(results)
            .map(|(prompt, result)| -> PipelineResult<GeneratedModel> {
                Ok(GeneratedModel::new(result?, prompt))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clab_models::{Stage, VideoStatus};

    use super::*;
    use crate::testing::ScriptedClient;

    const ANALYSIS: &str = "Name: Thermo Mug\nDescription: Steel mug\nVisual Features: Black\nTarget Audience: Commuters\nSelling Points:\n- Durable\n- Cheap";

    fn runner(client: Arc<ScriptedClient>) -> StageRunner {
        StageRunner::new(client, RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_analyze_enters_review() {
        let client = Arc::new(ScriptedClient::new().with_analysis(ANALYSIS));
        let runner = runner(client);
        let mut session = WizardSession::new();

        let outcome = runner
            .execute(&mut session, StageRequest::analyze("shop.example/mug"))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::Applied { follow_up: None });
        assert_eq!(session.stage(), Stage::ReviewProduct);
        let product = session.product.as_ref().unwrap();
        assert_eq!(product.url, "https://shop.example/mug");
        assert_eq!(product.selling_points, vec!["Durable", "Cheap"]);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_call() {
        let client = Arc::new(ScriptedClient::new());
        let runner = runner(client.clone());
        let mut session = WizardSession::new();

        let err = runner
            .execute(&mut session, StageRequest::analyze("http://"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Precondition(_)));
        assert_eq!(client.calls("analyze"), 0);
        assert!(!session.any_busy());
    }

    #[tokio::test]
    async fn test_model_success_requests_script() {
        let client = Arc::new(ScriptedClient::new());
        let runner = runner(client);
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));

        let outcome = runner
            .execute(&mut session, StageRequest::GenerateModel)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Applied {
                follow_up: Some(StageRequest::GenerateScript)
            }
        );
        assert_eq!(session.stage(), Stage::GenerateVideos);
        assert!(session.model.as_ref().unwrap().prompt_used.contains("Indonesian female"));
    }

    #[tokio::test]
    async fn test_model_success_keeps_existing_script() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));
        session.edit_script("Mine");

        let outcome = runner
            .execute(&mut session, StageRequest::GenerateModel)
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { follow_up: None });
        assert_eq!(session.script, "Mine");
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_state() {
        let client = Arc::new(ScriptedClient::new().failing("script", "model overloaded"));
        let runner = runner(client);
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));
        session.edit_script("Old script");

        let outcome = runner
            .execute(&mut session, StageRequest::ModifyScript(ScriptEdit::Shorten))
            .await
            .unwrap();

        assert!(matches!(outcome, ApplyOutcome::Failed(ref m) if m.contains("model overloaded")));
        assert_eq!(session.script, "Old script");
        assert_eq!(session.script_origin, ScriptOrigin::Edited);
        assert_eq!(session.notice().unwrap().action, Action::ModifyScript);
        assert!(!session.any_busy());

        session.dismiss_error();
        assert!(session.notice().is_none());
    }

    #[tokio::test]
    async fn test_begin_clears_previous_notice_and_guards_busy() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let mut session = WizardSession::new();
        session.edit_script("Hello there");
        session.set_notice(Action::GenerateVideo, "old");

        let ticket = runner.begin(&mut session, StageRequest::audio()).unwrap();
        assert!(session.notice().is_none());
        assert!(matches!(
            runner.begin(&mut session, StageRequest::audio()),
            Err(PipelineError::Busy(Action::GenerateAudio))
        ));

        let result = runner.run(&ticket).await;
        runner.apply(&mut session, ticket, result);
        let audio = session.audio.as_ref().unwrap();
        assert!(audio.duration_secs > 0.0);
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));

        let ticket = runner.begin(&mut session, StageRequest::GenerateModel).unwrap();
        let result = runner.run(&ticket).await;
        session.reset();
        session.mark_busy(Action::GenerateModel).unwrap();

        let outcome = runner.apply(&mut session, ticket, result);

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(session.model.is_none());
        assert!(session.is_busy(Slot::Model));
    }

    #[tokio::test]
    async fn test_script_edited_during_generation_is_kept() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));

        let ticket = runner.begin(&mut session, StageRequest::GenerateScript).unwrap();
        session.edit_script("My hand-written script");
        let result = runner.run(&ticket).await;

        let outcome = runner.apply(&mut session, ticket, result);

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert_eq!(session.script, "My hand-written script");
        assert_eq!(session.script_origin, ScriptOrigin::Edited);
        assert!(!session.is_busy(Slot::Script));
    }

    #[tokio::test]
    async fn test_model_for_replaced_product_is_discarded() {
        let client = Arc::new(ScriptedClient::new().with_analysis(ANALYSIS));
        let runner = runner(client);
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));

        let ticket = runner.begin(&mut session, StageRequest::GenerateModel).unwrap();
        runner
            .execute(&mut session, StageRequest::analyze("shop.example/other"))
            .await
            .unwrap();
        let result = runner.run(&ticket).await;

        assert_eq!(runner.apply(&mut session, ticket, result), ApplyOutcome::Stale);
        assert!(session.model.is_none());
        assert!(!session.any_busy());

        // A fresh attempt against the new product applies.
        let outcome = runner
            .execute(&mut session, StageRequest::GenerateModel)
            .await
            .unwrap();
        assert!(outcome.is_applied());
    }

    #[tokio::test]
    async fn test_failed_video_reports_failed_status() {
        let client = Arc::new(ScriptedClient::new().failing("video", "Image rejected"));
        let runner = runner(client);
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));
        session.model = Some(GeneratedModel::new(InlineMedia::new("aW1n", "image/png"), "p"));

        let outcome = runner
            .execute(&mut session, StageRequest::GenerateVideo)
            .await
            .unwrap();

        assert!(matches!(outcome, ApplyOutcome::Failed(_)));
        assert!(session.video.is_none());
        assert_eq!(session.video_status(), VideoStatus::Failed);
        assert!(session.video_error().unwrap().contains("Image rejected"));

        let _ticket = runner.begin(&mut session, StageRequest::GenerateVideo).unwrap();
        assert_eq!(session.video_status(), VideoStatus::InProgress);
        assert!(session.video_error().is_none());
    }

    #[tokio::test]
    async fn test_video_requires_model() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let mut session = WizardSession::new();
        session.product = Some(ProductData::placeholder("u"));

        let err = runner
            .execute(&mut session, StageRequest::GenerateVideo)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
        assert_eq!(session.video_status(), VideoStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_generate_shots_independent() {
        let runner = runner(Arc::new(ScriptedClient::new()));
        let product = ProductData::placeholder("u");

        let shots = runner.generate_shots(&product, Gender::Male, 3).await;
        assert_eq!(shots.len(), 3);
        assert!(shots.iter().all(|s| s.is_ok()));
        assert_ne!(
            shots[0].as_ref().unwrap().prompt_used,
            shots[1].as_ref().unwrap().prompt_used
        );
    }
}
