//! Drives stage actions against a shared session.
//!
//! The session sits behind an async mutex that is held only while an action
//! begins or applies, never across the remote call. Distinct actions can
//! therefore run concurrently and resolve in any order.

use std::sync::Arc;

use clab_models::{
    BackgroundMusicSelection, Gender, GeneratedModel, Language, MusicTrack, SavedProject,
    ScriptEdit, ScriptStyle, Stage,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::composer::{AssetComposer, MixSettings, RenderReceipt};
use crate::error::{PipelineError, PipelineResult};
use crate::session::WizardSession;
use crate::stages::{ApplyOutcome, StageRequest, StageRunner};
use crate::store::ProjectStore;

pub struct WizardController {
    session: Mutex<WizardSession>,
    runner: StageRunner,
    composer: AssetComposer,
}

impl WizardController {
    pub fn new(runner: StageRunner, composer: AssetComposer) -> Self {
        Self {
            session: Mutex::new(WizardSession::new()),
            runner,
            composer,
        }
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> WizardSession {
        self.session.lock().await.clone()
    }

    /// Run one action, then any follow-up its result made due.
    ///
    /// Returns the outcome of `request` itself. Follow-up failures end up in
    /// the session notice like any other action failure.
    pub async fn dispatch(&self, request: StageRequest) -> PipelineResult<ApplyOutcome> {
        let outcome = self.run_once(request).await?;

        if let ApplyOutcome::Applied {
            follow_up: Some(next),
        } = &outcome
        {
            debug!(action = %next.action(), "Running follow-up action");
            if let Err(e) = self.run_once(next.clone()).await {
                debug!(error = %e, "Follow-up action not started");
            }
        }

        Ok(outcome)
    }

    async fn run_once(&self, request: StageRequest) -> PipelineResult<ApplyOutcome> {
        let ticket = {
            let mut session = self.session.lock().await;
            self.runner.begin(&mut session, request)?
        };

        let result = self.runner.run(&ticket).await;

        let mut session = self.session.lock().await;
        Ok(self.runner.apply(&mut session, ticket, result))
    }

    pub async fn analyze(&self, url: &str) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::analyze(url)).await
    }

    pub async fn generate_model(&self) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::GenerateModel).await
    }

    pub async fn generate_script(&self) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::GenerateScript).await
    }

    pub async fn modify_script(&self, edit: ScriptEdit) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::ModifyScript(edit)).await
    }

    pub async fn generate_audio(&self, voice: &str) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::GenerateAudio {
            voice: voice.to_string(),
        })
        .await
    }

    pub async fn generate_video(&self) -> PipelineResult<ApplyOutcome> {
        self.dispatch(StageRequest::GenerateVideo).await
    }

    /// Start video and voiceover together.
    pub async fn generate_media(
        &self,
        voice: &str,
    ) -> (PipelineResult<ApplyOutcome>, PipelineResult<ApplyOutcome>) {
        tokio::join!(self.generate_video(), self.generate_audio(voice))
    }

    /// Image variations for the current product; the session is unchanged.
    pub async fn generate_shots(&self, count: usize) -> PipelineResult<Vec<PipelineResult<GeneratedModel>>> {
        let (product, gender) = {
            let session = self.session.lock().await;
            let product = session
                .product
                .clone()
                .ok_or_else(|| PipelineError::precondition("product data is required"))?;
            (product, session.gender)
        };
        Ok(self.runner.generate_shots(&product, gender, count).await)
    }

    pub async fn navigate(&self, target: Stage) -> PipelineResult<()> {
        self.session.lock().await.navigate(target)
    }

    pub async fn proceed_to_model(&self) -> PipelineResult<()> {
        self.session.lock().await.proceed_to_model()
    }

    pub async fn proceed_to_editor(&self) -> PipelineResult<()> {
        self.session.lock().await.proceed_to_editor()
    }

    pub async fn set_language(&self, language: Language) {
        self.session.lock().await.language = language;
    }

    pub async fn set_gender(&self, gender: Gender) {
        self.session.lock().await.gender = gender;
    }

    pub async fn set_script_style(&self, style: ScriptStyle) {
        self.session.lock().await.script_style = style;
    }

    pub async fn edit_script(&self, text: &str) {
        self.session.lock().await.edit_script(text);
    }

    pub async fn dismiss_error(&self) {
        self.session.lock().await.dismiss_error();
    }

    /// Select a catalog track and materialize its bytes.
    pub async fn select_stock_music(&self, track_id: &str) -> PipelineResult<()> {
        let track = MusicTrack::find(track_id)?;
        self.select_music(BackgroundMusicSelection::catalog(track))
            .await
    }

    /// Select background music. Catalog tracks are fetched at most once.
    pub async fn select_music(&self, mut selection: BackgroundMusicSelection) -> PipelineResult<()> {
        self.composer.library().materialize(&mut selection).await?;
        self.session.lock().await.music = Some(selection);
        Ok(())
    }

    /// Render the final asset from the current session.
    pub async fn compose(&self, mix: MixSettings) -> PipelineResult<RenderReceipt> {
        let session = self.snapshot().await;
        if !AssetComposer::is_ready(&session) {
            return Err(PipelineError::precondition(
                "video, voiceover and music are all required",
            ));
        }
        self.composer.compose(&session, mix).await
    }

    pub async fn reset(&self) {
        self.session.lock().await.reset();
    }

    pub async fn load(&self, project: SavedProject) {
        self.session.lock().await.load(project);
    }

    pub async fn save_to(&self, store: &dyn ProjectStore) -> PipelineResult<SavedProject> {
        let project = self.session.lock().await.to_saved();
        store.save(project.clone()).await?;
        Ok(project)
    }

    pub async fn load_from(&self, store: &dyn ProjectStore, id: &clab_models::ProjectId) -> PipelineResult<()> {
        let project = store
            .load(id)
            .await?
            .ok_or_else(|| PipelineError::store(format!("project {} not found", id)))?;
        self.load(project).await;
        Ok(())
    }
}
