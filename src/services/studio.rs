use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::models::image::{GeneratedImage, SourceImage};
use crate::models::run::{ItemStatus, RunState};
use crate::services::ai::AiError;
use crate::services::gemini::GeminiClient;
use crate::services::image_payload::ImagePayloadError;
use crate::services::recommend::StyleRecommender;
use crate::services::scheduler::{BatchScheduler, GenerationRun, RunReport};

/// Holds the single active run for the current source image.
///
/// Selecting a new image cancels the previous run and replaces it wholesale.
pub struct Studio {
    recommender: StyleRecommender,
    scheduler: Arc<BatchScheduler>,
    active: Mutex<Option<Arc<GenerationRun>>>,
}

impl Studio {
    pub fn new(recommender: StyleRecommender, scheduler: BatchScheduler) -> Self {
        Self {
            recommender,
            scheduler: Arc::new(scheduler),
            active: Mutex::new(None),
        }
    }

    /// Studio backed by Gemini for both analysis and generation.
    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        let gemini = Arc::new(GeminiClient::new(config)?);
        Ok(Self::new(
            StyleRecommender::new(gemini.clone()),
            BatchScheduler::new(gemini, config.generation_concurrency),
        ))
    }

    /// Make `image` the current source, analyze it and create its work items.
    ///
    /// The previous run is cancelled before analysis starts. On a configuration
    /// error the new run is discarded too, returning the studio to the upload
    /// step. Analysis runs in its own task, so a caller that goes away never
    /// leaves the run stuck in the analyzing phase.
    pub async fn select_source(
        self: &Arc<Self>,
        image: SourceImage,
    ) -> Result<Arc<GenerationRun>, StudioError> {
        let studio = Arc::clone(self);
        tokio::spawn(async move { studio.prepare(image).await }).await?
    }

    /// Select, analyze and start generating.
    ///
    /// Returns the state right after the scheduler claimed the run: items are
    /// still pending but `processing` is already set.
    pub async fn start(self: &Arc<Self>, image: SourceImage) -> Result<RunState, StudioError> {
        let studio = Arc::clone(self);
        tokio::spawn(async move {
            let run = studio.prepare(image).await?;
            let snapshot = studio.launch(run.clone()).unwrap_or_else(|| run.snapshot());
            Ok::<_, StudioError>(snapshot)
        })
        .await?
    }

    async fn prepare(&self, image: SourceImage) -> Result<Arc<GenerationRun>, StudioError> {
        let run = Arc::new(GenerationRun::new(image));
        self.replace_active(Some(run.clone())).await;

        tracing::info!(
            run_id = %run.id(),
            mime_type = %run.source().mime_type,
            size_bytes = run.source().byte_len(),
            "Analyzing new source image"
        );

        let styles = match self.recommender.recommend(run.source()).await {
            Ok(styles) => styles,
            Err(e) => {
                tracing::error!(run_id = %run.id(), error = %e, "Analysis aborted the run");
                self.discard_if_active(&run).await;
                return Err(StudioError::Configuration(e));
            }
        };

        if !run.install_styles(styles) {
            tracing::info!(run_id = %run.id(), "Source image replaced during analysis");
            return Err(StudioError::Superseded);
        }

        Ok(run)
    }

    /// Claim `run` and generate it in the background.
    ///
    /// Returns the state observed right after the claim, or `None` when the
    /// scheduler had nothing to claim.
    fn launch(&self, run: Arc<GenerationRun>) -> Option<RunState> {
        let eligible = self.scheduler.claim(&run)?;
        let snapshot = run.snapshot();
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move { scheduler.process(&run, eligible).await });
        Some(snapshot)
    }

    /// Generate the items of `run` in the caller's task.
    pub async fn generate(&self, run: &GenerationRun) -> RunReport {
        self.scheduler.run(run).await
    }

    pub async fn active(&self) -> Option<Arc<GenerationRun>> {
        self.active.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Result<RunState, StudioError> {
        let run = self.active().await.ok_or(StudioError::NoActiveSession)?;
        Ok(run.snapshot())
    }

    /// Re-run pending and failed items of the active run.
    /// Returns the number of items that will be scheduled.
    pub async fn rerun(&self) -> Result<(RunState, usize), StudioError> {
        let run = self.active().await.ok_or(StudioError::NoActiveSession)?;
        let snapshot = run.snapshot();

        if snapshot.analyzing {
            return Err(StudioError::StillAnalyzing);
        }
        if snapshot.processing {
            return Err(StudioError::RunInProgress);
        }

        match self.launch(run.clone()) {
            Some(snapshot) => {
                let eligible = snapshot.eligible().len();
                tracing::info!(run_id = %run.id(), eligible, "Re-running pending and failed items");
                Ok((snapshot, eligible))
            }
            None => {
                let snapshot = run.snapshot();
                if snapshot.processing {
                    return Err(StudioError::RunInProgress);
                }
                Ok((snapshot, 0))
            }
        }
    }

    /// Cancel and drop the active run. Returns false if there was none.
    pub async fn reset(&self) -> bool {
        self.replace_active(None).await
    }

    /// Image of a successfully generated item of the active run.
    pub async fn result_image(&self, id: u32) -> Result<GeneratedImage, StudioError> {
        let run = self.active().await.ok_or(StudioError::NoActiveSession)?;
        let state = run.snapshot();
        let item = state.item(id).ok_or(StudioError::ItemNotFound(id))?;

        match &item.status {
            ItemStatus::Success { image } => Ok(image.clone()),
            _ => Err(StudioError::ItemNotReady(id)),
        }
    }

    async fn replace_active(&self, next: Option<Arc<GenerationRun>>) -> bool {
        let mut active = self.active.lock().await;
        let previous = std::mem::replace(&mut *active, next);
        match previous {
            Some(previous) => {
                previous.cancel();
                tracing::info!(run_id = %previous.id(), "Cancelled previous run");
                true
            }
            None => false,
        }
    }

    async fn discard_if_active(&self, run: &Arc<GenerationRun>) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|current| Arc::ptr_eq(current, run)) {
            run.cancel();
            *active = None;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("No source image has been selected")]
    NoActiveSession,

    #[error("Invalid source image: {0}")]
    InvalidImage(#[from] ImagePayloadError),

    #[error("Service is not configured: {0}")]
    Configuration(AiError),

    #[error("Source image was replaced before analysis finished")]
    Superseded,

    #[error("Style analysis is still running")]
    StillAnalyzing,

    #[error("A generation run is already in progress")]
    RunInProgress,

    #[error("Style {0} does not exist")]
    ItemNotFound(u32),

    #[error("Style {0} has no generated image")]
    ItemNotReady(u32),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
