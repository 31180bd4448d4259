use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::image::{GeneratedImage, SourceImage};
use crate::models::run::{RunState, WorkItem};
use crate::models::style::StyleDescriptor;
use crate::services::ai::{AiError, ImageMutationService};

/// Variations generated concurrently per wave.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Message stored on items whose generation call failed.
pub const GENERATION_FAILED_MESSAGE: &str = "Generation failed. Try again.";

/// The generation run for one source image.
///
/// Its [`RunState`] is published through a watch channel: every transition is
/// a `send_modify`, so updates are serialized and subscribers always see a
/// consistent snapshot.
pub struct GenerationRun {
    id: Uuid,
    source: SourceImage,
    state: watch::Sender<RunState>,
    cancel: CancellationToken,
}

impl GenerationRun {
    /// A run still waiting for its style analysis.
    pub fn new(source: SourceImage) -> Self {
        let id = Uuid::new_v4();
        let (state, _) = watch::channel(RunState::analyzing(id));
        Self {
            id,
            source,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// A run with one pending item per descriptor.
    pub fn with_styles(source: SourceImage, styles: Vec<StyleDescriptor>) -> Self {
        let run = Self::new(source);
        run.install_styles(styles);
        run
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Abandon the run. In-flight calls finish but their results are dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Create the work items. Returns false if the run was already abandoned.
    pub fn install_styles(&self, styles: Vec<StyleDescriptor>) -> bool {
        let cancel = &self.cancel;
        self.state.send_if_modified(|state| {
            if cancel.is_cancelled() {
                return false;
            }
            state.install(styles);
            true
        })
    }

    /// Apply a mutation to the item with the given id and publish it.
    fn update_item<F>(&self, id: u32, apply: F)
    where
        F: FnOnce(&mut WorkItem) -> Result<(), crate::models::run::TransitionError>,
    {
        self.state.send_if_modified(|state| match state.item_mut(id) {
            Some(item) => match apply(item) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(run_id = %self.id, error = %e, "Rejected item transition");
                    false
                }
            },
            None => false,
        });
    }
}

/// Outcome of one scheduler invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub scheduled: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub discarded: usize,
    pub cancelled: bool,
}

/// Drives the mutation client over a run in fixed-size waves.
pub struct BatchScheduler {
    mutator: Arc<dyn ImageMutationService>,
    concurrency: usize,
}

impl BatchScheduler {
    pub fn new(mutator: Arc<dyn ImageMutationService>, concurrency: usize) -> Self {
        Self {
            mutator,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Generate every pending or failed item of `run`.
    ///
    /// Does nothing, without touching the run state, when no item is eligible
    /// or another invocation is already processing the run. Wave `k + 1`
    /// starts only after every call of wave `k` has settled.
    pub async fn run(&self, run: &GenerationRun) -> RunReport {
        match self.claim(run) {
            Some(eligible) => self.process(run, eligible).await,
            None => RunReport::default(),
        }
    }

    /// Mark `run` as processing and return its eligible items.
    ///
    /// `None` when the run is still analyzing, already claimed, or has
    /// nothing left to generate. A successful claim must be followed by
    /// [`BatchScheduler::process`], which clears the flag again.
    pub fn claim(&self, run: &GenerationRun) -> Option<Vec<WorkItem>> {
        let mut eligible = Vec::new();
        let claimed = run.state.send_if_modified(|state| {
            if state.processing || state.analyzing {
                return false;
            }
            eligible = state.eligible();
            if eligible.is_empty() {
                return false;
            }
            state.processing = true;
            true
        });

        if !claimed {
            tracing::debug!(run_id = %run.id, "Nothing to generate");
            return None;
        }
        Some(eligible)
    }

    /// Generate the items returned by a successful [`BatchScheduler::claim`].
    pub async fn process(&self, run: &GenerationRun, eligible: Vec<WorkItem>) -> RunReport {
        let mut report = RunReport::default();
        let start = Instant::now();
        metrics::counter!("generation_runs_total").increment(1);
        tracing::info!(
            run_id = %run.id,
            eligible = eligible.len(),
            concurrency = self.concurrency,
            "Starting generation run"
        );

        for (wave_index, wave) in eligible.chunks(self.concurrency).enumerate() {
            if run.is_cancelled() {
                break;
            }

            run.state.send_modify(|state| {
                for item in wave {
                    if let Some(current) = state.item_mut(item.id) {
                        if let Err(e) = current.begin() {
                            tracing::warn!(run_id = %run.id, error = %e, "Item could not start");
                        }
                    }
                }
            });
            report.scheduled += wave.len();

            tracing::debug!(
                run_id = %run.id,
                wave = wave_index,
                items = ?wave.iter().map(|item| item.id).collect::<Vec<_>>(),
                "Wave started"
            );

            let outcomes = join_all(wave.iter().map(|item| self.generate_one(run, item))).await;

            for (item, outcome) in wave.iter().zip(outcomes) {
                if run.is_cancelled() {
                    report.discarded += 1;
                    tracing::debug!(run_id = %run.id, style_id = item.id, "Discarding result of abandoned run");
                    continue;
                }

                match outcome {
                    Ok(image) => {
                        run.update_item(item.id, |current| current.succeed(image));
                        report.succeeded += 1;
                        metrics::counter!("hairstyle_variations_total", "outcome" => "success")
                            .increment(1);
                    }
                    Err(e) => {
                        tracing::warn!(
                            run_id = %run.id,
                            style_id = item.id,
                            label = %item.descriptor.label,
                            error = %e,
                            "Variation generation failed"
                        );
                        run.update_item(item.id, |current| current.fail(GENERATION_FAILED_MESSAGE));
                        report.failed += 1;
                        metrics::counter!("hairstyle_variations_total", "outcome" => "error")
                            .increment(1);
                    }
                }
            }
        }

        report.cancelled = run.is_cancelled();
        run.state.send_modify(|state| state.processing = false);

        tracing::info!(
            run_id = %run.id,
            scheduled = report.scheduled,
            succeeded = report.succeeded,
            failed = report.failed,
            discarded = report.discarded,
            cancelled = report.cancelled,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation run finished"
        );

        report
    }

    async fn generate_one(
        &self,
        run: &GenerationRun,
        item: &WorkItem,
    ) -> Result<GeneratedImage, AiError> {
        let start = Instant::now();
        let result = self
            .mutator
            .generate_variation(run.source(), &item.descriptor.prompt_description)
            .await;
        metrics::histogram!("variation_generation_seconds").record(start.elapsed().as_secs_f64());
        result
    }
}
