use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::run::{RunState, RunSummary};

/// Request to select a new source image (JSON form).
#[derive(Debug, Deserialize, Validate)]
pub struct SelectImageRequest {
    /// Base64 image, optionally prefixed with `data:<mime>;base64,`.
    #[garde(length(min = 1))]
    pub image: String,
}

/// Snapshot of the active run returned to the presentation surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub state: RunState,
    pub summary: RunSummary,
}

impl From<RunState> for SessionResponse {
    fn from(state: RunState) -> Self {
        let summary = state.summary();
        Self { state, summary }
    }
}

/// Response after asking for a re-run of pending and failed items.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerunResponse {
    pub run_id: uuid::Uuid,
    pub scheduled: usize,
    pub message: String,
}
