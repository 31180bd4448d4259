use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use uuid::Uuid;

use crate::models::image::GeneratedImage;
use crate::models::style::StyleDescriptor;

/// Generation status of a single work item.
///
/// The result image and error message live inside their variants, so an item
/// carries an image exactly when it succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(tag = "status", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Loading,
    Success {
        #[serde(rename = "resultImage")]
        image: GeneratedImage,
    },
    Error {
        #[serde(rename = "errorMessage")]
        message: String,
    },
}

impl ItemStatus {
    /// Items a scheduler run may pick up.
    pub fn is_eligible(&self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Error { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ItemStatus::Loading)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransitionError {
    #[error("Item {id} cannot move from {from} to {to}")]
    Invalid {
        id: u32,
        from: &'static str,
        to: &'static str,
    },
}

/// Per-run tracking record for one style descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u32,
    pub descriptor: StyleDescriptor,
    #[serde(flatten)]
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(descriptor: StyleDescriptor) -> Self {
        Self {
            id: descriptor.id,
            descriptor,
            status: ItemStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn result_image(&self) -> Option<&GeneratedImage> {
        match &self.status {
            ItemStatus::Success { image } => Some(image),
            _ => None,
        }
    }

    /// Pending or Error -> Loading.
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        if !self.status.is_eligible() {
            return Err(self.invalid("loading"));
        }
        self.set(ItemStatus::Loading);
        Ok(())
    }

    /// Loading -> Success.
    pub fn succeed(&mut self, image: GeneratedImage) -> Result<(), TransitionError> {
        if !self.status.is_loading() {
            return Err(self.invalid("success"));
        }
        self.set(ItemStatus::Success { image });
        Ok(())
    }

    /// Loading -> Error.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        if !self.status.is_loading() {
            return Err(self.invalid("error"));
        }
        self.set(ItemStatus::Error {
            message: message.into(),
        });
        Ok(())
    }

    fn set(&mut self, status: ItemStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    fn invalid(&self, to: &'static str) -> TransitionError {
        TransitionError::Invalid {
            id: self.id,
            from: (&self.status).into(),
            to,
        }
    }
}

/// Everything known about the current source image's generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub analyzing: bool,
    pub processing: bool,
    pub items: Vec<WorkItem>,
}

impl RunState {
    /// A fresh run waiting on the analysis call.
    pub fn analyzing(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            analyzing: true,
            processing: false,
            items: Vec::new(),
        }
    }

    /// Replace the items with fresh pending ones and leave the analyzing phase.
    pub fn install(&mut self, descriptors: Vec<StyleDescriptor>) {
        self.items = descriptors.into_iter().map(WorkItem::new).collect();
        self.analyzing = false;
    }

    pub fn item(&self, id: u32) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: u32) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Eligible items in their stored order.
    pub fn eligible(&self) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| item.status.is_eligible())
            .cloned()
            .collect()
    }

    pub fn loading_count(&self) -> usize {
        self.items.iter().filter(|item| item.status.is_loading()).count()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for item in &self.items {
            match item.status {
                ItemStatus::Pending => summary.pending += 1,
                ItemStatus::Loading => summary.loading += 1,
                ItemStatus::Success { .. } => summary.succeeded += 1,
                ItemStatus::Error { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Item counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pending: usize,
    pub loading: usize,
    pub succeeded: usize,
    pub failed: usize,
}
