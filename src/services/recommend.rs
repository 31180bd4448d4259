use serde_json::Value;
use std::sync::Arc;

use crate::models::image::SourceImage;
use crate::models::style::StyleDescriptor;
use crate::services::ai::{AiError, StyleAnalysisService};

/// Number of styles proposed for every portrait.
pub const STYLE_COUNT: usize = 18;

/// Description used for every entry of the fallback list.
pub const FALLBACK_DESCRIPTION: &str =
    "A modern, flattering hairstyle that suits the person's face shape and features";

/// Turns one analysis call into a list of style descriptors.
///
/// Everything except a configuration error is absorbed into the fallback
/// list, so callers always receive styles to generate.
pub struct StyleRecommender {
    analyzer: Arc<dyn StyleAnalysisService>,
    count: usize,
}

impl StyleRecommender {
    pub fn new(analyzer: Arc<dyn StyleAnalysisService>) -> Self {
        Self {
            analyzer,
            count: STYLE_COUNT,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub async fn recommend(&self, image: &SourceImage) -> Result<Vec<StyleDescriptor>, AiError> {
        let raw = match self.analyzer.analyze_styles(image, self.count).await {
            Ok(raw) => raw,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Style analysis failed, using fallback styles");
                metrics::counter!("style_analysis_fallbacks_total", "reason" => "call").increment(1);
                return Ok(fallback_styles(self.count));
            }
        };

        match normalize_styles(&raw, self.count) {
            Ok(styles) => {
                tracing::info!(count = styles.len(), "Style analysis complete");
                Ok(styles)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Style analysis returned an unusable shape, using fallback styles");
                metrics::counter!("style_analysis_fallbacks_total", "reason" => "shape").increment(1);
                Ok(fallback_styles(self.count))
            }
        }
    }
}

/// Re-index a raw analysis payload into style descriptors.
///
/// Contract: the payload must be a non-empty array. Only the first `count`
/// entries are kept and entry `i` (0-based) always gets id `i + 1`; any id in
/// the payload is ignored. A missing label becomes `Style {id}` and a missing
/// description falls back to the label. Shorter arrays are not padded.
pub fn normalize_styles(raw: &Value, count: usize) -> Result<Vec<StyleDescriptor>, ShapeError> {
    let entries = raw.as_array().ok_or(ShapeError::NotASequence)?;
    if entries.is_empty() {
        return Err(ShapeError::Empty);
    }

    let styles = entries
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, entry)| {
            let id = index as u32 + 1;
            let label = text_field(entry, "label").unwrap_or_else(|| placeholder_label(id));
            let prompt_description =
                text_field(entry, "promptDescription").unwrap_or_else(|| label.clone());
            StyleDescriptor {
                id,
                label,
                prompt_description,
            }
        })
        .collect();

    Ok(styles)
}

/// `count` generic styles used when analysis is unavailable.
pub fn fallback_styles(count: usize) -> Vec<StyleDescriptor> {
    (1..=count as u32)
        .map(|id| StyleDescriptor::new(id, placeholder_label(id), FALLBACK_DESCRIPTION))
        .collect()
}

fn placeholder_label(id: u32) -> String {
    format!("Style {}", id)
}

fn text_field(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ShapeError {
    #[error("Analysis payload is not a JSON array")]
    NotASequence,

    #[error("Analysis payload is an empty array")]
    Empty,
}
