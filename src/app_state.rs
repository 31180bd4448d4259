use std::sync::Arc;

use crate::services::studio::Studio;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
    /// Whether a Gemini credential was supplied at startup.
    pub credential_configured: bool,
}

impl AppState {
    pub fn new(studio: Studio, credential_configured: bool) -> Self {
        Self {
            studio: Arc::new(studio),
            credential_configured,
        }
    }
}
