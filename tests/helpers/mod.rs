//! In-memory stand-ins for the Gemini services

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use hairstyle_studio::models::image::{GeneratedImage, SourceImage};
use hairstyle_studio::models::run::RunState;
use hairstyle_studio::models::style::StyleDescriptor;
use hairstyle_studio::services::ai::{AiError, ImageMutationService, StyleAnalysisService};
use hairstyle_studio::services::image_payload;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use crate::fixtures;

pub fn source_image() -> SourceImage {
    image_payload::from_bytes(fixtures::PNG_BYTES).expect("fixture is a PNG")
}

/// Descriptors `1..=count` whose descriptions are `style-{id}`.
pub fn descriptors(count: u32) -> Vec<StyleDescriptor> {
    (1..=count)
        .map(|id| StyleDescriptor::new(id, format!("Style {}", id), format!("style-{}", id)))
        .collect()
}

pub enum Analysis {
    Respond(Value),
    /// Respond only after the given delay.
    Delayed(Duration, Value),
    Fail,
    MissingCredential,
}

pub struct MockAnalyzer {
    behavior: Analysis,
    pub calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn new(behavior: Analysis) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StyleAnalysisService for MockAnalyzer {
    async fn analyze_styles(&self, _image: &SourceImage, _count: usize) -> Result<Value, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Analysis::Respond(value) => Ok(value.clone()),
            Analysis::Delayed(delay, value) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
            Analysis::Fail => Err(AiError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            }),
            Analysis::MissingCredential => Err(AiError::MissingCredential),
        }
    }
}

/// Mutation mock that records every call and how many calls overlap.
///
/// Each successful call returns the style description, base64-encoded, as a PNG.
pub struct MockMutator {
    failing: Mutex<HashSet<String>>,
    delay: Duration,
    gate: Option<watch::Receiver<bool>>,
    observer: Mutex<Option<watch::Receiver<RunState>>>,
    pub calls: Mutex<Vec<String>>,
    pub loading_seen: Mutex<Vec<Vec<u32>>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockMutator {
    pub fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            delay: Duration::from_millis(10),
            gate: None,
            observer: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            loading_seen: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Calls block until `true` is sent on the returned sender.
    pub fn gated() -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let mut mock = Self::new();
        mock.gate = Some(rx);
        (mock, tx)
    }

    pub fn failing_on(self, descriptions: &[&str]) -> Self {
        self.set_failing(descriptions);
        self
    }

    pub fn set_failing(&self, descriptions: &[&str]) {
        let mut failing = self.failing.lock().unwrap();
        failing.clear();
        failing.extend(descriptions.iter().map(|d| d.to_string()));
    }

    /// Record which items are Loading at the moment each call starts.
    pub fn observe(&self, state: watch::Receiver<RunState>) {
        *self.observer.lock().unwrap() = Some(state);
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageMutationService for MockMutator {
    async fn generate_variation(
        &self,
        _image: &SourceImage,
        style_description: &str,
    ) -> Result<GeneratedImage, AiError> {
        self.calls.lock().unwrap().push(style_description.to_string());
        let loading: Option<Vec<u32>> = self.observer.lock().unwrap().as_ref().map(|observer| {
            observer
                .borrow()
                .items
                .iter()
                .filter(|item| item.status.is_loading())
                .map(|item| item.id)
                .collect()
        });
        if let Some(loading) = loading {
            self.loading_seen.lock().unwrap().push(loading);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match &self.gate {
            Some(gate) => {
                let mut gate = gate.clone();
                let _ = gate.wait_for(|open| *open).await;
            }
            None => tokio::time::sleep(self.delay).await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fails = self.failing.lock().unwrap().contains(style_description);
        if fails {
            return Err(AiError::NoImageInResponse);
        }
        let data = base64::engine::general_purpose::STANDARD.encode(style_description.as_bytes());
        Ok(GeneratedImage::new(Some("image/png".to_string()), data))
    }
}
