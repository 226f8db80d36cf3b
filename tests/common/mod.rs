// Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use citymatch::core::{MapsLinkBuilder, MatchEnricher, StreamOptions, StreamOrchestrator, StreamSummary};
use citymatch::models::{MatchRequest, ProgressEvent};
use citymatch::services::{CompletionSource, LlmError, PhotoSearch, TokenStream};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Model that replays a fixed list of fragments
pub struct ScriptedModel {
    fragments: Vec<Result<String, String>>,
    open_error: Option<String>,
    pulled: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(|f| Ok(f.into())).collect(),
            open_error: None,
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fragments followed by a mid-stream failure
    pub fn failing_after<I, S>(fragments: I, message: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut model = Self::new(fragments);
        model.fragments.push(Err(message.to_string()));
        model
    }

    /// Model whose request is rejected before streaming starts
    pub fn unavailable(message: &str) -> Self {
        let mut model = Self::new(Vec::<String>::new());
        model.open_error = Some(message.to_string());
        model
    }

    /// Number of fragments the consumer has pulled from the stream
    pub fn pulled(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulled)
    }
}

#[async_trait]
impl CompletionSource for ScriptedModel {
    async fn stream_completion(&self, _system: &str, _prompt: &str) -> Result<TokenStream, LlmError> {
        if let Some(message) = &self.open_error {
            return Err(LlmError::ApiError(message.clone()));
        }

        let items: Vec<Result<String, LlmError>> = self
            .fragments
            .iter()
            .cloned()
            .map(|f| f.map_err(LlmError::ApiError))
            .collect();
        let pulled = Arc::clone(&self.pulled);

        Ok(Box::pin(futures::stream::iter(items).inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        })))
    }
}

/// Model whose request never gets an answer
pub struct SilentModel;

#[async_trait]
impl CompletionSource for SilentModel {
    async fn stream_completion(&self, _system: &str, _prompt: &str) -> Result<TokenStream, LlmError> {
        std::future::pending::<()>().await;
        Err(LlmError::ApiError("unreachable".to_string()))
    }
}

/// Model that sends a few fragments and then stalls forever
pub struct StalledModel {
    pub prefix: String,
}

#[async_trait]
impl CompletionSource for StalledModel {
    async fn stream_completion(&self, _system: &str, _prompt: &str) -> Result<TokenStream, LlmError> {
        let prefix = futures::stream::iter(vec![Ok::<String, LlmError>(self.prefix.clone())]);
        Ok(Box::pin(prefix.chain(futures::stream::pending())))
    }
}

/// Returns a deterministic URL for every query and counts calls
#[derive(Default)]
pub struct EchoPhotos {
    pub calls: AtomicUsize,
}

#[async_trait]
impl PhotoSearch for EchoPhotos {
    async fn search(&self, query: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(format!("https://img.test/{}", urlencoding::encode(query)))
    }
}

/// Answers after a per-query delay, so later elements can finish first
pub struct DelayedPhotos {
    pub delays: HashMap<String, Duration>,
}

#[async_trait]
impl PhotoSearch for DelayedPhotos {
    async fn search(&self, query: &str) -> Option<String> {
        let delay = self.delays.get(query).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Some(format!("https://img.test/{}", urlencoding::encode(query)))
    }
}

pub fn request() -> MatchRequest {
    MatchRequest::new("Paris", "France", "London", "United Kingdom")
}

pub fn match_json(n1: &str, n2: &str) -> serde_json::Value {
    serde_json::json!({
        "neighborhood1": n1,
        "neighborhood1_description": format!("{} description", n1),
        "neighborhood2": n2,
        "neighborhood2_description": format!("{} description", n2),
        "similarity_reason": format!("{} and {} share a vibe", n1, n2),
        "characteristics": ["walkable", "historic", "walkable"]
    })
}

/// A pretty-printed array of `count` matches, as a model would write it
pub fn model_output(count: usize) -> String {
    let elements: Vec<_> = (0..count)
        .map(|i| match_json(&format!("North{}", i), &format!("South{}", i)))
        .collect();
    serde_json::to_string_pretty(&elements).unwrap()
}

pub fn options() -> StreamOptions {
    StreamOptions {
        pacing: Duration::ZERO,
        enrich_concurrency: 3,
        max_parse_failures: None,
        channel_capacity: 64,
    }
}

pub fn orchestrator(
    model: impl CompletionSource + 'static,
    photos: Arc<dyn PhotoSearch>,
    options: StreamOptions,
) -> StreamOrchestrator {
    let enricher = MatchEnricher::new(
        photos,
        MapsLinkBuilder::new("https://maps.example/search"),
        Duration::from_secs(10),
    );
    StreamOrchestrator::new(Arc::new(model), enricher, options)
}

/// Run to completion and collect every emitted event
pub async fn run_to_end(
    orchestrator: &StreamOrchestrator,
    request: MatchRequest,
) -> (Vec<ProgressEvent>, StreamSummary) {
    let (tx, mut rx) = mpsc::channel(256);
    let summary = orchestrator.run(request, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (events, summary)
}

/// Check the event lifecycle: one `processing`, contiguous `match`
/// indices, exactly one terminal event at the end
pub fn assert_well_formed(events: &[ProgressEvent]) {
    assert!(matches!(events.first(), Some(ProgressEvent::Processing { .. })), "first event must be processing");

    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "expected exactly one terminal event in {:?}", events);
    assert!(events.last().is_some_and(|e| e.is_terminal()), "terminal event must be last");

    let indices: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Match { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, (0..indices.len()).collect::<Vec<_>>());

    if let Some(ProgressEvent::Complete { total }) = events.last() {
        assert_eq!(*total, indices.len());
    }
}

pub fn matches_of(events: &[ProgressEvent]) -> Vec<citymatch::models::NeighborhoodMatch> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Match { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect()
}
