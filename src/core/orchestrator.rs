use crate::core::{
    buffer::TokenBuffer,
    enricher::MatchEnricher,
    extractor::{looks_like_array, try_extract},
    prompt::{build_prompt, SYSTEM_PROMPT},
};
use crate::models::{MatchRequest, ProgressEvent, RequestError};
use crate::services::{CompletionSource, LlmError, TokenStream};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::Instrument;

pub const PROCESSING_MESSAGE: &str = "Analyzing neighborhoods...";

/// Failures that end a stream with an `error` event
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("model response did not contain a complete JSON array")]
    Incomplete,

    #[error("model response was not valid JSON after {0} parse attempts")]
    TooManyParseFailures(usize),
}

/// Lifecycle of a single match stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Requesting,
    Streaming,
    Draining,
    Terminated,
}

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Complete,
    Error,
    /// The receiver went away; nothing further was emitted
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub matches: usize,
    pub skipped: usize,
    pub terminal: Terminal,
}

/// Tuning knobs for the streaming pipeline
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Delay between consecutive match events
    pub pacing: Duration,
    /// Number of elements enriched ahead of the one being emitted
    pub enrich_concurrency: usize,
    /// Give up after this many array-shaped buffers fail to parse
    pub max_parse_failures: Option<usize>,
    pub channel_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(100),
            enrich_concurrency: 3,
            max_parse_failures: None,
            channel_capacity: 16,
        }
    }
}

enum Interrupt {
    Failed(StreamError),
    Disconnected,
}

/// Tracks the state machine and owns the sending side of the event channel
struct EventSink {
    tx: mpsc::Sender<ProgressEvent>,
    state: StreamState,
}

impl EventSink {
    fn transition(&mut self, next: StreamState) {
        tracing::debug!("Stream state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn emit(&mut self, event: ProgressEvent) -> Result<(), Interrupt> {
        if self.state == StreamState::Terminated {
            return Err(Interrupt::Disconnected);
        }
        self.tx.send(event).await.map_err(|_| Interrupt::Disconnected)
    }
}

/// Drives one request from model completion to the terminal event
///
/// # Pipeline Stages
/// 1. Emit `processing` and open the model token stream
/// 2. Buffer fragments until the cleaned buffer parses as a JSON array
/// 3. Enrich elements concurrently, emitting `match` events in array order
/// 4. Emit `complete`, or `error` if stage 1 or 2 failed
pub struct StreamOrchestrator {
    llm: Arc<dyn CompletionSource>,
    enricher: MatchEnricher,
    options: StreamOptions,
}

impl StreamOrchestrator {
    pub fn new(llm: Arc<dyn CompletionSource>, enricher: MatchEnricher, options: StreamOptions) -> Self {
        Self {
            llm,
            enricher,
            options,
        }
    }

    /// Validate the request and run the stream on a background task
    ///
    /// An invalid request is rejected here, before any event is produced.
    pub fn start(self: Arc<Self>, request: MatchRequest) -> Result<mpsc::Receiver<ProgressEvent>, RequestError> {
        request.ensure_distinct()?;

        let (tx, rx) = mpsc::channel(self.options.channel_capacity.max(1));
        let span = tracing::info_span!(
            "match_stream",
            request_id = %uuid::Uuid::new_v4(),
            city1 = %request.city1,
            city2 = %request.city2
        );

        tokio::spawn(
            async move {
                let summary = self.run(request, tx).await;
                tracing::info!(
                    "Stream finished: {:?} ({} matches, {} skipped)",
                    summary.terminal,
                    summary.matches,
                    summary.skipped
                );
            }
            .instrument(span),
        );

        Ok(rx)
    }

    /// Run the full pipeline for an already validated request
    ///
    /// The channel is closed when this returns.
    pub async fn run(&self, request: MatchRequest, tx: mpsc::Sender<ProgressEvent>) -> StreamSummary {
        let mut sink = EventSink {
            tx,
            state: StreamState::Idle,
        };
        let mut summary = StreamSummary {
            matches: 0,
            skipped: 0,
            terminal: Terminal::Disconnected,
        };

        let outcome = self.drive(&request, &mut sink, &mut summary).await;

        summary.terminal = match outcome {
            Ok(()) => Terminal::Complete,
            Err(Interrupt::Disconnected) => {
                tracing::info!("Client disconnected, stopping stream");
                Terminal::Disconnected
            }
            Err(Interrupt::Failed(e)) => {
                tracing::error!("Match stream failed: {}", e);
                match sink.emit(ProgressEvent::error(e.to_string())).await {
                    Ok(()) => Terminal::Error,
                    Err(_) => Terminal::Disconnected,
                }
            }
        };

        sink.transition(StreamState::Terminated);
        summary
    }

    async fn drive(
        &self,
        request: &MatchRequest,
        sink: &mut EventSink,
        summary: &mut StreamSummary,
    ) -> Result<(), Interrupt> {
        sink.transition(StreamState::Requesting);
        sink.emit(ProgressEvent::processing(PROCESSING_MESSAGE)).await?;

        let prompt = build_prompt(request);
        let opened = tokio::select! {
            biased;
            _ = sink.tx.closed() => return Err(Interrupt::Disconnected),
            opened = self.llm.stream_completion(SYSTEM_PROMPT, &prompt) => opened,
        };
        let tokens = opened.map_err(|e| Interrupt::Failed(e.into()))?;

        sink.transition(StreamState::Streaming);
        let elements = self.read_array(tokens, sink).await?;

        sink.transition(StreamState::Draining);
        tracing::debug!("Extracted {} elements", elements.len());
        self.drain(elements, request, sink, summary).await?;

        sink.emit(ProgressEvent::Complete { total: summary.matches }).await
    }

    /// Consume fragments until the buffer holds a complete array
    ///
    /// The token stream is dropped on return, so fragments arriving after
    /// the first successful extraction are never read.
    async fn read_array(&self, mut tokens: TokenStream, sink: &EventSink) -> Result<Vec<Value>, Interrupt> {
        let mut buffer = TokenBuffer::new();
        let mut parse_failures = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = sink.tx.closed() => return Err(Interrupt::Disconnected),
                next = tokens.next() => next,
            };

            let fragment = match next {
                Some(Ok(fragment)) => fragment,
                Some(Err(e)) => return Err(Interrupt::Failed(e.into())),
                None => {
                    tracing::warn!("Token stream ended without a complete array ({} bytes buffered)", buffer.len());
                    return Err(Interrupt::Failed(StreamError::Incomplete));
                }
            };

            buffer.append(&fragment);
            let cleaned = buffer.snapshot();

            if let Some(elements) = try_extract(&cleaned) {
                return Ok(elements);
            }

            if looks_like_array(&cleaned) {
                parse_failures += 1;
                if self.options.max_parse_failures.is_some_and(|max| parse_failures > max) {
                    return Err(Interrupt::Failed(StreamError::TooManyParseFailures(parse_failures)));
                }
            }
        }
    }

    async fn drain(
        &self,
        elements: Vec<Value>,
        request: &MatchRequest,
        sink: &mut EventSink,
        summary: &mut StreamSummary,
    ) -> Result<(), Interrupt> {
        // `buffered` keeps results in input order while enriching ahead
        let mut enriched = futures::stream::iter(elements.into_iter().enumerate())
            .map(move |(position, element)| async move {
                (position, self.enricher.enrich(&element, request).await)
            })
            .buffered(self.options.enrich_concurrency.max(1));

        loop {
            let next = tokio::select! {
                biased;
                _ = sink.tx.closed() => return Err(Interrupt::Disconnected),
                next = enriched.next() => next,
            };

            let Some((position, result)) = next else {
                return Ok(());
            };

            match result {
                Ok(data) => {
                    if summary.matches > 0 && !self.options.pacing.is_zero() {
                        tokio::select! {
                            biased;
                            _ = sink.tx.closed() => return Err(Interrupt::Disconnected),
                            _ = tokio::time::sleep(self.options.pacing) => {}
                        }
                    }
                    let index = summary.matches;
                    sink.emit(ProgressEvent::Match { data, index }).await?;
                    summary.matches += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping element {}: {}", position, e);
                    summary.skipped += 1;
                }
            }
        }
    }
}
