//! Streaming chat completions from an OpenAI-compatible endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Stream of text fragments from the model
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Errors that can occur when talking to the model service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Model service API key is not configured")]
    MissingApiKey,

    #[error("Invalid stream chunk: {0}")]
    InvalidChunk(String),
}

/// Source of streamed completions
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Start a completion and return its token stream
    async fn stream_completion(&self, system: &str, prompt: &str) -> Result<TokenStream, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChatChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChunkChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI-compatible chat completion client
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// `timeout` bounds the whole streamed response, not just the first byte.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            temperature,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionSource for OpenAiClient {
    async fn stream_completion(&self, system: &str, prompt: &str) -> Result<TokenStream, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            stream: true,
        };

        tracing::debug!("Streaming completion with model {}, prompt length: {}", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::ApiError(format!("{}: {}", status, message)));
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }
}

/// Turn a server-sent-events byte stream into a stream of content fragments
pub fn parse_sse_stream<S>(stream: S) -> TokenStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let tokens = stream
        .scan(SseDecoder::default(), |decoder, chunk| {
            let items = match chunk {
                Ok(bytes) => decoder.feed(&bytes),
                Err(e) => vec![Err(LlmError::RequestError(e))],
            };
            futures::future::ready(Some(futures::stream::iter(items)))
        })
        .flatten();

    Box::pin(tokens)
}

/// Line-oriented SSE decoder
///
/// Network chunks may split lines (and multi-byte characters) anywhere, so
/// incomplete trailing bytes are held until the next chunk arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feed one network chunk and return the fragments it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, LlmError>> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);

            match decode_line(line.trim()) {
                SseLine::Skip => {}
                SseLine::Done => {
                    self.done = true;
                    self.pending.clear();
                    break;
                }
                SseLine::Content(text) => out.push(Ok(text)),
                SseLine::Invalid(e) => out.push(Err(e)),
            }
        }

        out
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

enum SseLine {
    Skip,
    Done,
    Content(String),
    Invalid(LlmError),
}

fn decode_line(line: &str) -> SseLine {
    // Empty lines separate events, `:` starts a comment
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }

    let data = match line.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None => return SseLine::Skip,
    };

    if data == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            let content: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if content.is_empty() {
                SseLine::Skip
            } else {
                SseLine::Content(content)
            }
        }
        Err(e) => SseLine::Invalid(LlmError::InvalidChunk(e.to_string())),
    }
}
