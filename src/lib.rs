//! CityMatch - streaming neighborhood matching service
//!
//! Asks a language model to pair up similar neighborhoods between two cities,
//! enriches each pair with photos and map links, and streams the results
//! one event per line as soon as the model's JSON array is complete.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{StreamOrchestrator, StreamOptions, StreamSummary, Terminal, MatchEnricher, MapsLinkBuilder, TokenBuffer, try_extract};
pub use crate::models::{MatchRequest, NeighborhoodMatch, ProgressEvent};
pub use crate::services::{CompletionSource, PhotoSearch, TokenStream, LlmError};
