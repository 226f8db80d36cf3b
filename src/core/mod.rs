// Core pipeline exports
pub mod buffer;
pub mod enricher;
pub mod extractor;
pub mod orchestrator;
pub mod prompt;

pub use buffer::{TokenBuffer, strip_fences};
pub use enricher::{MatchEnricher, MapsLinkBuilder, ShapeError, parse_element};
pub use extractor::{try_extract, looks_like_array};
pub use orchestrator::{StreamOrchestrator, StreamOptions, StreamState, StreamSummary, StreamError, Terminal};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
