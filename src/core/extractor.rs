//! Detects when the streamed buffer holds a complete JSON array.
//!
//! The whole buffer is re-parsed after every fragment. Completions are a
//! handful of elements long, so the quadratic total work is negligible and
//! there is no partial-object bookkeeping to get wrong.

use serde_json::Value;

/// Try to parse `cleaned` as a complete JSON array
///
/// Returns `None` while the text is not yet array-shaped or does not parse.
/// Truncated input is the normal state mid-stream, never an error.
pub fn try_extract(cleaned: &str) -> Option<Vec<Value>> {
    let text = cleaned.trim();
    if !looks_like_array(text) {
        return None;
    }

    match serde_json::from_str::<Vec<Value>>(text) {
        Ok(elements) => Some(elements),
        Err(e) => {
            tracing::trace!("Array not ready yet: {}", e);
            None
        }
    }
}

/// True when the trimmed text starts with `[` and ends with `]`
pub fn looks_like_array(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('[') && text.ends_with(']')
}
