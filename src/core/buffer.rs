//! Accumulates model output fragments and strips markdown code fences.

const FENCE: &str = "```";

/// Append-only text buffer for one streamed completion
#[derive(Debug, Default, Clone)]
pub struct TokenBuffer {
    text: String,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment in arrival order
    pub fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Raw concatenation of every fragment received so far
    pub fn raw(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Buffer contents with code fence wrapping removed
    pub fn snapshot(&self) -> String {
        strip_fences(&self.text).to_string()
    }
}

/// Strip a leading ```` ```lang ```` marker and a trailing ```` ``` ```` marker
///
/// Both markers are only recognised at the very ends of the trimmed text.
/// The result is a fixed point: stripping it again returns it unchanged.
pub fn strip_fences(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let stripped = strip_fences_once(current);
        if stripped.len() == current.len() {
            return current;
        }
        current = stripped;
    }
}

fn strip_fences_once(text: &str) -> &str {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix(FENCE) {
        // Optional language tag such as `json` directly after the fence
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
            .unwrap_or(rest.len());
        out = rest[tag_len..].trim_start();
    }

    if let Some(rest) = out.strip_suffix(FENCE) {
        out = rest;
    }

    out.trim()
}
