//! Summary generation with a deterministic content-policy guard.

mod guard;
mod prompt;

pub use guard::FALLBACK_SUMMARY;

use crate::processing::sanitize::sanitize;
use crate::processing::types::GenerationError;
use crate::services::GenerationClient;
use guard::{find_banned_phrase, strip_formatting};
use std::sync::Arc;

/// Appended to input that was cut at the character budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Outcome of a summarization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Final, policy-compliant summary text.
    pub text: String,
    /// True when the generator output was discarded for the canned fallback.
    pub used_fallback: bool,
}

/// Turns document text into a bounded plain-text summary.
pub struct Summarizer {
    client: Arc<dyn GenerationClient>,
    model_id: String,
    max_input_chars: usize,
    max_output_tokens: u32,
}

impl Summarizer {
    /// Build a summarizer targeting `model_id`.
    pub fn new(
        client: Arc<dyn GenerationClient>,
        model_id: impl Into<String>,
        max_input_chars: usize,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            max_input_chars,
            max_output_tokens,
        }
    }

    /// Summarize `text`.
    ///
    /// Input is truncated to the character budget and sanitized again before the request is
    /// built. The generated text has formatting characters stripped; if it still explains the
    /// document away as corrupted or binary, [`FALLBACK_SUMMARY`] is returned instead.
    pub async fn summarize(&self, text: &str) -> Result<Summary, GenerationError> {
        let document = sanitize(&prepare_input(text, self.max_input_chars));
        let request = prompt::build_request(&self.model_id, &document, self.max_output_tokens);
        tracing::debug!(
            model = %self.model_id,
            input_chars = document.chars().count(),
            max_tokens = self.max_output_tokens,
            "Requesting summary"
        );

        let response = self
            .client
            .invoke(&self.model_id, &request)
            .await
            .inspect_err(|error| {
                tracing::error!(model = %self.model_id, error = %error, "Generation call failed");
            })?;
        let raw = response
            .first_content()
            .ok_or(GenerationError::EmptyResponse)?;

        let cleaned = strip_formatting(raw);
        if let Some(phrase) = find_banned_phrase(&cleaned) {
            tracing::warn!(phrase, "Generated summary violated content policy; using fallback");
            return Ok(Summary {
                text: FALLBACK_SUMMARY.to_string(),
                used_fallback: true,
            });
        }

        Ok(Summary {
            text: cleaned,
            used_fallback: false,
        })
    }
}

/// Cut `text` to at most `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
pub(crate) fn prepare_input(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => {
            tracing::warn!(
                total_chars = text.chars().count(),
                max_chars,
                "Document exceeds summary input budget; truncating"
            );
            let mut truncated = text[..byte_offset].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text.to_string(),
    }
}
