//! Resolve a stored document to plain text, choosing the strategy by file extension.

use crate::processing::sanitize::sanitize;
use crate::processing::types::ExtractionError;
use crate::services::{BlockType, ObjectStore, TextDetection, TextDetectionError};
use std::path::Path;
use std::sync::Arc;

/// Extensions read straight from the object store instead of going through detection.
const PLAIN_TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "csv", "log"];

/// How a document's text is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Read the raw bytes and decode them as text.
    PlainText,
    /// Ask the text detection service for line blocks.
    Detection,
}

/// Pick the extraction strategy for `key` from its (case-insensitive) extension.
pub fn strategy_for(key: &str) -> ExtractionStrategy {
    let extension = Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match extension {
        Some(ext) if PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) => ExtractionStrategy::PlainText,
        _ => ExtractionStrategy::Detection,
    }
}

/// Text extractor backed by the object store and the detection service.
pub struct TextExtractor {
    object_store: Arc<dyn ObjectStore>,
    detection: Arc<dyn TextDetection>,
}

impl TextExtractor {
    /// Build an extractor over the given collaborators.
    pub fn new(object_store: Arc<dyn ObjectStore>, detection: Arc<dyn TextDetection>) -> Self {
        Self {
            object_store,
            detection,
        }
    }

    /// Extract the text of `bucket/key`.
    ///
    /// Plain-text extensions are decoded directly. Everything else goes through detection; when
    /// the service reports the format as unsupported, the raw bytes are decoded and sanitized
    /// instead so partial signal is still recovered.
    pub async fn extract(&self, bucket: &str, key: &str) -> Result<String, ExtractionError> {
        match strategy_for(key) {
            ExtractionStrategy::PlainText => {
                let bytes = self.read_raw(bucket, key).await?;
                Ok(decode_text(&bytes))
            }
            ExtractionStrategy::Detection => match self.detection.detect_text(bucket, key).await {
                Ok(blocks) => Ok(blocks
                    .into_iter()
                    .filter(|block| block.block_type == BlockType::Line)
                    .filter_map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join("\n")),
                Err(TextDetectionError::UnsupportedFormat(reason)) => {
                    tracing::error!(bucket, key, reason = %reason, "Unsupported document format for text detection; salvaging raw bytes");
                    let bytes = self.read_raw(bucket, key).await?;
                    Ok(sanitize(&decode_utf8_ignoring_errors(&bytes)))
                }
                Err(source) => {
                    tracing::error!(bucket, key, error = %source, "Text extraction failed");
                    Err(ExtractionError::Detection {
                        key: key.to_string(),
                        source,
                    })
                }
            },
        }
    }

    async fn read_raw(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ExtractionError> {
        self.object_store
            .get_object(bucket, key)
            .await
            .map_err(|source| {
                tracing::error!(bucket, key, error = %source, "Failed to read document bytes");
                ExtractionError::Read {
                    key: key.to_string(),
                    source,
                }
            })
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1 when they are not valid UTF-8.
///
/// Latin-1 maps every byte to a code point, so this never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

/// Decode bytes as UTF-8, silently dropping invalid sequences.
pub fn decode_utf8_ignoring_errors(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
