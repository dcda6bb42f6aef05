//! Error taxonomy and result types for the document pipeline.

use crate::processing::event::EventError;
use crate::services::types::{
    GenerationClientError, ObjectStoreError, PublishError, RecordStoreError, TextDetectionError,
};
use serde::Serialize;
use thiserror::Error;

/// Text could not be pulled out of the stored document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The detection service failed for a reason other than an unsupported format.
    #[error("Text extraction failed for {key}: {source}")]
    Detection {
        /// Document key being extracted.
        key: String,
        /// Underlying service error.
        #[source]
        source: TextDetectionError,
    },
    /// Raw bytes could not be read from the object store.
    #[error("Failed to read {key} from object store: {source}")]
    Read {
        /// Document key being read.
        key: String,
        /// Underlying store error.
        #[source]
        source: ObjectStoreError,
    },
}

/// Extraction succeeded but produced nothing worth summarizing.
#[derive(Debug, Error)]
#[error("No text could be extracted from the document.")]
pub struct EmptyContentError;

/// Summary generation failed upstream.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generation call itself failed.
    #[error("Summary generation failed: {0}")]
    Client(#[from] GenerationClientError),
    /// The generator answered without any message content.
    #[error("Summary generation returned no content")]
    EmptyResponse,
}

/// An artifact or record could not be written or read back.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Writing the summary artifact failed.
    #[error("Failed to store summary {key}: {source}")]
    Artifact {
        /// Derived artifact key.
        key: String,
        /// Underlying store error.
        #[source]
        source: ObjectStoreError,
    },
    /// The record store rejected a read or write.
    #[error("Failed to access processing records: {0}")]
    Record(#[from] RecordStoreError),
    /// A stored item did not have the expected record shape.
    #[error("Malformed processing record: {0}")]
    MalformedRecord(String),
}

/// Best-effort notification failure; logged by the pipeline and never propagated.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The message body could not be encoded.
    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
    /// The channel rejected the publish call.
    #[error("Failed to send notification: {0}")]
    Publish(#[from] PublishError),
}

/// Primary failure signal of a processing attempt, surfaced unchanged to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The trigger payload did not identify a document.
    #[error(transparent)]
    InvalidEvent(#[from] EventError),
    /// Text extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Extraction yielded only whitespace.
    #[error(transparent)]
    EmptyContent(#[from] EmptyContentError),
    /// Summary generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// An artifact or record write failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Result of a successfully processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    /// Identity minted for this attempt.
    pub document_id: String,
    /// Original document key.
    pub document_key: String,
    /// Key of the stored summary artifact.
    pub summary_key: String,
    /// Summary length in characters.
    pub summary_length: usize,
}
