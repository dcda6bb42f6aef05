//! Shared error and wire types for the external collaborators.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Failures shared by every HTTP-backed collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Service responded with an unexpected status code.
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Errors returned by the object store.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// The requested object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors returned by the document text detection service.
#[derive(Debug, Error)]
pub enum TextDetectionError {
    /// The service cannot read this document format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// The service answered with a body that could not be decoded.
    #[error("Malformed text detection response: {0}")]
    InvalidResponse(String),
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors returned by the text generation service.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// The service answered with a body that could not be decoded.
    #[error("Malformed generation response: {0}")]
    InvalidResponse(String),
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors returned by the structured record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// The service answered with a body that could not be decoded.
    #[error("Malformed record store response: {0}")]
    InvalidResponse(String),
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors returned by the notification channel.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Object written to the store, with descriptive attributes kept alongside the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// Raw object body.
    pub body: Vec<u8>,
    /// MIME type recorded with the object.
    pub content_type: String,
    /// User metadata attributes.
    pub metadata: BTreeMap<String, String>,
}

/// Granularity of a block returned by text detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// Whole page.
    Page,
    /// Single line of text.
    Line,
    /// Single word.
    Word,
    /// Any block kind the pipeline does not consume.
    #[serde(other)]
    Other,
}

/// One detected block, in service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block granularity.
    #[serde(rename = "BlockType")]
    pub block_type: BlockType,
    /// Detected text; pages carry none.
    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TextBlock {
    /// Convenience constructor for line blocks.
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            block_type: BlockType::Line,
            text: Some(text.into()),
        }
    }
}
