//! Document text detection (OCR) contract and HTTP adapter.

use crate::services::http::HttpTransport;
use crate::services::types::{TextBlock, TextDetectionError, TransportError};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Error type name the service reports for formats it cannot read.
const UNSUPPORTED_DOCUMENT_TYPE: &str = "UnsupportedDocumentException";

/// Service that reads text out of a stored document.
#[async_trait]
pub trait TextDetection: Send + Sync {
    /// Detect text in `bucket/key`, returning blocks in reading order.
    async fn detect_text(&self, bucket: &str, key: &str)
    -> Result<Vec<TextBlock>, TextDetectionError>;
}

/// HTTP adapter speaking the `DetectDocumentText` JSON shape.
pub struct HttpTextDetection {
    transport: HttpTransport,
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(rename = "Blocks", default)]
    blocks: Vec<TextBlock>,
}

impl HttpTextDetection {
    /// Build an adapter rooted at `base_url`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(base_url, api_key, "rusty-doc/text-detection")?;
        tracing::debug!(url = %transport.base_url, "Initialized text detection client");
        Ok(Self { transport })
    }
}

#[async_trait]
impl TextDetection for HttpTextDetection {
    async fn detect_text(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<TextBlock>, TextDetectionError> {
        let body = json!({
            "Document": {
                "S3Object": { "Bucket": bucket, "Name": key }
            }
        });

        let response = self
            .transport
            .request(Method::POST, "detect-document-text")
            .json(&body)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_unsupported_format(status, &body) {
                return Err(TextDetectionError::UnsupportedFormat(body));
            }
            return Err(TransportError::UnexpectedStatus { status, body }.into());
        }

        let payload: DetectResponse = response
            .json()
            .await
            .map_err(|error| TextDetectionError::InvalidResponse(error.to_string()))?;
        tracing::debug!(bucket, key, blocks = payload.blocks.len(), "Text detected");
        Ok(payload.blocks)
    }
}

fn is_unsupported_format(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        return true;
    }
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("__type")
                .and_then(Value::as_str)
                .map(|kind| kind.ends_with(UNSUPPORTED_DOCUMENT_TYPE))
        })
        .unwrap_or(false)
}
