//! Summary artifact naming and storage.

use crate::processing::types::PersistenceError;
use crate::services::{ObjectStore, PutObjectRequest};
use std::collections::BTreeMap;

const SUMMARY_PREFIX: &str = "summaries/";
const SUMMARY_SUFFIX: &str = ".summary.txt";
const SUMMARY_CONTENT_TYPE: &str = "text/plain";

/// Derived artifact key for `original_key`.
///
/// Deterministic, so reprocessing the same key overwrites the previous summary.
pub fn summary_key(original_key: &str) -> String {
    format!("{SUMMARY_PREFIX}{original_key}{SUMMARY_SUFFIX}")
}

/// Summary body plus the descriptive attributes stored next to it.
#[derive(Debug, Clone)]
pub struct SummaryArtifact<'a> {
    /// Source document key.
    pub document_key: &'a str,
    /// Summary text.
    pub summary: &'a str,
    /// Extracted text length in characters.
    pub text_length: usize,
    /// Generation timestamp.
    pub generated_at: &'a str,
}

impl SummaryArtifact<'_> {
    fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("original-document".to_string(), self.document_key.to_string()),
            ("summary-generated".to_string(), "true".to_string()),
            ("text-length".to_string(), self.text_length.to_string()),
            (
                "summary-length".to_string(),
                self.summary.chars().count().to_string(),
            ),
            (
                "processing-timestamp".to_string(),
                self.generated_at.to_string(),
            ),
        ])
    }
}

/// Write `artifact` to `bucket` and return its key.
pub async fn store_summary(
    store: &dyn ObjectStore,
    bucket: &str,
    artifact: &SummaryArtifact<'_>,
) -> Result<String, PersistenceError> {
    let key = summary_key(artifact.document_key);
    let request = PutObjectRequest {
        bucket: bucket.to_string(),
        key: key.clone(),
        body: artifact.summary.as_bytes().to_vec(),
        content_type: SUMMARY_CONTENT_TYPE.to_string(),
        metadata: artifact.metadata(),
    };
    match store.put_object(request).await {
        Ok(()) => {
            tracing::info!(bucket, key = %key, "Stored summary artifact");
            Ok(key)
        }
        Err(source) => Err(PersistenceError::Artifact { key, source }),
    }
}
