//! Append-only processing record log.
//!
//! Every status change is a new item keyed by `(document_id, processing_timestamp)`; nothing is
//! updated in place. Timestamps are fixed-width UTC strings so lexicographic order is
//! chronological order.

use crate::processing::types::PersistenceError;
use crate::services::{Item, RecordStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Placeholder identity used when a failure happens before the document is known.
pub const UNKNOWN: &str = "UNKNOWN";

const SECONDS_PER_DAY: i64 = 86_400;

/// Lifecycle status of one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Attempt started.
    Processing,
    /// Summary stored.
    Completed,
    /// Attempt aborted.
    Failed,
}

impl ProcessingStatus {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that names no known lifecycle state.
#[derive(Debug, Error)]
#[error("Unknown processing status '{0}' (expected PROCESSING, COMPLETED, or FAILED)")]
pub struct UnknownStatusError(pub String);

impl FromStr for ProcessingStatus {
    type Err = UnknownStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(UnknownStatusError(value.to_string())),
        }
    }
}

/// Status together with the fields that only exist for that status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "processing_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordPayload {
    /// Attempt started; no extra fields.
    Processing,
    /// Summary artifact written.
    Completed {
        /// Artifact key.
        summary_key: String,
        /// Extracted text length in characters.
        text_length: usize,
        /// Summary length in characters.
        summary_length: usize,
        /// Wall-clock seconds from start to completion.
        processing_duration_seconds: f64,
    },
    /// Attempt aborted.
    Failed {
        /// Display form of the primary error.
        error_message: String,
    },
}

impl RecordPayload {
    /// Status this payload belongs to.
    pub fn status(&self) -> ProcessingStatus {
        match self {
            Self::Processing => ProcessingStatus::Processing,
            Self::Completed { .. } => ProcessingStatus::Completed,
            Self::Failed { .. } => ProcessingStatus::Failed,
        }
    }
}

/// One entry of the processing log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    /// Attempt identity.
    pub document_id: String,
    /// Sort key; see [`format_timestamp`].
    pub processing_timestamp: String,
    /// Original object key.
    pub document_key: String,
    /// Start timestamp of the attempt, set on terminal records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Status-specific fields.
    #[serde(flatten)]
    pub payload: RecordPayload,
    /// Expiry as epoch seconds.
    pub ttl: i64,
}

impl ProcessingRecord {
    /// Status carried by this record.
    pub fn status(&self) -> ProcessingStatus {
        self.payload.status()
    }

    /// Encode as a flat record store item.
    pub fn to_item(&self) -> Result<Item, PersistenceError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(item)) => Ok(item),
            Ok(other) => Err(PersistenceError::MalformedRecord(format!(
                "record encoded as non-object: {other}"
            ))),
            Err(error) => Err(PersistenceError::MalformedRecord(error.to_string())),
        }
    }

    /// Decode a record store item.
    pub fn from_item(item: Item) -> Result<Self, PersistenceError> {
        serde_json::from_value(Value::Object(item))
            .map_err(|error| PersistenceError::MalformedRecord(error.to_string()))
    }
}

/// Format `at` as `YYYY-MM-DDTHH:MM:SS.ffffffZ` in UTC.
///
/// Microsecond precision with a fixed width keeps string order equal to time order.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}Z",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.microsecond()
    )
}

/// Current time, or one microsecond past `previous` when the clock has not advanced.
///
/// Guarantees the terminal record of an attempt sorts strictly after its PROCESSING record.
pub fn timestamp_after(previous: OffsetDateTime) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.max(previous + Duration::microseconds(1))
}

/// Typed view over the record store table.
pub struct RecordLog {
    store: Arc<dyn RecordStore>,
    table: String,
    ttl_days: u64,
}

impl RecordLog {
    /// Log backed by `table` whose records expire after `ttl_days`.
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>, ttl_days: u64) -> Self {
        Self {
            store,
            table: table.into(),
            ttl_days,
        }
    }

    /// Build a record written at `at`.
    pub fn record(
        &self,
        document_id: &str,
        document_key: &str,
        at: OffsetDateTime,
        started_at: Option<OffsetDateTime>,
        payload: RecordPayload,
    ) -> ProcessingRecord {
        ProcessingRecord {
            document_id: document_id.to_string(),
            processing_timestamp: format_timestamp(at),
            document_key: document_key.to_string(),
            started_at: started_at.map(format_timestamp),
            payload,
            ttl: self.expiry(at),
        }
    }

    /// Epoch seconds after which a record written at `at` may be purged.
    pub fn expiry(&self, at: OffsetDateTime) -> i64 {
        let days = i64::try_from(self.ttl_days).unwrap_or(i64::MAX);
        at.unix_timestamp()
            .saturating_add(days.saturating_mul(SECONDS_PER_DAY))
    }

    /// Append `record`.
    pub async fn write(&self, record: &ProcessingRecord) -> Result<(), PersistenceError> {
        let item = record.to_item()?;
        self.store.put_item(&self.table, item).await?;
        tracing::debug!(
            document_id = %record.document_id,
            status = %record.status(),
            timestamp = %record.processing_timestamp,
            "Wrote processing record"
        );
        Ok(())
    }

    /// Most recent records with `status`, newest first.
    pub async fn by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        let items = self
            .store
            .query_by_status(&self.table, status.as_str(), limit)
            .await?;
        let mut records = items
            .into_iter()
            .map(ProcessingRecord::from_item)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| b.processing_timestamp.cmp(&a.processing_timestamp));
        records.truncate(limit);
        Ok(records)
    }

    /// Full lineage of one attempt, oldest first.
    pub async fn history(&self, document_id: &str) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        let items = self.store.query_by_document(&self.table, document_id).await?;
        let mut records = items
            .into_iter()
            .map(ProcessingRecord::from_item)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| a.processing_timestamp.cmp(&b.processing_timestamp));
        Ok(records)
    }
}
