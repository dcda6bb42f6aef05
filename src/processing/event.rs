//! Trigger event parsing.
//!
//! Accepts either a direct `{ "bucket", "key" }` event or an object-store notification with a
//! `Records` array. Notification keys arrive form-URL-encoded (`+` for spaces) and are decoded
//! here; direct events are taken verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while interpreting a trigger payload.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload matched neither accepted shape.
    #[error("Malformed trigger event: {0}")]
    Malformed(String),
    /// A notification arrived with an empty `Records` array.
    #[error("Trigger event contains no records")]
    Empty,
}

/// Location of a newly stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Bucket holding the upload.
    pub bucket: String,
    /// Decoded object key.
    pub key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventPayload {
    Notification {
        #[serde(rename = "Records")]
        records: Vec<NotificationRecord>,
    },
    Direct(TriggerEvent),
}

#[derive(Deserialize)]
struct NotificationRecord {
    s3: StorageEntity,
}

#[derive(Deserialize)]
struct StorageEntity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Deserialize)]
struct ObjectEntity {
    key: String,
}

/// Parse a trigger payload into the documents it announces, in delivery order.
pub fn parse_trigger_events(payload: &Value) -> Result<Vec<TriggerEvent>, EventError> {
    let parsed: EventPayload = serde_json::from_value(payload.clone()).map_err(|_| {
        EventError::Malformed(
            "expected { bucket, key } or an object-store notification with Records".into(),
        )
    })?;

    let events = match parsed {
        EventPayload::Direct(event) => vec![event],
        EventPayload::Notification { records } => records
            .into_iter()
            .map(|record| TriggerEvent {
                bucket: record.s3.bucket.name,
                key: decode_object_key(&record.s3.object.key),
            })
            .collect(),
    };

    if events.is_empty() {
        return Err(EventError::Empty);
    }
    if let Some(event) = events
        .iter()
        .find(|event| event.bucket.trim().is_empty() || event.key.trim().is_empty())
    {
        return Err(EventError::Malformed(format!(
            "bucket and key must be non-empty (bucket: {:?}, key: {:?})",
            event.bucket, event.key
        )));
    }
    Ok(events)
}

/// Decode a form-URL-encoded object key (`+` is a space, `%XX` a byte).
///
/// Escapes that do not form valid UTF-8 become U+FFFD; the record is still processed.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
