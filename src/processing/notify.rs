//! Outcome notifications.

use crate::processing::types::NotificationError;
use crate::services::NotificationChannel;
use serde::Serialize;
use std::sync::Arc;

/// Outcome reported in a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Summary stored.
    Success,
    /// Attempt failed.
    Failed,
}

impl NotificationStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// Ephemeral message describing one processing outcome.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    /// Attempt identity.
    pub document_id: String,
    /// Original object key.
    pub document_key: String,
    /// Outcome.
    pub status: NotificationStatus,
    /// Time the outcome was reached.
    pub timestamp: String,
    /// Artifact key, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_key: Option<String>,
    /// Display form of the primary error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl NotificationMessage {
    /// Subject line for the channel.
    pub fn subject(&self) -> String {
        format!(
            "Document Processing {}: {}",
            self.status.as_str(),
            self.document_key
        )
    }
}

/// Publishes outcome messages to a fixed topic.
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
    topic: String,
}

impl Notifier {
    /// Notifier publishing to `topic`.
    pub fn new(channel: Arc<dyn NotificationChannel>, topic: impl Into<String>) -> Self {
        Self {
            channel,
            topic: topic.into(),
        }
    }

    /// Publish `message` as pretty-printed JSON.
    pub async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError> {
        let body = serde_json::to_string_pretty(message)?;
        self.channel
            .publish(&self.topic, &message.subject(), &body)
            .await?;
        tracing::info!(
            document_id = %message.document_id,
            status = message.status.as_str(),
            "Notification sent"
        );
        Ok(())
    }

    /// Publish `message`, logging and discarding any failure.
    pub async fn send_best_effort(&self, message: &NotificationMessage) {
        if let Err(error) = self.send(message).await {
            tracing::error!(
                document_id = %message.document_id,
                status = message.status.as_str(),
                error = %error,
                "Failed to send notification"
            );
        }
    }
}
