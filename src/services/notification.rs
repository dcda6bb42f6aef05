//! Notification channel contract and HTTP adapter.

use crate::services::http::{HttpTransport, encode_path};
use crate::services::types::{PublishError, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

/// Fan-out channel for processing outcomes.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Publish `message` under `subject` to `topic`.
    async fn publish(&self, topic: &str, subject: &str, message: &str)
    -> Result<(), PublishError>;
}

/// HTTP adapter for a topic-based pub/sub service.
pub struct HttpNotificationChannel {
    transport: HttpTransport,
}

impl HttpNotificationChannel {
    /// Build an adapter rooted at `base_url`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(base_url, api_key, "rusty-doc/notifications")?;
        tracing::debug!(url = %transport.base_url, "Initialized notification client");
        Ok(Self { transport })
    }
}

#[async_trait]
impl NotificationChannel for HttpNotificationChannel {
    async fn publish(
        &self,
        topic: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), PublishError> {
        let path = format!("topics/{}/messages", encode_path(topic));
        self.transport
            .send(self.transport.request(Method::POST, &path).json(&json!({
                "Subject": subject,
                "Message": message,
            })))
            .await?;
        Ok(())
    }
}
