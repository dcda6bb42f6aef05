//! Process-wide collaborator handles.
//!
//! Built once at startup and handed to the pipeline explicitly. Tests construct it from
//! in-memory fakes through the public fields.

use crate::config::Config;
use crate::services::{
    GenerationClient, HttpGenerationClient, HttpNotificationChannel, HttpObjectStore,
    HttpRecordStore, HttpTextDetection, NotificationChannel, ObjectStore, RecordStore,
    TextDetection, TransportError,
};
use std::sync::Arc;

/// Configuration plus one shared handle per external collaborator.
#[derive(Clone)]
pub struct ServiceContext {
    /// Effective configuration.
    pub config: Config,
    /// Source documents and summary artifacts.
    pub object_store: Arc<dyn ObjectStore>,
    /// Document text detection.
    pub text_detection: Arc<dyn TextDetection>,
    /// Summary generation.
    pub generation: Arc<dyn GenerationClient>,
    /// Processing record log.
    pub record_store: Arc<dyn RecordStore>,
    /// Outcome fan-out.
    pub notifications: Arc<dyn NotificationChannel>,
}

impl ServiceContext {
    /// Wire the HTTP adapters described by `config`.
    pub fn from_config(config: Config) -> Result<Self, TransportError> {
        let api_key = config.service_api_key.clone();
        let object_store = HttpObjectStore::new(&config.object_store_url, api_key.clone())?;
        let text_detection = HttpTextDetection::new(&config.text_detection_url, api_key.clone())?;
        let generation = HttpGenerationClient::new(&config.generation_url, api_key.clone())?;
        let record_store = HttpRecordStore::new(&config.record_store_url, api_key.clone())?;
        let notifications = HttpNotificationChannel::new(&config.notification_url, api_key)?;
        tracing::info!(
            output_bucket = %config.output_bucket,
            table = %config.metadata_table,
            topic = %config.notification_topic,
            model = %config.generation_model_id,
            "Service context initialized"
        );

        Ok(Self {
            config,
            object_store: Arc::new(object_store),
            text_detection: Arc::new(text_detection),
            generation: Arc::new(generation),
            record_store: Arc::new(record_store),
            notifications: Arc::new(notifications),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_RECORD_TTL_DAYS};

    fn config(object_store_url: &str) -> Config {
        Config {
            output_bucket: "summaries".into(),
            metadata_table: "records".into(),
            notification_topic: "events".into(),
            generation_model_id: "model".into(),
            object_store_url: object_store_url.into(),
            text_detection_url: "http://127.0.0.1:9001".into(),
            generation_url: "http://127.0.0.1:9002".into(),
            record_store_url: "http://127.0.0.1:9003".into(),
            notification_url: "http://127.0.0.1:9004".into(),
            service_api_key: None,
            record_ttl_days: DEFAULT_RECORD_TTL_DAYS,
            summary_max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            summary_max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            server_port: None,
        }
    }

    #[test]
    fn builds_from_valid_urls() {
        let context = ServiceContext::from_config(config("http://127.0.0.1:9000")).unwrap();
        assert_eq!(context.config.output_bucket, "summaries");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            ServiceContext::from_config(config("not a url")),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
