use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Record expiry applied when `RECORD_TTL_DAYS` is unset.
pub const DEFAULT_RECORD_TTL_DAYS: u64 = 30;
/// Character budget applied to summarizer input when `SUMMARY_MAX_INPUT_CHARS` is unset.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;
/// Generation output ceiling applied when `SUMMARY_MAX_TOKENS` is unset.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the document processing pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bucket receiving summary artifacts.
    pub output_bucket: String,
    /// Table holding the processing record log.
    pub metadata_table: String,
    /// Topic that receives success and failure notifications.
    pub notification_topic: String,
    /// Model identifier passed to the text generation service.
    pub generation_model_id: String,
    /// Base URL of the object store.
    pub object_store_url: String,
    /// Base URL of the document text detection service.
    pub text_detection_url: String,
    /// Base URL of the text generation service.
    pub generation_url: String,
    /// Base URL of the structured record store.
    pub record_store_url: String,
    /// Base URL of the notification channel.
    pub notification_url: String,
    /// Optional bearer credential forwarded to every collaborator.
    pub service_api_key: Option<String>,
    /// Days after which processing records may be purged.
    pub record_ttl_days: u64,
    /// Maximum characters handed to the generator before truncation.
    pub summary_max_input_chars: usize,
    /// Output-length ceiling requested from the generator.
    pub summary_max_tokens: u32,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            output_bucket: load_env("OUTPUT_BUCKET")?,
            metadata_table: load_env("METADATA_TABLE")?,
            notification_topic: load_env("NOTIFICATION_TOPIC")?,
            generation_model_id: load_env("GENERATION_MODEL_ID")?,
            object_store_url: load_env("OBJECT_STORE_URL")?,
            text_detection_url: load_env("TEXT_DETECTION_URL")?,
            generation_url: load_env("GENERATION_URL")?,
            record_store_url: load_env("RECORD_STORE_URL")?,
            notification_url: load_env("NOTIFICATION_URL")?,
            service_api_key: load_env_optional("SERVICE_API_KEY"),
            record_ttl_days: parse_optional("RECORD_TTL_DAYS")?.unwrap_or(DEFAULT_RECORD_TTL_DAYS),
            summary_max_input_chars: parse_optional("SUMMARY_MAX_INPUT_CHARS")?
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_MAX_INPUT_CHARS),
            summary_max_tokens: parse_optional("SUMMARY_MAX_TOKENS")?
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Copy `.env` (when present) into the process environment. Variables already set are kept.
///
/// Binaries call this before installing tracing so `RUST_LOG` and `RUSTY_DOC_LOG_FILE` from the
/// file are honored.
pub fn load_env_file() {
    dotenvy::dotenv().ok();
}

/// Load `.env` (when present) and build the configuration from the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_env_file();
    let config = Config::from_env()?;
    tracing::debug!(
        output_bucket = %config.output_bucket,
        metadata_table = %config.metadata_table,
        model = %config.generation_model_id,
        record_ttl_days = config.record_ttl_days,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}
