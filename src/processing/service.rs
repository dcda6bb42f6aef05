//! Pipeline orchestrator: extraction, summarization, persistence, and notification.

use crate::{
    context::ServiceContext,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        artifact::{SummaryArtifact, store_summary},
        event::{TriggerEvent, parse_trigger_events},
        extract::TextExtractor,
        notify::{NotificationMessage, NotificationStatus, Notifier},
        records::{
            ProcessingRecord, ProcessingStatus, RecordLog, RecordPayload, UNKNOWN,
            format_timestamp, timestamp_after,
        },
        summarize::Summarizer,
        types::{EmptyContentError, PersistenceError, PipelineError, ProcessingResult},
    },
    services::ObjectStore,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use uuid::Uuid;

/// Drives documents through the pipeline and owns the record log lifecycle.
///
/// Every attempt mints a fresh document id and writes a PROCESSING record before any work. It
/// then writes exactly one COMPLETED or FAILED record. Notifications and the FAILED-record write
/// are best-effort; the primary error always reaches the caller unchanged.
pub struct PipelineService {
    extractor: TextExtractor,
    summarizer: Summarizer,
    records: RecordLog,
    notifier: Notifier,
    object_store: Arc<dyn ObjectStore>,
    output_bucket: String,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, one-shot binary).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Process every document announced by a trigger payload, stopping at the first failure.
    async fn process_event(&self, payload: Value) -> Result<Vec<ProcessingResult>, PipelineError>;

    /// Most recent records with `status`, newest first.
    async fn records_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError>;

    /// Record lineage of one attempt, oldest first.
    async fn record_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Build the pipeline over the collaborators held by `context`.
    pub fn new(context: ServiceContext) -> Self {
        let ServiceContext {
            config,
            object_store,
            text_detection,
            generation,
            record_store,
            notifications,
        } = context;

        Self {
            extractor: TextExtractor::new(object_store.clone(), text_detection),
            summarizer: Summarizer::new(
                generation,
                config.generation_model_id,
                config.summary_max_input_chars,
                config.summary_max_tokens,
            ),
            records: RecordLog::new(record_store, config.metadata_table, config.record_ttl_days),
            notifier: Notifier::new(notifications, config.notification_topic),
            object_store,
            output_bucket: config.output_bucket,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Parse `payload` and process each announced document in order.
    ///
    /// A payload that identifies no document is itself a failed attempt: it is recorded under
    /// the `UNKNOWN` identity before the error is returned.
    pub async fn process_payload(
        &self,
        payload: &Value,
    ) -> Result<Vec<ProcessingResult>, PipelineError> {
        let events = match parse_trigger_events(payload) {
            Ok(events) => events,
            Err(error) => {
                let error = PipelineError::from(error);
                self.record_failure(UNKNOWN, UNKNOWN, None, &error).await;
                return Err(error);
            }
        };

        let mut results = Vec::with_capacity(events.len());
        for event in &events {
            results.push(self.process(event).await?);
        }
        Ok(results)
    }

    /// Run one document through the pipeline.
    pub async fn process(&self, event: &TriggerEvent) -> Result<ProcessingResult, PipelineError> {
        let document_id = Uuid::new_v4().to_string();
        let started = OffsetDateTime::now_utc();
        let clock = Instant::now();
        tracing::info!(
            document_id = %document_id,
            bucket = %event.bucket,
            key = %event.key,
            "Processing document"
        );

        let processing = self.records.record(
            &document_id,
            &event.key,
            started,
            None,
            RecordPayload::Processing,
        );
        if let Err(error) = self.records.write(&processing).await {
            // Without a PROCESSING record there is no lineage to terminate.
            let error = PipelineError::from(error);
            tracing::error!(
                document_id = %document_id,
                key = %event.key,
                error = %error,
                "Failed to write PROCESSING record"
            );
            self.metrics.record_failed();
            self.notify_failure(&document_id, &event.key, started, &error)
                .await;
            return Err(error);
        }

        match self.run(&document_id, event, started, clock).await {
            Ok(result) => Ok(result),
            Err(error) => {
                self.record_failure(&document_id, &event.key, Some(started), &error)
                    .await;
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        document_id: &str,
        event: &TriggerEvent,
        started: OffsetDateTime,
        clock: Instant,
    ) -> Result<ProcessingResult, PipelineError> {
        let text = self.extractor.extract(&event.bucket, &event.key).await?;
        if text.trim().is_empty() {
            return Err(EmptyContentError.into());
        }
        let text_length = text.chars().count();
        tracing::info!(document_id, chars = text_length, "Extracted text");

        let summary = self.summarizer.summarize(&text).await?;
        if summary.used_fallback {
            self.metrics.record_fallback_summary();
        }
        let summary_length = summary.text.chars().count();
        tracing::info!(
            document_id,
            chars = summary_length,
            fallback = summary.used_fallback,
            "Generated summary"
        );

        let generated_at = format_timestamp(OffsetDateTime::now_utc());
        let summary_key = store_summary(
            self.object_store.as_ref(),
            &self.output_bucket,
            &SummaryArtifact {
                document_key: &event.key,
                summary: &summary.text,
                text_length,
                generated_at: &generated_at,
            },
        )
        .await?;

        let elapsed = clock.elapsed();
        let finished = timestamp_after(started);
        let completed = self.records.record(
            document_id,
            &event.key,
            finished,
            Some(started),
            RecordPayload::Completed {
                summary_key: summary_key.clone(),
                text_length,
                summary_length,
                processing_duration_seconds: elapsed.as_secs_f64(),
            },
        );
        self.records.write(&completed).await?;
        self.metrics.record_completed(elapsed);
        tracing::info!(
            document_id,
            summary_key = %summary_key,
            duration_ms = elapsed.as_millis() as u64,
            "Stored processing metadata"
        );

        self.notifier
            .send_best_effort(&NotificationMessage {
                document_id: document_id.to_string(),
                document_key: event.key.clone(),
                status: NotificationStatus::Success,
                timestamp: format_timestamp(finished),
                summary_key: Some(summary_key.clone()),
                error_message: None,
            })
            .await;

        Ok(ProcessingResult {
            document_id: document_id.to_string(),
            document_key: event.key.clone(),
            summary_key,
            summary_length,
        })
    }

    /// Write the FAILED record and notify; both are logged on failure and never propagate.
    async fn record_failure(
        &self,
        document_id: &str,
        document_key: &str,
        started: Option<OffsetDateTime>,
        error: &PipelineError,
    ) {
        tracing::error!(
            document_id,
            key = document_key,
            error = %error,
            "Document processing failed"
        );
        self.metrics.record_failed();

        let failed_at = started.map_or_else(OffsetDateTime::now_utc, timestamp_after);
        let record = self.records.record(
            document_id,
            document_key,
            failed_at,
            started,
            RecordPayload::Failed {
                error_message: error.to_string(),
            },
        );
        if let Err(write_error) = self.records.write(&record).await {
            tracing::error!(
                document_id,
                error = %write_error,
                "Failed to write FAILED record"
            );
        }

        self.notify_failure(document_id, document_key, failed_at, error)
            .await;
    }

    async fn notify_failure(
        &self,
        document_id: &str,
        document_key: &str,
        at: OffsetDateTime,
        error: &PipelineError,
    ) {
        self.notifier
            .send_best_effort(&NotificationMessage {
                document_id: document_id.to_string(),
                document_key: document_key.to_string(),
                status: NotificationStatus::Failed,
                timestamp: format_timestamp(at),
                summary_key: None,
                error_message: Some(error.to_string()),
            })
            .await;
    }

    /// Most recent records with `status`, newest first.
    pub async fn records_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        self.records.by_status(status, limit).await
    }

    /// Record lineage of one attempt, oldest first.
    pub async fn record_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        self.records.history(document_id).await
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn process_event(&self, payload: Value) -> Result<Vec<ProcessingResult>, PipelineError> {
        PipelineService::process_payload(self, &payload).await
    }

    async fn records_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        PipelineService::records_by_status(self, status, limit).await
    }

    async fn record_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<ProcessingRecord>, PersistenceError> {
        PipelineService::record_history(self, document_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}
