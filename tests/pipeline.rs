use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustydoc::config::Config;
use rustydoc::context::ServiceContext;
use rustydoc::processing::summarize::FALLBACK_SUMMARY;
use rustydoc::processing::{
    PipelineError, PipelineService, ProcessingStatus, TriggerEvent,
};
use rustydoc::services::generation::{ChatChoice, ChoiceMessage};
use rustydoc::services::{
    ChatRequest, ChatResponse, GenerationClient, GenerationClientError, Item,
    NotificationChannel, ObjectStore, ObjectStoreError, PublishError, PutObjectRequest,
    RecordStore, RecordStoreError, TextBlock, TextDetection, TextDetectionError, TransportError,
};
use serde_json::{Value, json};

#[derive(Default)]
struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    puts: Mutex<Vec<PutObjectRequest>>,
}

impl MemoryObjectStore {
    fn with(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.into(), key.into()), body.to_vec());
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.into(),
                key: key.into(),
            })
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<(), ObjectStoreError> {
        self.puts.lock().unwrap().push(request);
        Ok(())
    }
}

/// Detection that knows nothing but the unsupported-format condition, or fixed lines.
enum Detection {
    Unsupported,
    Lines(Vec<&'static str>),
}

#[async_trait]
impl TextDetection for Detection {
    async fn detect_text(
        &self,
        _bucket: &str,
        _key: &str,
    ) -> Result<Vec<TextBlock>, TextDetectionError> {
        match self {
            Self::Unsupported => Err(TextDetectionError::UnsupportedFormat(
                "Request has unsupported document format".into(),
            )),
            Self::Lines(lines) => Ok(lines.iter().copied().map(TextBlock::line).collect()),
        }
    }
}

enum Reply {
    Text(&'static str),
    Unavailable,
}

struct StubGenerator {
    reply: Reply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl StubGenerator {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn document_sent(&self, call: usize) -> String {
        let requests = self.requests.lock().unwrap();
        let (_, body) = requests[call].messages[1]
            .content
            .split_once("Document content:\n")
            .expect("document section");
        body.trim_end_matches('\n').to_string()
    }
}

#[async_trait]
impl GenerationClient for StubGenerator {
    async fn invoke(
        &self,
        _model_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, GenerationClientError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.reply {
            Reply::Text(text) => Ok(ChatResponse {
                choices: vec![ChatChoice {
                    message: ChoiceMessage {
                        content: Some(text.to_string()),
                    },
                }],
            }),
            Reply::Unavailable => Err(GenerationClientError::InvalidResponse(
                "model is unavailable".into(),
            )),
        }
    }
}

#[derive(Default)]
struct MemoryRecordStore {
    items: Mutex<Vec<Item>>,
    reject_status: Option<&'static str>,
}

impl MemoryRecordStore {
    fn rejecting(status: &'static str) -> Self {
        Self {
            reject_status: Some(status),
            ..Default::default()
        }
    }

    fn items(&self) -> Vec<Item> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put_item(&self, _table: &str, item: Item) -> Result<(), RecordStoreError> {
        if self
            .reject_status
            .is_some_and(|status| item["processing_status"] == status)
        {
            return Err(RecordStoreError::InvalidResponse("table unavailable".into()));
        }
        self.items.lock().unwrap().push(item);
        Ok(())
    }

    async fn query_by_status(
        &self,
        _table: &str,
        status: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RecordStoreError> {
        let mut items: Vec<Item> = self
            .items()
            .into_iter()
            .filter(|item| item["processing_status"] == status)
            .collect();
        items.reverse();
        items.truncate(limit);
        Ok(items)
    }

    async fn query_by_document(
        &self,
        _table: &str,
        document_id: &str,
    ) -> Result<Vec<Item>, RecordStoreError> {
        Ok(self
            .items()
            .into_iter()
            .filter(|item| item["document_id"] == document_id)
            .collect())
    }
}

#[derive(Default)]
struct CapturingChannel {
    published: Mutex<Vec<(String, String, Value)>>,
    fail: bool,
}

#[async_trait]
impl NotificationChannel for CapturingChannel {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport(TransportError::InvalidUrl(
                "topic endpoint unreachable".into(),
            )));
        }
        let body = serde_json::from_str(message).expect("notification body is JSON");
        self.published
            .lock()
            .unwrap()
            .push((topic.into(), subject.into(), body));
        Ok(())
    }
}

fn config() -> Config {
    Config {
        output_bucket: "doc-summaries".into(),
        metadata_table: "doc-records".into(),
        notification_topic: "doc-events".into(),
        generation_model_id: "summary-model".into(),
        object_store_url: "http://127.0.0.1:9000".into(),
        text_detection_url: "http://127.0.0.1:9001".into(),
        generation_url: "http://127.0.0.1:9002".into(),
        record_store_url: "http://127.0.0.1:9003".into(),
        notification_url: "http://127.0.0.1:9004".into(),
        service_api_key: None,
        record_ttl_days: 30,
        summary_max_input_chars: 10_000,
        summary_max_tokens: 800,
        server_port: None,
    }
}

struct Harness {
    service: PipelineService,
    store: Arc<MemoryObjectStore>,
    generator: Arc<StubGenerator>,
    records: Arc<MemoryRecordStore>,
    channel: Arc<CapturingChannel>,
}

fn harness(
    store: MemoryObjectStore,
    detection: Detection,
    generator: Arc<StubGenerator>,
    records: MemoryRecordStore,
    channel: CapturingChannel,
) -> Harness {
    let store = Arc::new(store);
    let records = Arc::new(records);
    let channel = Arc::new(channel);
    let context = ServiceContext {
        config: config(),
        object_store: store.clone(),
        text_detection: Arc::new(detection),
        generation: generator.clone(),
        record_store: records.clone(),
        notifications: channel.clone(),
    };
    Harness {
        service: PipelineService::new(context),
        store,
        generator,
        records,
        channel,
    }
}

fn event(key: &str) -> TriggerEvent {
    TriggerEvent {
        bucket: "uploads".into(),
        key: key.into(),
    }
}

fn statuses(items: &[Item]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item["processing_status"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn plain_text_document_is_summarized_and_recorded() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "notes.txt", b"Meeting at 3pm.\nBudget: $500."),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. A meeting is set for 3pm.\n2. The budget is $500.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let result = h.service.process(&event("notes.txt")).await.unwrap();

    assert_eq!(result.document_key, "notes.txt");
    assert_eq!(result.summary_key, "summaries/notes.txt.summary.txt");
    assert_eq!(
        result.summary_length,
        "1. A meeting is set for 3pm.\n2. The budget is $500.".chars().count()
    );
    assert_eq!(h.generator.document_sent(0), "Meeting at 3pm.\nBudget: $500.");

    let puts = h.store.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].bucket, "doc-summaries");
    assert_eq!(puts[0].key, "summaries/notes.txt.summary.txt");
    assert_eq!(puts[0].metadata["original-document"], "notes.txt");
    assert_eq!(puts[0].metadata["text-length"], "29");

    let items = h.records.items();
    assert_eq!(statuses(&items), vec!["PROCESSING", "COMPLETED"]);
    assert!(items.iter().all(|item| item["document_id"] == result.document_id.as_str()));
    let completed = &items[1];
    assert_eq!(completed["summary_key"], "summaries/notes.txt.summary.txt");
    assert_eq!(completed["text_length"], 29);
    assert_eq!(completed["started_at"], items[0]["processing_timestamp"]);
    assert!(completed["processing_duration_seconds"].as_f64().unwrap() >= 0.0);
    assert!(
        completed["processing_timestamp"].as_str().unwrap()
            > items[0]["processing_timestamp"].as_str().unwrap()
    );

    let published = h.channel.published.lock().unwrap();
    let (topic, subject, body) = &published[0];
    assert_eq!(topic, "doc-events");
    assert_eq!(subject, "Document Processing SUCCESS: notes.txt");
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["document_id"], result.document_id.as_str());

    let snapshot = h.service.metrics_snapshot();
    assert_eq!(snapshot.documents_completed, 1);
    assert_eq!(snapshot.documents_failed, 0);
}

#[tokio::test]
async fn unsupported_pdf_falls_back_to_sanitized_bytes() {
    let h = harness(
        MemoryObjectStore::default().with(
            "uploads",
            "report.pdf",
            b"%PDF-1.4\n1 0 obj\nHello World\nendobj\n%%EOF",
        ),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. A greeting.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let result = h.service.process(&event("report.pdf")).await.unwrap();

    assert_eq!(h.generator.document_sent(0), "Hello World");
    assert_eq!(result.summary_key, "summaries/report.pdf.summary.txt");
}

#[tokio::test]
async fn unsupported_pdf_with_carriage_return_endings_still_recovers_text() {
    let h = harness(
        MemoryObjectStore::default().with(
            "uploads",
            "scan.pdf",
            b"%PDF-1.4\r1 0 obj\rHello World\rendobj\r%%EOF",
        ),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. A greeting.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let result = h.service.process(&event("scan.pdf")).await.unwrap();

    assert_eq!(h.generator.document_sent(0), "Hello World");
    assert_eq!(result.summary_key, "summaries/scan.pdf.summary.txt");
}

#[tokio::test]
async fn detected_lines_feed_the_summarizer() {
    let h = harness(
        MemoryObjectStore::default(),
        Detection::Lines(vec!["Invoice 42", "Due 2025-01-31"]),
        StubGenerator::new(Reply::Text("1. Invoice 42 is due on 2025-01-31.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let result = h.service.process(&event("invoice/jan.pdf")).await.unwrap();

    assert_eq!(h.generator.document_sent(0), "Invoice 42\nDue 2025-01-31");
    assert_eq!(result.summary_key, "summaries/invoice/jan.pdf.summary.txt");
}

#[tokio::test]
async fn whitespace_document_fails_without_calling_the_generator() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "blank.txt", b"  \n\t \n"),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("unused")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let error = h.service.process(&event("blank.txt")).await.unwrap_err();

    assert!(matches!(error, PipelineError::EmptyContent(_)));
    assert_eq!(h.generator.calls(), 0);
    assert!(h.store.puts.lock().unwrap().is_empty());

    let items = h.records.items();
    assert_eq!(statuses(&items), vec!["PROCESSING", "FAILED"]);
    assert_eq!(items[0]["document_id"], items[1]["document_id"]);
    assert_eq!(
        items[1]["error_message"],
        "No text could be extracted from the document."
    );

    let published = h.channel.published.lock().unwrap();
    assert_eq!(published[0].1, "Document Processing FAILED: blank.txt");
    assert_eq!(
        published[0].2["error_message"],
        "No text could be extracted from the document."
    );
    assert_eq!(h.service.metrics_snapshot().documents_failed, 1);
}

#[tokio::test]
async fn banned_phrase_is_replaced_with_canned_summary() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "scan.txt", b"\xff\xfe garbled"),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text(
            "This document appears to be corrupted and contains unreadable data.",
        )),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let result = h.service.process(&event("scan.txt")).await.unwrap();

    assert_eq!(result.summary_length, FALLBACK_SUMMARY.chars().count());
    let puts = h.store.puts.lock().unwrap();
    assert_eq!(puts[0].body, FALLBACK_SUMMARY.as_bytes());
    assert_eq!(h.service.metrics_snapshot().fallback_summaries, 1);
}

#[tokio::test]
async fn long_document_is_truncated_before_generation() {
    let body = "x".repeat(10_500);
    let h = harness(
        MemoryObjectStore::default().with("uploads", "long.txt", body.as_bytes()),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. Many x characters.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    h.service.process(&event("long.txt")).await.unwrap();

    assert_eq!(h.generator.document_sent(0), format!("{}...", "x".repeat(10_000)));
    let items = h.records.items();
    assert_eq!(items[1]["text_length"], 10_500);
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_attempt() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "notes.txt", b"Meeting at 3pm."),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. Meeting at 3pm.")),
        MemoryRecordStore::default(),
        CapturingChannel {
            fail: true,
            ..Default::default()
        },
    );

    let result = h.service.process(&event("notes.txt")).await;

    assert!(result.is_ok());
    assert_eq!(statuses(&h.records.items()), vec!["PROCESSING", "COMPLETED"]);
}

#[tokio::test]
async fn generation_failure_is_reraised_after_failed_record() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "notes.txt", b"Meeting at 3pm."),
        Detection::Unsupported,
        StubGenerator::new(Reply::Unavailable),
        MemoryRecordStore::default(),
        CapturingChannel {
            fail: true,
            ..Default::default()
        },
    );

    let error = h.service.process(&event("notes.txt")).await.unwrap_err();

    assert!(matches!(error, PipelineError::Generation(_)));
    let items = h.records.items();
    assert_eq!(statuses(&items), vec!["PROCESSING", "FAILED"]);
    assert_eq!(items[1]["error_message"], error.to_string().as_str());
}

#[tokio::test]
async fn failed_record_write_never_masks_the_original_error() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "blank.md", b"   "),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("unused")),
        MemoryRecordStore::rejecting("FAILED"),
        CapturingChannel::default(),
    );

    let error = h.service.process(&event("blank.md")).await.unwrap_err();

    assert!(matches!(error, PipelineError::EmptyContent(_)));
    assert_eq!(statuses(&h.records.items()), vec!["PROCESSING"]);
    assert_eq!(h.channel.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn processing_record_failure_aborts_before_any_work() {
    let h = harness(
        MemoryObjectStore::default().with("uploads", "notes.txt", b"Meeting at 3pm."),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("unused")),
        MemoryRecordStore::rejecting("PROCESSING"),
        CapturingChannel::default(),
    );

    let error = h.service.process(&event("notes.txt")).await.unwrap_err();

    assert!(matches!(error, PipelineError::Persistence(_)));
    assert!(h.records.items().is_empty());
    assert_eq!(h.generator.calls(), 0);
    let published = h.channel.published.lock().unwrap();
    assert_eq!(published[0].2["status"], "FAILED");
}

#[tokio::test]
async fn missing_plain_text_object_is_an_extraction_failure() {
    let h = harness(
        MemoryObjectStore::default(),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("unused")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let error = h.service.process(&event("gone.txt")).await.unwrap_err();

    assert!(matches!(error, PipelineError::Extraction(_)));
    assert_eq!(statuses(&h.records.items()), vec!["PROCESSING", "FAILED"]);
}

#[tokio::test]
async fn notification_payload_processes_every_record_in_order() {
    let h = harness(
        MemoryObjectStore::default()
            .with("uploads", "Q1 report.txt", b"Revenue grew.")
            .with("uploads", "notes.txt", b"Meeting at 3pm."),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. Summary.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );
    let payload = json!({
        "Records": [
            { "s3": { "bucket": { "name": "uploads" }, "object": { "key": "Q1+report.txt" } } },
            { "s3": { "bucket": { "name": "uploads" }, "object": { "key": "notes.txt" } } }
        ]
    });

    let results = h.service.process_payload(&payload).await.unwrap();

    let keys: Vec<_> = results.iter().map(|r| r.document_key.as_str()).collect();
    assert_eq!(keys, vec!["Q1 report.txt", "notes.txt"]);
    assert_ne!(results[0].document_id, results[1].document_id);
    assert_eq!(h.generator.document_sent(0), "Revenue grew.");
    assert_eq!(h.generator.document_sent(1), "Meeting at 3pm.");
}

#[tokio::test]
async fn unparseable_payload_is_recorded_as_unknown() {
    let h = harness(
        MemoryObjectStore::default(),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("unused")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let error = h
        .service
        .process_payload(&json!({ "unexpected": true }))
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::InvalidEvent(_)));
    let items = h.records.items();
    assert_eq!(statuses(&items), vec!["FAILED"]);
    assert_eq!(items[0]["document_id"], "UNKNOWN");
    assert_eq!(items[0]["document_key"], "UNKNOWN");
    assert_eq!(
        h.channel.published.lock().unwrap()[0].1,
        "Document Processing FAILED: UNKNOWN"
    );
}

#[tokio::test]
async fn record_history_and_status_lookup_reflect_the_log() {
    let h = harness(
        MemoryObjectStore::default()
            .with("uploads", "a.txt", b"Alpha.")
            .with("uploads", "b.txt", b" "),
        Detection::Unsupported,
        StubGenerator::new(Reply::Text("1. Alpha.")),
        MemoryRecordStore::default(),
        CapturingChannel::default(),
    );

    let ok = h.service.process(&event("a.txt")).await.unwrap();
    h.service.process(&event("b.txt")).await.unwrap_err();

    let history = h.service.record_history(&ok.document_id).await.unwrap();
    let lineage: Vec<_> = history.iter().map(|record| record.status()).collect();
    assert_eq!(
        lineage,
        vec![ProcessingStatus::Processing, ProcessingStatus::Completed]
    );

    let failed = h
        .service
        .records_by_status(ProcessingStatus::Failed, 10)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].document_key, "b.txt");
}
