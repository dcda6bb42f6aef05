//! HTTP surface through which the invoking environment delivers trigger events.
//!
//! - `POST /events` – Process a direct `{ "bucket", "key" }` event or an object-store
//!   notification (`Records`). Every announced document is processed in order; the response is
//!   the list of results, or `{ "error": message }` with `500` on the first failure so the
//!   caller's retry policy engages. Payloads that identify no document return `400`.
//! - `GET /records?status=FAILED&limit=N` – Recent records with a status, newest first.
//! - `GET /records/:document_id` – Record lineage of one attempt, oldest first.
//! - `GET /metrics` – Pipeline counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::metrics::MetricsSnapshot;
use crate::processing::{
    PersistenceError, PipelineApi, PipelineError, ProcessingRecord, ProcessingResult,
    ProcessingStatus,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Record listing size when `limit` is omitted.
pub const DEFAULT_RECORD_LIMIT: usize = 50;
/// Upper bound applied to `limit`.
pub const MAX_RECORD_LIMIT: usize = 500;

/// Build the HTTP router exposing the pipeline surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/events", post(process_event::<S>))
        .route("/records", get(list_records::<S>))
        .route("/records/:document_id", get(record_history::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Response body for `POST /events`.
#[derive(Serialize)]
struct EventResponse {
    results: Vec<ProcessingResult>,
}

/// Process every document announced by the trigger payload.
async fn process_event<S>(
    State(service): State<Arc<S>>,
    Json(payload): Json<Value>,
) -> Result<Json<EventResponse>, AppError>
where
    S: PipelineApi,
{
    let results = service.process_event(payload).await?;
    tracing::info!(documents = results.len(), "Event processed");
    Ok(Json(EventResponse { results }))
}

/// Query string for `GET /records`.
#[derive(Deserialize)]
struct RecordsQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Response body for record listings.
#[derive(Serialize)]
struct RecordsResponse {
    records: Vec<ProcessingRecord>,
}

/// List recent records with the requested status.
async fn list_records<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, AppError>
where
    S: PipelineApi,
{
    let status = query
        .status
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("status query parameter is required".into()))?
        .parse::<ProcessingStatus>()
        .map_err(|error| AppError::BadRequest(error.to_string()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECORD_LIMIT)
        .clamp(1, MAX_RECORD_LIMIT);
    let records = service.records_by_status(status, limit).await?;
    Ok(Json(RecordsResponse { records }))
}

/// Return the record lineage of one attempt.
async fn record_history<S>(
    State(service): State<Arc<S>>,
    Path(document_id): Path<String>,
) -> Result<Json<RecordsResponse>, AppError>
where
    S: PipelineApi,
{
    let records = service.record_history(&document_id).await?;
    if records.is_empty() {
        return Err(AppError::NotFound(format!(
            "No processing records for document {document_id}"
        )));
    }
    Ok(Json(RecordsResponse { records }))
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "process_event",
                method: "POST",
                path: "/events",
                description: "Extract, summarize, and record each uploaded document announced by the event. Response returns { \"results\": [{ document_id, document_key, summary_key, summary_length }] }.",
                request_example: Some(json!({
                    "bucket": "uploads",
                    "key": "invoice/jan.pdf"
                })),
            },
            CommandDescriptor {
                name: "list_records",
                method: "GET",
                path: "/records?status=FAILED&limit=50",
                description: "Return the most recent processing records with a status (PROCESSING, COMPLETED, FAILED), newest first.",
                request_example: None,
            },
            CommandDescriptor {
                name: "record_history",
                method: "GET",
                path: "/records/{document_id}",
                description: "Return every record written for one processing attempt, oldest first.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Pipeline(PipelineError),
    Persistence(PersistenceError),
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Pipeline(error @ PipelineError::InvalidEvent(_)) => {
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Self::Pipeline(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            Self::Persistence(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<PersistenceError> for AppError {
    fn from(inner: PersistenceError) -> Self {
        Self::Persistence(inner)
    }
}
