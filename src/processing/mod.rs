//! Document pipeline: extraction, sanitization, summarization, and the processing record log.

pub mod artifact;
pub mod event;
pub mod extract;
pub mod notify;
pub mod records;
pub mod sanitize;
mod service;
pub mod summarize;
pub mod types;

pub use event::{EventError, TriggerEvent, parse_trigger_events};
pub use records::{ProcessingRecord, ProcessingStatus, RecordPayload};
pub use service::{PipelineApi, PipelineService};
pub use types::{
    EmptyContentError, ExtractionError, GenerationError, NotificationError, PersistenceError,
    PipelineError, ProcessingResult,
};
