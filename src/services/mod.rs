//! External collaborators: object store, text detection, text generation, record store, and
//! notification channel, each as an async trait with an HTTP adapter.

pub mod generation;
pub(crate) mod http;
pub mod notification;
pub mod object_store;
pub mod record_store;
pub mod text_detection;
pub mod types;

pub use generation::{ChatMessage, ChatRequest, ChatResponse, GenerationClient, HttpGenerationClient};
pub use notification::{HttpNotificationChannel, NotificationChannel};
pub use object_store::{HttpObjectStore, ObjectStore};
pub use record_store::{HttpRecordStore, Item, RecordStore};
pub use text_detection::{HttpTextDetection, TextDetection};
pub use types::{
    BlockType, GenerationClientError, ObjectStoreError, PublishError, PutObjectRequest,
    RecordStoreError, TextBlock, TextDetectionError, TransportError,
};
