//! Structured record store contract and HTTP adapter.
//!
//! Items are flat JSON objects keyed by `(document_id, processing_timestamp)`. The store keeps a
//! secondary index on `(processing_status, processing_timestamp)` and purges items whose `ttl`
//! attribute (epoch seconds) has passed.

use crate::services::http::{HttpTransport, encode_path};
use crate::services::types::{RecordStoreError, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Name of the secondary index used for status lookups.
pub const STATUS_INDEX: &str = "ProcessingStatusIndex";

/// Raw record store item.
pub type Item = Map<String, Value>;

/// Append-only table of processing records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write one item.
    async fn put_item(&self, table: &str, item: Item) -> Result<(), RecordStoreError>;

    /// Items with the given status, newest first.
    async fn query_by_status(
        &self,
        table: &str,
        status: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RecordStoreError>;

    /// Every item sharing `document_id`, oldest first.
    async fn query_by_document(
        &self,
        table: &str,
        document_id: &str,
    ) -> Result<Vec<Item>, RecordStoreError>;
}

/// HTTP adapter for a table service.
pub struct HttpRecordStore {
    transport: HttpTransport,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(rename = "Items", default)]
    items: Vec<Item>,
}

impl HttpRecordStore {
    /// Build an adapter rooted at `base_url`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(base_url, api_key, "rusty-doc/records")?;
        tracing::debug!(url = %transport.base_url, "Initialized record store client");
        Ok(Self { transport })
    }

    async fn query(
        &self,
        path: String,
        params: &[(&str, String)],
    ) -> Result<Vec<Item>, RecordStoreError> {
        let response = self
            .transport
            .send(self.transport.request(Method::GET, &path).query(params))
            .await?;
        let payload: QueryResponse = response
            .json()
            .await
            .map_err(|error| RecordStoreError::InvalidResponse(error.to_string()))?;
        Ok(payload.items)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), RecordStoreError> {
        let path = format!("tables/{}/items", encode_path(table));
        self.transport
            .send(
                self.transport
                    .request(Method::PUT, &path)
                    .json(&json!({ "Item": item })),
            )
            .await?;
        Ok(())
    }

    async fn query_by_status(
        &self,
        table: &str,
        status: &str,
        limit: usize,
    ) -> Result<Vec<Item>, RecordStoreError> {
        let path = format!(
            "tables/{}/indexes/{STATUS_INDEX}/items",
            encode_path(table)
        );
        self.query(
            path,
            &[
                ("processing_status", status.to_string()),
                ("limit", limit.to_string()),
                ("descending", "true".to_string()),
            ],
        )
        .await
    }

    async fn query_by_document(
        &self,
        table: &str,
        document_id: &str,
    ) -> Result<Vec<Item>, RecordStoreError> {
        let path = format!("tables/{}/items", encode_path(table));
        self.query(path, &[("document_id", document_id.to_string())])
            .await
    }
}
