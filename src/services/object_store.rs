//! Object store contract and its path-style HTTP adapter.
//!
//! Objects live at `{base}/{bucket}/{key}`. User metadata travels as `x-amz-meta-*` headers,
//! which keeps the adapter usable against S3-compatible gateways.

use crate::services::http::{HttpTransport, encode_path};
use crate::services::types::{ObjectStoreError, PutObjectRequest, TransportError};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, header::CONTENT_TYPE};

const METADATA_HEADER_PREFIX: &str = "x-amz-meta-";

/// Blob storage holding uploaded documents and generated artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full body of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Create or overwrite an object.
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), ObjectStoreError>;
}

/// HTTP adapter for an S3-compatible object store.
pub struct HttpObjectStore {
    transport: HttpTransport,
}

impl HttpObjectStore {
    /// Build an adapter rooted at `base_url`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(base_url, api_key, "rusty-doc/object-store")?;
        tracing::debug!(url = %transport.base_url, "Initialized object store client");
        Ok(Self { transport })
    }

    fn object_path(bucket: &str, key: &str) -> String {
        format!("{}/{}", encode_path(bucket), encode_path(key))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self
            .transport
            .request(Method::GET, &Self::object_path(bucket, key))
            .send()
            .await
            .map_err(TransportError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let response = crate::services::http::ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(TransportError::from)?;
        tracing::debug!(bucket, key, bytes = bytes.len(), "Object fetched");
        Ok(bytes.to_vec())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<(), ObjectStoreError> {
        let PutObjectRequest {
            bucket,
            key,
            body,
            content_type,
            metadata,
        } = request;

        let mut builder = self
            .transport
            .request(Method::PUT, &Self::object_path(&bucket, &key))
            .header(CONTENT_TYPE, content_type);
        for (name, value) in &metadata {
            // Header values must be visible ASCII; keys with accents are percent-encoded.
            builder = builder.header(
                format!("{METADATA_HEADER_PREFIX}{name}"),
                urlencoding::encode(value).into_owned(),
            );
        }

        let size = body.len();
        self.transport.send(builder.body(body)).await?;
        tracing::debug!(bucket = %bucket, key = %key, bytes = size, "Object stored");
        Ok(())
    }
}
