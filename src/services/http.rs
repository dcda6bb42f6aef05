//! Thin reqwest wrapper shared by the HTTP collaborator adapters.

use crate::services::types::TransportError;
use reqwest::{Client, Method, RequestBuilder, Response};

/// Base URL, credential, and pooled client for one collaborator endpoint.
#[derive(Clone)]
pub(crate) struct HttpTransport {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl HttpTransport {
    pub(crate) fn new(
        base_url: &str,
        api_key: Option<String>,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        let base_url = normalize_base_url(base_url).map_err(TransportError::InvalidUrl)?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.bearer_auth(api_key);
        }
        req
    }

    /// Send a request and turn non-2xx statuses into [`TransportError::UnexpectedStatus`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await?;
        ensure_success(response).await
    }
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::UnexpectedStatus { status, body })
}

/// Percent-encode each `/`-separated segment of an object key or resource name.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
