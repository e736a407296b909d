//! Upload collaborator
//!
//! [`Uploader`] is the seam between the linker and the content store.
//! [`HttpUploader`] talks to a store over HTTP; tests substitute a recorder.

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use crate::link::Link;

/// Error from an upload attempt. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// One payload to store.
#[derive(Debug)]
pub struct UploadRequest<'a> {
    pub name: &'a str,
    pub content_type: &'a str,
    pub body: Vec<u8>,
    pub links: &'a [Link],
}

/// Stores a payload and returns the store's confirmation document.
#[async_trait]
pub trait Uploader: Debug + Send + Sync {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<serde_json::Value, UploadError>;
}

#[derive(Deserialize)]
struct Confirmation {
    inner_envelope: InnerEnvelope,
}

#[derive(Deserialize)]
struct InnerEnvelope {
    hashkey: String,
}

/// Pull the assigned content address (`inner_envelope.hashkey`) out of a
/// confirmation document.
pub fn content_address(confirmation: &serde_json::Value) -> Result<String, UploadError> {
    Confirmation::deserialize(confirmation)
        .map(|c| c.inner_envelope.hashkey)
        .map_err(|e| {
            UploadError::InvalidResponse(format!(
                "confirmation has no inner_envelope.hashkey ({e}): {confirmation}"
            ))
        })
}

/// Value for a single RFC 8288 `Link` header carrying every link.
pub fn link_header(links: &[Link]) -> Option<String> {
    if links.is_empty() {
        return None;
    }
    Some(
        links
            .iter()
            .map(|link| format!("<{}>; rel=\"{}\"", link.address, link.rel))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// HTTP uploader: `POST {endpoint}/upload?name={name}`.
#[derive(Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl fmt::Debug for HttpUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpUploader")
            .field("endpoint", &self.endpoint)
            .field("has_token", &self.auth_token.is_some())
            .finish()
    }
}

impl HttpUploader {
    /// `endpoint` is the store root (e.g. `http://localhost:8081/`).
    /// Trailing slashes are stripped.
    pub fn new(
        endpoint: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn map_error(resp: reqwest::Response) -> UploadError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let body = match status {
            StatusCode::UNAUTHORIZED if body.is_empty() => "authentication required".to_string(),
            StatusCode::FORBIDDEN if body.is_empty() => "access denied".to_string(),
            _ => body,
        };
        UploadError::Rejected {
            status: status.as_u16(),
            body,
        }
    }

    fn map_network_error(e: reqwest::Error) -> UploadError {
        if e.is_timeout() {
            UploadError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            UploadError::Network(format!("connection failed: {e}"))
        } else {
            UploadError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, request: UploadRequest<'_>) -> Result<serde_json::Value, UploadError> {
        let url = format!("{}/upload", self.endpoint);
        let mut req = self
            .add_auth(self.client.post(&url))
            .query(&[("name", request.name)])
            .header(header::CONTENT_TYPE, request.content_type)
            .body(request.body);
        if let Some(links) = link_header(request.links) {
            req = req.header(header::LINK, links);
        }

        let resp = req.send().await.map_err(Self::map_network_error)?;
        if resp.status().is_success() {
            resp.json()
                .await
                .map_err(|e| UploadError::InvalidResponse(e.to_string()))
        } else {
            Err(Self::map_error(resp).await)
        }
    }
}
