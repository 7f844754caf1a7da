//! Outbound transport.
//!
//! The scheduler only ever talks to a [`Transport`]: one call per flush, a
//! fully built [`WireCall`], and a [`CancellationToken`] that is cancelled
//! when the call overruns its timeout. [`HttpTransport`] is the reqwest
//! implementation used by default.

mod http;

pub use http::HttpTransport;

use crate::batch::QueryRequest;
use crate::identity::Identity;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONNECTION, USER_AGENT};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A single outgoing GET: final URL plus the fixed header set.
#[derive(Debug, Clone)]
pub struct WireCall {
    url: Url,
    headers: HeaderMap,
}

impl WireCall {
    /// `{endpoint}?action=query&format=json&<merged params>`
    pub fn new(endpoint: &Url, query: &QueryRequest, headers: HeaderMap) -> Self {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", "query");
            pairs.append_pair("format", "json");
            for (k, v) in query.to_pairs() {
                pairs.append_pair(&k, &v);
            }
        }
        Self { url, headers }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Headers sent with every call.
pub fn default_headers(identity: &Identity) -> Result<HeaderMap> {
    let user_agent = HeaderValue::from_bytes(identity.as_str().as_bytes()).map_err(|e| {
        Error::validation_with_context(
            format!("identity is not a valid header value: {}", e),
            ErrorContext::new()
                .with_field_path("userAgent")
                .with_details(identity.as_str())
                .with_source("header_builder"),
        )
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(headers)
}

/// Issues one call and decodes the JSON body.
///
/// Implementations should stop work promptly once `cancel` fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: &WireCall, cancel: CancellationToken) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    #[error("Call cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(Arc::new(e))
    }
}
