use super::{Transport, TransportError, WireCall};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// reqwest-backed [`Transport`].
///
/// No overall request timeout is configured on the client: the scheduler's
/// cancellation guard bounds every call.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let connect_timeout_secs = env::var("HOLOWIKI_HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_max_idle_per_host(
                env::var("HOLOWIKI_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(4),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("HOLOWIKI_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Some(proxy) = proxy_from(env::var("HOLOWIKI_PROXY_URL").ok()) {
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_json(&self, call: &WireCall) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(call.url().clone())
            .headers(call.headers().clone())
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::from(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status, response.text().await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::from(e)))?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }
}

/// Proxy for every scheme, or `None` (with a warning) if the URL is invalid.
fn proxy_from(raw: Option<String>) -> Option<Proxy> {
    let raw = raw?;
    match Proxy::all(raw.as_str()) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            warn!(proxy_url = raw.as_str(), error = %e, "ignoring invalid HOLOWIKI_PROXY_URL");
            None
        }
    }
}

fn remote_error(status: reqwest::StatusCode, body: reqwest::Result<String>) -> Error {
    let message = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(status = status.as_u16(), error = %e, "failed to read error response body");
            format!("{} (body unreadable: {})", status, e)
        }
    };
    Error::Remote {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, call: &WireCall, cancel: CancellationToken) -> Result<serde_json::Value> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Transport(TransportError::Cancelled)),
            result = self.get_json(call) => result,
        }
    }
}
