use crate::client::core::WikiClient;
use crate::config::ClientOptions;
use crate::identity::UserAgentOptions;
use crate::scheduler::Scheduler;
use crate::transport::{default_headers, HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Nothing is validated until [`build`](Self::build); a failed build
/// produces no client at all.
pub struct WikiClientBuilder {
    options: ClientOptions,
    env_overrides: bool,
    transport: Option<Arc<dyn Transport>>,
}

impl WikiClientBuilder {
    pub fn new() -> Self {
        Self {
            options: ClientOptions::default(),
            env_overrides: false,
            transport: None,
        }
    }

    /// Replace all options at once (e.g. loaded with [`ClientOptions::from_yaml_str`]).
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Max duration of a single call (500ms..=30s, default 10s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    /// Minimum spacing between dispatch starts (500ms..=5s, default 1s).
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.options.request_interval = Some(interval);
        self
    }

    pub fn user_agent(mut self, user_agent: UserAgentOptions) -> Self {
        self.options.user_agent = Some(user_agent);
        self
    }

    /// Override the API endpoint (primarily for testing with mock servers).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.options.endpoint = Some(endpoint.into());
        self
    }

    /// Apply `HOLOWIKI_*` environment overrides at build time.
    pub fn env_overrides(mut self, enable: bool) -> Self {
        self.env_overrides = enable;
        self
    }

    /// Inject a transport. Default is [`HttpTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the options and build the client.
    pub fn build(self) -> Result<WikiClient> {
        let options = if self.env_overrides {
            self.options.with_env_overrides()?
        } else {
            self.options
        };
        let config = options.validate()?;
        let headers = default_headers(config.identity())?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };

        tracing::debug!(
            user_agent = config.identity().as_str(),
            endpoint = config.endpoint().as_str(),
            request_timeout_ms = config.request_timeout().as_millis() as u64,
            request_interval_ms = config.request_interval().as_millis() as u64,
            "wiki client configured"
        );

        let scheduler = Scheduler::new(config.clone(), headers, transport);
        Ok(WikiClient { config, scheduler })
    }
}

impl Default for WikiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
