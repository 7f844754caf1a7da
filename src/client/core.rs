use crate::batch::{BatchResponse, QueryRequest};
use crate::client::builder::WikiClientBuilder;
use crate::config::ClientConfig;
use crate::scheduler::{Scheduler, SchedulerSnapshot, Ticket};
use crate::Result;

/// Rate-limited client for a MediaWiki `api.php` endpoint.
///
/// Clones share one queue, so the request interval holds across all of them.
#[derive(Debug, Clone)]
pub struct WikiClient {
    pub(crate) config: ClientConfig,
    pub(crate) scheduler: Scheduler,
}

impl WikiClient {
    /// Client with default options against the default endpoint.
    pub fn new() -> Result<Self> {
        WikiClientBuilder::new().build()
    }

    pub fn builder() -> WikiClientBuilder {
        WikiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The identification string sent as `User-Agent`.
    pub fn user_agent(&self) -> &str {
        self.config.identity().as_str()
    }

    /// Queue a request for the next dispatch. Await the ticket for the result.
    pub async fn submit(&self, query: QueryRequest) -> Ticket {
        self.scheduler.submit(query).await
    }

    /// Submit and wait for the batch outcome.
    pub async fn query(&self, query: QueryRequest) -> Result<BatchResponse> {
        self.submit(query).await.await
    }

    /// Read-only view of the scheduler's queue, phase and watermark.
    pub async fn snapshot(&self) -> SchedulerSnapshot {
        self.scheduler.snapshot().await
    }
}
