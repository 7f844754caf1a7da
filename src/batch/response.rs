use serde_json::Value;
use std::sync::Arc;

/// Outcome of one dispatch, shared by every request that rode in it.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    batch_id: String,
    size: usize,
    body: Arc<Value>,
}

impl BatchResponse {
    pub(crate) fn new(batch_id: impl Into<String>, size: usize, body: Arc<Value>) -> Self {
        Self {
            batch_id: batch_id.into(),
            size,
            body,
        }
    }

    /// Id of the dispatch (shared by all requests in the batch).
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Number of requests that were merged into the call.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Decoded JSON body of the combined call.
    pub fn body(&self) -> &Value {
        &self.body
    }
}
