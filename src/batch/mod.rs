//! Request batching.
//!
//! Requests submitted in quick succession are collected in a
//! [`RequestQueue`] and sent as a single `action=query` call: the queued
//! [`QueryRequest`]s that agree on their single-value parameters
//! ([`QueryRequest::can_merge_with`]) are merged with
//! [`QueryRequest::merge`], multi-value parameters joined with `|` the way
//! MediaWiki expects. Requests that disagree wait for the next call. Every
//! submitter of a batch receives the same [`BatchResponse`].
//!
//! ## Example
//!
//! ```rust
//! use holowiki::batch::QueryRequest;
//!
//! let a = QueryRequest::new().prop(["info"]).titles(["Usada Pekora"]);
//! let b = QueryRequest::new().prop(["info"]).titles(["Houshou Marine"]);
//!
//! let merged = QueryRequest::merge([&a, &b]);
//! assert_eq!(
//!     merged.to_pairs(),
//!     vec![
//!         ("prop".to_string(), "info".to_string()),
//!         ("titles".to_string(), "Usada Pekora|Houshou Marine".to_string()),
//!     ]
//! );
//! ```

mod queue;
mod request;
mod response;

pub use queue::{QueuedItem, RequestQueue};
pub use request::{QueryRequest, MULTI_VALUE_PARAMS, MULTI_VALUE_SEPARATOR, RESERVED_PARAMS};
pub use response::BatchResponse;
