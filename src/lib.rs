//! # holowiki
//!
//! Client helper for the [hololive.wiki](https://hololive.wiki) MediaWiki API
//! (or any other `api.php` endpoint).
//!
//! ## Overview
//!
//! Two things matter when a bot talks to a wiki: it has to identify itself
//! properly, and it must not hammer the server. This crate does both:
//!
//! - **Identification**: [`identity::build_identity`] validates a bot name,
//!   a semantic version and contact details, and formats the `User-Agent`
//!   sent with every call.
//! - **Pacing**: requests go through a single-flight [`scheduler::Scheduler`].
//!   Requests submitted close together are merged into one `action=query`
//!   call, consecutive calls start at least `request_interval` apart, and
//!   each call is cancelled after `request_timeout`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use holowiki::{QueryRequest, UserAgentOptions, WikiClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> holowiki::Result<()> {
//!     let client = WikiClient::builder()
//!         .user_agent(
//!             UserAgentOptions::new("FanArtBot", "1.2.0")
//!                 .with_contact(vec!["https://example.com/fanartbot", "ops@example.com"]),
//!         )
//!         .request_interval(Duration::from_millis(1500))
//!         .build()?;
//!
//!     // Both requests ride in the same call.
//!     let a = client.submit(QueryRequest::new().prop(["info"]).titles(["Gawr Gura"])).await;
//!     let b = client.submit(QueryRequest::new().prop(["info"]).titles(["Ninomae Ina'nis"])).await;
//!
//!     let response = a.await?;
//!     println!("{}", response.body());
//!     b.await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`identity`] | User-Agent validation and formatting |
//! | [`config`] | Options, defaults, bounds and env overrides |
//! | [`batch`] | Query descriptors, queue and batch merging |
//! | [`scheduler`] | Single-flight rate-limited dispatcher |
//! | [`transport`] | Transport trait and reqwest implementation |
//! | [`client`] | [`WikiClient`] and its builder |

pub mod batch;
pub mod client;
pub mod config;
pub mod identity;
pub mod scheduler;
pub mod transport;

// Re-export main types for convenience
pub use batch::{BatchResponse, QueryRequest};
pub use client::{WikiClient, WikiClientBuilder};
pub use config::{ClientConfig, ClientOptions};
pub use identity::{Contact, Identity, UserAgentOptions, HOST_LIBRARY};
pub use scheduler::{Phase, SchedulerSnapshot, Ticket};
pub use transport::{Transport, WireCall};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
