//! Wiki client: validated configuration, fixed headers and the request
//! scheduler behind one handle.
//!
//! Keep the public surface small: build once, then `submit`/`query`.

pub mod builder;
pub mod core;

pub use self::builder::WikiClientBuilder;
pub use self::core::WikiClient;
