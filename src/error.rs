use std::time::Duration;
use thiserror::Error;

/// Structured error context for configuration and dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Option path that caused the error (e.g., "requestTimeout", "userAgent.version")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the offending value)
    pub details: Option<String>,
    /// Source of the error (e.g., "identity_validator", "options_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the wiki client.
///
/// `Clone` so that the outcome of one dispatch can be handed to every ticket
/// that rode in the batch.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An option has the wrong kind (e.g. a string where milliseconds were expected).
    #[error("Type mismatch for `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// An option has the right kind but an unacceptable value.
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// The cancellation guard fired before the call settled.
    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// The scheduler was torn down before the batch settled.
    #[error("Request dropped before dispatch settled")]
    Dropped,
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation (value-range) error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            field: field.into(),
            expected,
            found: found.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True for errors raised while validating configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. } | Error::Validation { .. })
    }

    /// True for value-range errors (right kind, out-of-bounds value).
    pub fn is_value_range(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// True for wrong-kind errors.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }
}
