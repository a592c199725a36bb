use crate::descriptor::DescriptorError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Operation identifier of the call that failed (e.g. "cloudsigma.getDriveInfo")
    pub operation: Option<String>,
    /// Argument or field that caused the error (e.g. "args[1]", "query.mode")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g. expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g. "binder", "basic_auth")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
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

/// Unified error type for the request engine.
///
/// Binding and filter errors are raised before any network I/O. Timeouts are
/// the only kind the retry decorator re-runs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Binding error: {message}{}", format_context(.context))]
    Binding {
        message: String,
        context: ErrorContext,
    },

    #[error("Request filter error: {message}{}", format_context(.context))]
    Filter {
        message: String,
        context: ErrorContext,
    },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("HTTP {status} returned by {operation}: {body}")]
    ResponseFault {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Not authorized (HTTP {status}): {message}")]
    Authorization { status: u16, message: String },

    #[error("Resource not found: {message}")]
    ResourceNotFound { message: String },

    #[error("Illegal state (HTTP {status}): {message}")]
    IllegalState { status: u16, message: String },

    #[error("Response parsing error: {message}{}", format_context(.context))]
    Parse {
        message: String,
        context: ErrorContext,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref op) = ctx.operation {
        parts.push(format!("operation: {}", op));
    }
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
    pub fn binding(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Binding {
            message: msg.into(),
            context,
        }
    }

    pub fn filter(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Filter {
            message: msg.into(),
            context,
        }
    }

    pub fn parse(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout {
            message: msg.into(),
        }
    }

    /// Whether this failure is timeout-classified.
    ///
    /// Looks through transport wrappers: a reqwest error that reports a
    /// timeout counts even when it arrived as `Error::Transport`.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Transport(inner) => inner.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ResponseFault { status, .. }
            | Error::Authorization { status, .. }
            | Error::IllegalState { status, .. } => Some(*status),
            Error::ResourceNotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Whether the failure means "the resource is not there".
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Binding { context, .. }
            | Error::Filter { context, .. }
            | Error::Parse { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::timeout("read timed out").is_timeout());
        assert!(!Error::Cancelled.is_timeout());
        assert!(!Error::Transport(TransportError::Other("connection refused".into())).is_timeout());
        assert!(Error::Transport(TransportError::TimedOut("deadline".into())).is_timeout());
    }

    #[test]
    fn test_context_display() {
        let err = Error::binding(
            "missing required argument",
            ErrorContext::new()
                .with_operation("iso.getISO")
                .with_field_path("args[0]"),
        );
        let text = err.to_string();
        assert!(text.contains("operation: iso.getISO"));
        assert!(text.contains("field: args[0]"));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("args[0]")
        );
    }

    #[test]
    fn test_status_of_mapped_errors() {
        let not_found = Error::ResourceNotFound {
            message: "drive uuid".into(),
        };
        assert!(not_found.is_not_found());
        let fault = Error::ResponseFault {
            operation: "x".into(),
            status: 500,
            body: String::new(),
        };
        assert_eq!(fault.status(), Some(500));
        assert!(!fault.is_not_found());
    }
}
