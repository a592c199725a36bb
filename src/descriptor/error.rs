//! Descriptor error types

/// Errors raised while declaring, registering, or looking up descriptors.
///
/// These are programmer errors: they surface when a client is assembled or an
/// unknown operation is invoked, never as a recoverable runtime condition.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Unknown operation: {id}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    UnknownOperation { id: String, hint: Option<String> },

    #[error("Operation '{id}' is registered twice")]
    DuplicateOperation { id: String },

    #[error("Unknown {kind} '{id}' referenced by {operation}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    UnknownComponent {
        kind: &'static str,
        id: String,
        operation: String,
        hint: Option<String>,
    },

    #[error("Invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid descriptor for '{id}': {reason}")]
    Invalid { id: String, reason: String },

    #[error("Failed to load manifest from {path}: {reason}")]
    LoadError { path: String, reason: String },

    #[error("YAML syntax error: {0}")]
    YamlError(String),
}

impl DescriptorError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            DescriptorError::UnknownOperation { ref mut hint, .. } => *hint = hint_val,
            DescriptorError::UnknownComponent { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }
}
