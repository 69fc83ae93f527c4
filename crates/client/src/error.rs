//! The single error kind shared by every gateway operation.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by any gateway operation.
///
/// Carries a human-readable message. When the failure originated in the
/// transport, a body parse, or local file I/O, the underlying error is kept
/// as the source so callers can walk the chain.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The message alone, without the source chain.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
