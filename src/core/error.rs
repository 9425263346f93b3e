//! Error types for ripple analysis.

/// Result type for ripple analysis operations.
pub type Result<T> = std::result::Result<T, RippleError>;

/// Error type for ripple analysis.
///
/// Only malformed input and malformed configuration are errors. Shapes that
/// cannot be aligned and insulin that belongs to a neighboring excursion are
/// regular results, see [`crate::Alignment`] and [`crate::Offset`].
#[derive(Debug, thiserror::Error)]
pub enum RippleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RippleError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RippleError::InvalidInput(msg.into())
    }
}

impl From<toml::de::Error> for RippleError {
    fn from(e: toml::de::Error) -> Self {
        RippleError::Configuration(format!("Failed to parse config: {}", e))
    }
}
