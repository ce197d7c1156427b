//! Error types for custom tags
//!
//! Every variant is recoverable locally: callers log and keep their previous
//! state. Nothing here is allowed to take a connection or the process down.

use thiserror::Error;

/// Result type alias for custom tag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for custom tags
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Replication Errors
    // ==========================================================================
    #[error("Malformed tag list ({reason}): {raw:?}")]
    MalformedPayload { raw: String, reason: &'static str },

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    #[error("Invalid tag token {token:?}: {reason}")]
    InvalidTagToken { token: String, reason: &'static str },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("<specialmsg:command> must be a S2C command name! (entry #{position})")]
    MissingCommand { position: usize },

    #[error("config parse failed as JSON ({json_error}) and JSON5 ({json5_error})")]
    ConfigParse {
        json_error: String,
        json5_error: String,
    },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error type string (for diagnostics)
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::InvalidTagToken { .. } => "INVALID_ARGUMENT",
            Self::MissingCommand { .. } | Self::ConfigParse { .. } => "CONFIGURATION_ERROR",
            Self::Io(_) => "OS_ERROR",
        }
    }

    /// Whether the error came from configuration loading (the previous
    /// configuration must stay active).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCommand { .. } | Self::ConfigParse { .. } | Self::Io(_)
        )
    }
}
