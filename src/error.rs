//! Error types for the screenshot service

use std::fmt;
use thiserror::Error;

/// Result type alias for render operations
pub type Result<T> = std::result::Result<T, Error>;

/// What a render was asked to load. Used to pick user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A remote or local page addressed by URL
    Url,
    /// Inline HTML/CSS supplied in the request body
    Markup,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Url => f.write_str("url"),
            SourceKind::Markup => f.write_str("markup"),
        }
    }
}

/// Errors that can occur while handling a render request
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied API key does not match the configured secret
    #[error("Invalid API Key")]
    Unauthorized,

    /// The request is missing content or carries malformed input
    #[error("{message}")]
    Validation {
        message: String,
        /// Individual findings, e.g. from the markup lint
        details: Vec<String>,
    },

    /// Navigation or content injection failed or timed out
    #[error("Failed to load {source_kind}: {reason}")]
    ContentLoad { source_kind: SourceKind, reason: String },

    /// Failed to launch or configure the browser
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// Failed to capture the page
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Anything else that went wrong after the request was accepted
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a validation failure without details
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// HTTP status code this error maps to
    pub fn status(&self) -> u16 {
        match self {
            Error::Unauthorized => 403,
            Error::Validation { .. } | Error::ContentLoad { .. } => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(Error::Unauthorized.status(), 403);
        assert_eq!(Error::validation("nope").status(), 400);
        let load = Error::ContentLoad {
            source_kind: SourceKind::Url,
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert_eq!(load.status(), 400);
        assert_eq!(Error::Initialization("no chrome".into()).status(), 500);
        assert_eq!(Error::Internal("boom".into()).status(), 500);
    }

    #[test]
    fn content_load_message_names_the_source() {
        let err = Error::ContentLoad {
            source_kind: SourceKind::Markup,
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Failed to load markup: timeout");
    }
}
