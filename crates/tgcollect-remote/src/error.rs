use std::time::Duration;

use thiserror::Error;

/// Errors returned by gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The reference is malformed or names nothing on the remote side.
    #[error("invalid channel reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The channel exists but this session may not read it (private, banned, removed).
    #[error("access denied to '{reference}': {reason}")]
    AccessDenied { reference: String, reason: String },

    /// The gateway asked us to back off for `retry_after_secs`.
    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// Network failure, server error, or a response that did not parse.
    #[error("transient remote error: {0}")]
    Transient(String),
}

/// How the collector should react to a [`RemoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The channel can never succeed as configured.
    PermanentSkip,
    /// Skip the channel for this cycle; it is tried again next cycle.
    SkipCycle,
    /// Wait this long, then defer the channel to the next cycle.
    RateLimited(Duration),
}

impl RemoteError {
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            RemoteError::InvalidReference { .. } => FailureClass::PermanentSkip,
            RemoteError::AccessDenied { .. } | RemoteError::Transient(_) => FailureClass::SkipCycle,
            RemoteError::RateLimited { retry_after_secs } => {
                FailureClass::RateLimited(Duration::from_secs(*retry_after_secs))
            }
        }
    }
}

/// Errors building a [`crate::RemoteClient`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
