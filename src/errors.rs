//! Typed error hierarchy for the board client.
//!
//! - `ApiError`: failures talking to the board REST API
//! - `BoardError`: reconciler-level failures
//! - `RejectReason`: machine-readable classification of a failed request,
//!   used to pick the user-facing notification

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::board::models::ItemId;

/// Why the server (or the network) refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    WipLimitExceeded,
    NotFound,
    InvalidColumn,
    Conflict,
    Transport,
    Other(String),
}

impl RejectReason {
    /// Classify an error `code` from a response body, falling back to the
    /// HTTP status when the body carries no code.
    pub fn from_code(code: Option<&str>, status: u16) -> Self {
        match code {
            Some("WIP_LIMIT_EXCEEDED") => Self::WipLimitExceeded,
            Some("NOT_FOUND") => Self::NotFound,
            Some("INVALID_COLUMN") => Self::InvalidColumn,
            Some("CONFLICT") => Self::Conflict,
            Some(other) => Self::Other(other.to_string()),
            None => match status {
                404 => Self::NotFound,
                409 => Self::Conflict,
                _ => Self::Other(format!("HTTP_{}", status)),
            },
        }
    }

    /// The wire code for this reason.
    pub fn code(&self) -> &str {
        match self {
            Self::WipLimitExceeded => "WIP_LIMIT_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidColumn => "INVALID_COLUMN",
            Self::Conflict => "CONFLICT",
            Self::Transport => "TRANSPORT",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WipLimitExceeded => f.write_str("the destination column is at its WIP limit"),
            Self::NotFound => f.write_str("the item no longer exists"),
            Self::InvalidColumn => f.write_str("the destination column does not exist"),
            Self::Conflict => f.write_str("the board changed on the server"),
            Self::Transport => f.write_str("the board server could not be reached"),
            Self::Other(code) => write!(f, "the server refused the request ({})", code),
        }
    }
}

/// Errors from the board REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Board API rejected the request (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        reason: RejectReason,
        message: String,
    },

    #[error("Board API request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Board API unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::Rejected { reason, .. } => reason.clone(),
            Self::Transport(_) | Self::Unavailable(_) => RejectReason::Transport,
            Self::Decode { .. } => RejectReason::Other("DECODE".to_string()),
            Self::InvalidUrl(_) => RejectReason::Other("INVALID_URL".to_string()),
        }
    }

    /// Build a rejection from a status, code and message, as the server
    /// stand-ins do.
    pub fn rejected(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            reason: RejectReason::from_code(Some(code), status),
            message: message.into(),
        }
    }
}

/// Errors from the move reconciler.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Work item {0} not found on board")]
    ItemNotFound(ItemId),

    #[error("No pending move with request id {0}")]
    MoveNotPending(Uuid),
}
