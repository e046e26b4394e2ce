//! Errors surfaced by the creation flow and user actions

use opyn_core::{ProtocolError, TxError};
use thiserror::Error;

/// Errors returned by user-triggered actions
#[derive(Debug, Error)]
pub enum FlowError {
    /// Rejected before any network call; `message` is shown to the user
    #[error("{message}")]
    Validation { message: String },

    /// An option creation is already running
    #[error("An option creation is already in progress")]
    Busy,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transaction(#[from] TxError),
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Busy => "busy",
            Self::Protocol(e) => e.error_code(),
            Self::Transaction(e) => e.error_code(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Busy => 409,
            Self::Protocol(e) => e.status_code(),
            Self::Transaction(e) => e.status_code(),
        }
    }
}
