//! Action Errors
//!
//! Every failure an action can report falls into one of three kinds:
//! a user configuration problem, a malformed address coming back from the
//! service, or a failed remote call. None of them are retried.

use thiserror::Error;

use crate::address::AddressError;
use crate::service::ServiceError;

/// Error returned by action execution.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Missing or inconsistent user input. Not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed address: {0}")]
    MalformedAddress(#[from] AddressError),

    /// Failure reported by the spreadsheet service, passed through unchanged.
    #[error("Remote call failed: {0}")]
    Remote(#[from] ServiceError),
}

impl ActionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true for errors caused by user input.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;
