//! Shared storage types for Hackhub
//!
//! Errors raised by the document store collaborator, their mapping into the
//! application error, and the retry loop used by optimistic transactions.

use std::future::Future;

use crate::error::{Error, Result};
use thiserror::Error;

/// Storage-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    /// A transaction precondition no longer held; nothing was written.
    #[error("Concurrent modification of {collection}/{id}")]
    Conflict { collection: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the failure is transient and a read may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidData(err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Error::NotFound("Record not found".to_string()),
            StoreError::AlreadyExists => Error::Conflict("Record already exists".to_string()),
            StoreError::Conflict { collection, id } => {
                Error::Contention(format!("{}/{}", collection, id))
            }
            StoreError::Unavailable(msg) => Error::Unavailable(msg),
            StoreError::InvalidData(msg) => Error::Internal(format!("Invalid stored data: {}", msg)),
            StoreError::Backend(msg) => Error::Internal(msg),
        }
    }
}

/// Re-run an optimistic read-validate-commit attempt while it loses races.
///
/// Each attempt must re-read everything it validates; only
/// `Error::Contention` (nothing was applied) triggers another attempt.
pub async fn retry_on_contention<T, F, Fut>(
    max_attempts: u32,
    operation: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(Error::Contention(resource)) if tries < max_attempts => {
                tracing::debug!(
                    operation,
                    attempt = tries,
                    resource = %resource,
                    "Lost optimistic race, retrying from a fresh read"
                );
                tries += 1;
            }
            result => return result,
        }
    }
}
