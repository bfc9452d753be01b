//! Error Types
//!
//! Store errors are programmer errors (bad index, unknown key). Sync errors
//! are what a user-facing operation can fail with; they are classified into an
//! [`ErrorKind`] before reaching the reporter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CollectionId, ItemKey};

/// Client-side precondition failure (e.g. empty required field)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Misuse of the ordered store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("index {index} out of bounds for {len} items")]
    InvalidIndex { index: usize, len: usize },
    #[error("no item with key {0}")]
    UnknownId(ItemKey),
}

/// Failure of a collection operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Mutation attempted without edit capability; the UI should have made
    /// this impossible
    #[error("editing {collection} is not permitted for this viewer")]
    Permission { collection: CollectionId },
    /// Backend refused the caller (401/403)
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Backend considers the submitted order/state stale
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error category delivered to the toast/banner collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Server,
    Validation,
    Conflict,
    Forbidden,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) | SyncError::Store(_) => ErrorKind::Validation,
            SyncError::Permission { .. } | SyncError::Forbidden(_) => ErrorKind::Forbidden,
            SyncError::Network(_) => ErrorKind::Network,
            SyncError::Server { .. } => ErrorKind::Server,
            SyncError::Conflict(_) => ErrorKind::Conflict,
        }
    }

    /// Transient failures worth repeating for idempotent edits
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result alias for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
