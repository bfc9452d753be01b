//! Backend Access Layer
//!
//! Abstract per-item REST interface plus its reqwest implementation.
//! Bodies travel as JSON values; `codec` converts them to and from typed
//! records.
//!
//! There is deliberately no bulk "clear collection" call: every mutation is a
//! single-item create, update or delete.

mod codec;
mod rest;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{CollectionRef, ItemId};
use crate::error::{SyncError, ValidationError};

pub use codec::{decode_created_id, decode_record, decode_records, encode_create, encode_update, extract_message};
pub use rest::RestClient;

/// Transport-level failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response at all (connection refused, CORS, aborted, ...)
    #[error("no response: {0}")]
    Transport(String),
    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Response arrived but could not be understood
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(message) => SyncError::Network(message),
            ApiError::Status { status, message } => match status {
                400 | 422 => SyncError::Validation(ValidationError::new("request", message)),
                401 | 403 => SyncError::Forbidden(message),
                409 | 412 => SyncError::Conflict(message),
                _ => SyncError::Server { status, message },
            },
            ApiError::Decode(message) => SyncError::Server { status: 0, message },
        }
    }
}

/// Per-item CRUD against the backend
///
/// `?Send` because everything runs on the browser's single event loop.
#[async_trait(?Send)]
pub trait CollectionApi {
    /// Current server contents of the collection, unordered JSON items
    async fn fetch(&self, collection: &CollectionRef) -> Result<Vec<Value>, ApiError>;

    /// `POST /{collection}`; returns the created item
    async fn create(&self, collection: &CollectionRef, body: Value) -> Result<Value, ApiError>;

    /// `PUT /{collection}/{id}`
    async fn update(&self, collection: &CollectionRef, id: &ItemId, body: Value) -> Result<(), ApiError>;

    /// `DELETE /{collection}/{id}`
    async fn delete(&self, collection: &CollectionRef, id: &ItemId) -> Result<(), ApiError>;
}
