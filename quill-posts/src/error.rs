use quill_blob::BlobError;
use quill_core::QuillError;
use serde_json::{json, Value};
use thiserror::Error;

use crate::records::StoreError;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Failures surfaced by the blog lifecycle.
///
/// Fatal errors are returned verbatim; swallowed asset failures never show
/// up here (they go to the log and the event channel instead).
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Malformed or missing input. The operation never started.
    #[error("{message}")]
    Validation { message: String, errors: Option<Value> },

    /// The post does not exist. Nothing was changed.
    #[error("Post not found: {id}")]
    NotFound { id: String },

    /// Photo upload failed.
    #[error("asset store failure: {0}")]
    AssetStore(#[source] BlobError),

    /// The post changed since the caller read it.
    #[error("Post {id} is at version {actual}, expected {expected}")]
    Conflict { id: String, expected: u64, actual: u64 },

    #[error("record store failure: {0}")]
    Store(#[source] StoreError),

    /// The post record is gone but its comments could not all be removed.
    #[error("Post {id} deleted but its comments were not: {source}")]
    PartialDelete {
        id: String,
        #[source]
        source: StoreError,
    },
}

impl LifecycleError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            errors: None,
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            errors: Some(json!({ (field): [message.clone()] })),
            message,
        }
    }

    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

impl From<BlobError> for LifecycleError {
    fn from(err: BlobError) -> Self {
        if err.is_invalid_input() {
            LifecycleError::invalid_field("photo", err.to_string())
        } else {
            LifecycleError::AssetStore(err)
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => LifecycleError::NotFound { id },
            StoreError::Conflict { id, expected, actual } => {
                LifecycleError::Conflict { id, expected, actual }
            }
            other => LifecycleError::Store(other),
        }
    }
}

/// Backend detail only travels in `source`, never in the message.
impl From<LifecycleError> for QuillError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation { message, errors } => {
                let quill = QuillError::unprocessable(message);
                match errors {
                    Some(errors) => quill.with_errors(errors),
                    None => quill,
                }
            }
            LifecycleError::NotFound { id } => QuillError::not_found(format!("Post not found: {id}")),
            LifecycleError::Conflict { id, expected, actual } => QuillError::conflict(format!(
                "Post {id} is at version {actual}, expected {expected}"
            ))
            .with_data(json!({ "id": id, "expected": expected, "actual": actual })),
            err @ LifecycleError::AssetStore(_) => {
                QuillError::bad_gateway("Photo storage is unavailable")
                    .with_source(anyhow::Error::new(err))
            }
            err @ (LifecycleError::Store(_) | LifecycleError::PartialDelete { .. }) => {
                QuillError::general_error("Internal error").with_source(anyhow::Error::new(err))
            }
        }
    }
}
