use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_core::QuillError;
use quill_posts::LifecycleError;
use serde_json::json;

/// Handler error: anything that ends up as a Feathers-style JSON body.
#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        Self(QuillError::from(e).into_anyhow())
    }
}

impl From<QuillError> for ApiError {
    fn from(e: QuillError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        QuillError::bad_request("Failed to parse the request body as JSON")
            .with_errors(json!({"_schema": [rejection.body_text()]}))
            .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let safe = match self.0.chain().find_map(|e| e.downcast_ref::<QuillError>()) {
            Some(quill) => {
                if quill.code() >= 500 {
                    tracing::error!(error = ?self.0, "request failed");
                }
                quill.sanitize_for_client()
            }
            None => {
                tracing::error!(error = ?self.0, "unhandled error");
                QuillError::general_error("Internal error")
            }
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
