use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docent_core::DocentError;
use serde_json::json;
use tracing::error;

/// An error rendered as `{ "detail": "..." }` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// An error with an explicit status.
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// A 400 with `detail`.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Map a failed upload. Caller errors keep their message; anything else
    /// is reported as a processing failure.
    pub fn upload(err: DocentError) -> Self {
        if err.is_client_error() {
            return err.into();
        }
        error!(error = %err, "Document processing failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing document: {err}"),
        )
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent as `detail`.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<DocentError> for ApiError {
    fn from(err: DocentError) -> Self {
        match err {
            DocentError::InvalidInput(msg)
            | DocentError::UnsupportedFile(msg)
            | DocentError::NotReady(msg) => Self::bad_request(msg),
            other => {
                error!(error = %other, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Result type returned by every handler.
pub type ApiResult<T> = Result<T, ApiError>;
