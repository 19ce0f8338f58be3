//! Mapping of store errors onto HTTP statuses.
//!
//! Every failure is answered with an empty body; only the status tells the
//! client what went wrong.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roamdb_core::{ErrorKind, RoamError};
use thiserror::Error;

/// Why a request failed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The path named no known collection or sub-resource
    #[error("no route for {0}")]
    NoRoute(String),

    /// The store refused or could not find something
    #[error(transparent)]
    Store(#[from] RoamError),
}

impl ApiError {
    /// Status sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoRoute(_) => StatusCode::NOT_FOUND,
            ApiError::Store(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::MalformedInput | ErrorKind::ValidationFailure => {
                    StatusCode::BAD_REQUEST
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(target: "roamdb::http", status = status.as_u16(), error = %self, "request failed");
        status.into_response()
    }
}

/// Result type of the request handlers.
pub type ApiResult<T> = Result<T, ApiError>;
