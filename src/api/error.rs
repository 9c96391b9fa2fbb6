use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::StoreError;
use crate::order_actor::{ErrorKind, OrderServiceError};

/// Error body every route answers with: `{"error": kind, "message": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::BadRequest, message: message.into() }
    }

    /// Store failure of a request-validating read: missing rows are
    /// `not_found`, domain rules are `bad_request`, the rest `internal`.
    pub fn from_request(err: StoreError) -> Self {
        OrderServiceError::from_request(err).into()
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidState | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrderServiceError> for ApiError {
    fn from(err: OrderServiceError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self { kind: ErrorKind::Internal, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind.as_str(), message = %self.message, "Request failed");
        } else {
            warn!(kind = self.kind.as_str(), message = %self.message, "Request rejected");
        }

        (status, Json(json!({ "error": self.kind.as_str(), "message": self.message }))).into_response()
    }
}
