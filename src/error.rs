use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Rejections surfaced at the HTTP layer, before any session exists.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "invalid_request",
            AppError::NotFound(_) => "not_found",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message()
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Failures scoped to a single step of a single session.
#[derive(Debug)]
pub enum GatewayError {
    /// Inbound frame is not a JSON object of the expected shape.
    InvalidEncoding(serde_json::Error),
    /// `loginCheck` answered with something other than a login result.
    MalformedLoginResponse(serde_json::Error),
    CapacityExceeded { capacity: usize },
    /// Outbound envelope could not be built from the backend payload.
    Encode(serde_json::Error),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::InvalidEncoding(e) => write!(f, "invalid frame encoding: {e}"),
            GatewayError::MalformedLoginResponse(e) => {
                write!(f, "malformed login response: {e}")
            }
            GatewayError::CapacityExceeded { capacity } => {
                write!(f, "registry full ({capacity} sessions)")
            }
            GatewayError::Encode(e) => write!(f, "failed to encode envelope: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {}
