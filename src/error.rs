// src/error.rs

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{clients::UpstreamError, config::Config};

/// Detail of a 500 that was hidden from the response body.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error, details are logged but not returned
    InternalServerError(String),

    // 500 with a human-readable message (failures around external calls)
    Service(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (acting on another user's resource)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),

    /// A provider answered with a non-success status.
    /// Relayed to the client with the provider's own status and body.
    Upstream {
        status: u16,
        body: serde_json::Value,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                let body = Json(json!({ "error": "Internal Server Error" }));
                let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
                response.extensions_mut().insert(ErrorDetail(msg));
                return response;
            }
            AppError::Service(msg) => {
                tracing::error!("Service failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream { status, body } => {
                tracing::warn!("Upstream provider returned {}", status);
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                return (status, Json(body)).into_response();
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Axum Middleware: with `DEBUG` on, 500 bodies carry the hidden detail.
pub async fn expose_error_detail(
    State(config): State<Config>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if !config.debug {
        return response;
    }

    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => (
            response.status(),
            Json(json!({
                "error": "Internal Server Error",
                "detail": detail,
            })),
        )
            .into_response(),
        None => response,
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Provider failures keep the provider's status and body when there is one,
/// everything else collapses to a 500 with a readable message.
impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body } => AppError::Upstream {
                status,
                body: serde_json::from_str(&body).unwrap_or_else(|_| json!({ "error": body })),
            },
            other => AppError::Service(other.to_string()),
        }
    }
}
