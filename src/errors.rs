//! Application error taxonomy and the JSON error envelope.
//!
//! Handlers and middleware return [`AppError`]. Its `IntoResponse` only sets
//! the status and stashes the message in the response extensions; the
//! outermost [`error_envelope`] layer, which still knows the request path,
//! turns that into the `{status, timestamp, message, path}` body.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{macros::format_description, OffsetDateTime};
use tracing::error;

const BUSINESS_RULES: &str = "Error in Business Rules";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", BUSINESS_RULES)]
    DuplicateEmail,
    #[error("{}", BUSINESS_RULES)]
    AgeRestriction,
    #[error("Invalid data format")]
    Validation,
    #[error("Invalid uuid format")]
    InvalidUuid,
    #[error("Invalid token")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Bad credentials")]
    BadCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Access denied")]
    Forbidden,
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail
            | AppError::AgeRestriction
            | AppError::Validation
            | AppError::InvalidUuid
            | AppError::InvalidToken => StatusCode::BAD_REQUEST,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::BadCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Message of a failed request, picked up by [`error_envelope`].
#[derive(Debug, Clone)]
struct ErrorMessage(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            error!(error = ?e, "unhandled failure");
        }
        let mut res = status.into_response();
        res.extensions_mut().insert(ErrorMessage(self.to_string()));
        res
    }
}

/// Uniform error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: String,
    pub timestamp: String,
    pub message: String,
    pub path: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: String, path: String) -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(format_description!(
                "[day]-[month]-[year] [hour repr:12]:[minute]:[second]"
            ))
            .unwrap_or_default();
        Self {
            status: status_name(status),
            timestamp,
            message,
            path,
        }
    }
}

/// `404 Not Found` -> `NOT_FOUND`.
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
        .replace([' ', '-'], "_")
}

pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;
    let Some(ErrorMessage(message)) = res.extensions_mut().remove::<ErrorMessage>() else {
        return res;
    };
    let status = res.status();
    (status, Json(ApiError::new(status, message, path))).into_response()
}
