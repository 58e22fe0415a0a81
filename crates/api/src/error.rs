//! HTTP error mapping.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use engine::EngineError;

use crate::handlers::found;
use crate::templates::ErrorTemplate;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No live session on a staff-only page.
    #[error("login required")]
    Unauthenticated,

    /// Logged in, but not as staff.
    #[error("staff access required")]
    Forbidden,

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(err) => match err {
                EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::Validation(_)
                | EngineError::Conflict(_)
                | EngineError::UnknownChoreReference { .. }
                | EngineError::CycleDetected
                | EngineError::InvalidState { .. }
                | EngineError::NotAssignable(_)
                | EngineError::ClaimLimitReached { .. }
                | EngineError::UndoWindowExpired { .. }
                | EngineError::AlreadyUndone => StatusCode::BAD_REQUEST,
                EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                EngineError::PasswordHash(_) | EngineError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthenticated => StatusCode::FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Server-side failures stay generic.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "something went wrong".into()
        } else {
            self.to_string()
        }
    }

    fn log(&self) {
        if self.status().is_server_error() {
            error!(error = %self, "request failed");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Unauthenticated) {
            return found("/login");
        }
        self.log();

        let status = self.status();
        let message = self.public_message();
        let page = ErrorTemplate { status: status.as_u16(), message: message.clone() };
        let body = page.render().unwrap_or(message);
        (status, Html(body)).into_response()
    }
}

/// [`ApiError`] rendered as `{"error": "..."}` for the JSON API.
#[derive(Debug)]
pub struct JsonError(pub ApiError);

impl From<EngineError> for JsonError {
    fn from(err: EngineError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = match self.0 {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ref other => other.status(),
        };
        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}
