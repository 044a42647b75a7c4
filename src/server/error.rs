//! Error responses
//!
//! Handlers return `Result<_, ApiError>`; any `anyhow::Error` converts with
//! `?`. Caller-facing `ChatsumError` kinds become 4xx/503 with a JSON body;
//! anything else is logged and reported as a bare 500.

use crate::error::ChatsumError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable snake_case kind, e.g. `not_member`
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// HTTP status for an error kind
pub fn status_for(err: &ChatsumError) -> StatusCode {
    use ChatsumError::*;

    match err {
        Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        NotAuthorized(_) | NotMember { .. } => StatusCode::FORBIDDEN,
        NotFound { .. } => StatusCode::NOT_FOUND,
        InvalidSchedule(_) | InvalidRequest(_) | CannotRemoveCreator(_) => StatusCode::BAD_REQUEST,
        ChatClosed(_)
        | ChatNotActive { .. }
        | AlreadyClosed(_)
        | AlreadyMember { .. }
        | Conflict(_) => StatusCode::CONFLICT,
        SummarizationUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(err) = self.0.downcast_ref::<ChatsumError>() {
            if err.is_caller_facing() {
                let body = ErrorBody {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                };
                return (status_for(err), Json(body)).into_response();
            }
        }

        tracing::error!(error = ?self.0, "Request failed");
        let body = ErrorBody {
            error: "internal".to_string(),
            message: "internal server error".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
