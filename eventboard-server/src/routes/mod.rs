pub mod events;
pub mod health;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eventboard_core::{EventError, FieldError};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

/// Every route, with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(events::router())
        .merge(health::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Errors a handler can return
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Other(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            AppError::Other(err) => match err.downcast_ref::<EventError>() {
                Some(EventError::Validation(errors)) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    err.to_string(),
                    Some(errors.fields().to_vec()),
                ),
                Some(EventError::DuplicateTitle(_)) => (StatusCode::CONFLICT, err.to_string(), None),
                Some(EventError::QueryTimeout(_)) => {
                    (StatusCode::GATEWAY_TIMEOUT, err.to_string(), None)
                }
                _ => {
                    error!(error = %err, "Request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
                }
            },
        };

        (status, Json(ErrorResponse { error, fields })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Other(err.into())
    }
}
