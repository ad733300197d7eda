use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use memora_core::error::CoreError;
use memora_core::session::{SessionError, SubmitError};
use memora_core::stores::StoreError;
use memora_db::stores::store_error;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the collaborator and session
/// errors from `memora_core`, plus HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `memora_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed store, export, auth, or upload call.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A refused guest session transition.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A failed finalize.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Direct repository calls surface through the store error vocabulary, so
/// unique violations become 409s and outages 503s.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(store_error(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Store(store) => match store {
                StoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {key} not found"),
                ),
                StoreError::Unavailable(msg) => {
                    tracing::error!(error = %msg, "Store unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "The service is temporarily unavailable".to_string(),
                    )
                }
                StoreError::Core(core) => classify_core_error(core),
            },

            // --- Guest session errors ---
            AppError::Session(err) => match err {
                SessionError::Validation(core) => classify_core_error(core),
                SessionError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
                }
                SessionError::ToneStepDisabled => {
                    (StatusCode::CONFLICT, "TONE_STEP_DISABLED", err.to_string())
                }
                SessionError::SubmissionInFlight { .. } => {
                    (StatusCode::CONFLICT, "SUBMISSION_IN_FLIGHT", err.to_string())
                }
            },
            AppError::Submit(err) => match err {
                SubmitError::NotReady(_) => {
                    (StatusCode::CONFLICT, "NOT_READY", err.to_string())
                }
                SubmitError::Network(store) => {
                    tracing::warn!(error = %store, "Memory submission failed");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "SUBMISSION_FAILED",
                        "Could not save the memory, please try again".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, key } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} {key} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
