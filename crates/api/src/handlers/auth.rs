//! Handler for `POST /admin/login`.

use axum::extract::State;
use axum::Json;
use memora_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::issue_admin_token;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// POST /api/v1/admin/login
///
/// Exchange the shared admin password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    if !state.auth.login(&input.password).await? {
        tracing::warn!("Admin login rejected");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid password".into(),
        )));
    }

    let issued = issue_admin_token(&state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    tracing::info!("Admin logged in");

    Ok(Json(DataResponse {
        data: LoginResponse {
            success: true,
            token: issued.token,
            expires_in: issued.expires_in,
        },
    }))
}
