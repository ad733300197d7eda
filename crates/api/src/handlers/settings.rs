//! Handlers for global settings, event resolution, and background upload.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use memora_core::settings::{ResolvedConfig, Settings, SettingsPatch};
use memora_core::stores::Upload;
use memora_db::repositories::SettingsRepo;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_admin_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AdminUser;
use crate::query::{EventCodeParams, EventScopeParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /admin/settings`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(flatten)]
    pub patch: SettingsPatch,
    /// Replaces the shared admin password when present.
    pub admin_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackgroundResponse {
    pub background_image: String,
}

/// GET /api/v1/settings
///
/// Global settings as guests see them without an event code.
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<DataResponse<Settings>>> {
    let settings = state.settings.get().await?;
    state.remember_settings(settings.clone());
    Ok(Json(DataResponse { data: settings }))
}

/// GET /api/v1/resolve?event=CODE
///
/// The merged configuration for a join link. Unknown or inactive codes
/// resolve to the global settings.
pub async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<EventCodeParams>,
) -> Json<DataResponse<ResolvedConfig>> {
    let config = state.resolve_config(params.event.as_deref()).await;
    Json(DataResponse {
        data: ResolvedConfig::clone(&config),
    })
}

/// PUT /api/v1/admin/settings
pub async fn update_settings(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsRequest>,
) -> AppResult<Json<DataResponse<Settings>>> {
    if let Some(password) = &input.admin_password {
        validate_admin_password(password)?;
    }
    // Validate everything before touching the password.
    input.patch.validate()?;

    if let Some(password) = &input.admin_password {
        let hash = hash_password(password)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
        SettingsRepo::set_password_hash(&state.pool, &hash).await?;
        tracing::info!("Admin password changed");
    }

    let settings = if input.patch.is_empty() {
        state.settings.get().await?
    } else {
        state.settings.put(&input.patch).await?
    };
    state.remember_settings(settings.clone());
    Ok(Json(DataResponse { data: settings }))
}

/// POST /api/v1/admin/background?event_id=
///
/// Multipart upload with a single `file` field. Without `event_id` the
/// global background is replaced.
pub async fn upload_background(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<EventScopeParams>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<BackgroundResponse>>> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        upload = Some(Upload {
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".into()))?;
    let background_image = state.media.upload_background(params.event_id, upload).await?;

    Ok(Json(DataResponse {
        data: BackgroundResponse { background_image },
    }))
}
