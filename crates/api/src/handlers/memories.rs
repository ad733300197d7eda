//! Handlers for guest memories: direct submission, the admin listing, and
//! the memory book export.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use memora_core::session::{NewMemory, Photo};
use memora_core::stores::MemoryRecord;
use memora_core::tone::Tone;
use memora_core::types::MemoryId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AdminUser;
use crate::query::EventScopeParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /memories`.
#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    pub guest_name: String,
    pub photo: Option<String>,
    pub message: String,
    pub tone: Option<String>,
    /// Join-link code; unknown or inactive codes file the memory globally.
    pub event_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedMemory {
    pub id: MemoryId,
}

/// POST /api/v1/memories
///
/// One-shot submission for clients that keep the flow state themselves.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateMemoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedMemory>>)> {
    let photo = input.photo.map(Photo::new).transpose()?;
    let tone = input.tone.as_deref().map(Tone::from_str_db).transpose()?;

    let config = state.resolve_config(input.event_code.as_deref()).await;
    // Without a tone step the tone is never recorded.
    let tone = tone.filter(|_| config.tone_page_enabled);
    let memory = NewMemory::new(
        &input.guest_name,
        photo,
        &input.message,
        tone,
        config.event.clone(),
    )?;

    let id = state.memories.create(&memory).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedMemory { id },
        }),
    ))
}

/// GET /api/v1/admin/memories?event_id=
///
/// Newest first.
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<EventScopeParams>,
) -> AppResult<Json<DataResponse<Vec<MemoryRecord>>>> {
    let memories = state.memories.list(params.event_id).await?;
    Ok(Json(DataResponse { data: memories }))
}

/// DELETE /api/v1/admin/memories/{id}
pub async fn delete(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<MemoryId>,
) -> AppResult<StatusCode> {
    state.memories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/memories/pdf?event_id=
///
/// Download the memory book, one page per memory, oldest first.
pub async fn export_pdf(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<EventScopeParams>,
) -> AppResult<impl IntoResponse> {
    let pdf = state.export.render_pdf(params.event_id).await?;
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", pdf.filename),
            ),
        ],
        pdf.bytes,
    ))
}
