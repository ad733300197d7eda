//! Handlers for the `/admin/events` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use memora_core::settings::{EventOverrides, EventProfile};
use memora_core::stores::{EventPatch, NewEvent};
use memora_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::middleware::auth::AdminUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/events`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    /// Custom short code; generated when absent.
    pub code: Option<String>,
    #[serde(flatten)]
    pub overrides: EventOverrides,
}

/// Request body for `PUT /admin/events/{id}`. Absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    #[serde(flatten)]
    pub overrides: EventOverrides,
}

/// An event plus the link guests use to join it.
#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: EventProfile,
    /// Also the payload of the event's QR code.
    pub join_url: String,
}

impl EventView {
    fn new(event: EventProfile, config: &ServerConfig) -> Self {
        let join_url = config.join_url(&event.code);
        Self { event, join_url }
    }
}

/// POST /api/v1/admin/events
pub async fn create(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<EventView>>)> {
    let new_event = NewEvent {
        name: input.name,
        code: input.code,
        overrides: input.overrides,
    };
    let event = state.events.create(&new_event).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: EventView::new(event, &state.config),
        }),
    ))
}

/// GET /api/v1/admin/events
///
/// Every event, deactivated ones included, with memory counts.
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<EventView>>>> {
    let events = state.events.list().await?;
    let data = events
        .into_iter()
        .map(|e| EventView::new(e, &state.config))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/events/{id}
pub async fn get_by_id(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EventView>>> {
    let event = state.events.get(id).await?;
    Ok(Json(DataResponse {
        data: EventView::new(event, &state.config),
    }))
}

/// PUT /api/v1/admin/events/{id}
pub async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEventRequest>,
) -> AppResult<Json<DataResponse<EventView>>> {
    let patch = EventPatch {
        name: input.name,
        overrides: input.overrides,
    };
    let event = state.events.update(id, &patch).await?;
    Ok(Json(DataResponse {
        data: EventView::new(event, &state.config),
    }))
}

/// DELETE /api/v1/admin/events/{id}
///
/// Deactivates the event. Its memories are kept and its code stops resolving.
pub async fn deactivate(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.events.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
