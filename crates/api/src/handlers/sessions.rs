//! Handlers for the `/sessions` resource: one guest's walk through the
//! guestbook flow.
//!
//! Every transition is validated by [`GuestSession`]; these handlers only
//! look the session up, apply the step, and render a [`SessionView`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use memora_core::session::{FinalizeOutcome, GuestSession, Photo, SessionState, Submission};
use memora_core::settings::ResolvedConfig;
use memora_core::tone::Tone;
use memora_core::types::MemoryId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::sessions::lock_session;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub event_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetNameRequest {
    pub name: String,
}

/// `photo: null` skips the photo.
#[derive(Debug, Deserialize)]
pub struct SetPhotoRequest {
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChooseToneRequest {
    pub tone: String,
}

#[derive(Debug, Deserialize)]
pub struct ComposeMessageRequest {
    pub message: String,
}

/// Snapshot of a guest session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub state: SessionState,
    pub guest_name: Option<String>,
    pub photo: Option<Photo>,
    pub tone: Option<Tone>,
    pub message: Option<String>,
    pub tone_step_required: bool,
    /// Prompt shown on the compose step; fixed once shown.
    pub compose_question: Option<String>,
    /// Prompt shown on the recap step.
    pub recap_question: Option<String>,
    pub memory_id: Option<MemoryId>,
    pub config: ResolvedConfig,
}

impl SessionView {
    fn build(id: Uuid, session: &mut GuestSession) -> Self {
        let state = session.state();
        let compose_from = if session.tone_step_required() {
            SessionState::ToneChosen
        } else {
            SessionState::PhotoStaged
        };
        let compose_question = (state >= compose_from && state < SessionState::Submitted)
            .then(|| session.compose_question().to_string());
        let recap_question =
            (state >= SessionState::MessageComposed).then(|| session.recap_question());

        Self {
            id,
            state,
            guest_name: session.guest_name().map(str::to_string),
            photo: session.photo().cloned(),
            tone: session.tone(),
            message: session.message().map(str::to_string),
            tone_step_required: session.tone_step_required(),
            compose_question,
            recap_question,
            memory_id: session.memory_id(),
            config: ResolvedConfig::clone(session.config()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    #[serde(flatten)]
    pub outcome: FinalizeOutcome,
    pub session: SessionView,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions
///
/// Resolve the event (or global) configuration and open a fresh session.
pub async fn start(
    State(state): State<AppState>,
    Json(input): Json<StartSessionRequest>,
) -> (StatusCode, Json<DataResponse<SessionView>>) {
    let config = state.resolve_config(input.event_code.as_deref()).await;
    let (id, handle) = state.sessions.insert(GuestSession::new(config));
    tracing::info!(
        session_id = %id,
        event_code = input.event_code.as_deref().unwrap_or("-"),
        "Guest session started"
    );

    let data = SessionView::build(id, &mut lock_session(&handle));
    (StatusCode::CREATED, Json(DataResponse { data }))
}

/// GET /api/v1/sessions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let handle = state.sessions.get(id)?;
    let data = SessionView::build(id, &mut lock_session(&handle));
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/sessions/{id}/name
pub async fn set_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetNameRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let handle = state.sessions.get(id)?;
    let mut session = lock_session(&handle);
    session.set_name(&input.name)?;
    Ok(Json(DataResponse {
        data: SessionView::build(id, &mut session),
    }))
}

/// PUT /api/v1/sessions/{id}/photo
pub async fn set_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetPhotoRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let photo = input.photo.map(Photo::new).transpose()?;
    let handle = state.sessions.get(id)?;
    let mut session = lock_session(&handle);
    session.set_photo(photo)?;
    Ok(Json(DataResponse {
        data: SessionView::build(id, &mut session),
    }))
}

/// PUT /api/v1/sessions/{id}/tone
pub async fn choose_tone(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ChooseToneRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let tone = Tone::from_str_db(&input.tone)?;
    let handle = state.sessions.get(id)?;
    let mut session = lock_session(&handle);
    session.choose_tone(tone)?;
    Ok(Json(DataResponse {
        data: SessionView::build(id, &mut session),
    }))
}

/// PUT /api/v1/sessions/{id}/message
pub async fn compose_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ComposeMessageRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let handle = state.sessions.get(id)?;
    let mut session = lock_session(&handle);
    session.compose_message(&input.message)?;
    Ok(Json(DataResponse {
        data: SessionView::build(id, &mut session),
    }))
}

/// POST /api/v1/sessions/{id}/finalize
///
/// Persist the memory at most once. Repeated or concurrent calls never
/// create a second memory:
///
/// - `201` -- this call saved the memory.
/// - `200` -- it was already saved.
/// - `202` -- another call is saving it right now.
pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<DataResponse<FinalizeResponse>>)> {
    let handle = state.sessions.get(id)?;

    // The session lock is released before the store call.
    let submission = lock_session(&handle).begin_submission()?;
    let outcome = match submission {
        Submission::ShortCircuit(outcome) => outcome,
        Submission::Ready { ticket, memory } => {
            let result = state.memories.create(&memory).await;
            lock_session(&handle).complete_submission(ticket, result)?
        }
    };

    let status = match outcome {
        FinalizeOutcome::Submitted(_) => StatusCode::CREATED,
        FinalizeOutcome::AlreadySubmitted(_) => StatusCode::OK,
        FinalizeOutcome::InFlight => StatusCode::ACCEPTED,
    };
    let session = SessionView::build(id, &mut lock_session(&handle));
    Ok((
        status,
        Json(DataResponse {
            data: FinalizeResponse { outcome, session },
        }),
    ))
}

/// POST /api/v1/sessions/{id}/reset
///
/// Clear the guest's answers and start over with the same configuration.
/// Refused with 409 while a finalize is saving the memory.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let handle = state.sessions.get(id)?;
    let mut session = lock_session(&handle);
    session.reset()?;
    Ok(Json(DataResponse {
        data: SessionView::build(id, &mut session),
    }))
}

/// DELETE /api/v1/sessions/{id}
pub async fn end(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.sessions.remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
