//! Route definitions for the guest-facing flow.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{memories, sessions, settings};
use crate::state::AppState;

/// Guest routes, mounted at the API root.
///
/// ```text
/// GET    /settings                   -> get_settings
/// GET    /resolve                    -> resolve
/// POST   /sessions                   -> start
/// GET    /sessions/{id}              -> get_by_id
/// DELETE /sessions/{id}              -> end
/// PUT    /sessions/{id}/name         -> set_name
/// PUT    /sessions/{id}/photo        -> set_photo
/// PUT    /sessions/{id}/tone         -> choose_tone
/// PUT    /sessions/{id}/message      -> compose_message
/// POST   /sessions/{id}/finalize     -> finalize
/// POST   /sessions/{id}/reset        -> reset
/// POST   /memories                   -> create
/// ```
pub fn router() -> Router<AppState> {
    let session_routes = Router::new()
        .route("/", post(sessions::start))
        .route("/{id}", get(sessions::get_by_id).delete(sessions::end))
        .route("/{id}/name", put(sessions::set_name))
        .route("/{id}/photo", put(sessions::set_photo))
        .route("/{id}/tone", put(sessions::choose_tone))
        .route("/{id}/message", put(sessions::compose_message))
        .route("/{id}/finalize", post(sessions::finalize))
        .route("/{id}/reset", post(sessions::reset));

    Router::new()
        .route("/settings", get(settings::get_settings))
        .route("/resolve", get(settings::resolve))
        .route("/memories", post(memories::create))
        .nest("/sessions", session_routes)
}
