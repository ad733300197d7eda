//! Route definitions for the `/admin` surface.
//!
//! Every handler except `login` takes an [`AdminUser`](crate::middleware::auth::AdminUser).

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{auth, events, memories, settings};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /login                      -> login
/// PUT    /settings                   -> update_settings
/// POST   /background                 -> upload_background
/// GET    /events                     -> list
/// POST   /events                     -> create
/// GET    /events/{id}                -> get_by_id
/// PUT    /events/{id}                -> update
/// DELETE /events/{id}                -> deactivate
/// GET    /memories                   -> list
/// GET    /memories/pdf               -> export_pdf
/// DELETE /memories/{id}              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/settings", put(settings::update_settings))
        .route("/background", post(settings::upload_background))
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/{id}",
            get(events::get_by_id)
                .put(events::update)
                .delete(events::deactivate),
        )
        .route("/memories", get(memories::list))
        .route("/memories/pdf", get(memories::export_pdf))
        .route("/memories/{id}", axum::routing::delete(memories::delete))
}
