pub mod admin;
pub mod guest;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /settings                                  global settings (public)
/// /resolve?event=CODE                        merged config for a join link (public)
///
/// /sessions                                  start a guest session (POST)
/// /sessions/{id}                             get, end (GET, DELETE)
/// /sessions/{id}/name                        enter name (PUT)
/// /sessions/{id}/photo                       stage or skip photo (PUT)
/// /sessions/{id}/tone                        choose tone (PUT)
/// /sessions/{id}/message                     compose message (PUT)
/// /sessions/{id}/finalize                    submit once (POST)
/// /sessions/{id}/reset                       start over (POST)
///
/// /memories                                  one-shot submission (POST)
///
/// /admin/login                               exchange password for token (public)
/// /admin/settings                            update settings (PUT)
/// /admin/background?event_id=                upload background (POST, multipart)
/// /admin/events                              list, create
/// /admin/events/{id}                         get, update, deactivate
/// /admin/memories?event_id=                  list (newest first)
/// /admin/memories/{id}                       delete
/// /admin/memories/pdf?event_id=              download memory book
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Guest-facing routes (no auth).
        .merge(guest::router())
        // Admin routes (bearer token, except login).
        .nest("/admin", admin::router())
}
