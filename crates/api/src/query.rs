//! Shared query parameter types for API handlers.

use memora_core::types::DbId;
use serde::Deserialize;

/// `?event_id=` filter for admin listings, exports, and uploads.
///
/// Absent means the global scope: every memory, or the global settings.
#[derive(Debug, Default, Deserialize)]
pub struct EventScopeParams {
    pub event_id: Option<DbId>,
}

/// `?event=CODE` on the public resolve endpoint, matching the join link.
#[derive(Debug, Default, Deserialize)]
pub struct EventCodeParams {
    pub event: Option<String>,
}
