//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": ... }` envelope used by all API responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
