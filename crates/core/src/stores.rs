//! Collaborator contracts consumed by the resolver, the guest session, and
//! the admin surface.
//!
//! The persistence crate implements the settings, event, and memory stores
//! on PostgreSQL; the API crate implements export, auth, and media upload.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::session::{NewMemory, Photo};
use crate::settings::{EventOverrides, EventProfile, Settings, SettingsPatch};
use crate::tone::Tone;
use crate::types::{DbId, MemoryId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The backing service could not be reached or rejected the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => CoreError::NotFound { entity, key },
            StoreError::Unavailable(msg) => CoreError::Internal(msg),
            StoreError::Core(core) => core,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted guest memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub id: MemoryId,
    pub event_id: Option<DbId>,
    pub event_code: Option<String>,
    pub guest_name: String,
    pub photo: Option<Photo>,
    pub message: String,
    pub tone: Option<Tone>,
    pub created_at: Timestamp,
}

/// Input for creating an event.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: String,
    /// Requested short code; generated when `None`.
    pub code: Option<String>,
    pub overrides: EventOverrides,
}

/// Partial update of an event. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub overrides: EventOverrides,
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A rendered PDF ready to download.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Global settings singleton.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Settings, StoreError>;
    async fn put(&self, patch: &SettingsPatch) -> Result<Settings, StoreError>;
}

/// Admin-created events addressable by short code.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Look up an active event. Deactivated and unknown codes yield `None`.
    async fn get_by_code(&self, code: &str) -> Result<Option<EventProfile>, StoreError>;
    async fn get(&self, id: DbId) -> Result<EventProfile, StoreError>;
    async fn create(&self, input: &NewEvent) -> Result<EventProfile, StoreError>;
    async fn update(&self, id: DbId, patch: &EventPatch) -> Result<EventProfile, StoreError>;
    /// Soft-deactivate; memories are kept.
    async fn deactivate(&self, id: DbId) -> Result<(), StoreError>;
    /// All events, including deactivated ones.
    async fn list(&self) -> Result<Vec<EventProfile>, StoreError>;
}

/// Guest memories.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn create(&self, memory: &NewMemory) -> Result<MemoryId, StoreError>;
    /// All memories when `event_id` is `None`, newest first.
    async fn list(&self, event_id: Option<DbId>) -> Result<Vec<MemoryRecord>, StoreError>;
    async fn delete(&self, id: MemoryId) -> Result<(), StoreError>;
}

/// Memory book export.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn render_pdf(&self, event_id: Option<DbId>) -> Result<ExportedPdf, StoreError>;
}

/// Shared-secret admin check.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn login(&self, password: &str) -> Result<bool, StoreError>;
}

/// Background image upload. Returns the stored image reference.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload_background(
        &self,
        event_id: Option<DbId>,
        file: Upload,
    ) -> Result<String, StoreError>;
}
