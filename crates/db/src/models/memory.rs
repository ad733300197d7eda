//! Guest memory rows and DTOs.

use memora_core::session::{NewMemory, Photo};
use memora_core::stores::MemoryRecord;
use memora_core::tone::Tone;
use memora_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from `memories`, joined with its event's code.
#[derive(Debug, Clone, FromRow)]
pub struct MemoryRow {
    pub id: DbId,
    pub event_id: Option<DbId>,
    pub event_code: Option<String>,
    pub guest_name: String,
    pub photo: Option<String>,
    pub message: String,
    pub tone: Option<String>,
    pub created_at: Timestamp,
}

impl MemoryRow {
    /// Convert to the domain record. Unrecognized photos and tones are
    /// dropped rather than failing the whole listing.
    pub fn into_record(self) -> MemoryRecord {
        let id = self.id;
        let photo = self.photo.and_then(|p| match Photo::new(p) {
            Ok(photo) => Some(photo),
            Err(e) => {
                tracing::warn!(memory_id = id, error = %e, "Dropping unreadable stored photo");
                None
            }
        });
        let tone = self.tone.as_deref().and_then(|t| Tone::from_str_db(t).ok());
        MemoryRecord {
            id,
            event_id: self.event_id,
            event_code: self.event_code,
            guest_name: self.guest_name,
            photo,
            message: self.message,
            tone,
            created_at: self.created_at,
        }
    }
}

/// DTO for inserting a memory.
#[derive(Debug, Clone)]
pub struct CreateMemory {
    pub event_id: Option<DbId>,
    pub guest_name: String,
    pub photo: Option<String>,
    pub message: String,
    pub tone: Option<&'static str>,
}

impl From<&NewMemory> for CreateMemory {
    fn from(memory: &NewMemory) -> Self {
        Self {
            event_id: memory.event.as_ref().map(|e| e.id),
            guest_name: memory.guest_name.clone(),
            photo: memory.photo.as_ref().map(|p| p.as_str().to_string()),
            message: memory.message.clone(),
            tone: memory.tone.map(Tone::as_str),
        }
    }
}
