//! Event rows and DTOs.

use memora_core::settings::{EventOverrides, EventProfile};
use memora_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `events` table, with its derived memory count.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub couple_names: Option<String>,
    pub welcome_text: Option<String>,
    pub background_image: Option<String>,
    pub tone_page_enabled: Option<bool>,
    pub tone_questions: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub memory_count: i64,
}

impl EventRow {
    pub fn into_profile(self) -> EventProfile {
        EventProfile {
            id: self.id,
            code: self.code,
            name: self.name,
            overrides: EventOverrides {
                couple_names: self.couple_names,
                welcome_text: self.welcome_text,
                background_image: self.background_image,
                tone_page_enabled: self.tone_page_enabled,
                tone_questions: self.tone_questions,
            },
            is_active: self.is_active,
            memory_count: self.memory_count,
        }
    }
}

/// DTO for inserting an event. `code` must already be canonical.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub code: String,
    pub name: String,
    pub overrides: EventOverrides,
}

/// DTO for partially updating an event.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub overrides: EventOverrides,
}
