//! The `settings` singleton row.

use memora_core::settings::{Settings, SettingsPatch};
use memora_core::tone::ToneQuestions;
use memora_core::types::Timestamp;
use sqlx::FromRow;

/// The single row of the `settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub id: i16,
    pub couple_names: String,
    pub welcome_text: String,
    pub background_image: Option<String>,
    pub admin_password_hash: Option<String>,
    pub tone_page_enabled: bool,
    pub tone_questions: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SettingsRow {
    /// Convert to the domain type, normalizing legacy question shapes.
    pub fn into_settings(self) -> Settings {
        Settings {
            couple_names: self.couple_names,
            welcome_text: self.welcome_text,
            background_image: self.background_image.filter(|bg| !bg.trim().is_empty()),
            tone_page_enabled: self.tone_page_enabled,
            tone_questions: ToneQuestions::normalize(&self.tone_questions),
        }
    }
}

/// Partial settings update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateSettings {
    pub couple_names: Option<String>,
    pub welcome_text: Option<String>,
    pub background_image: Option<String>,
    pub tone_page_enabled: Option<bool>,
    /// Already normalized to the canonical tone-keyed shape.
    pub tone_questions: Option<serde_json::Value>,
}

impl From<&SettingsPatch> for UpdateSettings {
    fn from(patch: &SettingsPatch) -> Self {
        Self {
            couple_names: patch.couple_names.clone(),
            welcome_text: patch.welcome_text.clone(),
            background_image: patch.background_image.clone(),
            tone_page_enabled: patch.tone_page_enabled,
            tone_questions: patch.normalized_tone_questions().map(|tq| tq.to_value()),
        }
    }
}
