//! Global settings, per-event overrides, and the merged [`ResolvedConfig`].
//!
//! An event overrides the global settings field by field. Absent or blank
//! event fields fall back to the global value, with one exception:
//! `tone_page_enabled` is `true` unless the event says exactly `false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::tone::ToneQuestions;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Couple names shown before an admin configures anything.
pub const DEFAULT_COUPLE_NAMES: &str = "Anna & Nemanja";

/// Welcome text shown before an admin configures anything.
pub const DEFAULT_WELCOME_TEXT: &str = "Leave a memory for";

/// Maximum length of the couple names field.
pub const MAX_COUPLE_NAMES_LENGTH: usize = 200;

/// Maximum length of the welcome text field.
pub const MAX_WELCOME_TEXT_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Global display settings (singleton).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub couple_names: String,
    pub welcome_text: String,
    pub background_image: Option<String>,
    pub tone_page_enabled: bool,
    pub tone_questions: ToneQuestions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            couple_names: DEFAULT_COUPLE_NAMES.to_string(),
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            background_image: None,
            tone_page_enabled: true,
            tone_questions: ToneQuestions::defaults(),
        }
    }
}

/// Partial update of the global settings. `None` fields are left unchanged.
///
/// `tone_questions` is accepted in any historical shape and normalized by
/// [`SettingsPatch::normalized_tone_questions`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub couple_names: Option<String>,
    pub welcome_text: Option<String>,
    pub background_image: Option<String>,
    pub tone_page_enabled: Option<bool>,
    pub tone_questions: Option<Value>,
}

impl SettingsPatch {
    /// `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.couple_names.is_none()
            && self.welcome_text.is_none()
            && self.background_image.is_none()
            && self.tone_page_enabled.is_none()
            && self.tone_questions.is_none()
    }

    /// Normalize the incoming tone questions, if any.
    pub fn normalized_tone_questions(&self) -> Option<ToneQuestions> {
        self.tone_questions.as_ref().map(ToneQuestions::normalize)
    }

    /// Validate field lengths and question banks.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(names) = &self.couple_names {
            validate_length("couple_names", names, MAX_COUPLE_NAMES_LENGTH)?;
        }
        if let Some(text) = &self.welcome_text {
            validate_length("welcome_text", text, MAX_WELCOME_TEXT_LENGTH)?;
        }
        if let Some(tq) = self.normalized_tone_questions() {
            tq.validate()?;
        }
        Ok(())
    }

    /// Apply the patch to an in-memory settings value.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(names) = &self.couple_names {
            settings.couple_names = names.clone();
        }
        if let Some(text) = &self.welcome_text {
            settings.welcome_text = text.clone();
        }
        if let Some(bg) = &self.background_image {
            settings.background_image = Some(bg.clone());
        }
        if let Some(enabled) = self.tone_page_enabled {
            settings.tone_page_enabled = enabled;
        }
        if let Some(tq) = self.normalized_tone_questions() {
            settings.tone_questions = tq;
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Fields an event may override. Every field is optional; on update, `None`
/// leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOverrides {
    pub couple_names: Option<String>,
    pub welcome_text: Option<String>,
    pub background_image: Option<String>,
    pub tone_page_enabled: Option<bool>,
    pub tone_questions: Option<Value>,
}

impl EventOverrides {
    /// Validate field lengths and question banks.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(names) = &self.couple_names {
            validate_length("couple_names", names, MAX_COUPLE_NAMES_LENGTH)?;
        }
        if let Some(text) = &self.welcome_text {
            validate_length("welcome_text", text, MAX_WELCOME_TEXT_LENGTH)?;
        }
        if let Some(raw) = &self.tone_questions {
            ToneQuestions::normalize(raw).validate()?;
        }
        Ok(())
    }
}

/// Reference to the event a guest flow is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub id: DbId,
    pub code: String,
}

/// An active event as seen by the resolver and the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProfile {
    pub id: DbId,
    pub code: String,
    pub name: String,
    #[serde(flatten)]
    pub overrides: EventOverrides,
    /// Deactivated events stop resolving but keep their memories.
    pub is_active: bool,
    /// Number of memories recorded for this event (derived).
    pub memory_count: i64,
}

impl EventProfile {
    pub fn event_ref(&self) -> EventRef {
        EventRef {
            id: self.id,
            code: self.code.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvedConfig
// ---------------------------------------------------------------------------

/// The effective configuration for one guest flow. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub couple_names: String,
    pub welcome_text: String,
    pub background_image: Option<String>,
    pub tone_page_enabled: bool,
    pub tone_questions: ToneQuestions,
    /// The event this configuration came from, if any.
    pub event: Option<EventRef>,
}

impl ResolvedConfig {
    /// Global settings with no event attached.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            couple_names: settings.couple_names.clone(),
            welcome_text: settings.welcome_text.clone(),
            background_image: settings.background_image.clone(),
            tone_page_enabled: settings.tone_page_enabled,
            tone_questions: settings.tone_questions.clone(),
            event: None,
        }
    }

    /// Overlay `event` onto `settings`.
    pub fn overlay(settings: &Settings, event: &EventProfile) -> Self {
        let o = &event.overrides;
        Self {
            couple_names: present(&o.couple_names).unwrap_or(&settings.couple_names).to_string(),
            welcome_text: present(&o.welcome_text).unwrap_or(&settings.welcome_text).to_string(),
            background_image: present(&o.background_image)
                .map(str::to_string)
                .or_else(|| settings.background_image.clone()),
            tone_page_enabled: o.tone_page_enabled != Some(false),
            tone_questions: match &o.tone_questions {
                Some(raw) => ToneQuestions::normalize_over(raw, &settings.tone_questions),
                None => settings.tone_questions.clone(),
            },
            event: Some(event.event_ref()),
        }
    }

    /// Code of the attached event, if any.
    pub fn event_code(&self) -> Option<&str> {
        self.event.as_ref().map(|e| e.code.as_str())
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// A string override counts only when it holds something besides whitespace.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn validate_length(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::Tone;
    use serde_json::json;

    fn global() -> Settings {
        Settings {
            couple_names: "Global Couple".into(),
            welcome_text: "Welcome".into(),
            background_image: Some("https://example.com/bg.jpg".into()),
            tone_page_enabled: false,
            tone_questions: ToneQuestions::defaults(),
        }
    }

    fn event(overrides: EventOverrides) -> EventProfile {
        EventProfile {
            id: 7,
            code: "ABC234".into(),
            name: "Summer wedding".into(),
            overrides,
            is_active: true,
            memory_count: 0,
        }
    }

    #[test]
    fn from_settings_has_no_event() {
        let cfg = ResolvedConfig::from_settings(&global());
        assert_eq!(cfg.couple_names, "Global Couple");
        assert!(cfg.event.is_none());
        assert!(!cfg.tone_page_enabled);
    }

    #[test]
    fn overlay_prefers_present_event_fields() {
        let cfg = ResolvedConfig::overlay(
            &global(),
            &event(EventOverrides {
                couple_names: Some("Jo & Sam".into()),
                background_image: Some("data:image/png;base64,AAAA".into()),
                ..Default::default()
            }),
        );
        assert_eq!(cfg.couple_names, "Jo & Sam");
        assert_eq!(cfg.welcome_text, "Welcome");
        assert_eq!(cfg.background_image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(cfg.event_code(), Some("ABC234"));
    }

    #[test]
    fn blank_event_fields_fall_back() {
        let cfg = ResolvedConfig::overlay(
            &global(),
            &event(EventOverrides {
                couple_names: Some("   ".into()),
                welcome_text: Some(String::new()),
                background_image: Some(String::new()),
                ..Default::default()
            }),
        );
        assert_eq!(cfg.couple_names, "Global Couple");
        assert_eq!(cfg.welcome_text, "Welcome");
        assert_eq!(cfg.background_image.as_deref(), Some("https://example.com/bg.jpg"));
    }

    #[test]
    fn tone_page_enabled_unless_explicitly_false() {
        let unset = ResolvedConfig::overlay(&global(), &event(EventOverrides::default()));
        assert!(unset.tone_page_enabled, "unset must resolve to enabled");

        let on = ResolvedConfig::overlay(
            &global(),
            &event(EventOverrides {
                tone_page_enabled: Some(true),
                ..Default::default()
            }),
        );
        assert!(on.tone_page_enabled);

        let off = ResolvedConfig::overlay(
            &global(),
            &event(EventOverrides {
                tone_page_enabled: Some(false),
                ..Default::default()
            }),
        );
        assert!(!off.tone_page_enabled);
    }

    #[test]
    fn event_questions_override_per_tone() {
        let cfg = ResolvedConfig::overlay(
            &global(),
            &event(EventOverrides {
                tone_questions: Some(json!({"funny": ["Q1", "Q2"]})),
                ..Default::default()
            }),
        );
        assert_eq!(cfg.tone_questions.bank(Tone::Funny).candidates(), vec!["Q1", "Q2"]);
        assert_eq!(
            cfg.tone_questions.bank(Tone::Wise),
            ToneQuestions::defaults().bank(Tone::Wise)
        );
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut s = global();
        let patch = SettingsPatch {
            welcome_text: Some("Hello".into()),
            tone_questions: Some(json!({"wise": "Single?"})),
            ..Default::default()
        };
        patch.apply_to(&mut s);
        assert_eq!(s.couple_names, "Global Couple");
        assert_eq!(s.welcome_text, "Hello");
        assert_eq!(s.tone_questions.bank(Tone::Wise).candidates(), vec!["Single?"]);
        assert!(s.tone_questions.bank(Tone::Funny).is_blank());
    }

    #[test]
    fn patch_rejects_overlong_names() {
        let patch = SettingsPatch {
            couple_names: Some("x".repeat(MAX_COUPLE_NAMES_LENGTH + 1)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(SettingsPatch::default().is_empty());
    }
}
