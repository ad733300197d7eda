//! Repository for the `settings` singleton.

use memora_core::tone::ToneQuestions;
use sqlx::PgPool;

use crate::models::settings::{SettingsRow, UpdateSettings};

/// Column list for `settings` queries.
const COLUMNS: &str = "\
    id, couple_names, welcome_text, background_image, admin_password_hash, \
    tone_page_enabled, tone_questions, created_at, updated_at";

/// Provides data access for the global settings row.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Make sure the singleton row exists and every tone has a question
    /// list. Stored tones win over the defaults.
    pub async fn ensure_defaults(pool: &PgPool) -> Result<SettingsRow, sqlx::Error> {
        let defaults = ToneQuestions::defaults().to_value();
        let query = format!(
            "INSERT INTO settings (id, tone_questions) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET \
                 tone_questions = $1 || settings.tone_questions \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SettingsRow>(&query)
            .bind(&defaults)
            .fetch_one(pool)
            .await
    }

    /// Fetch the settings row.
    pub async fn get(pool: &PgPool) -> Result<Option<SettingsRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1");
        sqlx::query_as::<_, SettingsRow>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Partially update the settings.
    ///
    /// Uses `COALESCE` so only provided fields are changed.
    pub async fn update(
        pool: &PgPool,
        dto: &UpdateSettings,
    ) -> Result<Option<SettingsRow>, sqlx::Error> {
        let query = format!(
            "UPDATE settings SET \
                 couple_names = COALESCE($1, couple_names), \
                 welcome_text = COALESCE($2, welcome_text), \
                 background_image = COALESCE($3, background_image), \
                 tone_page_enabled = COALESCE($4, tone_page_enabled), \
                 tone_questions = COALESCE($5, tone_questions) \
             WHERE id = 1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SettingsRow>(&query)
            .bind(&dto.couple_names)
            .bind(&dto.welcome_text)
            .bind(&dto.background_image)
            .bind(dto.tone_page_enabled)
            .bind(&dto.tone_questions)
            .fetch_optional(pool)
            .await
    }

    /// Replace the global background image.
    pub async fn set_background(pool: &PgPool, image: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE settings SET background_image = $1 WHERE id = 1")
            .bind(image)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The stored admin password hash, if one has been set.
    pub async fn get_password_hash(pool: &PgPool) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT admin_password_hash FROM settings WHERE id = 1")
                .fetch_optional(pool)
                .await?;
        Ok(row.and_then(|(hash,)| hash))
    }

    /// Store a new admin password hash.
    pub async fn set_password_hash(pool: &PgPool, hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE settings SET admin_password_hash = $1 WHERE id = 1")
            .bind(hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
