//! Repository for the `events` table.

use memora_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, EventRow, UpdateEvent};

/// Column list for `events` queries, including the derived memory count.
/// Valid in both `SELECT ... FROM events` and `RETURNING`.
const COLUMNS: &str = "\
    id, code, name, couple_names, welcome_text, background_image, \
    tone_page_enabled, tone_questions, is_active, created_at, updated_at, \
    (SELECT COUNT(*) FROM memories m WHERE m.event_id = events.id) AS memory_count";

/// Provides data access for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event. Fails with a unique violation on
    /// `uq_events_code` if the code is taken.
    pub async fn create(pool: &PgPool, dto: &CreateEvent) -> Result<EventRow, sqlx::Error> {
        let o = &dto.overrides;
        let query = format!(
            "INSERT INTO events \
                 (code, name, couple_names, welcome_text, background_image, \
                  tone_page_enabled, tone_questions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventRow>(&query)
            .bind(&dto.code)
            .bind(&dto.name)
            .bind(&o.couple_names)
            .bind(&o.welcome_text)
            .bind(&o.background_image)
            .bind(o.tone_page_enabled)
            .bind(&o.tone_questions)
            .fetch_one(pool)
            .await
    }

    /// Find an event by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EventRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an active event by its canonical (upper-case) code.
    pub async fn find_active_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<EventRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE code = $1 AND is_active");
        sqlx::query_as::<_, EventRow>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// List all events, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<EventRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, EventRow>(&query).fetch_all(pool).await
    }

    /// Partially update an event.
    ///
    /// Uses `COALESCE` so only provided fields are changed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateEvent,
    ) -> Result<Option<EventRow>, sqlx::Error> {
        let o = &dto.overrides;
        let query = format!(
            "UPDATE events SET \
                 name = COALESCE($2, name), \
                 couple_names = COALESCE($3, couple_names), \
                 welcome_text = COALESCE($4, welcome_text), \
                 background_image = COALESCE($5, background_image), \
                 tone_page_enabled = COALESCE($6, tone_page_enabled), \
                 tone_questions = COALESCE($7, tone_questions) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .bind(&dto.name)
            .bind(&o.couple_names)
            .bind(&o.welcome_text)
            .bind(&o.background_image)
            .bind(o.tone_page_enabled)
            .bind(&o.tone_questions)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate an event. Returns `true` if an active event was
    /// deactivated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE events SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace an event's background image.
    pub async fn set_background(pool: &PgPool, id: DbId, image: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE events SET background_image = $2 WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
