//! Repository for the `memories` table.

use memora_core::types::DbId;
use sqlx::PgPool;

use crate::models::memory::{CreateMemory, MemoryRow};

/// Column list for `memories` queries joined with `events`.
const COLUMNS: &str = "\
    m.id, m.event_id, e.code AS event_code, m.guest_name, m.photo, \
    m.message, m.tone, m.created_at";

const FROM: &str = "memories m LEFT JOIN events e ON e.id = m.event_id";

/// Provides data access for guest memories.
pub struct MemoryRepo;

impl MemoryRepo {
    /// Insert a memory and return its ID.
    pub async fn create(pool: &PgPool, dto: &CreateMemory) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO memories (event_id, guest_name, photo, message, tone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(dto.event_id)
        .bind(&dto.guest_name)
        .bind(&dto.photo)
        .bind(&dto.message)
        .bind(dto.tone)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// List memories newest first, optionally scoped to one event.
    pub async fn list(pool: &PgPool, event_id: Option<DbId>) -> Result<Vec<MemoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM} \
             WHERE ($1::BIGINT IS NULL OR m.event_id = $1) \
             ORDER BY m.created_at DESC, m.id DESC"
        );
        sqlx::query_as::<_, MemoryRow>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// List memories oldest first for the memory book.
    pub async fn list_for_export(
        pool: &PgPool,
        event_id: Option<DbId>,
    ) -> Result<Vec<MemoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM} \
             WHERE ($1::BIGINT IS NULL OR m.event_id = $1) \
             ORDER BY m.created_at ASC, m.id ASC"
        );
        sqlx::query_as::<_, MemoryRow>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Permanently delete a memory. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
