//! PostgreSQL implementations of the core collaborator traits.

use async_trait::async_trait;
use memora_core::error::CoreError;
use memora_core::event_code::{generate_event_code, validate_event_code};
use memora_core::session::NewMemory;
use memora_core::settings::{EventProfile, Settings, SettingsPatch};
use memora_core::stores::{
    EventPatch, EventStore, MemoryRecord, MemoryStore, NewEvent, SettingsStore, StoreError,
};
use memora_core::types::{DbId, MemoryId};
use sqlx::PgPool;

use crate::models::event::{CreateEvent, UpdateEvent};
use crate::models::memory::CreateMemory;
use crate::models::settings::UpdateSettings;
use crate::repositories::{EventRepo, MemoryRepo, SettingsRepo};

/// Attempts at drawing an unused random event code.
const CODE_ATTEMPTS: usize = 8;

const EVENT_CODE_CONSTRAINT: &str = "uq_events_code";

/// Map a database error onto the store error vocabulary.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound {
            entity: "Row",
            key: "unknown".to_string(),
        },
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Core(CoreError::Conflict(format!(
                "Duplicate value violates {}",
                db.constraint().unwrap_or("a unique constraint")
            )))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            StoreError::Core(CoreError::Validation(db.message().to_string()))
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            StoreError::Unavailable(err.to_string())
        }
    }
}

fn is_code_collision(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(EVENT_CODE_CONSTRAINT)
    )
}

fn event_not_found(id: DbId) -> StoreError {
    StoreError::NotFound {
        entity: "Event",
        key: id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self) -> Result<Settings, StoreError> {
        let row = match SettingsRepo::get(&self.pool).await.map_err(store_error)? {
            Some(row) => row,
            None => SettingsRepo::ensure_defaults(&self.pool)
                .await
                .map_err(store_error)?,
        };
        Ok(row.into_settings())
    }

    async fn put(&self, patch: &SettingsPatch) -> Result<Settings, StoreError> {
        patch.validate()?;
        let dto = UpdateSettings::from(patch);
        let row = SettingsRepo::update(&self.pool, &dto)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "Settings",
                key: "1".to_string(),
            })?;
        tracing::info!("Settings updated");
        Ok(row.into_settings())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_with_generated_code(
        &self,
        input: &NewEvent,
    ) -> Result<EventProfile, StoreError> {
        for attempt in 1..=CODE_ATTEMPTS {
            let code = generate_event_code(&mut rand::rng());
            let dto = CreateEvent {
                code,
                name: input.name.trim().to_string(),
                overrides: input.overrides.clone(),
            };
            match EventRepo::create(&self.pool, &dto).await {
                Ok(row) => return Ok(row.into_profile()),
                Err(e) if is_code_collision(&e) => {
                    tracing::debug!(attempt, code = %dto.code, "Event code collision, retrying");
                }
                Err(e) => return Err(store_error(e)),
            }
        }
        Err(StoreError::Core(CoreError::Conflict(
            "Could not allocate a free event code".to_string(),
        )))
    }
}

fn validate_event_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::blank("Event name"));
    }
    Ok(())
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<EventProfile>, StoreError> {
        let row = EventRepo::find_active_by_code(&self.pool, &code.to_ascii_uppercase())
            .await
            .map_err(store_error)?;
        Ok(row.map(|r| r.into_profile()))
    }

    async fn get(&self, id: DbId) -> Result<EventProfile, StoreError> {
        EventRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .map(|r| r.into_profile())
            .ok_or_else(|| event_not_found(id))
    }

    async fn create(&self, input: &NewEvent) -> Result<EventProfile, StoreError> {
        validate_event_name(&input.name)?;
        input.overrides.validate()?;

        let profile = match &input.code {
            None => self.insert_with_generated_code(input).await?,
            Some(raw) => {
                let dto = CreateEvent {
                    code: validate_event_code(raw)?,
                    name: input.name.trim().to_string(),
                    overrides: input.overrides.clone(),
                };
                match EventRepo::create(&self.pool, &dto).await {
                    Ok(row) => row.into_profile(),
                    Err(e) if is_code_collision(&e) => {
                        return Err(StoreError::Core(CoreError::Conflict(format!(
                            "Event code '{}' is already in use",
                            dto.code
                        ))))
                    }
                    Err(e) => return Err(store_error(e)),
                }
            }
        };
        tracing::info!(event_id = profile.id, code = %profile.code, "Event created");
        Ok(profile)
    }

    async fn update(&self, id: DbId, patch: &EventPatch) -> Result<EventProfile, StoreError> {
        if let Some(name) = &patch.name {
            validate_event_name(name)?;
        }
        patch.overrides.validate()?;

        let dto = UpdateEvent {
            name: patch.name.as_ref().map(|n| n.trim().to_string()),
            overrides: patch.overrides.clone(),
        };
        let profile = EventRepo::update(&self.pool, id, &dto)
            .await
            .map_err(store_error)?
            .map(|r| r.into_profile())
            .ok_or_else(|| event_not_found(id))?;
        tracing::info!(event_id = id, "Event updated");
        Ok(profile)
    }

    async fn deactivate(&self, id: DbId) -> Result<(), StoreError> {
        if EventRepo::deactivate(&self.pool, id).await.map_err(store_error)? {
            tracing::info!(event_id = id, "Event deactivated");
            Ok(())
        } else {
            Err(event_not_found(id))
        }
    }

    async fn list(&self) -> Result<Vec<EventProfile>, StoreError> {
        let rows = EventRepo::list(&self.pool).await.map_err(store_error)?;
        Ok(rows.into_iter().map(|r| r.into_profile()).collect())
    }
}

// ---------------------------------------------------------------------------
// Memories
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgMemoryStore {
    pool: PgPool,
}

impl PgMemoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemoryStore for PgMemoryStore {
    async fn create(&self, memory: &NewMemory) -> Result<MemoryId, StoreError> {
        let dto = CreateMemory::from(memory);
        let id = MemoryRepo::create(&self.pool, &dto)
            .await
            .map_err(store_error)?;
        tracing::info!(
            memory_id = id,
            event_code = memory.event_code().unwrap_or("-"),
            "Memory saved"
        );
        Ok(id)
    }

    async fn list(&self, event_id: Option<DbId>) -> Result<Vec<MemoryRecord>, StoreError> {
        let rows = MemoryRepo::list(&self.pool, event_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }

    async fn delete(&self, id: MemoryId) -> Result<(), StoreError> {
        if MemoryRepo::delete(&self.pool, id).await.map_err(store_error)? {
            tracing::info!(memory_id = id, "Memory deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "Memory",
                key: id.to_string(),
            })
        }
    }
}
