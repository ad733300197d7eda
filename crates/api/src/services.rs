//! PostgreSQL-backed implementations of the export, auth, and upload
//! collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use memora_core::error::CoreError;
use memora_core::export::{export_filename, render_memory_book, MemoryPage};
use memora_core::media::{encode_data_url, validate_image_content_type};
use memora_core::prompt::{select_question, SelectionMode};
use memora_core::settings::ResolvedConfig;
use memora_core::stores::{
    AuthGate, EventStore, ExportService, ExportedPdf, MediaUploader, SettingsStore, StoreError,
    Upload,
};
use memora_core::types::DbId;
use memora_db::repositories::{EventRepo, MemoryRepo, SettingsRepo};
use memora_db::stores::store_error;
use memora_db::DbPool;

use crate::auth::password::{hash_password, verify_password};

// ---------------------------------------------------------------------------
// Memory book export
// ---------------------------------------------------------------------------

pub struct PdfExporter {
    pool: DbPool,
    settings: Arc<dyn SettingsStore>,
    events: Arc<dyn EventStore>,
}

impl PdfExporter {
    pub fn new(pool: DbPool, settings: Arc<dyn SettingsStore>, events: Arc<dyn EventStore>) -> Self {
        Self {
            pool,
            settings,
            events,
        }
    }
}

#[async_trait]
impl ExportService for PdfExporter {
    async fn render_pdf(&self, event_id: Option<DbId>) -> Result<ExportedPdf, StoreError> {
        let settings = self.settings.get().await?;
        let config = match event_id {
            Some(id) => ResolvedConfig::overlay(&settings, &self.events.get(id).await?),
            None => ResolvedConfig::from_settings(&settings),
        };

        let rows = MemoryRepo::list_for_export(&self.pool, event_id)
            .await
            .map_err(store_error)?;
        let pages: Vec<MemoryPage> = rows
            .into_iter()
            .map(|row| {
                let record = row.into_record();
                MemoryPage {
                    question: select_question(
                        record.tone,
                        &config.tone_questions,
                        SelectionMode::First,
                    ),
                    guest_name: record.guest_name,
                    photo: record.photo.map(String::from),
                    message: record.message,
                }
            })
            .collect();

        let count = pages.len();
        let bytes = tokio::task::spawn_blocking(move || render_memory_book(&pages))
            .await
            .map_err(|e| StoreError::Core(CoreError::Internal(format!("Export task failed: {e}"))))?
            .map_err(|e| StoreError::Core(CoreError::Internal(e.to_string())))?;

        tracing::info!(event_id = ?event_id, memories = count, bytes = bytes.len(), "Memory book rendered");
        Ok(ExportedPdf {
            filename: export_filename(&config.couple_names),
            bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Admin login
// ---------------------------------------------------------------------------

/// Checks the shared admin password against the stored Argon2 hash.
pub struct PasswordGate {
    pool: DbPool,
    /// Hashed and stored on first use when no hash exists yet.
    seed_password: String,
}

impl PasswordGate {
    pub fn new(pool: DbPool, seed_password: String) -> Self {
        Self {
            pool,
            seed_password,
        }
    }
}

#[async_trait]
impl AuthGate for PasswordGate {
    async fn login(&self, password: &str) -> Result<bool, StoreError> {
        let hash = match SettingsRepo::get_password_hash(&self.pool)
            .await
            .map_err(store_error)?
        {
            Some(hash) => hash,
            None => seed_admin_password(&self.pool, &self.seed_password).await?,
        };
        verify_password(password, &hash).map_err(|e| {
            StoreError::Core(CoreError::Internal(format!("Stored admin hash is unusable: {e}")))
        })
    }
}

/// Hash and store `password` as the admin password, returning the hash.
pub async fn seed_admin_password(pool: &DbPool, password: &str) -> Result<String, StoreError> {
    let hash = hash_password(password)
        .map_err(|e| StoreError::Core(CoreError::Internal(format!("Password hashing failed: {e}"))))?;
    SettingsRepo::set_password_hash(pool, &hash)
        .await
        .map_err(store_error)?;
    tracing::info!("Admin password hash stored");
    Ok(hash)
}

// ---------------------------------------------------------------------------
// Background upload
// ---------------------------------------------------------------------------

/// Stores uploaded backgrounds inline as data URLs on the settings or event row.
pub struct BackgroundUploader {
    pool: DbPool,
    max_bytes: usize,
}

impl BackgroundUploader {
    pub fn new(pool: DbPool, max_bytes: usize) -> Self {
        Self { pool, max_bytes }
    }
}

#[async_trait]
impl MediaUploader for BackgroundUploader {
    async fn upload_background(
        &self,
        event_id: Option<DbId>,
        file: Upload,
    ) -> Result<String, StoreError> {
        let content_type = validate_image_content_type(file.content_type.as_deref())?;
        if file.bytes.is_empty() {
            return Err(CoreError::Validation("Uploaded file is empty".to_string()).into());
        }
        if file.bytes.len() > self.max_bytes {
            return Err(CoreError::Validation(format!(
                "Uploaded file exceeds {} bytes",
                self.max_bytes
            ))
            .into());
        }

        let url = encode_data_url(content_type, &file.bytes);
        match event_id {
            Some(id) => {
                if !EventRepo::set_background(&self.pool, id, &url)
                    .await
                    .map_err(store_error)?
                {
                    return Err(StoreError::NotFound {
                        entity: "Event",
                        key: id.to_string(),
                    });
                }
            }
            None => {
                SettingsRepo::set_background(&self.pool, &url)
                    .await
                    .map_err(store_error)?;
            }
        }
        tracing::info!(event_id = ?event_id, content_type, bytes = file.bytes.len(), "Background uploaded");
        Ok(url)
    }
}
