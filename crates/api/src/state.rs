use std::sync::{Arc, PoisonError, RwLock};

use memora_core::resolver::EventResolver;
use memora_core::settings::{ResolvedConfig, Settings};
use memora_core::stores::{
    AuthGate, EventStore, ExportService, MediaUploader, MemoryStore, SettingsStore,
};
use memora_db::stores::{PgEventStore, PgMemoryStore, PgSettingsStore};

use crate::config::ServerConfig;
use crate::services::{BackgroundUploader, PasswordGate, PdfExporter};
use crate::sessions::SessionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: memora_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    pub settings: Arc<dyn SettingsStore>,
    pub events: Arc<dyn EventStore>,
    pub memories: Arc<dyn MemoryStore>,
    pub export: Arc<dyn ExportService>,
    pub auth: Arc<dyn AuthGate>,
    pub media: Arc<dyn MediaUploader>,
    /// Live guest sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Last settings fetched successfully; the fallback when the store is down.
    last_settings: Arc<KnownSettings>,
}

impl AppState {
    /// Wire the PostgreSQL-backed collaborators.
    pub fn new(pool: memora_db::DbPool, config: ServerConfig) -> Self {
        let settings: Arc<dyn SettingsStore> = Arc::new(PgSettingsStore::new(pool.clone()));
        let events: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));
        let memories: Arc<dyn MemoryStore> = Arc::new(PgMemoryStore::new(pool.clone()));
        let export = Arc::new(PdfExporter::new(
            pool.clone(),
            Arc::clone(&settings),
            Arc::clone(&events),
        ));
        let auth = Arc::new(PasswordGate::new(pool.clone(), config.admin_password.clone()));
        let media = Arc::new(BackgroundUploader::new(pool.clone(), config.max_upload_bytes));
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl()));

        Self {
            pool,
            config: Arc::new(config),
            settings,
            events,
            memories,
            export,
            auth,
            media,
            sessions,
            last_settings: Arc::new(KnownSettings::default()),
        }
    }

    /// Resolve the guest configuration for an optional event code.
    ///
    /// Never fails: an unreachable store falls back to the last known
    /// settings, an unknown event to the global settings.
    ///
    /// Each call gets its own resolver, one per guest device, so concurrent
    /// guests never supersede each other.
    pub async fn resolve_config(&self, event_code: Option<&str>) -> Arc<ResolvedConfig> {
        let (seed, generation) = self.last_settings.snapshot();
        let resolver =
            EventResolver::with_defaults(Arc::clone(&self.settings), Arc::clone(&self.events), seed);
        let resolved = resolver.resolve(event_code).await.into_config();
        let known = resolver.known_settings();
        let config = resolved.unwrap_or_else(|| Arc::new(ResolvedConfig::from_settings(&known)));
        self.last_settings.store_if_current(generation, known);
        config
    }

    pub fn known_settings(&self) -> Settings {
        self.last_settings.snapshot().0
    }

    pub fn remember_settings(&self, settings: Settings) {
        self.last_settings.store(settings);
    }
}

/// Last known good settings, versioned so a slow read cannot clobber a
/// newer write.
#[derive(Debug, Default)]
struct KnownSettings {
    inner: RwLock<(Settings, u64)>,
}

impl KnownSettings {
    fn snapshot(&self) -> (Settings, u64) {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, settings: Settings) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.1 + 1;
        *guard = (settings, next);
    }

    /// Store only if nothing was stored since `generation` was read.
    fn store_if_current(&self, generation: u64, settings: Settings) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.1 != generation {
            tracing::debug!(generation, current = guard.1, "Discarding stale settings snapshot");
            return false;
        }
        if guard.0 != settings {
            *guard = (settings, generation + 1);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(couple_names: &str) -> Settings {
        Settings {
            couple_names: couple_names.into(),
            ..Settings::default()
        }
    }

    #[test]
    fn stale_snapshot_does_not_overwrite_newer_settings() {
        let known = KnownSettings::default();
        let (_, generation) = known.snapshot();

        // An admin update lands while a resolution is still fetching.
        known.store(named("Saved by admin"));

        assert!(!known.store_if_current(generation, named("Read before the update")));
        assert_eq!(known.snapshot().0.couple_names, "Saved by admin");
    }

    #[test]
    fn current_snapshot_is_stored() {
        let known = KnownSettings::default();
        let (_, generation) = known.snapshot();

        assert!(known.store_if_current(generation, named("Fetched")));
        let (settings, next) = known.snapshot();
        assert_eq!(settings.couple_names, "Fetched");
        assert_eq!(next, generation + 1);
    }

    #[test]
    fn unchanged_fallback_keeps_generation() {
        let known = KnownSettings::default();
        known.store(named("Fetched"));
        let (seed, generation) = known.snapshot();

        // A failed fetch hands back the seed unchanged.
        assert!(known.store_if_current(generation, seed));
        assert_eq!(known.snapshot().1, generation);
    }
}
