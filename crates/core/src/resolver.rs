//! Event resolution: merge an event's overrides over the global settings.
//!
//! Resolution never fails. An unreachable settings store leaves the last
//! known good settings in place; an unknown, inactive, or unreachable event
//! falls back to the global settings with no event attached.
//!
//! Concurrent `resolve` calls are last-request-wins: a call that completes
//! after a newer one has started returns [`Resolution::Superseded`] and does
//! not publish its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::event_code::normalize_event_code;
use crate::settings::{EventProfile, ResolvedConfig, Settings};
use crate::stores::{EventStore, SettingsStore};

/// Whether a configuration is available yet.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(Arc<ResolvedConfig>),
}

impl LoadState {
    pub fn config(&self) -> Option<&Arc<ResolvedConfig>> {
        match self {
            Self::Loading => None,
            Self::Ready(cfg) => Some(cfg),
        }
    }
}

/// Outcome of one [`EventResolver::resolve`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Arc<ResolvedConfig>),
    /// A newer request started before this one finished.
    Superseded,
}

impl Resolution {
    pub fn into_config(self) -> Option<Arc<ResolvedConfig>> {
        match self {
            Self::Resolved(cfg) => Some(cfg),
            Self::Superseded => None,
        }
    }
}

pub struct EventResolver {
    settings: Arc<dyn SettingsStore>,
    events: Arc<dyn EventStore>,
    /// Last successfully fetched settings.
    defaults: RwLock<Settings>,
    latest: AtomicU64,
    state: watch::Sender<LoadState>,
}

impl EventResolver {
    pub fn new(settings: Arc<dyn SettingsStore>, events: Arc<dyn EventStore>) -> Self {
        Self::with_defaults(settings, events, Settings::default())
    }

    /// Start with explicit fallback settings instead of the product defaults.
    pub fn with_defaults(
        settings: Arc<dyn SettingsStore>,
        events: Arc<dyn EventStore>,
        defaults: Settings,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::Loading);
        Self {
            settings,
            events,
            defaults: RwLock::new(defaults),
            latest: AtomicU64::new(0),
            state,
        }
    }

    /// Resolve the configuration for `event_code` (or the global settings).
    pub async fn resolve(&self, event_code: Option<&str>) -> Resolution {
        let request = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(LoadState::Loading);

        let code = event_code.and_then(|raw| {
            let code = normalize_event_code(raw);
            if code.is_none() && !raw.trim().is_empty() {
                tracing::warn!(event_code = raw, "Ignoring malformed event code");
            }
            code
        });

        let (settings, event) = tokio::join!(self.fetch_settings(), async {
            match &code {
                Some(code) => self.fetch_event(code).await,
                None => None,
            }
        });

        let config = Arc::new(match &event {
            Some(event) => ResolvedConfig::overlay(&settings, event),
            None => ResolvedConfig::from_settings(&settings),
        });

        if self.latest.load(Ordering::SeqCst) != request {
            tracing::debug!(request, "Discarding superseded resolution");
            return Resolution::Superseded;
        }
        self.state.send_replace(LoadState::Ready(Arc::clone(&config)));
        Resolution::Resolved(config)
    }

    /// Current load state.
    pub fn status(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// The most recently published configuration, if any.
    pub fn current(&self) -> Option<Arc<ResolvedConfig>> {
        self.state.borrow().config().cloned()
    }

    /// Wait until a configuration is published.
    pub async fn ready(&self) -> Arc<ResolvedConfig> {
        let mut rx = self.state.subscribe();
        let outcome = rx
            .wait_for(|s| matches!(s, LoadState::Ready(_)))
            .await
            .ok()
            .and_then(|s| s.config().cloned());
        // The sender lives in `self`, so the channel cannot close while we wait.
        outcome.unwrap_or_else(|| {
            Arc::new(ResolvedConfig::from_settings(&self.known_settings()))
        })
    }

    /// Replace the fallback settings wholesale, e.g. after an admin update.
    pub fn replace_defaults(&self, settings: Settings) {
        *self.defaults.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    async fn fetch_settings(&self) -> Settings {
        match self.settings.get().await {
            Ok(settings) => {
                self.replace_defaults(settings.clone());
                settings
            }
            Err(e) => {
                tracing::warn!(error = %e, "Settings fetch failed, using last known settings");
                self.known_settings()
            }
        }
    }

    async fn fetch_event(&self, code: &str) -> Option<EventProfile> {
        match self.events.get_by_code(code).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                tracing::warn!(event_code = code, "Event not found, using global settings");
                None
            }
            Err(e) => {
                tracing::warn!(event_code = code, error = %e, "Event fetch failed, using global settings");
                None
            }
        }
    }

    /// Last successfully fetched settings, or the seeded defaults.
    pub fn known_settings(&self) -> Settings {
        self.defaults.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
