//! In-memory registry of guest sessions.
//!
//! Each guest device holds a session id. Sessions live in process memory
//! only and expire after a period of inactivity; expired entries are
//! dropped lazily on the next lookup or insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use memora_core::error::CoreError;
use memora_core::session::GuestSession;
use uuid::Uuid;

/// Shared handle to one session.
///
/// The lock is never held across an `.await`; see [`lock_session`].
pub type SessionHandle = Arc<Mutex<GuestSession>>;

struct Entry {
    session: SessionHandle,
    last_seen: Instant,
}

pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register `session` and return its id and handle.
    pub fn insert(&self, session: GuestSession) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.evict_idle(&mut sessions);
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(
            id,
            Entry {
                session: Arc::clone(&handle),
                last_seen: Instant::now(),
            },
        );
        (id, handle)
    }

    /// Look up a live session and mark it as used.
    pub fn get(&self, id: Uuid) -> Result<SessionHandle, CoreError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let expired = match sessions.get_mut(&id) {
            Some(entry) if entry.last_seen.elapsed() < self.ttl => {
                entry.last_seen = Instant::now();
                return Ok(Arc::clone(&entry.session));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "Guest session expired");
        }
        Err(CoreError::NotFound {
            entity: "Session",
            key: id.to_string(),
        })
    }

    /// Forget a session. Returns `true` if it existed.
    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Drop every idle session. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.evict_idle(&mut sessions)
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Entry>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Purged idle guest sessions");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a session for a synchronous transition.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, GuestSession> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use memora_core::session::SessionState;
    use memora_core::settings::ResolvedConfig;

    fn session() -> GuestSession {
        GuestSession::new(Arc::new(ResolvedConfig::default()))
    }

    #[test]
    fn insert_then_get_returns_same_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = registry.insert(session());

        let handle = registry.get(id).unwrap();
        lock_session(&handle).set_name("Jamie").unwrap();

        let again = registry.get(id).unwrap();
        assert_eq!(lock_session(&again).state(), SessionState::NameEntered);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        assert_matches!(
            registry.get(Uuid::new_v4()),
            Err(CoreError::NotFound { entity: "Session", .. })
        );
    }

    #[test]
    fn idle_sessions_expire() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let (id, _) = registry.insert(session());
        assert!(registry.get(id).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_forgets_session() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (id, _) = registry.insert(session());
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn purge_drops_only_idle_sessions() {
        let live = SessionRegistry::new(Duration::from_secs(60));
        live.insert(session());
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);

        let idle = SessionRegistry::new(Duration::ZERO);
        idle.insert(session());
        assert_eq!(idle.purge_expired(), 1);
        assert!(idle.is_empty());
    }
}
