use chrono::{DateTime, Utc};
use lookbook_core::Session;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared handle to one session. Holding the lock serializes every mutation
/// of that session; other sessions are unaffected.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Outcome of [`SessionStore::get_or_create`].
pub enum SessionLookup {
    Found(SessionHandle),
    Created(SessionHandle),
}

impl SessionLookup {
    pub fn into_handle(self) -> SessionHandle {
        match self {
            SessionLookup::Found(h) | SessionLookup::Created(h) => h,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, SessionLookup::Created(_))
    }
}

/// Mapping from session id to session state.
pub trait SessionStore: Send + Sync {
    /// Look up `id`, creating a fresh session when it is unknown.
    fn get_or_create(&self, id: &str) -> SessionLookup;

    /// Look up `id` without creating it.
    fn get(&self, id: &str) -> Option<SessionHandle>;

    /// Create a session under a newly generated id.
    fn create(&self) -> (String, SessionHandle);

    fn remove(&self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions created before `cutoff`; returns how many were dropped.
    fn evict_created_before(&self, cutoff: DateTime<Utc>) -> usize;
}

struct SessionSlot {
    handle: SessionHandle,
    created_at: DateTime<Utc>,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            created_at: session.created(),
            handle: Arc::new(Mutex::new(session)),
        }
    }
}

/// Single-process session table.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prepared session, replacing any session with the same id.
    pub fn insert(&self, session: Session) -> SessionHandle {
        let slot = SessionSlot::new(session);
        let handle = slot.handle.clone();
        let id = handle.lock().id().to_string();
        self.sessions.write().insert(id, slot);
        handle
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id: &str) -> SessionLookup {
        if let Some(handle) = self.get(id) {
            return SessionLookup::Found(handle);
        }

        let mut sessions = self.sessions.write();
        // Another request may have created it between the two locks.
        if let Some(slot) = sessions.get(id) {
            return SessionLookup::Found(slot.handle.clone());
        }
        let slot = SessionSlot::new(Session::new(id));
        let handle = slot.handle.clone();
        sessions.insert(id.to_string(), slot);
        debug!(session_id = id, "session created");
        SessionLookup::Created(handle)
    }

    #[inline]
    fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(id).map(|slot| slot.handle.clone())
    }

    fn create(&self) -> (String, SessionHandle) {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if let SessionLookup::Created(handle) = self.get_or_create(&id) {
                return (id, handle);
            }
        }
    }

    fn remove(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }

    fn evict_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, slot| slot.created_at >= cutoff);
        before - sessions.len()
    }
}

/// Periodically evict sessions older than `ttl`.
pub fn spawn_session_reaper(
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    interval: Duration,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("session-reaper".to_string())
        .spawn(move || {
            let ttl = match chrono::Duration::from_std(ttl) {
                Ok(ttl) => ttl,
                Err(e) => {
                    warn!(error = %e, "session ttl out of range, reaper disabled");
                    return;
                }
            };
            loop {
                std::thread::sleep(interval);
                let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
                    continue;
                };
                let evicted = store.evict_created_before(cutoff);
                if evicted > 0 {
                    info!(evicted, remaining = store.len(), "expired sessions evicted");
                }
            }
        })
}
