use crate::api::InstagramSession;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Opaque per-browser key carried in the session cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn generate() -> Self {
        SessionKey(Uuid::new_v4().simple().to_string())
    }

    /// Accepts only keys shaped like the ones `generate` hands out.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Uuid::try_parse(raw)
            .ok()
            .map(|id| SessionKey(id.simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to correlate log lines without leaking the whole key.
        write!(f, "SessionKey({}…)", &self.0[..8])
    }
}

/// Per-caller storage for signed-in API sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &SessionKey) -> Option<Arc<InstagramSession>>;

    /// Stores a session under `key`. Sessions without an access token are refused.
    async fn save(&self, key: SessionKey, session: InstagramSession) -> AppResult<()>;

    /// Drops expired entries and returns how many were removed.
    async fn purge_expired(&self) -> usize;
}

struct Entry {
    session: Arc<InstagramSession>,
    last_seen: DateTime<Utc>,
}

/// In-process store with a sliding idle timeout.
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionKey, Entry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        MemorySessionStore {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or(0)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.ttl
    }

    #[cfg(test)]
    async fn backdate(&self, key: &SessionKey, by: Duration) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.last_seen -= by;
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Option<Arc<InstagramSession>> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let expired = self.is_expired(entries.get(key)?, now);
        if expired {
            debug!("Session {:?} expired", key);
            entries.remove(key);
            return None;
        }

        let entry = entries.get_mut(key)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.session))
    }

    async fn save(&self, key: SessionKey, session: InstagramSession) -> AppResult<()> {
        if !session.is_authenticated() {
            return Err(AppError::NotAuthenticated);
        }

        debug!("Storing session {:?}", key);
        self.entries.write().await.insert(
            key,
            Entry {
                session: Arc::new(session),
                last_seen: Utc::now(),
            },
        );
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }
}
