#![cfg(feature = "web")]

//! Per-browser sessions holding the uploaded dataset.
//!
//! Each browser gets a random `session` cookie on its first upload. The dataset it
//! uploads lives only in that session and expires with it.

use crate::record::Dataset;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Session data
///
/// Holds the dataset uploaded in this session, if any, and when the session lapses.
#[derive(Debug, Clone)]
pub struct Session {
    pub dataset: Option<Arc<Dataset>>,
    pub expires_at: SystemTime,
}

/// All live sessions, keyed by session id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a session with no dataset
    ///
    /// # Returns
    /// * `String` - A unique session ID
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            dataset: None,
            expires_at: SystemTime::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Whether `session_id` names a session that has not expired.
    pub fn is_valid(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(session_id)
            .is_some_and(|s| s.expires_at > SystemTime::now())
    }

    /// The dataset of a live session. Accessing a session extends its lifetime.
    pub fn dataset(&self, session_id: &str) -> Option<Arc<Dataset>> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get_mut(session_id)?;
        if session.expires_at <= now {
            sessions.remove(session_id);
            return None;
        }
        session.expires_at = now + self.ttl;
        session.dataset.clone()
    }

    /// Install `dataset` as the session's dataset, replacing any previous one.
    ///
    /// Creates the session if it does not exist yet.
    pub fn replace_dataset(&self, session_id: &str, dataset: Dataset) {
        let session = Session {
            dataset: Some(Arc::new(dataset)),
            expires_at: SystemTime::now() + self.ttl,
        };
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session_id.to_string(), session);
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_dataset;

    #[test]
    fn new_session_has_no_dataset() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create();
        assert!(store.is_valid(&id));
        assert!(store.dataset(&id).is_none());
        assert!(!store.is_valid("not-a-session"));
    }

    #[test]
    fn replace_dataset_swaps_whole_dataset() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create();
        store.replace_dataset(&id, sample_dataset());
        assert_eq!(store.dataset(&id).map(|d| d.len()), Some(3));

        store.replace_dataset(&id, Dataset::default());
        assert_eq!(store.dataset(&id).map(|d| d.len()), Some(0));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.create();
        let b = store.create();
        store.replace_dataset(&a, sample_dataset());
        assert!(store.dataset(&b).is_none());
    }

    #[test]
    fn expired_sessions_are_purged() {
        let store = SessionStore::new(Duration::ZERO);
        let id = store.create();
        store.create();
        assert!(!store.is_valid(&id));
        assert!(store.dataset(&id).is_none());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }
}
