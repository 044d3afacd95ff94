#![cfg(feature = "web")]
use crate::listing::CleanedTable;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// The cleaned table one browser is working with.
#[derive(Debug, Clone)]
pub struct Session {
    /// Table of the most recent upload
    pub table: Arc<CleanedTable>,

    /// Time when the session expires
    pub expires_at: Instant,
}

/// Per-browser tables, keyed by the `session` cookie.
///
/// Tables are never mutated once stored: a new upload replaces the `Arc`, and any
/// request still holding the previous one keeps a consistent view. At most
/// `max_sessions` sessions are live at once; storing past that evicts the session
/// closest to expiry.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Stores `table` for `session_id`, replacing any earlier upload, and drops
    /// sessions that have expired.
    pub fn store(&self, session_id: &str, table: CleanedTable) -> Arc<CleanedTable> {
        let now = Instant::now();
        let table = Arc::new(table);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, session| session.expires_at > now);

        while !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.expires_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!("session limit {} reached, evicting {}", self.max_sessions, id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }
        sessions.insert(
            session_id.to_string(),
            Session {
                table: Arc::clone(&table),
                expires_at: now + self.ttl,
            },
        );

        table
    }

    /// The session's table, if it has one and has not expired.
    pub fn table(&self, session_id: &str) -> Option<Arc<CleanedTable>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(session_id)
            .filter(|session| session.expires_at > Instant::now())
            .map(|session| Arc::clone(&session.table))
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
