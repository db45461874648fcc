//! In-memory session store.
//!
//! Sessions hold the append-only conversation history the core grounds
//! its answers in. The store owns the turns; the core only reads them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::chat::Turn;

const GREETING: &str = "Hi! Ask me anything about customer insights.";

struct Session {
    turns: Vec<Turn>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

/// Append-only per-session turn storage.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session, creating one (seeded with the greeting turn) when
    /// the id is absent or unknown. Returns the id and a history snapshot.
    pub fn resolve(&self, id: Option<Uuid>) -> (Uuid, Vec<Turn>) {
        let mut sessions = self.sessions.write();

        if let Some(id) = id {
            if let Some(session) = sessions.get(&id) {
                return (id, session.turns.clone());
            }
        }

        let id = id.unwrap_or_else(Uuid::new_v4);
        let session = Session {
            turns: vec![Turn::assistant(GREETING)],
            created_at: Utc::now(),
        };
        let turns = session.turns.clone();
        sessions.insert(id, session);
        (id, turns)
    }

    /// Append a turn to an existing session.
    pub fn append(&self, id: Uuid, turn: Turn) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(&id) {
            session.turns.push(turn);
        }
    }

    /// Number of turns currently held for a session.
    pub fn turn_count(&self, id: Uuid) -> usize {
        self.sessions
            .read()
            .get(&id)
            .map(|s| s.turns.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    #[test]
    fn test_new_session_starts_with_greeting() {
        let store = SessionStore::new();
        let (id, turns) = store.resolve(None);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(store.turn_count(id), 1);
    }

    #[test]
    fn test_history_is_append_only() {
        let store = SessionStore::new();
        let (id, _) = store.resolve(None);

        store.append(id, Turn::user("how many customers?"));
        store.append(id, Turn::assistant("42"));

        let (_, turns) = store.resolve(Some(id));
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].content, "how many customers?");
        assert_eq!(turns[2].content, "42");
    }

    #[test]
    fn test_unknown_id_creates_fresh_session() {
        let store = SessionStore::new();
        let ghost = Uuid::new_v4();
        let (id, turns) = store.resolve(Some(ghost));
        assert_eq!(id, ghost);
        assert_eq!(turns.len(), 1);
    }
}
