use std::time::Instant;

use log::debug;

use crate::core_session::session::Session;

/// In-memory set of sessions, keyed by the client's durable token.
///
/// The registry exists so a session survives a dropped connection, not to
/// serve concurrent clients: the accept loop is its single writer. It is the
/// only place sessions are created or removed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.session_id() == session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.iter().any(|s| s.session_id() == session_id)
    }

    /// Registers a fresh session for a previously-unknown token.
    pub fn create(&mut self, session_id: String, started_at: Instant) -> &mut Session {
        debug!("Registering session {}", session_id);
        self.sessions.push(Session::new(session_id, started_at));
        self.sessions
            .last_mut()
            .expect("session was just pushed")
    }

    /// Filtered removal, a no-op for unknown tokens.
    pub fn remove(&mut self, session_id: &str) {
        self.sessions.retain(|s| s.session_id() != session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.session_id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_finds_by_token() {
        let mut registry = SessionRegistry::new();
        assert!(!registry.contains("tok-1"));
        registry.create("tok-1".to_string(), Instant::now());
        assert!(registry.contains("tok-1"));
        assert!(registry.find("tok-1").is_some());
        assert!(registry.find("tok-2").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removal_is_filtered_and_idempotent() {
        let mut registry = SessionRegistry::new();
        registry.create("tok-1".to_string(), Instant::now());
        registry.create("tok-2".to_string(), Instant::now());
        registry.remove("tok-1");
        assert!(!registry.contains("tok-1"));
        assert!(registry.contains("tok-2"));
        registry.remove("tok-1");
        assert_eq!(registry.len(), 1);
    }
}
