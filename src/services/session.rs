//! Opaque server-side session store. Tokens are random, never derived from
//! user data, and exist only in memory: restarting the server logs
//! everyone out.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a session after a successful credential check.
    pub fn create(&self, username: &str, role: Role) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.inner.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                role,
            },
        );
        token
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.inner.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(token).cloned()
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        let mut sessions = self.inner.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(token)
    }

    /// Point an existing session at a new username after a rename.
    pub fn rebind(&self, token: &str, username: &str) -> bool {
        let mut sessions = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(token) {
            Some(session) => {
                session.username = username.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_remove() {
        let store = SessionStore::new();
        let token = store.create("alice", Role::User);
        let session = store.get(&token).unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.role, Role::User);

        store.remove(&token);
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn tokens_are_unique() {
        let store = SessionStore::new();
        let a = store.create("alice", Role::User);
        let b = store.create("alice", Role::User);
        assert_ne!(a, b);
    }

    #[test]
    fn rebind_updates_username() {
        let store = SessionStore::new();
        let token = store.create("alice", Role::User);
        assert!(store.rebind(&token, "alicia"));
        assert_eq!(store.get(&token).unwrap().username, "alicia");
        assert!(!store.rebind("missing", "x"));
    }
}
