//! Session registry: which live connection is joined as which user
//!
//! Every operation takes a single lock, so register/unregister/snapshot are
//! atomic with respect to each other regardless of which connection task
//! calls them.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{ChatError, ChatResult};
use crate::types::{ConnectionId, Roster, User};

/// Authoritative mapping from connection handle to joined user
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ConnectionId, User>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user` to `conn`, replacing any previous binding.
    ///
    /// Returns the user that was bound before, if any.
    pub fn register(&self, conn: ConnectionId, user: User) -> Option<User> {
        self.sessions.lock().insert(conn, user)
    }

    /// Like [`register`](Self::register), but refuses a name already held by
    /// a different connection. Check and insert happen under one lock.
    pub fn try_register(&self, conn: ConnectionId, user: User) -> ChatResult<Option<User>> {
        let mut sessions = self.sessions.lock();
        let taken = sessions
            .iter()
            .any(|(other, existing)| *other != conn && existing.name == user.name);
        if taken {
            return Err(ChatError::DuplicateName(user.name));
        }
        Ok(sessions.insert(conn, user))
    }

    /// Remove and return the user bound to `conn`.
    ///
    /// Safe to call for connections that never joined or already left.
    pub fn unregister(&self, conn: ConnectionId) -> Option<User> {
        self.sessions.lock().remove(&conn)
    }

    /// Remove the binding only if it is for a user with `name`.
    ///
    /// Returns `None` and leaves the registry untouched on a mismatch.
    pub fn unregister_named(&self, conn: ConnectionId, name: &str) -> Option<User> {
        let mut sessions = self.sessions.lock();
        match sessions.get(&conn) {
            Some(user) if user.name == name => sessions.remove(&conn),
            _ => None,
        }
    }

    /// User currently bound to `conn`
    pub fn user_for(&self, conn: ConnectionId) -> Option<User> {
        self.sessions.lock().get(&conn).cloned()
    }

    /// Deduplicated copy of all joined users at this instant
    pub fn snapshot(&self) -> Roster {
        self.sessions.lock().values().cloned().collect()
    }

    /// Number of joined connections
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
