//! # Session State
//!
//! Sessions opened by `login` and closed by `logout`.
//!
//! Commands never look a user up from ambient state: the front end resolves
//! its session handle here once and passes the `Session` value to each
//! command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(user, pass) ──► Session ──► SessionState::open                   │
//! │                           │                                             │
//! │                           ▼                                             │
//! │  front end keeps session_id; each action:                               │
//! │      SessionState::get(session_id) ──► &Session ──► command(.., &s, ..) │
//! │                                                                         │
//! │  logout(session_id) ──► SessionState::close                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use libris_core::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::ApiError;

/// Open sessions keyed by session id.
///
/// `Arc<Mutex<..>>` so clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    // A panic while holding the lock cannot leave the map half-written.
    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a freshly authenticated session.
    pub fn open(&self, session: Session) {
        self.sessions().insert(session.session_id, session);
    }

    /// Looks up an open session.
    ///
    /// ## Errors
    /// `UNAUTHORIZED` when the id is unknown or was logged out.
    pub fn get(&self, session_id: Uuid) -> Result<Session, ApiError> {
        self.sessions()
            .get(&session_id)
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))
    }

    /// Ends a session. Returns `false` if it was not open.
    pub fn close(&self, session_id: Uuid) -> bool {
        self.sessions().remove(&session_id).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.sessions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use libris_core::Role;

    fn session() -> Session {
        Session {
            session_id: Uuid::new_v4(),
            user_id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_get_close() {
        let state = SessionState::new();
        let s = session();
        let id = s.session_id;

        state.open(s.clone());
        assert_eq!(state.get(id).unwrap(), s);
        assert_eq!(state.active_count(), 1);

        assert!(state.close(id));
        assert!(!state.close(id));
        assert_eq!(state.get(id).unwrap_err().code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_clones_share_sessions() {
        let state = SessionState::new();
        let other = state.clone();
        let s = session();

        state.open(s.clone());
        assert!(other.get(s.session_id).is_ok());
    }
}
