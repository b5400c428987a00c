//! # Session
//!
//! The logged-in operator, passed explicitly to every command that needs to
//! know who is acting.
//!
//! ```text
//! login(username, password)
//!      │
//!      ▼
//! Session { session_id, user_id, username, role, started_at }
//!      │
//!      ├──► issue_book(&session, ..)     records issued_by = user_id
//!      └──► create_user(&session, ..)    session.require_admin()?
//! ```
//!
//! A session is a plain value. There is no global "current user".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};

/// An authenticated operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for a user whose credentials were just verified.
    pub fn new(user: &User) -> Self {
        Session {
            session_id: Uuid::new_v4(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            started_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`CoreError::Forbidden`] unless the session is an admin.
    ///
    /// `action` names the attempted operation for the error message.
    pub fn require_admin(&self, action: &str) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                action: action.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: 5,
            username: "clerk".to_string(),
            password_hash: String::new(),
            email: "clerk@library.test".to_string(),
            full_name: "Desk Clerk".to_string(),
            role,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_new_session_copies_principal() {
        let session = Session::new(&user(Role::Librarian));
        assert_eq!(session.user_id, 5);
        assert_eq!(session.username, "clerk");
        assert_eq!(session.role, Role::Librarian);
        assert!(!session.is_admin());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let u = user(Role::Staff);
        assert_ne!(Session::new(&u).session_id, Session::new(&u).session_id);
    }

    #[test]
    fn test_require_admin() {
        assert!(Session::new(&user(Role::Admin)).require_admin("create user").is_ok());

        let err = Session::new(&user(Role::Staff))
            .require_admin("create user")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: create user requires an admin session"
        );
    }
}
