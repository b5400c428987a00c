//! # Auth Commands
//!
//! Login gate. Every other command that needs a principal takes the
//! `Session` returned here.

use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{DbState, SessionState};
use libris_core::validation::validate_required;
use libris_core::Session;

/// Verifies credentials and opens a session.
///
/// ## Errors
/// * `UNAUTHORIZED` - unknown user or wrong password (same message for both)
/// * `VALIDATION_ERROR` - blank username or password
pub async fn login(
    db: &DbState,
    sessions: &SessionState,
    username: &str,
    password: &str,
) -> Result<Session, ApiError> {
    let username = validate_required("username", username, 50)?;
    if password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let session = db.inner().users().authenticate(&username, password).await?;
    sessions.open(session.clone());

    Ok(session)
}

/// Closes a session.
pub fn logout(sessions: &SessionState, session_id: Uuid) -> Result<(), ApiError> {
    if !sessions.close(session_id) {
        return Err(ApiError::unauthorized("Not logged in"));
    }

    info!(%session_id, "Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_login_and_logout() {
        let db = DbState::in_memory().await.unwrap();
        let sessions = SessionState::new();

        let session = login(&db, &sessions, "admin", "admin123").await.unwrap();
        assert!(session.is_admin());
        assert!(sessions.get(session.session_id).is_ok());

        logout(&sessions, session.session_id).unwrap();
        assert_eq!(
            logout(&sessions, session.session_id).unwrap_err().code,
            ErrorCode::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let db = DbState::in_memory().await.unwrap();
        let sessions = SessionState::new();

        let err = login(&db, &sessions, "admin", "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = login(&db, &sessions, "  ", "x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(sessions.active_count(), 0);
    }
}
