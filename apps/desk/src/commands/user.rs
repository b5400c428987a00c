//! # User Commands
//!
//! Staff account management. Every command here requires an admin session.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::state::DbState;
use libris_core::validation::validate_search_query;
use libris_core::{Session, User, UserDraft};

/// Staff account form. `password` is required on create; on edit a blank
/// password keeps the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(flatten)]
    pub user: UserDraft,
    #[serde(default)]
    pub password: String,
}

fn require_admin(session: &Session, action: &str) -> Result<(), ApiError> {
    session.require_admin(action).map_err(|e| {
        warn!(user_id = session.user_id, action, "Admin action refused");
        ApiError::from(e)
    })
}

pub async fn list_users(db: &DbState, session: &Session) -> Result<Vec<User>, ApiError> {
    require_admin(session, "listing users")?;
    Ok(db.inner().users().list().await?)
}

pub async fn search_users(
    db: &DbState,
    session: &Session,
    query: &str,
) -> Result<Vec<User>, ApiError> {
    require_admin(session, "searching users")?;
    let query = validate_search_query(query)?;
    Ok(db.inner().users().search(&query).await?)
}

pub async fn create_user(db: &DbState, session: &Session, form: UserForm) -> Result<User, ApiError> {
    require_admin(session, "creating users")?;
    Ok(db.inner().users().create(form.user, &form.password).await?)
}

pub async fn update_user(
    db: &DbState,
    session: &Session,
    id: i64,
    form: UserForm,
) -> Result<User, ApiError> {
    require_admin(session, "editing users")?;
    Ok(db
        .inner()
        .users()
        .update(id, form.user, Some(form.password.as_str()))
        .await?)
}

/// Deletes a staff account other than the session's own.
pub async fn delete_user(db: &DbState, session: &Session, id: i64) -> Result<(), ApiError> {
    require_admin(session, "deleting users")?;
    Ok(db.inner().users().delete(id, session.user_id).await?)
}
