//! # User Repository
//!
//! Staff accounts, password hashing and login.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authenticate("admin", "admin123")                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM users WHERE username = ?                               │
//! │       │                                                                 │
//! │       ├── no row              → CoreError::InvalidCredentials           │
//! │       ├── argon2 mismatch     → CoreError::InvalidCredentials           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE users SET last_login_at = now                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Session { session_id, user_id, username, role, started_at }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passwords are stored as argon2 PHC strings (salt and parameters inside).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::SearchTerm;
use libris_core::validation::validate_password;
use libris_core::{CoreError, Role, Session, User, UserDraft};

const USER_COLUMNS: &str =
    "id, username, password_hash, email, full_name, role, created_at, last_login_at";

/// Username of the account created on first start.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the account created on first start. Operators are expected to
/// change it.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// All staff accounts ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");

        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Case-insensitive substring search over username, full name and email.
    pub async fn search(&self, term: &str) -> DbResult<Vec<User>> {
        let term = SearchTerm::new(term);
        if term.is_empty() {
            return self.list().await;
        }

        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|u| {
                term.matches([
                    Some(u.username.as_str()),
                    Some(u.full_name.as_str()),
                    Some(u.email.as_str()),
                ])
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Creates a staff account with a freshly hashed password.
    pub async fn create(&self, draft: UserDraft, password: &str) -> DbResult<User> {
        let draft = draft.validated()?;
        validate_password(password)?;
        debug!(username = %draft.username, role = %draft.role, "Creating user");

        let password_hash = hash_password(password)?;

        let sql = format!(
            r#"
            INSERT INTO users (username, password_hash, email, full_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&draft.username)
            .bind(&password_hash)
            .bind(&draft.email)
            .bind(&draft.full_name)
            .bind(draft.role)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_user_value(e.into(), &draft))?;

        info!(id = user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Edits a staff account. A blank or absent `new_password` keeps the
    /// current one.
    ///
    /// ## Errors
    /// * `CoreError::LastAdmin` - the edit would demote the only admin
    pub async fn update(
        &self,
        id: i64,
        draft: UserDraft,
        new_password: Option<&str>,
    ) -> DbResult<User> {
        let draft = draft.validated()?;
        let new_password = new_password.filter(|p| !p.is_empty());
        if let Some(password) = new_password {
            validate_password(password)?;
        }

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let current_role: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if current_role == Role::Admin && draft.role != Role::Admin {
            let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&mut *tx)
                .await?;
            if admins <= 1 {
                warn!(id, "Refusing to demote the last admin");
                return Err(CoreError::LastAdmin.into());
            }
        }

        let password_hash = new_password.map(hash_password).transpose()?;

        let sql = format!(
            r#"
            UPDATE users SET
                username = ?2, email = ?3, full_name = ?4, role = ?5,
                password_hash = COALESCE(?6, password_hash)
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&draft.username)
            .bind(&draft.email)
            .bind(&draft.full_name)
            .bind(draft.role)
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| duplicate_user_value(e.into(), &draft))?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id, role = %user.role, password_changed = new_password.is_some(), "User updated");
        Ok(user)
    }

    /// Deletes a staff account.
    ///
    /// ## Errors
    /// * `CoreError::SelfDelete` - `id` is the acting user
    /// * `CoreError::LastAdmin` - `id` is the only admin
    pub async fn delete(&self, id: i64, acting_user_id: i64) -> DbResult<()> {
        if id == acting_user_id {
            warn!(id, "Refusing to delete the current session's account");
            return Err(CoreError::SelfDelete.into());
        }

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let role: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if role == Role::Admin {
            let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&mut *tx)
                .await?;
            if admins <= 1 {
                warn!(id, "Refusing to delete the last admin");
                return Err(CoreError::LastAdmin.into());
            }
        }

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id, "User deleted");
        Ok(())
    }

    /// Verifies credentials and opens a session, stamping `last_login_at`.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Session> {
        let user = match self.get_by_username(username).await? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(username = %username.trim(), "Login failed");
                return Err(CoreError::InvalidCredentials.into());
            }
        };

        sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(user.id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        let session = Session::new(&user);
        info!(
            user_id = user.id,
            username = %user.username,
            role = %user.role,
            session_id = %session.session_id,
            "Login succeeded"
        );
        Ok(session)
    }

    /// Creates the default `admin` account when no admin exists.
    ///
    /// ## Returns
    /// `true` when an account was created.
    pub async fn ensure_default_admin(&self) -> DbResult<bool> {
        if self.admin_count().await? > 0 {
            return Ok(false);
        }

        let draft = UserDraft {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: "admin@library.com".to_string(),
            full_name: "System Administrator".to_string(),
            role: Role::Admin,
        };
        let user = self.create(draft, DEFAULT_ADMIN_PASSWORD).await?;

        warn!(
            user_id = user.id,
            "Created default admin account; change its password"
        );
        Ok(true)
    }

    pub async fn admin_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Picks which submitted value collided for the unique-violation message.
fn duplicate_user_value(err: DbError, draft: &UserDraft) -> DbError {
    match &err {
        DbError::UniqueViolation { field, .. } if field == "username" => {
            err.with_duplicate_value(&draft.username)
        }
        DbError::UniqueViolation { .. } => err.with_duplicate_value(&draft.email),
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn staff(username: &str) -> UserDraft {
        UserDraft {
            username: username.to_string(),
            email: format!("{username}@library.test"),
            full_name: "Desk Staff".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let db = test_support::db().await;

        assert!(db.users().ensure_default_admin().await.unwrap());
        assert!(!db.users().ensure_default_admin().await.unwrap());
        assert_eq!(db.users().admin_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_stamps_last_login() {
        let db = test_support::db().await;
        db.users().ensure_default_admin().await.unwrap();

        let session = db.users().authenticate("admin", "admin123").await.unwrap();
        assert!(session.is_admin());

        let user = db.users().get_by_id(session.user_id).await.unwrap().unwrap();
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let db = test_support::db().await;
        db.users().ensure_default_admin().await.unwrap();

        for (username, password) in [("admin", "nope"), ("ghost", "admin123")] {
            let err = db.users().authenticate(username, password).await.unwrap_err();
            assert!(matches!(err, DbError::Domain(CoreError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn test_create_validates_password_length() {
        let db = test_support::db().await;

        let err = db.users().create(staff("clerk"), "123").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_support::db().await;
        db.users().create(staff("clerk"), "password1").await.unwrap();

        let mut again = staff("clerk");
        again.email = "other@library.test".to_string();
        let err = db.users().create(again, "password1").await.unwrap_err();
        assert_eq!(err.to_string(), "Duplicate username: 'clerk' already exists");
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_blank() {
        let db = test_support::db().await;
        let user = db.users().create(staff("clerk"), "password1").await.unwrap();

        let mut draft = staff("clerk");
        draft.role = Role::Librarian;
        db.users().update(user.id, draft.clone(), Some("")).await.unwrap();
        assert!(db.users().authenticate("clerk", "password1").await.is_ok());

        db.users().update(user.id, draft, Some("changed!")).await.unwrap();
        assert!(db.users().authenticate("clerk", "password1").await.is_err());
        let session = db.users().authenticate("clerk", "changed!").await.unwrap();
        assert_eq!(session.role, Role::Librarian);
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let db = test_support::db().await;
        db.users().ensure_default_admin().await.unwrap();
        let admin = db.users().get_by_username("admin").await.unwrap().unwrap();
        let clerk = db.users().create(staff("clerk"), "password1").await.unwrap();

        let err = db.users().delete(admin.id, admin.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SelfDelete)));

        let err = db.users().delete(admin.id, clerk.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::LastAdmin)));

        let mut demote = staff("admin");
        demote.email = "admin@library.com".to_string();
        let err = db.users().update(admin.id, demote, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::LastAdmin)));

        db.users().delete(clerk.id, admin.id).await.unwrap();
        assert!(db.users().get_by_id(clerk.id).await.unwrap().is_none());
    }
}
