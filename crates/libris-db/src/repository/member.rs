//! # Member Repository
//!
//! Library patrons. A member holding books cannot be deleted; once every
//! loan is returned, deleting the member removes their loan history too.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::SearchTerm;
use libris_core::{CoreError, Member, MemberDraft};

pub(crate) const MEMBER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, status, joined_at";

#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// All members ordered by first then last name.
    pub async fn list(&self) -> DbResult<Vec<Member>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY first_name, last_name, id"
        );

        let members = sqlx::query_as::<_, Member>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(members)
    }

    /// Case-insensitive substring search over name, email and phone.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Member>> {
        let term = SearchTerm::new(term);
        if term.is_empty() {
            return self.list().await;
        }

        debug!(?term, "Searching members");

        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|m| {
                term.matches([
                    Some(m.first_name.as_str()),
                    Some(m.last_name.as_str()),
                    Some(m.email.as_str()),
                    m.phone.as_deref(),
                ])
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1");

        let member = sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    /// Registers a member, stamping the join date.
    pub async fn create(&self, draft: MemberDraft) -> DbResult<Member> {
        let draft = draft.validated()?;
        debug!(email = %draft.email, "Registering member");

        let sql = format!(
            r#"
            INSERT INTO members (first_name, last_name, email, phone, address, status, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {MEMBER_COLUMNS}
            "#
        );

        let member = sqlx::query_as::<_, Member>(&sql)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .bind(&draft.address)
            .bind(draft.status)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(&draft.email))?;

        info!(id = member.id, "Member registered");
        Ok(member)
    }

    pub async fn update(&self, id: i64, draft: MemberDraft) -> DbResult<Member> {
        let draft = draft.validated()?;
        debug!(id, status = %draft.status, "Updating member");

        let sql = format!(
            r#"
            UPDATE members SET
                first_name = ?2, last_name = ?3, email = ?4,
                phone = ?5, address = ?6, status = ?7
            WHERE id = ?1
            RETURNING {MEMBER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .bind(&draft.address)
            .bind(draft.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(&draft.email))?
            .ok_or_else(|| DbError::not_found("Member", id))
    }

    /// Deletes a member with no books out.
    ///
    /// ## Errors
    /// * `DbError::Domain(CoreError::HasActiveIssues)` - member still holds
    ///   `issued` or `overdue` copies
    /// * `DbError::NotFound` - no such member
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_issues WHERE member_id = ?1 AND status IN ('issued', 'overdue')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            warn!(id, active, "Refusing to delete member with active issues");
            return Err(CoreError::HasActiveIssues {
                entity: "member".to_string(),
                id,
                active,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM members WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id, "Member deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
