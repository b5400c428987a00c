//! # Issue Repository
//!
//! Circulation: lending copies, taking them back, and the reads that judge
//! lateness.
//!
//! ## Issue / Return Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue_book(book 7, member 3, due_at)                                   │
//! │    BEGIN                                                                │
//! │      SELECT book, member          → NotFound if either is missing       │
//! │      check_can_issue()            → NoCopiesAvailable / MemberNotActive │
//! │      UPDATE books SET available_copies = available_copies - 1           │
//! │        WHERE id = 7 AND available_copies > 0                            │
//! │      INSERT INTO book_issues (..., status = 'issued')                   │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  return_book(issue 12, fine 2.50)                                       │
//! │    BEGIN                                                                │
//! │      SELECT issue                 → NotFound / AlreadyReturned          │
//! │      UPDATE book_issues SET status = 'returned', returned_at, fine      │
//! │      UPDATE books SET available_copies = MIN(available + 1, total)      │
//! │      INSERT INTO fines (...)      only when fine > 0                    │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before `COMMIT` drops the transaction, which rolls it back.
//!
//! ## Overdue
//! Nothing here writes `overdue`. Reads take an `as_of` instant and report a
//! loan as overdue when it is `issued` and `due_at < as_of`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::book::BOOK_COLUMNS;
use crate::repository::member::MEMBER_COLUMNS;
use libris_core::circulation::{check_can_issue, check_can_return};
use libris_core::validation::validate_fine;
use libris_core::{
    Book, CirculationPolicy, CoreError, DashboardStats, Fine, Issue, IssueListing, Member, Money,
    ValidationError,
};

const ISSUE_COLUMNS: &str =
    "id, book_id, member_id, issued_at, due_at, returned_at, fine_cents, status, issued_by";

pub(crate) const FINE_COLUMNS: &str =
    "id, issue_id, amount_cents, fined_at, paid_at, payment_status";

const LISTING_SELECT: &str = r#"
    SELECT
        i.id,
        i.book_id,
        b.title AS book_title,
        i.member_id,
        m.first_name || ' ' || m.last_name AS member_name,
        i.issued_at,
        i.due_at,
        i.returned_at,
        i.fine_cents,
        i.status
    FROM book_issues i
    JOIN books b ON b.id = i.book_id
    JOIN members m ON m.id = i.member_id
"#;

/// SQL predicate for "overdue at ?1", matching `circulation::effective_status`.
const OVERDUE_AT_1: &str =
    "(i.status = 'overdue' OR (i.status = 'issued' AND julianday(i.due_at) < julianday(?1)))";

/// Which issues a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueFilter {
    #[default]
    All,
    /// Copies still out, late or not.
    Active,
    /// Copies out and past due.
    Overdue,
    Returned,
}

impl std::str::FromStr for IssueFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(IssueFilter::All),
            "active" => Ok(IssueFilter::Active),
            "overdue" => Ok(IssueFilter::Overdue),
            "returned" => Ok(IssueFilter::Returned),
            _ => Err(ValidationError::NotAllowed {
                field: "filter".to_string(),
                allowed: ["all", "active", "overdue", "returned"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// What a return produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnOutcome {
    pub issue: Issue,
    /// The unpaid fine raised by this return, if the fine was non-zero.
    pub fine: Option<Fine>,
}

#[derive(Debug, Clone)]
pub struct IssueRepository {
    pool: SqlitePool,
}

impl IssueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IssueRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Lends one copy of a book to a member.
    ///
    /// ## Arguments
    /// * `due_at` - When the copy is due back; must not be before now
    /// * `issued_by` - Acting staff user, from the session
    /// * `policy` - Decides whether inactive members may borrow
    ///
    /// ## Errors
    /// * `DbError::NotFound` - book or member does not exist
    /// * `CoreError::NoCopiesAvailable` - every copy is out
    /// * `CoreError::MemberNotActive` - policy requires an active member
    pub async fn issue_book(
        &self,
        book_id: i64,
        member_id: i64,
        due_at: DateTime<Utc>,
        issued_by: Option<i64>,
        policy: &CirculationPolicy,
    ) -> DbResult<Issue> {
        let issued_at = Utc::now();
        if due_at < issued_at {
            return Err(ValidationError::InvalidFormat {
                field: "due_at".to_string(),
                reason: "must not be in the past".to_string(),
            }
            .into());
        }

        debug!(book_id, member_id, due_at = %due_at, "Issuing book");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Book", book_id))?;

        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"
        ))
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Member", member_id))?;

        if let Err(err) = check_can_issue(&book, &member, policy) {
            warn!(book_id, member_id, error = %err, "Issue rejected");
            return Err(err.into());
        }

        // Conditional so the count cannot go negative even if it moved
        // since the read above.
        let decremented = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1
            WHERE id = ?1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(CoreError::NoCopiesAvailable {
                book_id,
                title: book.title,
            }
            .into());
        }

        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            INSERT INTO book_issues (book_id, member_id, issued_at, due_at, fine_cents, status, issued_by)
            VALUES (?1, ?2, ?3, ?4, 0, 'issued', ?5)
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(book_id)
        .bind(member_id)
        .bind(issued_at)
        .bind(due_at)
        .bind(issued_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            issue_id = issue.id,
            book_id,
            member_id,
            available = book.available_copies - 1,
            due_at = %issue.due_at,
            "Book issued"
        );
        Ok(issue)
    }

    /// Takes a copy back, recording `fine` on the issue and raising an
    /// unpaid Fine when it is non-zero.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such issue
    /// * `CoreError::AlreadyReturned` - the issue is already closed
    /// * `ValidationError::Negative` - negative fine
    pub async fn return_book(&self, issue_id: i64, fine: Money) -> DbResult<ReturnOutcome> {
        let fine = validate_fine(fine)?;
        debug!(issue_id, fine = %fine, "Returning book");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM book_issues WHERE id = ?1"
        ))
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Issue", issue_id))?;

        if let Err(err) = check_can_return(&issue) {
            warn!(issue_id, "Return rejected: already returned");
            return Err(err.into());
        }

        let returned_at = Utc::now();

        let issue = sqlx::query_as::<_, Issue>(&format!(
            r#"
            UPDATE book_issues
            SET status = 'returned', returned_at = ?2, fine_cents = ?3
            WHERE id = ?1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue_id)
        .bind(returned_at)
        .bind(fine.cents())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE books SET available_copies = MIN(available_copies + 1, total_copies)
            WHERE id = ?1
            "#,
        )
        .bind(issue.book_id)
        .execute(&mut *tx)
        .await?;

        let fine_row = if fine.is_positive() {
            let row = sqlx::query_as::<_, Fine>(&format!(
                r#"
                INSERT INTO fines (issue_id, amount_cents, fined_at, payment_status)
                VALUES (?1, ?2, ?3, 'unpaid')
                RETURNING {FINE_COLUMNS}
                "#
            ))
            .bind(issue_id)
            .bind(fine.cents())
            .bind(returned_at)
            .fetch_one(&mut *tx)
            .await?;
            Some(row)
        } else {
            None
        };

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            issue_id,
            book_id = issue.book_id,
            fine = %fine,
            fine_id = ?fine_row.as_ref().map(|f| f.id),
            "Book returned"
        );
        Ok(ReturnOutcome {
            issue,
            fine: fine_row,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Issue>> {
        let issue = sqlx::query_as::<_, Issue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM book_issues WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(issue)
    }

    /// Issues matching `filter`, newest first, with effective status at
    /// `as_of`.
    pub async fn list(
        &self,
        filter: IssueFilter,
        as_of: DateTime<Utc>,
    ) -> DbResult<Vec<IssueListing>> {
        let condition = match filter {
            IssueFilter::All => "1 = 1",
            IssueFilter::Active => "i.status IN ('issued', 'overdue')",
            IssueFilter::Overdue => OVERDUE_AT_1,
            IssueFilter::Returned => "i.status = 'returned'",
        };

        let sql =
            format!("{LISTING_SELECT} WHERE {condition} ORDER BY i.issued_at DESC, i.id DESC");

        let mut query = sqlx::query_as::<_, IssueListing>(&sql);
        if filter == IssueFilter::Overdue {
            query = query.bind(as_of);
        }
        let rows = query.fetch_all(&self.pool).await?;

        debug!(?filter, count = rows.len(), "Listed issues");
        Ok(rows
            .into_iter()
            .map(|row| row.with_effective_status(as_of))
            .collect())
    }

    /// Loans of one member, newest first.
    pub async fn for_member(
        &self,
        member_id: i64,
        as_of: DateTime<Utc>,
    ) -> DbResult<Vec<IssueListing>> {
        let sql = format!(
            "{LISTING_SELECT} WHERE i.member_id = ?1 ORDER BY i.issued_at DESC, i.id DESC"
        );

        let rows = sqlx::query_as::<_, IssueListing>(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.with_effective_status(as_of))
            .collect())
    }

    /// The latest `limit` issues for the dashboard.
    pub async fn recent(&self, limit: u32, as_of: DateTime<Utc>) -> DbResult<Vec<IssueListing>> {
        let sql = format!("{LISTING_SELECT} ORDER BY i.issued_at DESC, i.id DESC LIMIT ?1");

        let rows = sqlx::query_as::<_, IssueListing>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.with_effective_status(as_of))
            .collect())
    }

    /// Headline counts for the dashboard at `as_of`.
    ///
    /// `issued_now` and `overdue_now` split the active loans: a loan past due
    /// counts as overdue even though its stored status is `issued`.
    pub async fn dashboard_stats(&self, as_of: DateTime<Utc>) -> DbResult<DashboardStats> {
        let sql = format!(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_copies), 0) FROM books),
                (SELECT COUNT(*) FROM members),
                (SELECT COUNT(*) FROM book_issues i
                    WHERE i.status IN ('issued', 'overdue') AND NOT {OVERDUE_AT_1}),
                (SELECT COUNT(*) FROM book_issues i WHERE {OVERDUE_AT_1})
            "#
        );

        let (total_books, total_members, issued_now, overdue_now): (i64, i64, i64, i64) =
            sqlx::query_as(&sql)
                .bind(as_of)
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardStats {
            total_books,
            total_members,
            issued_now,
            overdue_now,
        })
    }

    /// Fine to propose for returning `issue_id` at `as_of` under `policy`.
    pub async fn suggest_fine(
        &self,
        issue_id: i64,
        policy: &CirculationPolicy,
        as_of: DateTime<Utc>,
    ) -> DbResult<Money> {
        let issue = self
            .get_by_id(issue_id)
            .await?
            .ok_or_else(|| DbError::not_found("Issue", issue_id))?;

        Ok(policy.suggested_fine(issue.due_at, as_of))
    }
}
