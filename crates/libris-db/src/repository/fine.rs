//! # Fine Repository
//!
//! Fines are only ever created by `IssueRepository::return_book`; this
//! repository lists them and records payment.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::issue::FINE_COLUMNS;
use libris_core::{CoreError, Fine, FineListing, Money, PaymentStatus};

const FINE_LISTING_SELECT: &str = r#"
    SELECT
        f.id,
        f.issue_id,
        i.member_id,
        m.first_name || ' ' || m.last_name AS member_name,
        b.title AS book_title,
        f.amount_cents,
        f.fined_at,
        f.paid_at,
        f.payment_status
    FROM fines f
    JOIN book_issues i ON i.id = f.issue_id
    JOIN members m ON m.id = i.member_id
    JOIN books b ON b.id = i.book_id
"#;

#[derive(Debug, Clone)]
pub struct FineRepository {
    pool: SqlitePool,
}

impl FineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FineRepository { pool }
    }

    /// Fines newest first, optionally only those with the given status.
    pub async fn list(&self, status: Option<PaymentStatus>) -> DbResult<Vec<FineListing>> {
        let fines = match status {
            Some(status) => {
                let sql = format!(
                    "{FINE_LISTING_SELECT} WHERE f.payment_status = ?1 ORDER BY f.fined_at DESC, f.id DESC"
                );
                sqlx::query_as::<_, FineListing>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{FINE_LISTING_SELECT} ORDER BY f.fined_at DESC, f.id DESC");
                sqlx::query_as::<_, FineListing>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(fines)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>(&format!(
            "SELECT {FINE_COLUMNS} FROM fines WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(fine)
    }

    /// Fines raised on one issue.
    pub async fn for_issue(&self, issue_id: i64) -> DbResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(&format!(
            "SELECT {FINE_COLUMNS} FROM fines WHERE issue_id = ?1 ORDER BY id"
        ))
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }

    /// Total unpaid fines of a member.
    pub async fn outstanding_for_member(&self, member_id: i64) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(f.amount_cents), 0)
            FROM fines f
            JOIN book_issues i ON i.id = f.issue_id
            WHERE i.member_id = ?1 AND f.payment_status = 'unpaid'
            "#,
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Records payment of a fine.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such fine
    /// * `CoreError::FineAlreadyPaid` - it was settled before
    pub async fn mark_paid(&self, id: i64) -> DbResult<Fine> {
        let paid = sqlx::query_as::<_, Fine>(&format!(
            r#"
            UPDATE fines SET payment_status = 'paid', paid_at = ?2
            WHERE id = ?1 AND payment_status = 'unpaid'
            RETURNING {FINE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match paid {
            Some(fine) => {
                info!(fine_id = id, amount = %fine.amount(), "Fine paid");
                Ok(fine)
            }
            None => match self.get_by_id(id).await? {
                Some(_) => {
                    warn!(fine_id = id, "Fine already paid");
                    Err(CoreError::FineAlreadyPaid { fine_id: id }.into())
                }
                None => Err(DbError::not_found("Fine", id)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use libris_core::CirculationPolicy;

    #[tokio::test]
    async fn test_mark_paid_once() {
        let db = test_support::db().await;
        let book = db.books().create(test_support::book("Dune", 1)).await.unwrap();
        let member = db
            .members()
            .create(test_support::member("Ada", "ada@example.org"))
            .await
            .unwrap();
        let issue = db
            .issues()
            .issue_book(book.id, member.id, test_support::days_from_now(7), None, &CirculationPolicy::default())
            .await
            .unwrap();
        let fine = db
            .issues()
            .return_book(issue.id, Money::from_cents(125))
            .await
            .unwrap()
            .fine
            .unwrap();

        assert_eq!(
            db.fines().outstanding_for_member(member.id).await.unwrap(),
            Money::from_cents(125)
        );
        assert_eq!(db.fines().list(Some(PaymentStatus::Unpaid)).await.unwrap().len(), 1);

        let paid = db.fines().mark_paid(fine.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert!(db.fines().outstanding_for_member(member.id).await.unwrap().is_zero());

        assert!(matches!(
            db.fines().mark_paid(fine.id).await,
            Err(DbError::Domain(CoreError::FineAlreadyPaid { .. }))
        ));
        assert!(matches!(
            db.fines().mark_paid(999).await,
            Err(DbError::NotFound { .. })
        ));

        let listing = db.fines().list(None).await.unwrap();
        assert_eq!(listing[0].book_title, "Dune");
        assert_eq!(listing[0].member_name, "Ada Reader");
    }
}
