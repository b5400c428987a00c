//! # Circulation Commands
//!
//! Issue and return screen actions.
//!
//! ## Return Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  preview_return(issue 12)                                               │
//! │       │  days_overdue = 4, suggested fine = 4 × $0.50 = $2.00            │
//! │       ▼                                                                 │
//! │  operator confirms or edits the fine ("2.00", "0", "")                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  return_book(issue 12, "2.00")                                          │
//! │       │  one transaction: issue returned, copy back on shelf,           │
//! │       │  unpaid fine row when the fine is above zero                    │
//! │       ▼                                                                 │
//! │  ReturnOutcome { issue, fine }                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};
use libris_core::circulation::{days_overdue, default_due_date};
use libris_core::validation::validate_loan_days;
use libris_core::{Issue, IssueListing, IssueStatus, Money, Session};
use libris_db::{IssueFilter, ReturnOutcome};

/// An issue request from the desk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub book_id: i64,
    pub member_id: i64,
    /// Loan period override; the configured loan period when absent.
    #[serde(default)]
    pub loan_days: Option<i64>,
}

/// What the return dialog shows before the operator confirms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPreview {
    pub issue: Issue,
    pub status: IssueStatus,
    pub days_overdue: i64,
    pub suggested_fine: Money,
}

/// Lends one copy, recording the session's user as the issuer.
pub async fn issue_book(
    db: &DbState,
    config: &AppConfig,
    session: &Session,
    request: IssueRequest,
) -> Result<Issue, ApiError> {
    let loan_days = match request.loan_days {
        Some(days) => validate_loan_days(days)?,
        None => config.loan_days,
    };
    let due_at = default_due_date(Utc::now(), loan_days);

    let issue = db
        .inner()
        .issues()
        .issue_book(
            request.book_id,
            request.member_id,
            due_at,
            Some(session.user_id),
            &config.policy(),
        )
        .await?;

    info!(
        issue_id = issue.id,
        issued_by = %session.username,
        due_at = %issue.due_at,
        "issue_book command"
    );
    Ok(issue)
}

/// Lateness and suggested fine for an issue, as of now.
pub async fn preview_return(
    db: &DbState,
    config: &AppConfig,
    issue_id: i64,
) -> Result<ReturnPreview, ApiError> {
    preview_return_at(db, config, issue_id, Utc::now()).await
}

async fn preview_return_at(
    db: &DbState,
    config: &AppConfig,
    issue_id: i64,
    as_of: DateTime<Utc>,
) -> Result<ReturnPreview, ApiError> {
    let issue = db
        .inner()
        .issues()
        .get_by_id(issue_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue", &issue_id.to_string()))?;

    Ok(ReturnPreview {
        status: issue.effective_status(as_of),
        days_overdue: days_overdue(issue.due_at, as_of),
        suggested_fine: config.policy().suggested_fine(issue.due_at, as_of),
        issue,
    })
}

/// Closes an issue with the fine the operator entered. Blank means no fine.
pub async fn return_book(
    db: &DbState,
    issue_id: i64,
    fine: &str,
) -> Result<ReturnOutcome, ApiError> {
    let fine = if fine.trim().is_empty() {
        Money::zero()
    } else {
        fine.parse::<Money>()?
    };

    Ok(db.inner().issues().return_book(issue_id, fine).await?)
}

/// Issues matching `filter`, with overdue derived as of now.
pub async fn list_issues(db: &DbState, filter: IssueFilter) -> Result<Vec<IssueListing>, ApiError> {
    Ok(db.inner().issues().list(filter, Utc::now()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::login;
    use crate::commands::book::{create_book, get_book, BookForm};
    use crate::error::ErrorCode;
    use crate::state::SessionState;
    use chrono::Duration;
    use libris_core::{MemberDraft, MemberStatus};

    async fn setup() -> (DbState, Session, i64, i64) {
        let db = DbState::in_memory().await.unwrap();
        let session = login(&db, &SessionState::new(), "admin", "admin123")
            .await
            .unwrap();

        let book = create_book(
            &db,
            BookForm {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                total_copies: "1".to_string(),
                ..BookForm::default()
            },
        )
        .await
        .unwrap();

        let member = db
            .inner()
            .members()
            .create(MemberDraft {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.org".to_string(),
                status: MemberStatus::Suspended,
                ..MemberDraft::default()
            })
            .await
            .unwrap();

        (db, session, book.id, member.id)
    }

    fn request(book_id: i64, member_id: i64) -> IssueRequest {
        IssueRequest {
            book_id,
            member_id,
            loan_days: None,
        }
    }

    #[tokio::test]
    async fn test_issue_records_session_user_and_loan_days() {
        let (db, session, book_id, member_id) = setup().await;
        let config = AppConfig::default();

        let issue = issue_book(&db, &config, &session, request(book_id, member_id))
            .await
            .unwrap();
        assert_eq!(issue.issued_by, Some(session.user_id));
        let loan = issue.due_at - issue.issued_at;
        assert!(loan <= Duration::days(14) && loan > Duration::days(14) - Duration::minutes(1));

        let err = issue_book(&db, &config, &session, request(book_id, member_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoCopiesAvailable);
    }

    #[tokio::test]
    async fn test_require_active_member_setting() {
        let (db, session, book_id, member_id) = setup().await;
        let config = AppConfig {
            require_active_member: true,
            ..AppConfig::default()
        };

        let err = issue_book(&db, &config, &session, request(book_id, member_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_preview_and_return_with_fine() {
        let (db, session, book_id, member_id) = setup().await;
        let config = AppConfig::default();
        let issue = issue_book(
            &db,
            &config,
            &session,
            IssueRequest {
                loan_days: Some(7),
                ..request(book_id, member_id)
            },
        )
        .await
        .unwrap();

        let preview = preview_return_at(&db, &config, issue.id, issue.due_at + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(preview.status, IssueStatus::Overdue);
        assert_eq!(preview.days_overdue, 3);
        assert_eq!(preview.suggested_fine, Money::from_cents(150));

        let outcome = return_book(&db, issue.id, "1.50").await.unwrap();
        assert_eq!(outcome.fine.map(|f| f.amount_cents), Some(150));
        assert_eq!(get_book(&db, book_id).await.unwrap().available_copies, 1);

        let err = return_book(&db, issue.id, "").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(list_issues(&db, IssueFilter::Returned).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_fine_text() {
        let (db, session, book_id, member_id) = setup().await;
        let issue = issue_book(&db, &AppConfig::default(), &session, request(book_id, member_id))
            .await
            .unwrap();

        let err = return_book(&db, issue.id, "two dollars").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let err = return_book(&db, issue.id, "-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
