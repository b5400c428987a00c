//! End-to-end circulation scenarios through the public `Database` API.

use libris_core::{CirculationPolicy, CoreError, IssueStatus, Money, PaymentStatus};
use libris_db::{DbError, DEFAULT_ADMIN_USERNAME};

mod support {
    use chrono::{DateTime, Duration, Utc};
    use libris_core::{BookDraft, MemberDraft};
    use libris_db::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub fn book(title: &str, copies: i64) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: "Test Author".to_string(),
            total_copies: copies,
            ..BookDraft::default()
        }
    }

    pub fn member(first: &str, email: &str) -> MemberDraft {
        MemberDraft {
            first_name: first.to_string(),
            last_name: "Reader".to_string(),
            email: email.to_string(),
            ..MemberDraft::default()
        }
    }

    pub fn days_from_now(days: i64) -> DateTime<Utc> {
        Utc::now() + Duration::days(days)
    }
}

/// Three copies, two loans, a stock edit, then a late return with a fine.
#[tokio::test]
async fn test_copy_counts_through_issue_edit_and_return() {
    let db = support::db().await;
    let policy = CirculationPolicy::default();

    let book = db.books().create(support::book("Dune", 3)).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (3, 3));

    let ada = db
        .members()
        .create(support::member("Ada", "ada@example.org"))
        .await
        .unwrap();
    let alan = db
        .members()
        .create(support::member("Alan", "alan@example.org"))
        .await
        .unwrap();

    let due = policy.due_date(chrono::Utc::now());
    let first = db
        .issues()
        .issue_book(book.id, ada.id, due, None, &policy)
        .await
        .unwrap();
    db.issues()
        .issue_book(book.id, alan.id, due, None, &policy)
        .await
        .unwrap();

    let book = db.books().get_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.available_copies, 1);

    let mut draft = support::book("Dune", 5);
    draft.author = book.author.clone();
    let book = db.books().update(book.id, draft).await.unwrap();
    assert_eq!((book.total_copies, book.available_copies), (5, 3));

    let outcome = db
        .issues()
        .return_book(first.id, Money::from_cents(250))
        .await
        .unwrap();
    assert_eq!(outcome.issue.status, IssueStatus::Returned);
    assert_eq!(outcome.issue.fine_cents, 250);

    let book = db.books().get_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(book.available_copies, 4);

    let unpaid = db.fines().list(Some(PaymentStatus::Unpaid)).await.unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].amount_cents, 250);
    assert_eq!(unpaid[0].member_id, ada.id);

    let err = db
        .issues()
        .return_book(first.id, Money::zero())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::AlreadyReturned { .. })));
}

/// Available copies never exceed total or drop below zero, whatever the
/// order of loans, returns and stock edits.
#[tokio::test]
async fn test_available_stays_within_bounds() {
    let db = support::db().await;
    let policy = CirculationPolicy::default();
    let book = db.books().create(support::book("Cosmos", 2)).await.unwrap();
    let member = db
        .members()
        .create(support::member("Grace", "grace@example.org"))
        .await
        .unwrap();
    let due = support::days_from_now(7);

    let a = db
        .issues()
        .issue_book(book.id, member.id, due, None, &policy)
        .await
        .unwrap();
    let b = db
        .issues()
        .issue_book(book.id, member.id, due, None, &policy)
        .await
        .unwrap();
    assert!(matches!(
        db.issues().issue_book(book.id, member.id, due, None, &policy).await,
        Err(DbError::Domain(CoreError::NoCopiesAvailable { .. }))
    ));

    // Shrinking below the number on loan leaves nothing on the shelf.
    let shrunk = db
        .books()
        .update(book.id, support::book("Cosmos", 1))
        .await
        .unwrap();
    assert_eq!((shrunk.total_copies, shrunk.available_copies), (1, 0));

    db.issues().return_book(a.id, Money::zero()).await.unwrap();
    db.issues().return_book(b.id, Money::zero()).await.unwrap();

    let book = db.books().get_by_id(book.id).await.unwrap().unwrap();
    assert_eq!((book.total_copies, book.available_copies), (1, 1));
    assert!(db.fines().list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_guards_and_cascade() {
    let db = support::db().await;
    let policy = CirculationPolicy::default();
    let book = db.books().create(support::book("SPQR", 1)).await.unwrap();
    let member = db
        .members()
        .create(support::member("Mary", "mary@example.org"))
        .await
        .unwrap();
    let issue = db
        .issues()
        .issue_book(book.id, member.id, support::days_from_now(3), None, &policy)
        .await
        .unwrap();

    assert!(matches!(
        db.books().delete(book.id).await,
        Err(DbError::Domain(CoreError::HasActiveIssues { active: 1, .. }))
    ));
    assert!(matches!(
        db.members().delete(member.id).await,
        Err(DbError::Domain(CoreError::HasActiveIssues { active: 1, .. }))
    ));

    db.issues()
        .return_book(issue.id, Money::from_cents(100))
        .await
        .unwrap();
    db.members().delete(member.id).await.unwrap();

    // Loan history and its fine go with the member.
    assert!(db.issues().get_by_id(issue.id).await.unwrap().is_none());
    assert!(db.fines().list(None).await.unwrap().is_empty());
    db.books().delete(book.id).await.unwrap();
}

#[tokio::test]
async fn test_login_with_default_admin() {
    let db = support::db().await;
    assert!(db.users().ensure_default_admin().await.unwrap());
    assert!(!db.users().ensure_default_admin().await.unwrap());

    let session = db
        .users()
        .authenticate(DEFAULT_ADMIN_USERNAME, "admin123")
        .await
        .unwrap();
    assert!(session.is_admin());

    assert!(matches!(
        db.users().authenticate(DEFAULT_ADMIN_USERNAME, "wrong").await,
        Err(DbError::Domain(CoreError::InvalidCredentials))
    ));
}
