//! # Book Repository
//!
//! Catalog operations for books.
//!
//! ## Editing Copy Counts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update(id, draft { total_copies: 5 })                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    SELECT total_copies, available_copies   → (3, 1): 2 lent out        │
//! │    available = reconcile_available(3, 1, 5) → 3                         │
//! │    UPDATE books SET ..., total_copies = 5, available_copies = 3         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The operator never types available copies; they always follow from the
//! loans on record.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::SearchTerm;
use libris_core::circulation::reconcile_available;
use libris_core::{Book, BookDraft, BookListing, CoreError};

pub(crate) const BOOK_COLUMNS: &str = "id, title, author, isbn, publisher, publication_year, \
     category_id, total_copies, available_copies, description, added_at";

/// Same columns qualified for the join with `categories`, which also has
/// `id` and `description`.
const LISTING_COLUMNS: &str = "b.id, b.title, b.author, b.isbn, b.publisher, b.publication_year, \
     b.category_id, b.total_copies, b.available_copies, b.description, b.added_at, \
     c.name AS category_name";

/// Repository for the `books` table.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.books();
/// let hits = repo.search("herbert").await?;
/// let book = repo.update(hits[0].book.id, draft).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Every book with its category name, ordered by title.
    pub async fn list(&self) -> DbResult<Vec<BookListing>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM books b
            LEFT JOIN categories c ON c.id = b.category_id
            ORDER BY b.title, b.id
            "#
        );

        let books = sqlx::query_as::<_, BookListing>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Case-insensitive substring search over title, author and ISBN.
    ///
    /// ## Arguments
    /// * `term` - Search text; empty lists every book
    pub async fn search(&self, term: &str) -> DbResult<Vec<BookListing>> {
        let term = SearchTerm::new(term);
        if term.is_empty() {
            return self.list().await;
        }

        debug!(?term, "Searching books");

        let books: Vec<BookListing> = self
            .list()
            .await?
            .into_iter()
            .filter(|b| {
                term.matches([
                    Some(b.book.title.as_str()),
                    Some(b.book.author.as_str()),
                    b.book.isbn.as_deref(),
                ])
            })
            .collect();

        debug!(count = books.len(), "Book search returned rows");
        Ok(books)
    }

    /// Gets a book by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found
    /// * `Ok(None)` - No such id
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Adds a book with every copy on the shelf.
    pub async fn create(&self, draft: BookDraft) -> DbResult<Book> {
        let draft = draft.validated()?;
        debug!(title = %draft.title, copies = draft.total_copies, "Adding book");

        let sql = format!(
            r#"
            INSERT INTO books (
                title, author, isbn, publisher, publication_year, category_id,
                total_copies, available_copies, description, added_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?9)
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&draft.title)
            .bind(&draft.author)
            .bind(&draft.isbn)
            .bind(&draft.publisher)
            .bind(draft.publication_year)
            .bind(draft.category_id)
            .bind(draft.total_copies)
            .bind(&draft.description)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(draft.isbn.as_deref().unwrap_or("")))?;

        info!(id = book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// Edits a book. Available copies are recomputed from the new total and
    /// the copies currently lent out, in the same transaction as the read.
    pub async fn update(&self, id: i64, draft: BookDraft) -> DbResult<Book> {
        let draft = draft.validated()?;
        debug!(id, total_copies = draft.total_copies, "Updating book");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let (old_total, old_available): (i64, i64) = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Book", id))?;

        let available = reconcile_available(old_total, old_available, draft.total_copies);

        let sql = format!(
            r#"
            UPDATE books SET
                title = ?2, author = ?3, isbn = ?4, publisher = ?5,
                publication_year = ?6, category_id = ?7,
                total_copies = ?8, available_copies = ?9, description = ?10
            WHERE id = ?1
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(&draft.title)
            .bind(&draft.author)
            .bind(&draft.isbn)
            .bind(&draft.publisher)
            .bind(draft.publication_year)
            .bind(draft.category_id)
            .bind(draft.total_copies)
            .bind(available)
            .bind(&draft.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(draft.isbn.as_deref().unwrap_or("")))?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            id,
            old_total,
            old_available,
            total = book.total_copies,
            available = book.available_copies,
            "Book updated"
        );
        Ok(book)
    }

    /// Deletes a book that has no copies out on loan. Returned issues for the
    /// book (and their fines) go with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_issues WHERE book_id = ?1 AND status IN ('issued', 'overdue')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            warn!(id, active, "Refusing to delete book with active issues");
            return Err(CoreError::HasActiveIssues {
                entity: "book".to_string(),
                id,
                active,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id, "Book deleted");
        Ok(())
    }

    /// Number of catalog entries (titles, not copies).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use libris_core::ValidationError;

    #[tokio::test]
    async fn test_create_sets_available_to_total() {
        let db = test_support::db().await;

        let book = db.books().create(test_support::book("Dune", 3)).await.unwrap();
        assert_eq!(book.total_copies, 3);
        assert_eq!(book.available_copies, 3);
        assert_eq!(db.books().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let db = test_support::db().await;

        let err = db.books().create(test_support::book("  ", 1)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_isbn() {
        let db = test_support::db().await;

        let mut first = test_support::book("First", 1);
        first.isbn = Some("0306406152".to_string());
        db.books().create(first).await.unwrap();

        let mut second = test_support::book("Second", 1);
        second.isbn = Some("0-306-40615-2".to_string());
        let err = db.books().create(second).await.unwrap_err();

        assert_eq!(err.to_string(), "Duplicate ISBN: '0306406152' already exists");
    }

    #[tokio::test]
    async fn test_search_matches_title_author_isbn() {
        let db = test_support::db().await;

        let mut dune = test_support::book("Dune", 1);
        dune.author = "Frank Herbert".to_string();
        dune.isbn = Some("9780441172719".to_string());
        db.books().create(dune).await.unwrap();
        db.books().create(test_support::book("Emma", 1)).await.unwrap();

        assert_eq!(db.books().search("herb").await.unwrap().len(), 1);
        assert_eq!(db.books().search("DUNE").await.unwrap().len(), 1);
        assert_eq!(db.books().search("0441").await.unwrap().len(), 1);
        assert_eq!(db.books().search("%").await.unwrap().len(), 0);

        let all = db.books().search("").await.unwrap();
        let titles: Vec<_> = all.iter().map(|b| b.book.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn test_search_folds_accented_letters() {
        let db = test_support::db().await;
        let mut emile = test_support::book("Émile", 1);
        emile.author = "Jean-Jacques Rousseau".to_string();
        db.books().create(emile).await.unwrap();

        for term in ["émile", "ÉMILE", "Émile", "mil"] {
            let hits = db.books().search(term).await.unwrap();
            assert_eq!(hits.len(), 1, "search for {term}");
            assert_eq!(hits[0].book.title, "Émile");
        }
        assert_eq!(db.books().search("emile").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_listing_carries_category_name() {
        let db = test_support::db().await;
        let science = db
            .categories()
            .search("Science")
            .await
            .unwrap()
            .remove(0);

        let mut draft = test_support::book("Cosmos", 2);
        draft.category_id = Some(science.id);
        db.books().create(draft).await.unwrap();

        let listing = db.books().list().await.unwrap().remove(0);
        assert_eq!(listing.category_name.as_deref(), Some("Science"));
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let db = test_support::db().await;

        let err = db.books().update(99, test_support::book("Ghost", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
