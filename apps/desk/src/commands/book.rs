//! # Book Commands
//!
//! Catalog screen actions.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form fields (strings) ──► BookForm::into_draft ──► BookDraft            │
//! │                               │ parse year / copies                      │
//! │                               ▼                                          │
//! │  db.books().update(id, draft)                                            │
//! │       available = clamp(new_total - lent_out, 0, new_total)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use libris_core::validation::{
    parse_int, parse_optional_int, validate_search_query, ValidationResult,
};
use libris_core::{Book, BookDraft, BookListing};

/// Book form as typed by the operator. Numbers arrive as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub publication_year: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub total_copies: String,
    #[serde(default)]
    pub description: String,
}

impl BookForm {
    /// Parses the numeric fields. Remaining checks happen in
    /// `BookDraft::validated`.
    pub fn into_draft(self) -> ValidationResult<BookDraft> {
        Ok(BookDraft {
            publication_year: parse_optional_int("publication_year", &self.publication_year)?,
            total_copies: parse_int("total_copies", &self.total_copies)?,
            title: self.title,
            author: self.author,
            isbn: Some(self.isbn),
            publisher: Some(self.publisher),
            category_id: self.category_id,
            description: Some(self.description),
        })
    }
}

pub async fn list_books(db: &DbState) -> Result<Vec<BookListing>, ApiError> {
    Ok(db.inner().books().list().await?)
}

/// Searches title, author and ISBN. A blank query lists everything.
pub async fn search_books(db: &DbState, query: &str) -> Result<Vec<BookListing>, ApiError> {
    let start = Instant::now();
    let query = validate_search_query(query)?;

    let books = db.inner().books().search(&query).await?;

    debug!(
        query = %query,
        results = books.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search_books command"
    );
    Ok(books)
}

pub async fn get_book(db: &DbState, id: i64) -> Result<Book, ApiError> {
    db.inner()
        .books()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book", &id.to_string()))
}

pub async fn create_book(db: &DbState, form: BookForm) -> Result<Book, ApiError> {
    let draft = form.into_draft()?;
    Ok(db.inner().books().create(draft).await?)
}

pub async fn update_book(db: &DbState, id: i64, form: BookForm) -> Result<Book, ApiError> {
    let draft = form.into_draft()?;
    Ok(db.inner().books().update(id, draft).await?)
}

/// Deletes a book with no copies out on loan.
pub async fn delete_book(db: &DbState, id: i64) -> Result<(), ApiError> {
    Ok(db.inner().books().delete(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn form(title: &str, copies: &str) -> BookForm {
        BookForm {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            total_copies: copies.to_string(),
            ..BookForm::default()
        }
    }

    #[test]
    fn test_form_parses_numbers_and_blanks() {
        let mut f = form("Dune", " 3 ");
        f.publication_year = "1965".to_string();
        let draft = f.into_draft().unwrap().validated().unwrap();

        assert_eq!(draft.total_copies, 3);
        assert_eq!(draft.publication_year, Some(1965));
        assert_eq!(draft.isbn, None);
        assert_eq!(draft.publisher, None);
    }

    #[test]
    fn test_form_rejects_non_numeric_copies() {
        assert!(form("Dune", "three").into_draft().is_err());
    }

    #[tokio::test]
    async fn test_book_crud() {
        let db = DbState::in_memory().await.unwrap();

        let mut f = form("Dune", "2");
        f.isbn = "978-0-441-17271-9".to_string();
        let book = create_book(&db, f.clone()).await.unwrap();
        assert_eq!(book.available_copies, 2);
        assert_eq!(book.isbn.as_deref(), Some("9780441172719"));

        let err = create_book(&db, f).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        assert_eq!(list_books(&db).await.unwrap().len(), 1);
        assert_eq!(search_books(&db, "herbert").await.unwrap().len(), 1);

        let updated = update_book(&db, book.id, form("Dune Messiah", "4")).await.unwrap();
        assert_eq!(updated.available_copies, 4);

        delete_book(&db, book.id).await.unwrap();
        let err = get_book(&db, book.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_zero_copies_is_validation_error() {
        let db = DbState::in_memory().await.unwrap();
        let err = create_book(&db, form("Dune", "0")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
