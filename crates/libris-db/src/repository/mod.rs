//! # Repository Module
//!
//! One repository per table, each owning a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command (apps/desk)                                                    │
//! │       │  db.books().search("herbert")                                   │
//! │       ▼                                                                 │
//! │  BookRepository ──► SQL ──► SQLite                                      │
//! │                                                                         │
//! │  categories  CategoryRepository   CRUD, search                          │
//! │  books       BookRepository       CRUD, search, copy reconciliation     │
//! │  members     MemberRepository     CRUD, search, active-issue guard      │
//! │  users       UserRepository       CRUD, login, last-admin guard         │
//! │  book_issues IssueRepository      issue / return transactions, stats    │
//! │  fines       FineRepository       listing, payment                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as::<_, T>`) and rows decode
//! through the `FromRow` derives in `libris-core`. Search filters the
//! ordered listing with `SearchTerm`.

pub mod book;
pub mod category;
pub mod fine;
pub mod issue;
pub mod member;
pub mod user;

pub use book::BookRepository;
pub use category::CategoryRepository;
pub use fine::FineRepository;
pub use issue::IssueRepository;
pub use member::MemberRepository;
pub use user::UserRepository;

/// Case-insensitive substring matcher for the search screens.
///
/// Folding happens in Rust with Unicode lowercase: SQLite's `LIKE` only
/// folds ASCII, so `"émile"` would miss `"Émile"`.
#[derive(Debug, Clone)]
pub(crate) struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        SearchTerm(term.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any present field contains the term.
    pub fn matches<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
        fields
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&self.0))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_folds_unicode_case() {
        let term = SearchTerm::new(" ÉMILE ");
        assert!(term.matches([Some("Émile, or On Education")]));
        assert!(SearchTerm::new("émile").matches([None, Some("ÉMILE")]));
        assert!(!term.matches([Some("Emile"), None]));
    }

    #[test]
    fn test_search_term_is_literal() {
        assert!(SearchTerm::new("100%").matches([Some("100% Pure")]));
        assert!(!SearchTerm::new("a_b").matches([Some("axb")]));
        assert!(SearchTerm::new("   ").is_empty());
    }
}
