//! # Commands Module
//!
//! One function per desk action. Each returns `Result<T, ApiError>` and
//! takes only the state it needs.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports)
//! ├── auth.rs         ◄─── login / logout
//! ├── dashboard.rs    ◄─── headline counts, recent loans
//! ├── book.rs         ◄─── catalog CRUD and search
//! ├── category.rs     ◄─── category CRUD and search
//! ├── member.rs       ◄─── member CRUD, search, loan history
//! ├── user.rs         ◄─── staff accounts (admin session only)
//! ├── circulation.rs  ◄─── issue, return preview, return, issue lists
//! ├── fine.rs         ◄─── fine listing and payment
//! └── report.rs       ◄─── canned reports, CSV export
//! ```
//!
//! ## State Injection
//! ```rust,ignore
//! // Only needs database
//! async fn search_books(db: &DbState, query: &str)
//!
//! // Needs circulation settings and the acting user
//! async fn issue_book(db: &DbState, config: &AppConfig, session: &Session, request: IssueRequest)
//!
//! // Authorization is checked against the session passed in
//! async fn delete_user(db: &DbState, session: &Session, id: i64)
//! ```

pub mod auth;
pub mod book;
pub mod category;
pub mod circulation;
pub mod dashboard;
pub mod fine;
pub mod member;
pub mod report;
pub mod user;
