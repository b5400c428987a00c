//! # libris-db: Storage Layer for the Libris Desk
//!
//! SQLite persistence for the catalog, membership, staff accounts and
//! circulation, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Data Flow                                 │
//! │                                                                         │
//! │  Desk command (issue_book)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     libris-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ BookRepo      │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ IssueRepo     │    │ 001_initial  │   │   │
//! │  │   │ Transactions  │    │ FineRepo ...  │    │  _schema.sql │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                        ┌───────────────┐                        │   │
//! │  │                        │ ReportRepo    │──► CSV export          │   │
//! │  │                        └───────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/libris/libris.db                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//! - [`report`] - Canned reports and CSV export
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libris_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./libris.db")).await?;
//! db.users().ensure_default_admin().await?;
//!
//! let session = db.users().authenticate("admin", "admin123").await?;
//! let books = db.books().search("herbert").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod report;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use report::{export_csv, ReportKind, ReportRepository, ReportTable};

// Repository re-exports for convenience
pub use repository::issue::{IssueFilter, ReturnOutcome};
pub use repository::user::{hash_password, verify_password, DEFAULT_ADMIN_USERNAME};
pub use repository::{
    BookRepository, CategoryRepository, FineRepository, IssueRepository, MemberRepository,
    UserRepository,
};

