//! # libris-core: Pure Domain Logic for Libris
//!
//! This crate holds the rules of the library: what a book, member, staff user,
//! issue and fine are, how copy counts move when books are lent and returned,
//! when a loan counts as overdue, and who may do what. Everything here is a
//! pure function over values; there is no database, file or network access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/desk (command layer)                       │   │
//! │  │   login ─► issue_book ─► return_book ─► export_report           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ libris-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌─────────────┐ ┌───────────┐ ┌────────────┐   │   │
//! │  │   │   types   │ │ circulation │ │  session  │ │ validation │   │   │
//! │  │   │  Book     │ │ reconcile   │ │  Session  │ │   rules    │   │   │
//! │  │   │  Issue    │ │ overdue     │ │  Role     │ │   parsing  │   │   │
//! │  │   └───────────┘ └─────────────┘ └───────────┘ └────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 libris-db (Database Layer)                      │   │
//! │  │        SQLite queries, transactions, reports, CSV export        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Member, User, Issue, Fine, ...)
//! - [`circulation`] - Issue/return rules, overdue derivation, copy reconciliation
//! - [`session`] - Logged-in principal and authorization checks
//! - [`money`] - Money type with integer arithmetic (fines)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and form-field parsing
//!
//! ## Example Usage
//!
//! ```rust
//! use libris_core::circulation::reconcile_available;
//!
//! // 3 copies, 1 on the shelf (2 lent out); the library buys 2 more.
//! assert_eq!(reconcile_available(3, 1, 5), 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod circulation;
pub mod error;
pub mod money;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use circulation::CirculationPolicy;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use session::Session;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default loan period in days when the operator does not pick a due date.
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Upper bound on copies of a single title.
///
/// Guards against typos like 1000 instead of 10 on the book form.
pub const MAX_TOTAL_COPIES: i64 = 10_000;

/// Number of rows shown in the dashboard's "recent issues" panel.
pub const RECENT_ISSUES_LIMIT: u32 = 10;
