//! # Error Types
//!
//! Domain-specific error types for libris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libris-core errors (this file)                                        │
//! │  ├── CoreError        - Circulation and authorization rule violations  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  libris-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  desk API errors (in app)                                              │
//! │  └── ApiError         - What the operator sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Operator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::MemberStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
///
/// None of these are retried; each aborts the single attempted operation
/// and leaves stored state untouched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Every copy of the book is out on loan.
    ///
    /// ## User Workflow
    /// ```text
    /// Issue Book (book #7)
    ///      │
    ///      ▼
    /// available_copies = 0
    ///      │
    ///      ▼
    /// NoCopiesAvailable { book_id: 7, .. }
    ///      │
    ///      ▼
    /// Operator sees: "No copies of 'Dune' are available"
    /// ```
    #[error("No copies of '{title}' are available (book {book_id})")]
    NoCopiesAvailable { book_id: i64, title: String },

    /// The issue has already been returned.
    #[error("Issue {issue_id} has already been returned")]
    AlreadyReturned { issue_id: i64 },

    /// A book or member still has copies out on loan.
    ///
    /// ## When This Occurs
    /// - Deleting a book with `issued`/`overdue` issues
    /// - Deleting a member who still holds books
    #[error("Cannot delete {entity} {id}: {active} issue(s) still active")]
    HasActiveIssues {
        entity: String,
        id: i64,
        active: i64,
    },

    /// Member is not allowed to borrow under the active circulation policy.
    #[error("Member {member_id} is {status}, cannot borrow")]
    MemberNotActive { member_id: i64, status: MemberStatus },

    /// The session's role does not permit the operation.
    #[error("Permission denied: {action} requires an admin session")]
    Forbidden { action: String },

    /// Username/password pair did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The fine was already settled.
    #[error("Fine {fine_id} is already paid")]
    FineAlreadyPaid { fine_id: i64 },

    /// Removing the account would leave the library without an admin.
    #[error("Cannot remove the last admin account")]
    LastAdmin,

    /// Operators may not delete the account they are logged in with.
    #[error("Cannot delete the account of the current session")]
    SelfDelete,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything touches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., not a number, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
