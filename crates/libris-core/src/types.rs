//! # Domain Types
//!
//! Core domain types used throughout Libris.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐    ┌───────────────┐    ┌───────────────┐           │
//! │  │   Category    │◄───│     Book      │    │    Member     │           │
//! │  │  name (uniq)  │ 0..1  isbn (uniq)  │    │  email (uniq) │           │
//! │  └───────────────┘    │  total/avail  │    │  status       │           │
//! │                       └───────▲───────┘    └───────▲───────┘           │
//! │                               │                    │                    │
//! │                       ┌───────┴────────────────────┴───────┐           │
//! │                       │               Issue                │           │
//! │                       │  issued_at, due_at, returned_at    │           │
//! │  ┌───────────────┐    │  status, fine_cents, issued_by ────┼──► User   │
//! │  │     Fine      │───►│                                    │           │
//! │  │  paid/unpaid  │    └────────────────────────────────────┘           │
//! │  └───────────────┘                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are identified by SQLite integer keys. `*Draft` types carry operator
//! input for create/update and know how to normalize themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::circulation;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    normalize_optional, validate_email, validate_isbn, validate_publication_year,
    validate_required, validate_total_copies, validate_username, ValidationResult,
};

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

// =============================================================================
// Category
// =============================================================================

/// A shelf category books can optionally belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Operator input for creating or renaming a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryDraft {
    /// Trims fields and checks the name is present.
    pub fn validated(self) -> ValidationResult<Self> {
        Ok(CategoryDraft {
            name: validate_required("name", &self.name, 100)?,
            description: normalize_optional(self.description.as_deref()),
        })
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalogued title and its copy counts.
///
/// Invariant: `1 <= total_copies` and `0 <= available_copies <= total_copies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i64>,
    pub category_id: Option<i64>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub description: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan.
    #[inline]
    pub fn lent_out(&self) -> i64 {
        circulation::lent_out(self.total_copies, self.available_copies)
    }

    /// Whether at least one copy can be issued.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// A book row joined with its category name, as shown in the catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookListing {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
}

/// Operator input for adding or editing a book.
///
/// On update, `total_copies` is the *new* total; available copies are
/// reconciled from it rather than taken from the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i64>,
    pub category_id: Option<i64>,
    pub total_copies: i64,
    pub description: Option<String>,
}

impl Default for BookDraft {
    fn default() -> Self {
        BookDraft {
            title: String::new(),
            author: String::new(),
            isbn: None,
            publisher: None,
            publication_year: None,
            category_id: None,
            total_copies: 1,
            description: None,
        }
    }
}

impl BookDraft {
    /// Normalizes text fields and checks every rule on the book form.
    pub fn validated(self) -> ValidationResult<Self> {
        let isbn = match normalize_optional(self.isbn.as_deref()) {
            Some(raw) => Some(validate_isbn(&raw)?),
            None => None,
        };
        if let Some(year) = self.publication_year {
            validate_publication_year(year)?;
        }
        validate_total_copies(self.total_copies)?;

        Ok(BookDraft {
            title: validate_required("title", &self.title, 255)?,
            author: validate_required("author", &self.author, 255)?,
            isbn,
            publisher: normalize_optional(self.publisher.as_deref()),
            publication_year: self.publication_year,
            category_id: self.category_id,
            total_copies: self.total_copies,
            description: normalize_optional(self.description.as_deref()),
        })
    }
}

// =============================================================================
// Member
// =============================================================================

/// Borrowing status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl MemberStatus {
    pub const ALL: [&'static str; 3] = ["active", "inactive", "suspended"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(MemberStatus::Active),
            "inactive" => Ok(MemberStatus::Inactive),
            "suspended" => Ok(MemberStatus::Suspended),
            _ => Err(not_allowed("status", &Self::ALL)),
        }
    }
}

/// A library patron who borrows books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Operator input for registering or editing a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: MemberStatus,
}

impl MemberDraft {
    pub fn validated(self) -> ValidationResult<Self> {
        Ok(MemberDraft {
            first_name: validate_required("first_name", &self.first_name, 100)?,
            last_name: validate_required("last_name", &self.last_name, 100)?,
            email: validate_email(&self.email)?,
            phone: normalize_optional(self.phone.as_deref()),
            address: normalize_optional(self.address.as_deref()),
            status: self.status,
        })
    }
}

// =============================================================================
// Staff Users
// =============================================================================

/// Staff role. Only `Admin` may manage user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Librarian,
    Staff,
}

impl Role {
    pub const ALL: [&'static str; 3] = ["admin", "librarian", "staff"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "librarian" => Ok(Role::Librarian),
            "staff" => Ok(Role::Staff),
            _ => Err(not_allowed("role", &Self::ALL)),
        }
    }
}

/// A staff account (operator), not a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// argon2 PHC string. Never leaves the process.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Operator input for creating or editing a staff account.
/// The password travels separately so it is never stored in a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl UserDraft {
    pub fn validated(self) -> ValidationResult<Self> {
        Ok(UserDraft {
            username: validate_username(&self.username)?,
            email: validate_email(&self.email)?,
            full_name: validate_required("full_name", &self.full_name, 255)?,
            role: self.role,
        })
    }
}

// =============================================================================
// Issue (loan record)
// =============================================================================

/// Lifecycle status of an issue.
///
/// ```text
///   issue_book()            return_book()
///  ─────────────► Issued ─────────────────► Returned
///                   │  ▲                       ▲
///    due_at < now   │  │ (derived at read)     │ return_book()
///                   ▼  │                       │
///                 Overdue ─────────────────────┘
/// ```
///
/// Only `Issued` and `Returned` are written by this crate's callers;
/// `Overdue` is produced by [`circulation::effective_status`]. It is still a
/// valid stored value so rows written by older tooling decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Issued,
    Returned,
    Overdue,
}

impl IssueStatus {
    pub const ALL: [&'static str; 3] = ["issued", "returned", "overdue"];

    /// Copy is still out of the library.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, IssueStatus::Issued | IssueStatus::Overdue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "issued",
            IssueStatus::Returned => "returned",
            IssueStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "issued" => Ok(IssueStatus::Issued),
            "returned" => Ok(IssueStatus::Returned),
            "overdue" => Ok(IssueStatus::Overdue),
            _ => Err(not_allowed("status", &Self::ALL)),
        }
    }
}

/// One copy of a book lent to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Issue {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_cents: i64,
    /// Status as stored; see [`Issue::effective_status`].
    pub status: IssueStatus,
    pub issued_by: Option<i64>,
}

impl Issue {
    #[inline]
    pub fn fine(&self) -> Money {
        Money::from_cents(self.fine_cents)
    }

    /// Status with `Issued` promoted to `Overdue` once past due.
    pub fn effective_status(&self, as_of: DateTime<Utc>) -> IssueStatus {
        circulation::effective_status(self.status, self.due_at, as_of)
    }
}

/// An issue joined with book title and member name for the circulation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IssueListing {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub member_id: i64,
    pub member_name: String,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_cents: i64,
    pub status: IssueStatus,
}

impl IssueListing {
    /// Replaces the stored status with the effective one at `as_of`.
    pub fn with_effective_status(mut self, as_of: DateTime<Utc>) -> Self {
        self.status = circulation::effective_status(self.status, self.due_at, as_of);
        self
    }
}

// =============================================================================
// Fine
// =============================================================================

/// Payment status of a fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(not_allowed("payment_status", &["unpaid", "paid"])),
        }
    }
}

/// A monetary penalty raised when an issue is returned with a fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Fine {
    pub id: i64,
    pub issue_id: i64,
    pub amount_cents: i64,
    pub fined_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
}

impl Fine {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A fine joined with who owes it and for which book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FineListing {
    pub id: i64,
    pub issue_id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub book_title: String,
    pub amount_cents: i64,
    pub fined_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Sum of `total_copies` over the catalog.
    pub total_books: i64,
    pub total_members: i64,
    /// Issues currently out and not yet past due.
    pub issued_now: i64,
    /// Issues currently out and past due.
    pub overdue_now: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap()
    }

    fn sample_issue(status: IssueStatus) -> Issue {
        Issue {
            id: 1,
            book_id: 2,
            member_id: 3,
            issued_at: at(1),
            due_at: at(15),
            returned_at: None,
            fine_cents: 0,
            status,
            issued_by: Some(1),
        }
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("Active".parse::<MemberStatus>().unwrap(), MemberStatus::Active);
        assert_eq!(" SUSPENDED ".parse::<MemberStatus>().unwrap(), MemberStatus::Suspended);
        assert_eq!("librarian".parse::<Role>().unwrap(), Role::Librarian);
        assert!("owner".parse::<Role>().is_err());
        assert!(matches!(
            "gone".parse::<IssueStatus>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_issue_effective_status() {
        let issue = sample_issue(IssueStatus::Issued);
        assert_eq!(issue.effective_status(at(10)), IssueStatus::Issued);
        assert_eq!(
            issue.effective_status(at(15) + Duration::minutes(1)),
            IssueStatus::Overdue
        );

        let returned = sample_issue(IssueStatus::Returned);
        assert_eq!(returned.effective_status(at(30)), IssueStatus::Returned);
    }

    #[test]
    fn test_book_draft_normalizes_fields() {
        let draft = BookDraft {
            title: "  Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("978-0-441-17271-9".to_string()),
            publisher: Some("   ".to_string()),
            total_copies: 3,
            ..BookDraft::default()
        }
        .validated()
        .unwrap();

        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.isbn.as_deref(), Some("9780441172719"));
        assert_eq!(draft.publisher, None);
    }

    #[test]
    fn test_book_draft_requires_title_and_author() {
        let err = BookDraft {
            author: "Anon".to_string(),
            ..BookDraft::default()
        }
        .validated()
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "title".to_string()
            }
        );
    }

    #[test]
    fn test_book_draft_rejects_zero_copies() {
        let result = BookDraft {
            title: "T".to_string(),
            author: "A".to_string(),
            total_copies: 0,
            ..BookDraft::default()
        }
        .validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_member_draft_checks_email() {
        let draft = MemberDraft {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada-at-example".to_string(),
            ..MemberDraft::default()
        };
        assert!(draft.validated().is_err());
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            email: "admin@library.test".to_string(),
            full_name: "System Administrator".to_string(),
            role: Role::Admin,
            created_at: at(1),
            last_login_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[test]
    fn test_book_lent_out() {
        let book = Book {
            id: 1,
            title: "T".to_string(),
            author: "A".to_string(),
            isbn: None,
            publisher: None,
            publication_year: None,
            category_id: None,
            total_copies: 5,
            available_copies: 2,
            description: None,
            added_at: at(1),
        };
        assert_eq!(book.lent_out(), 3);
        assert!(book.is_available());
    }
}
