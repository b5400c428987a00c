//! # Validation Module
//!
//! Input validation and form-field parsing for Libris.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command layer (apps/desk)                                    │
//! │  ├── Form strings parsed into numbers / money / enums                  │
//! │  └── THIS MODULE: parse_int, parse_optional_int                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Drafts (types.rs)                                            │
//! │  ├── BookDraft::validated(), MemberDraft::validated(), ...             │
//! │  └── THIS MODULE: required fields, email, ISBN, ranges                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (isbn, email, username, category name)         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::validation::{validate_email, validate_isbn};
//!
//! assert_eq!(validate_isbn("0-306-40615-2").unwrap(), "0306406152");
//! assert!(validate_email("reader@library.org").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TOTAL_COPIES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length for staff accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest loan the issue form accepts.
pub const MAX_LOAN_DAYS: i64 = 365;

/// Highest daily fine rate the desk can be configured with ($1000.00).
pub const MAX_FINE_PER_DAY: Money = Money::from_cents(100_000);

// =============================================================================
// String Validators
// =============================================================================

/// Trims a required text field and checks it is present and not too long.
///
/// ## Example
/// ```rust
/// use libris_core::validation::validate_required;
///
/// assert_eq!(validate_required("title", "  Dune ", 255).unwrap(), "Dune");
/// assert!(validate_required("title", "   ", 255).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims an optional text field; blank input becomes `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`, with text on both sides
/// - The domain part contains a `.` with text on both sides of it
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_required("email", email, 255)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "expected an address like name@example.org".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates and normalizes an ISBN.
///
/// ## Rules
/// - A leading `ISBN`, `ISBN-10:` or `ISBN-13:` label is dropped
/// - Hyphens and spaces are removed
/// - A 9-digit SBN becomes its ISBN-10 by prefixing `0`
/// - What remains is 10 or 13 characters long
/// - All digits, except that the final character may be `X`
///
/// ## Returns
/// The compact form, with a trailing `x` upper-cased.
///
/// ```rust
/// use libris_core::validation::validate_isbn;
///
/// assert_eq!(validate_isbn("978-0-441-17271-9").unwrap(), "9780441172719");
/// assert_eq!(validate_isbn("0 8044 2957 x").unwrap(), "080442957X");
/// assert_eq!(validate_isbn("ISBN 0441013597").unwrap(), "0441013597");
/// assert!(validate_isbn("12345").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> ValidationResult<String> {
    let mut compact: String = strip_isbn_label(isbn)
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if compact.is_empty() {
        return Err(ValidationError::Required {
            field: "isbn".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "isbn".to_string(),
        reason: reason.to_string(),
    };

    if compact.len() == 9 {
        compact.insert(0, '0');
    }

    if compact.len() != 10 && compact.len() != 13 {
        return Err(invalid("must be 10 or 13 digits"));
    }

    let last = compact.len() - 1;
    let well_formed = compact
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || (i == last && c == 'X'));
    if !well_formed {
        return Err(invalid("only digits, with an optional trailing X"));
    }

    Ok(compact)
}

/// Drops an `ISBN` label (`ISBN`, `ISBN:`, `ISBN-10:`, `isbn 13 `) from the
/// front of `raw`.
fn strip_isbn_label(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("isbn") => {}
        _ => return raw,
    }

    let separator = |c: char| c == ':' || c == '-' || c.is_whitespace();
    let rest = raw[4..].trim_start_matches(separator);
    let rest = match rest.strip_prefix("10").or_else(|| rest.strip_prefix("13")) {
        Some(tail) if tail.starts_with(|c: char| c == ':' || c.is_whitespace()) => tail,
        _ => rest,
    };

    rest.trim_start_matches(separator)
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (lists everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a staff username: 3-50 characters of letters, digits, `.`, `_`
/// or `-`.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = validate_required("username", username, 50)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(username)
}

/// Validates a new password. Only the length is checked; whitespace is
/// significant and kept.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Form Field Parsing
// =============================================================================

/// Parses an integer form field.
///
/// ```rust
/// use libris_core::validation::parse_int;
///
/// assert_eq!(parse_int("total_copies", " 4 ").unwrap(), 4);
/// assert!(parse_int("total_copies", "four").is_err());
/// ```
pub fn parse_int(field: &str, raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        })
}

/// Parses an optional integer form field; blank input is `None`.
pub fn parse_optional_int(field: &str, raw: &str) -> ValidationResult<Option<i64>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_int(field, raw).map(Some)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a book's total copy count.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_TOTAL_COPIES`]
pub fn validate_total_copies(total: i64) -> ValidationResult<()> {
    if !(1..=MAX_TOTAL_COPIES).contains(&total) {
        return Err(ValidationError::OutOfRange {
            field: "total_copies".to_string(),
            min: 1,
            max: MAX_TOTAL_COPIES,
        });
    }

    Ok(())
}

/// Validates a publication year (1 to 9999).
pub fn validate_publication_year(year: i64) -> ValidationResult<()> {
    if !(1..=9999).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "publication_year".to_string(),
            min: 1,
            max: 9999,
        });
    }

    Ok(())
}

/// Validates a loan period in days.
///
/// ## User Workflow
/// ```text
/// Issue Book form
///      │
///      ├── days left blank ──► configured loan period (14)
///      │
///      └── days entered ──► validate_loan_days(days)
///                                │
///                                ├── days < 1 or > 365? → OutOfRange
///                                └── OK → due_at = now + days
/// ```
pub fn validate_loan_days(days: i64) -> ValidationResult<i64> {
    if !(1..=MAX_LOAN_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "loan_days".to_string(),
            min: 1,
            max: MAX_LOAN_DAYS,
        });
    }

    Ok(days)
}

/// Validates a fine entered on return. Zero is allowed (no fine).
pub fn validate_fine(fine: Money) -> ValidationResult<Money> {
    if fine.is_negative() {
        return Err(ValidationError::Negative {
            field: "fine".to_string(),
        });
    }

    Ok(fine)
}

/// Validates a configured daily fine rate: not negative, at most
/// [`MAX_FINE_PER_DAY`].
pub fn validate_fine_rate(rate: Money) -> ValidationResult<Money> {
    if rate.is_negative() {
        return Err(ValidationError::Negative {
            field: "fine_per_day".to_string(),
        });
    }
    if rate > MAX_FINE_PER_DAY {
        return Err(ValidationError::InvalidFormat {
            field: "fine_per_day".to_string(),
            reason: format!("must be at most {}", MAX_FINE_PER_DAY.to_decimal_string()),
        });
    }

    Ok(rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
