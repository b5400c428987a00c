//! # API Error Type
//!
//! Unified error type for desk commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Libris                                 │
//! │                                                                         │
//! │  Front end                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  issue_book(book 7, member 3)                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ─── DbError::QueryFailed(..) ───┐             │  │
//! │  │         │             (logged, reported generically)             │  │
//! │  │         ▼                                          ▼             │  │
//! │  │  Rule violation? ─── CoreError::NoCopiesAvailable ─► ApiError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "NO_COPIES_AVAILABLE",                                       │
//! │    "message": "No copies of 'Dune' are available (book 7)" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use libris_core::{CoreError, ValidationError};
use libris_db::DbError;
use serde::Serialize;

use crate::state::ConfigError;

/// API error returned from desk commands.
///
/// ## Serialization
/// This is what the front end receives when a command fails:
/// ```json
/// {
///   "code": "DUPLICATE",
///   "message": "ISBN '9780441172719' already exists"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// ISBN, email, username or category name already taken
    Duplicate,

    /// Login failed or the session is unknown
    Unauthorized,

    /// The session's role does not allow the action
    Forbidden,

    /// Every copy of the book is out
    NoCopiesAvailable,

    /// A library rule rejected the action (active loans, already returned, ...)
    BusinessLogic,

    /// Database operation failed
    DatabaseError,

    /// Report file could not be written
    ExportError,

    /// Configuration could not be read
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Domain(e) => ApiError::from(e),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Export(e) => {
                tracing::error!("Report export failed: {}", e);
                ApiError::new(ErrorCode::ExportError, format!("Export failed: {}", e))
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NoCopiesAvailable { .. } => ErrorCode::NoCopiesAvailable,
            CoreError::InvalidCredentials => ErrorCode::Unauthorized,
            CoreError::Forbidden { .. } => ErrorCode::Forbidden,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::AlreadyReturned { .. }
            | CoreError::HasActiveIssues { .. }
            | CoreError::MemberNotActive { .. }
            | CoreError::FineAlreadyPaid { .. }
            | CoreError::LastAdmin
            | CoreError::SelfDelete => ErrorCode::BusinessLogic,
        };

        match err {
            CoreError::Validation(e) => ApiError::from(e),
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_duplicate_code() {
        let err = ApiError::from(DbError::duplicate("ISBN", "9780441172719"));
        assert_eq!(err.code, ErrorCode::Duplicate);
        assert_eq!(err.message, "ISBN '9780441172719' already exists");
    }

    #[test]
    fn test_domain_errors_pass_through_db_error() {
        let err = ApiError::from(DbError::from(CoreError::NoCopiesAvailable {
            book_id: 7,
            title: "Dune".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::NoCopiesAvailable);
        assert!(err.message.contains("Dune"));

        let err = ApiError::from(CoreError::HasActiveIssues {
            entity: "member".to_string(),
            id: 3,
            active: 1,
        });
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "title".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "title is required");
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_string(&ApiError::unauthorized("Not logged in")).unwrap();
        assert_eq!(json, r#"{"code":"UNAUTHORIZED","message":"Not logged in"}"#);
    }
}
