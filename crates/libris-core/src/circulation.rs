//! # Circulation Rules
//!
//! How copies move between the shelf and members, and how lateness is judged.
//!
//! ## Copy Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Book: total_copies = T, available_copies = A                          │
//! │                                                                         │
//! │   lent out  B = T - A                                                   │
//! │                                                                         │
//! │   issue    : A ─► A - 1      (requires A > 0)                           │
//! │   return   : A ─► A + 1      (never above T)                            │
//! │   edit T→T': A ─► clamp(T' - B, 0, T')                                  │
//! │                                                                         │
//! │   Invariant: 0 <= A <= T after every step                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overdue
//! `overdue` is never written by the circulation engine. A loan is overdue
//! when it is still `issued` and its due time has passed at the moment of
//! reading; see [`effective_status`].
//!
//! The persistence side of these rules lives in `libris-db`, which runs each
//! multi-statement change inside one transaction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Book, Issue, IssueStatus, Member, MemberStatus};
use crate::DEFAULT_LOAN_DAYS;

// =============================================================================
// Policy
// =============================================================================

/// Operator-tunable circulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CirculationPolicy {
    /// Loan length used when the operator does not choose a due date.
    pub loan_days: i64,
    /// Rate used to suggest a fine on late returns.
    pub fine_per_day: Money,
    /// Refuse loans to members whose status is not `active`.
    pub require_active_member: bool,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        CirculationPolicy {
            loan_days: DEFAULT_LOAN_DAYS,
            fine_per_day: Money::from_cents(50),
            require_active_member: false,
        }
    }
}

impl CirculationPolicy {
    /// Due date for a loan starting at `issued_at` under this policy.
    pub fn due_date(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        default_due_date(issued_at, self.loan_days)
    }

    /// Fine to propose when a loan due at `due_at` comes back at `returned_at`.
    pub fn suggested_fine(&self, due_at: DateTime<Utc>, returned_at: DateTime<Utc>) -> Money {
        suggested_fine(due_at, returned_at, self.fine_per_day)
    }

    /// Checks whether `member` may borrow under this policy.
    pub fn check_member(&self, member: &Member) -> CoreResult<()> {
        if self.require_active_member && member.status != MemberStatus::Active {
            return Err(CoreError::MemberNotActive {
                member_id: member.id,
                status: member.status,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Dates
// =============================================================================

/// `issued_at + loan_days`.
pub fn default_due_date(issued_at: DateTime<Utc>, loan_days: i64) -> DateTime<Utc> {
    issued_at + Duration::days(loan_days)
}

/// Stored status with `Issued` promoted to `Overdue` once `due_at < as_of`.
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use libris_core::circulation::effective_status;
/// use libris_core::IssueStatus;
///
/// let now = Utc::now();
/// let due = now - Duration::hours(1);
/// assert_eq!(effective_status(IssueStatus::Issued, due, now), IssueStatus::Overdue);
/// assert_eq!(effective_status(IssueStatus::Returned, due, now), IssueStatus::Returned);
/// ```
pub fn effective_status(
    stored: IssueStatus,
    due_at: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> IssueStatus {
    match stored {
        IssueStatus::Issued if due_at < as_of => IssueStatus::Overdue,
        other => other,
    }
}

/// Whole calendar days between the due date and `as_of`, or 0 if not late.
///
/// Counted on UTC dates, so a book due at 17:00 and checked at 09:00 the next
/// morning is one day late.
pub fn days_overdue(due_at: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    (as_of.date_naive() - due_at.date_naive()).num_days().max(0)
}

/// `days_overdue * daily_rate`, saturating at the largest amount `Money`
/// can hold.
pub fn suggested_fine(
    due_at: DateTime<Utc>,
    returned_at: DateTime<Utc>,
    daily_rate: Money,
) -> Money {
    daily_rate.saturating_mul(days_overdue(due_at, returned_at))
}

// =============================================================================
// Copy Counts
// =============================================================================

/// Copies out on loan given the current counts.
#[inline]
pub fn lent_out(total_copies: i64, available_copies: i64) -> i64 {
    (total_copies - available_copies).max(0)
}

/// Available copies after the total changes from `old_total` to `new_total`.
///
/// Copies already lent out stay accounted for; the result is clamped to
/// `[0, new_total]`.
///
/// ```rust
/// use libris_core::circulation::reconcile_available;
///
/// assert_eq!(reconcile_available(3, 1, 5), 3); // 2 lent out
/// assert_eq!(reconcile_available(5, 1, 2), 0); // more lent out than owned
/// ```
pub fn reconcile_available(old_total: i64, old_available: i64, new_total: i64) -> i64 {
    let new_total = new_total.max(0);
    (new_total - lent_out(old_total, old_available)).clamp(0, new_total)
}

// =============================================================================
// Preconditions
// =============================================================================

/// Preconditions for lending a copy of `book` to `member`.
///
/// ```text
/// issue_book(book, member)
///      │
///      ├── available_copies == 0?            → NoCopiesAvailable
///      ├── policy requires active member and
///      │   member.status != active?          → MemberNotActive
///      └── OK → insert issue, decrement available
/// ```
pub fn check_can_issue(
    book: &Book,
    member: &Member,
    policy: &CirculationPolicy,
) -> CoreResult<()> {
    if book.available_copies <= 0 {
        return Err(CoreError::NoCopiesAvailable {
            book_id: book.id,
            title: book.title.clone(),
        });
    }
    policy.check_member(member)
}

/// Preconditions for returning `issue`: it must still be out.
pub fn check_can_return(issue: &Issue) -> CoreResult<()> {
    if !issue.status.is_active() {
        return Err(CoreError::AlreadyReturned { issue_id: issue.id });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
    }

    fn book(total: i64, available: i64) -> Book {
        Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: None,
            publisher: None,
            publication_year: Some(1965),
            category_id: None,
            total_copies: total,
            available_copies: available,
            description: None,
            added_at: at(1, 9),
        }
    }

    fn member(status: MemberStatus) -> Member {
        Member {
            id: 3,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
            address: None,
            status,
            joined_at: at(1, 9),
        }
    }

    #[test]
    fn test_default_due_date() {
        assert_eq!(default_due_date(at(1, 10), 14), at(15, 10));
        assert_eq!(CirculationPolicy::default().due_date(at(2, 8)), at(16, 8));
    }

    #[test]
    fn test_effective_status() {
        let due = at(15, 10);
        assert_eq!(effective_status(IssueStatus::Issued, due, at(15, 9)), IssueStatus::Issued);
        assert_eq!(effective_status(IssueStatus::Issued, due, due), IssueStatus::Issued);
        assert_eq!(effective_status(IssueStatus::Issued, due, at(15, 11)), IssueStatus::Overdue);
        assert_eq!(effective_status(IssueStatus::Overdue, due, at(1, 0)), IssueStatus::Overdue);
        assert_eq!(effective_status(IssueStatus::Returned, due, at(30, 0)), IssueStatus::Returned);
    }

    #[test]
    fn test_days_overdue() {
        let due = at(10, 17);
        assert_eq!(days_overdue(due, at(9, 12)), 0);
        assert_eq!(days_overdue(due, at(10, 23)), 0);
        assert_eq!(days_overdue(due, at(11, 9)), 1);
        assert_eq!(days_overdue(due, at(15, 9)), 5);
    }

    #[test]
    fn test_suggested_fine() {
        let policy = CirculationPolicy::default();
        assert_eq!(policy.suggested_fine(at(10, 12), at(10, 18)), Money::zero());
        assert_eq!(policy.suggested_fine(at(10, 12), at(15, 8)), Money::from_cents(250));
    }

    #[test]
    fn test_suggested_fine_saturates_on_huge_rate() {
        let policy = CirculationPolicy {
            fine_per_day: "92233720368547758.07".parse().unwrap(),
            ..CirculationPolicy::default()
        };

        let fine = policy.suggested_fine(at(10, 12), at(13, 12));
        assert_eq!(fine.cents(), i64::MAX);
    }

    #[test]
    fn test_reconcile_available() {
        // 3 total, 1 available → 2 lent out
        assert_eq!(reconcile_available(3, 1, 5), 3);
        assert_eq!(reconcile_available(3, 1, 3), 1);
        assert_eq!(reconcile_available(3, 1, 2), 0);
        assert_eq!(reconcile_available(3, 3, 1), 1);
        assert_eq!(reconcile_available(10, 0, 4), 0);
    }

    #[test]
    fn test_reconcile_stays_in_bounds() {
        for old_total in 1..8 {
            for old_available in 0..=old_total {
                for new_total in 1..12 {
                    let a = reconcile_available(old_total, old_available, new_total);
                    assert!(a >= 0 && a <= new_total);
                }
            }
        }
    }

    #[test]
    fn test_check_can_issue() {
        let policy = CirculationPolicy::default();
        assert!(check_can_issue(&book(3, 1), &member(MemberStatus::Active), &policy).is_ok());

        let err = check_can_issue(&book(3, 0), &member(MemberStatus::Active), &policy).unwrap_err();
        assert!(matches!(err, CoreError::NoCopiesAvailable { book_id: 7, .. }));
    }

    #[test]
    fn test_member_status_only_enforced_by_policy() {
        let suspended = member(MemberStatus::Suspended);

        let lenient = CirculationPolicy::default();
        assert!(check_can_issue(&book(1, 1), &suspended, &lenient).is_ok());

        let strict = CirculationPolicy {
            require_active_member: true,
            ..CirculationPolicy::default()
        };
        let err = check_can_issue(&book(1, 1), &suspended, &strict).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MemberNotActive {
                member_id: 3,
                status: MemberStatus::Suspended
            }
        ));
    }

    #[test]
    fn test_check_can_return() {
        let mut issue = Issue {
            id: 9,
            book_id: 7,
            member_id: 3,
            issued_at: at(1, 10),
            due_at: at(15, 10),
            returned_at: None,
            fine_cents: 0,
            status: IssueStatus::Issued,
            issued_by: None,
        };
        assert!(check_can_return(&issue).is_ok());

        issue.status = IssueStatus::Overdue;
        assert!(check_can_return(&issue).is_ok());

        issue.status = IssueStatus::Returned;
        assert!(matches!(
            check_can_return(&issue),
            Err(CoreError::AlreadyReturned { issue_id: 9 })
        ));
    }
}
