//! # Reports
//!
//! Five canned read-only queries, materialized as tables and exported as CSV.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportKind            Rows                                             │
//! │  ───────────────────   ─────────────────────────────────────────────    │
//! │  inventory             one per book: copies total / available / out     │
//! │  member_activity       one per member: loans, active loans, fines owed  │
//! │  circulation_history   one per issue, with effective status             │
//! │  overdue               active issues past due, with days overdue        │
//! │  fine_ledger           one per fine                                     │
//! │                                                                         │
//! │  run(kind, as_of) ──► ReportTable { title, columns, rows }              │
//! │                           │                                             │
//! │                           ▼                                             │
//! │                 export_csv(&table, path)   header row = column names    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column headers are the SQL result column names, so the CSV header always
//! matches the query. Money columns are rendered as `12.50`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::DbResult;
use libris_core::ValidationError;

// =============================================================================
// Report Kinds
// =============================================================================

/// The canned reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Inventory,
    MemberActivity,
    CirculationHistory,
    Overdue,
    FineLedger,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Inventory,
        ReportKind::MemberActivity,
        ReportKind::CirculationHistory,
        ReportKind::Overdue,
        ReportKind::FineLedger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Inventory => "inventory",
            ReportKind::MemberActivity => "member_activity",
            ReportKind::CirculationHistory => "circulation_history",
            ReportKind::Overdue => "overdue",
            ReportKind::FineLedger => "fine_ledger",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Inventory => "Book Inventory",
            ReportKind::MemberActivity => "Member Activity",
            ReportKind::CirculationHistory => "Circulation History",
            ReportKind::Overdue => "Overdue Books",
            ReportKind::FineLedger => "Fine Ledger",
        }
    }

    /// Default export file name, e.g. `overdue_20261019.csv`.
    pub fn file_name(&self, as_of: DateTime<Utc>) -> String {
        format!("{}_{}.csv", self.as_str(), as_of.format("%Y%m%d"))
    }

    /// The query behind the report. `?1` is the `as_of` instant where used.
    fn sql(&self) -> &'static str {
        match self {
            ReportKind::Inventory => {
                r#"
                SELECT
                    b.id AS book_id,
                    b.title,
                    b.author,
                    b.isbn,
                    c.name AS category,
                    b.total_copies,
                    b.available_copies,
                    b.total_copies - b.available_copies AS on_loan
                FROM books b
                LEFT JOIN categories c ON c.id = b.category_id
                ORDER BY b.title, b.id
                "#
            }
            ReportKind::MemberActivity => {
                r#"
                SELECT
                    m.id AS member_id,
                    m.first_name || ' ' || m.last_name AS member,
                    m.email,
                    m.status,
                    COUNT(i.id) AS total_issues,
                    COALESCE(SUM(CASE WHEN i.status IN ('issued', 'overdue') THEN 1 ELSE 0 END), 0)
                        AS active_issues,
                    printf('%.2f', COALESCE((
                        SELECT SUM(f.amount_cents)
                        FROM fines f
                        JOIN book_issues fi ON fi.id = f.issue_id
                        WHERE fi.member_id = m.id AND f.payment_status = 'unpaid'
                    ), 0) / 100.0) AS fines_owed
                FROM members m
                LEFT JOIN book_issues i ON i.member_id = m.id
                GROUP BY m.id
                ORDER BY m.first_name, m.last_name, m.id
                "#
            }
            ReportKind::CirculationHistory => {
                r#"
                SELECT
                    i.id AS issue_id,
                    b.title AS book,
                    m.first_name || ' ' || m.last_name AS member,
                    i.issued_at,
                    i.due_at,
                    i.returned_at,
                    CASE
                        WHEN i.status = 'issued' AND julianday(i.due_at) < julianday(?1)
                        THEN 'overdue'
                        ELSE i.status
                    END AS status,
                    printf('%.2f', i.fine_cents / 100.0) AS fine
                FROM book_issues i
                JOIN books b ON b.id = i.book_id
                JOIN members m ON m.id = i.member_id
                ORDER BY i.issued_at DESC, i.id DESC
                "#
            }
            ReportKind::Overdue => {
                r#"
                SELECT
                    i.id AS issue_id,
                    b.title AS book,
                    m.first_name || ' ' || m.last_name AS member,
                    m.email,
                    m.phone,
                    i.issued_at,
                    i.due_at,
                    MAX(CAST(julianday(date(?1)) - julianday(date(i.due_at)) AS INTEGER), 0)
                        AS days_overdue
                FROM book_issues i
                JOIN books b ON b.id = i.book_id
                JOIN members m ON m.id = i.member_id
                WHERE i.status = 'overdue'
                   OR (i.status = 'issued' AND julianday(i.due_at) < julianday(?1))
                ORDER BY i.due_at, i.id
                "#
            }
            ReportKind::FineLedger => {
                r#"
                SELECT
                    f.id AS fine_id,
                    f.issue_id,
                    m.first_name || ' ' || m.last_name AS member,
                    b.title AS book,
                    printf('%.2f', f.amount_cents / 100.0) AS amount,
                    f.payment_status,
                    f.fined_at,
                    f.paid_at
                FROM fines f
                JOIN book_issues i ON i.id = f.issue_id
                JOIN members m ON m.id = i.member_id
                JOIN books b ON b.id = i.book_id
                ORDER BY f.fined_at DESC, f.id DESC
                "#
            }
        }
    }

    fn uses_as_of(&self) -> bool {
        matches!(self, ReportKind::CirculationHistory | ReportKind::Overdue)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `fine_ledger` as well as `fine-ledger`.
impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "report".to_string(),
                allowed: ReportKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Report Table
// =============================================================================

/// A materialized report: header plus text cells. NULL becomes `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Renders one cell as text, whatever its SQLite storage class.
fn cell_text(row: &SqliteRow, index: usize) -> String {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(|v| v.to_string()).unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(|v| v.to_string()).unwrap_or_default();
    }
    String::new()
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Runs a report as of `as_of` (used by the reports that judge lateness).
    ///
    /// An empty result still carries its column names when SQLite can
    /// describe the statement.
    pub async fn run(&self, kind: ReportKind, as_of: DateTime<Utc>) -> DbResult<ReportTable> {
        debug!(report = %kind, "Running report");

        let mut query = sqlx::query(kind.sql());
        if kind.uses_as_of() {
            query = query.bind(as_of);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => self.describe_columns(kind).await?,
        };

        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| cell_text(row, i)).collect())
            .collect();

        info!(report = %kind, rows = rows.len(), "Report ready");
        Ok(ReportTable {
            title: kind.title().to_string(),
            columns,
            rows,
        })
    }

    async fn describe_columns(&self, kind: ReportKind) -> DbResult<Vec<String>> {
        use sqlx::Executor;

        let described = self.pool.describe(kind.sql()).await?;
        Ok(described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }
}

// =============================================================================
// CSV Export
// =============================================================================

/// Writes `table` to `path` as comma-separated values with a header row.
pub fn export_csv(table: &ReportTable, path: &Path) -> DbResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        rows = table.rows.len(),
        title = %table.title,
        "Report exported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use libris_core::{CirculationPolicy, Money};

    #[test]
    fn test_report_kind_parsing() {
        assert_eq!("fine_ledger".parse::<ReportKind>().unwrap(), ReportKind::FineLedger);
        assert_eq!("Member-Activity".parse::<ReportKind>().unwrap(), ReportKind::MemberActivity);
        assert!("sales".parse::<ReportKind>().is_err());

        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_file_name() {
        let as_of = DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(ReportKind::Overdue.file_name(as_of), "overdue_20261019.csv");
    }

    #[tokio::test]
    async fn test_inventory_columns_and_cells() {
        let db = test_support::db().await;
        db.books().create(test_support::book("Dune", 3)).await.unwrap();

        let table = db.reports().run(ReportKind::Inventory, Utc::now()).await.unwrap();
        assert_eq!(
            table.columns,
            vec![
                "book_id",
                "title",
                "author",
                "isbn",
                "category",
                "total_copies",
                "available_copies",
                "on_loan"
            ]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Dune");
        assert_eq!(table.rows[0][3], "");
        assert_eq!(table.rows[0][7], "0");
    }

    #[tokio::test]
    async fn test_every_report_runs_on_empty_database() {
        let db = test_support::db().await;
        for kind in ReportKind::ALL {
            let table = db.reports().run(kind, Utc::now()).await.unwrap();
            assert!(table.is_empty());
            assert!(!table.columns.is_empty(), "{kind} has no columns");
        }
    }

    #[tokio::test]
    async fn test_overdue_and_fine_reports() {
        let db = test_support::db().await;
        let policy = CirculationPolicy::default();
        let book = db.books().create(test_support::book("Dune", 2)).await.unwrap();
        let member = db
            .members()
            .create(test_support::member("Ada", "ada@example.org"))
            .await
            .unwrap();

        let late = db
            .issues()
            .issue_book(book.id, member.id, test_support::days_from_now(2), None, &policy)
            .await
            .unwrap();
        let returned = db
            .issues()
            .issue_book(book.id, member.id, test_support::days_from_now(2), None, &policy)
            .await
            .unwrap();
        db.issues()
            .return_book(returned.id, Money::from_cents(250))
            .await
            .unwrap();

        let as_of = late.due_at + chrono::Duration::days(3);
        let overdue = db.reports().run(ReportKind::Overdue, as_of).await.unwrap();
        assert_eq!(overdue.rows.len(), 1);
        let days = overdue.column("days_overdue").unwrap();
        assert_eq!(overdue.rows[0][days], "3");

        let history = db.reports().run(ReportKind::CirculationHistory, as_of).await.unwrap();
        let status = history.column("status").unwrap();
        let mut statuses: Vec<_> = history.rows.iter().map(|r| r[status].as_str()).collect();
        statuses.sort();
        assert_eq!(statuses, vec!["overdue", "returned"]);

        let ledger = db.reports().run(ReportKind::FineLedger, as_of).await.unwrap();
        let amount = ledger.column("amount").unwrap();
        assert_eq!(ledger.rows[0][amount], "2.50");

        let activity = db.reports().run(ReportKind::MemberActivity, as_of).await.unwrap();
        let row = &activity.rows[0];
        assert_eq!(row[activity.column("total_issues").unwrap()], "2");
        assert_eq!(row[activity.column("active_issues").unwrap()], "1");
        assert_eq!(row[activity.column("fines_owed").unwrap()], "2.50");
    }

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let table = ReportTable {
            title: "Fine Ledger".to_string(),
            columns: vec!["fine_id".to_string(), "member".to_string(), "amount".to_string()],
            rows: vec![vec!["1".to_string(), "Lovelace, Ada".to_string(), "2.50".to_string()]],
        };

        let path = std::env::temp_dir().join(format!(
            "libris-export-{}.csv",
            std::process::id()
        ));
        export_csv(&table, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written, "fine_id,member,amount\n1,\"Lovelace, Ada\",2.50\n");
    }
}
