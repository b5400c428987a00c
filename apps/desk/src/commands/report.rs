//! # Report Commands
//!
//! Runs the canned reports and exports them as CSV.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::ApiError;
use crate::state::DbState;
use libris_db::{export_csv, ReportKind, ReportTable};

/// Where an export went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub report: ReportKind,
    pub path: PathBuf,
    pub rows: usize,
}

pub async fn run_report(db: &DbState, kind: ReportKind) -> Result<ReportTable, ApiError> {
    Ok(db.inner().reports().run(kind, Utc::now()).await?)
}

/// Runs a report and writes it as CSV into `dir`, named
/// `<report>_<YYYYMMDD>.csv`.
pub async fn export_report(
    db: &DbState,
    kind: ReportKind,
    dir: &Path,
) -> Result<ExportSummary, ApiError> {
    let now = Utc::now();
    let table = db.inner().reports().run(kind, now).await?;
    let path = dir.join(kind.file_name(now));

    export_csv(&table, &path)?;

    Ok(ExportSummary {
        report: kind,
        path,
        rows: table.rows.len(),
    })
}
