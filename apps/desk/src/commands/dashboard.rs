//! # Dashboard Command
//!
//! Headline counts and latest loans for the start screen.

use chrono::Utc;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};
use libris_core::{DashboardStats, IssueListing, RECENT_ISSUES_LIMIT};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub library_name: String,
    pub stats: DashboardStats,
    pub recent_issues: Vec<IssueListing>,
}

pub async fn get_dashboard(db: &DbState, config: &AppConfig) -> Result<Dashboard, ApiError> {
    let now = Utc::now();
    let issues = db.inner().issues();

    Ok(Dashboard {
        library_name: config.library_name.clone(),
        stats: issues.dashboard_stats(now).await?,
        recent_issues: issues.recent(RECENT_ISSUES_LIMIT, now).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = DbState::in_memory().await.unwrap();
        let dashboard = get_dashboard(&db, &AppConfig::default()).await.unwrap();

        assert_eq!(dashboard.library_name, "Libris Library");
        assert_eq!(dashboard.stats.total_books, 0);
        assert_eq!(dashboard.stats.overdue_now, 0);
        assert!(dashboard.recent_issues.is_empty());
    }
}
