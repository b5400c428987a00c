//! # Libris Desk Library
//!
//! Command layer for the circulation desk, plus the console front end that
//! drives it.
//!
//! ## Module Organization
//! ```text
//! libris_desk/
//! ├── lib.rs          ◄─── You are here (Desk setup, logging)
//! ├── cli.rs          ◄─── Console argument parsing and dispatch
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── session.rs  ◄─── Open login sessions
//! │   └── config.rs   ◄─── LIBRIS_* configuration
//! ├── commands/       ◄─── One function per desk action
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Desk                                                                   │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐     │
//! │  │    DbState       │ │   SessionState   │ │     AppConfig        │     │
//! │  │  • Database pool │ │  • open sessions │ │  • loan days         │     │
//! │  │  • Repositories  │ │                  │ │  • fine per day      │     │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘     │
//! │                                                                         │
//! │  Commands borrow only what they need: &DbState, &AppConfig, &Session.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use error::{ApiError, ErrorCode};
use state::{AppConfig, DbState, SessionState};

/// Everything a front end needs to run desk commands.
#[derive(Debug, Clone)]
pub struct Desk {
    pub db: DbState,
    pub sessions: SessionState,
    pub config: AppConfig,
}

impl Desk {
    /// Opens the configured database.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Resolve database path ─── LIBRIS_DB_PATH / --db / data dir          │
    /// │  2. Connect ─────────────── SQLite, WAL mode, foreign keys on           │
    /// │  3. Migrate ─────────────── schema + default categories                 │
    /// │  4. Default admin ───────── admin / admin123 when no admin exists       │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let db_path = config.database_path()?;
        info!(?db_path, library = %config.library_name, "Opening library database");

        let db = DbState::open(db_path).await?;
        if !db.inner().health_check().await {
            return Err(ApiError::new(
                ErrorCode::DatabaseError,
                "Database is not responding",
            ));
        }
        info!("Database connected and migrations applied");

        Ok(Desk {
            db,
            sessions: SessionState::new(),
            config,
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=libris=trace` - Show trace for libris crates only
/// - Default: `info,libris=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,libris=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
