//! # State Module
//!
//! Application state for the desk.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐               │
//! │  │   DbState    │  │ SessionState │  │    AppConfig     │               │
//! │  │              │  │              │  │                  │               │
//! │  │  Database    │  │  Arc<Mutex<  │  │  db_path         │               │
//! │  │  (SQLite     │  │   HashMap<   │  │  loan_days       │               │
//! │  │   pool)      │  │   Uuid,      │  │  fine_per_day    │               │
//! │  │              │  │   Session>>> │  │  library_name    │               │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘               │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • DbState: Database has internal connection pool (thread-safe)         │
//! │  • SessionState: Protected by Arc<Mutex<T>>                             │
//! │  • AppConfig: Read-only after initialization                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::{AppConfig, ConfigError};
pub use db::DbState;
pub use session::SessionState;
