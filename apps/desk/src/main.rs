//! # Libris Desk Entry Point
//!
//! Console front end for the circulation desk.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Desk                                      │
//! │                                                                         │
//! │  argv ──► cli::CliArgs::parse                                           │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  AppConfig::from_env (+ --db) ──► Desk::open                            │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  cli::run: login ──► command ──► logout                                 │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  stdout: JSON result          stderr: logs                              │
//! │  exit 1 with {"code", "message"} on failure                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use libris_desk::cli::{self, CliArgs, Command};
use libris_desk::error::ApiError;
use libris_desk::state::AppConfig;
use libris_desk::{init_tracing, Desk};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(Value::String(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Ok(value) => print_json(&value, ExitCode::SUCCESS),
        Err(err) => {
            let value = serde_json::to_value(&err).unwrap_or(Value::Null);
            print_json(&value, ExitCode::FAILURE)
        }
    }
}

async fn run() -> Result<Value, ApiError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = CliArgs::parse(&args)?;

    if args.command == Command::Help {
        return Ok(Value::String(cli::USAGE.to_string()));
    }

    let mut config = AppConfig::from_env()?;
    if let Some(path) = &args.db_path {
        config.db_path = Some(path.clone());
    }

    info!(library = %config.library_name, "Starting Libris desk");
    let desk = Desk::open(config).await?;

    let result = cli::run(&desk, args).await;
    desk.db.inner().close().await;
    result
}

fn print_json(value: &Value, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            code
        }
        Err(e) => {
            eprintln!("Failed to render output: {e}");
            ExitCode::FAILURE
        }
    }
}
