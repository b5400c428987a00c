//! # Console Front End
//!
//! Argument parsing and dispatch for the `libris-desk` binary.
//!
//! ```text
//! libris-desk [--db PATH] --user NAME --password PASS <command> [args]
//!
//!   stats                          dashboard counts and recent loans
//!   books [QUERY]                  catalog, optionally searched
//!   members [QUERY]                members, optionally searched
//!   categories [QUERY]             categories, optionally searched
//!   users [QUERY]                  staff accounts (admin only)
//!   issue BOOK_ID MEMBER_ID [DAYS] lend a copy
//!   return ISSUE_ID [FINE]         return a copy; FINE defaults to the
//!                                  suggested fine
//!   issues [all|active|overdue|returned]
//!   fines [paid|unpaid]
//!   pay-fine FINE_ID
//!   report KIND [--out DIR]        print a report, or export it as CSV
//! ```
//!
//! Every command runs inside a login session that is closed afterwards.
//! Results are printed as JSON.

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::commands::{
    auth, book, category, circulation, dashboard, fine, member, report, user,
};
use crate::error::ApiError;
use crate::Desk;
use libris_core::validation::parse_int;
use libris_core::{PaymentStatus, Session};
use libris_db::{IssueFilter, ReportKind};

/// One desk action requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    Books(String),
    Members(String),
    Categories(String),
    Users(String),
    Issue {
        book_id: i64,
        member_id: i64,
        loan_days: Option<i64>,
    },
    Return {
        issue_id: i64,
        fine: Option<String>,
    },
    Issues(IssueFilter),
    Fines(Option<PaymentStatus>),
    PayFine(i64),
    Report {
        kind: ReportKind,
        out: Option<PathBuf>,
    },
    Help,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub db_path: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub command: Command,
}

pub const USAGE: &str = "\
Usage: libris-desk [--db PATH] --user NAME --password PASS <command> [args]

Commands:
  stats                            Dashboard counts and recent loans
  books [QUERY]                    List or search books
  members [QUERY]                  List or search members
  categories [QUERY]               List or search categories
  users [QUERY]                    List or search staff (admin only)
  issue BOOK_ID MEMBER_ID [DAYS]   Lend a copy
  return ISSUE_ID [FINE]           Return a copy (fine defaults to suggested)
  issues [all|active|overdue|returned]
  fines [paid|unpaid]
  pay-fine FINE_ID
  report KIND [--out DIR]          inventory, member_activity,
                                   circulation_history, overdue, fine_ledger";

impl CliArgs {
    /// Parses arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self, ApiError> {
        let mut db_path = None;
        let mut username = None;
        let mut password = None;
        let mut out = None;
        let mut words: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--db" | "-d" => {
                    db_path = Some(PathBuf::from(value_after(args, i, "--db")?));
                    i += 1;
                }
                "--user" | "-u" => {
                    username = Some(value_after(args, i, "--user")?.to_string());
                    i += 1;
                }
                "--password" | "-p" => {
                    password = Some(value_after(args, i, "--password")?.to_string());
                    i += 1;
                }
                "--out" | "-o" => {
                    out = Some(PathBuf::from(value_after(args, i, "--out")?));
                    i += 1;
                }
                "--help" | "-h" => words = vec!["help".to_string()],
                other => words.push(other.to_string()),
            }
            i += 1;
        }

        let command = parse_command(&words, out)?;

        Ok(CliArgs {
            db_path,
            username,
            password,
            command,
        })
    }
}

fn value_after<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, ApiError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ApiError::validation(format!("{flag} needs a value")))
}

fn parse_command(words: &[String], out: Option<PathBuf>) -> Result<Command, ApiError> {
    let Some((name, rest)) = words.split_first() else {
        return Ok(Command::Help);
    };
    let arg = |n: usize| rest.get(n).map(String::as_str);
    let query = || rest.join(" ");
    let required = |n: usize, field: &str| -> Result<i64, ApiError> {
        let raw = arg(n).ok_or_else(|| ApiError::validation(format!("{field} is required")))?;
        Ok(parse_int(field, raw)?)
    };

    let command = match name.as_str() {
        "help" => Command::Help,
        "stats" => Command::Stats,
        "books" => Command::Books(query()),
        "members" => Command::Members(query()),
        "categories" => Command::Categories(query()),
        "users" => Command::Users(query()),
        "issue" => Command::Issue {
            book_id: required(0, "book_id")?,
            member_id: required(1, "member_id")?,
            loan_days: arg(2).map(|d| parse_int("loan_days", d)).transpose()?,
        },
        "return" => Command::Return {
            issue_id: required(0, "issue_id")?,
            fine: arg(1).map(str::to_string),
        },
        "issues" => Command::Issues(arg(0).unwrap_or("all").parse()?),
        "fines" => Command::Fines(arg(0).map(str::parse::<PaymentStatus>).transpose()?),
        "pay-fine" => Command::PayFine(required(0, "fine_id")?),
        "report" => Command::Report {
            kind: arg(0)
                .ok_or_else(|| ApiError::validation("report kind is required"))?
                .parse()?,
            out,
        },
        other => {
            return Err(ApiError::validation(format!(
                "unknown command '{other}', try --help"
            )))
        }
    };

    Ok(command)
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Logs in, runs one command, and logs out again.
pub async fn run(desk: &Desk, args: CliArgs) -> Result<Value, ApiError> {
    if args.command == Command::Help {
        return Ok(Value::String(USAGE.to_string()));
    }

    let (Some(username), Some(password)) = (args.username.as_deref(), args.password.as_deref())
    else {
        return Err(ApiError::unauthorized("--user and --password are required"));
    };

    let session = auth::login(&desk.db, &desk.sessions, username, password).await?;
    let result = execute(desk, &session, args.command).await;
    auth::logout(&desk.sessions, session.session_id)?;

    result
}

/// Runs one command for an authenticated session.
pub async fn execute(desk: &Desk, session: &Session, command: Command) -> Result<Value, ApiError> {
    debug!(?command, user = %session.username, "Dispatching command");
    let db = &desk.db;

    match command {
        Command::Help => Ok(Value::String(USAGE.to_string())),
        Command::Stats => to_json(dashboard::get_dashboard(db, &desk.config).await?),
        Command::Books(q) => to_json(book::search_books(db, &q).await?),
        Command::Members(q) => to_json(member::search_members(db, &q).await?),
        Command::Categories(q) => to_json(category::search_categories(db, &q).await?),
        Command::Users(q) => to_json(user::search_users(db, session, &q).await?),
        Command::Issue {
            book_id,
            member_id,
            loan_days,
        } => {
            let request = circulation::IssueRequest {
                book_id,
                member_id,
                loan_days,
            };
            to_json(circulation::issue_book(db, &desk.config, session, request).await?)
        }
        Command::Return { issue_id, fine } => {
            let fine = match fine {
                Some(fine) => fine,
                None => circulation::preview_return(db, &desk.config, issue_id)
                    .await?
                    .suggested_fine
                    .to_decimal_string(),
            };
            to_json(circulation::return_book(db, issue_id, &fine).await?)
        }
        Command::Issues(filter) => to_json(circulation::list_issues(db, filter).await?),
        Command::Fines(status) => to_json(fine::list_fines(db, status).await?),
        Command::PayFine(id) => to_json(fine::pay_fine(db, session, id).await?),
        Command::Report { kind, out: Some(dir) } => {
            to_json(report::export_report(db, kind, &dir).await?)
        }
        Command::Report { kind, out: None } => to_json(report::run_report(db, kind).await?),
    }
}
