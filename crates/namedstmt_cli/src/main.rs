//! Prepare-check probe for named queries.
//!
//! # Responsibility
//! - Register queries from the command line and prepare them against SQLite.
//! - Print a deterministic JSON report for scripts and CI checks.
//!
//! Usage: `namedstmt_cli <db-path|:memory:> <query>...`

use log::warn;
use namedstmt_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, DbOptions,
    LogConfig, SqliteNamedStmt, SqliteRegistry,
};
use serde::Serialize;
use std::process::ExitCode;

const LOG_LEVEL_ENV: &str = "NAMEDSTMT_LOG";
const LOG_DIR_ENV: &str = "NAMEDSTMT_LOG_DIR";
const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Serialize)]
struct Report {
    version: &'static str,
    prepared: Vec<SqliteNamedStmt>,
    error: Option<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((db_path, queries)) = args
        .split_first()
        .filter(|(_, queries)| !queries.is_empty())
    else {
        eprintln!("usage: namedstmt_cli <db-path|{MEMORY_DB}> <query>...");
        return ExitCode::from(2);
    };

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&LogConfig::new(level, log_dir)) {
            eprintln!("logging disabled: {err}");
        }
    }

    let options = DbOptions::default();
    let opened = if db_path.as_str() == MEMORY_DB {
        open_db_in_memory(&options)
    } else {
        open_db(db_path, &options)
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    let registry = SqliteRegistry::new();
    registry.add(queries.iter().cloned());

    let mut report = Report {
        version: core_version(),
        prepared: Vec::new(),
        error: None,
    };
    if let Err(err) = registry.prepare(&conn) {
        warn!("event=cli_prepare module=cli status=error");
        report.error = Some(err.to_string());
    }
    report.prepared = registry
        .queries()
        .iter()
        .filter_map(|query| registry.stmt(query))
        .map(|stmt| stmt.as_ref().clone())
        .collect();

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to render report: {err}");
            return ExitCode::FAILURE;
        }
    }

    if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
