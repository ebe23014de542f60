//! Concurrency-safe registry of lazily prepared named SQL statements.
//!
//! Register query text up front, prepare everything once a database handle
//! is available, then look handles up by the same text from any thread.

pub mod db;
pub mod logging;
pub mod stmts;

pub use db::{open_db, open_db_in_memory, DbError, DbOptions, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use stmts::{
    failure_message, log_failure, panic_on_failure, NamedPreparer, PrepareMode, RegistryError,
    RegistryResult, SqliteNamedStmt, StatementRegistry,
};

/// Registry specialised to the bundled SQLite preparer.
pub type SqliteRegistry = StatementRegistry<SqliteNamedStmt>;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
