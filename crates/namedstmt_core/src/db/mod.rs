//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for statement preparation.
//! - Apply connection options before the connection is handed out.
//!
//! # Invariants
//! - Returned connections have every `DbOptions` setting applied.
//! - Schema management stays with the caller.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidOption(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidOption(message) => write!(f, "invalid connection option: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidOption(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Connection settings applied by `open_db` and `open_db_in_memory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOptions {
    /// How long SQLite waits on a locked database. Zero disables waiting.
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
    /// Capacity of the per-connection prepared statement cache. Preparing a
    /// registry grows it to fit every registered statement.
    pub statement_cache_capacity: usize,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            foreign_keys: true,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
        }
    }
}

impl DbOptions {
    fn validate(&self) -> DbResult<()> {
        if self.statement_cache_capacity == 0 {
            return Err(DbError::InvalidOption(
                "statement_cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
