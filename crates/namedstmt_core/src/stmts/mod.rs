//! Named statement registry.
//!
//! # Responsibility
//! - Map query text to lazily prepared statement handles.
//! - Provide safe concurrent lookup of prepared handles.
//!
//! # Invariants
//! - A query text is registered at most once.
//! - Lookups never create entries; only `add` registers and only `prepare`
//!   publishes handles.
//! - Registered queries are never removed or invalidated.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod failure;
pub mod preparer;
pub mod registry;

pub use failure::{failure_message, log_failure, panic_on_failure};
pub use preparer::{NamedPreparer, SqliteNamedStmt};
pub use registry::{PrepareMode, StatementRegistry};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors surfaced by `StatementRegistry::prepare`.
#[derive(Debug)]
pub enum RegistryError {
    /// `prepare` was called before any query was registered.
    NothingToPrepare,
    /// The database handle rejected one registered query.
    Prepare {
        query: String,
        source: Box<dyn Error + Send + Sync + 'static>,
    },
}

impl RegistryError {
    /// Returns the offending query text for preparation failures.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::NothingToPrepare => None,
            Self::Prepare { query, .. } => Some(query.as_str()),
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::NothingToPrepare => "nothing_to_prepare",
            Self::Prepare { .. } => "prepare_failed",
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToPrepare => write!(f, "no statements to prepare"),
            Self::Prepare { query, source } => write!(f, "{source} in query {query}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NothingToPrepare => None,
            Self::Prepare { source, .. } => Some(source.as_ref()),
        }
    }
}
