//! Database handle contract and the SQLite implementation.
//!
//! # Responsibility
//! - Define the single operation the registry needs from a database handle.
//! - Compile named queries against SQLite and keep a shareable descriptor.
//!
//! # Invariants
//! - `SqliteNamedStmt` is only built from SQL that SQLite compiled
//!   successfully on the preparing connection.
//! - Descriptors hold no borrow of the connection.
//! - The connection's statement cache holds every statement of the batch
//!   being prepared, so `SqliteNamedStmt::cached` reuses the compiled one.

use crate::db::DEFAULT_STATEMENT_CACHE_CAPACITY;
use rusqlite::{CachedStatement, Connection};
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;

/// Database handle able to compile a named/parameterized query.
pub trait NamedPreparer {
    type Stmt;
    type Error: Error + Send + Sync + 'static;

    fn prepare_named(&self, query: &str) -> Result<Self::Stmt, Self::Error>;

    /// Called before a batch with the number of statements that must stay
    /// compiled on this handle at once.
    fn reserve(&self, _statements: usize) {}
}

impl<T: NamedPreparer + ?Sized> NamedPreparer for &T {
    type Stmt = T::Stmt;
    type Error = T::Error;

    fn prepare_named(&self, query: &str) -> Result<Self::Stmt, Self::Error> {
        (**self).prepare_named(query)
    }

    fn reserve(&self, statements: usize) {
        (**self).reserve(statements)
    }
}

impl<T: NamedPreparer + ?Sized> NamedPreparer for Arc<T> {
    type Stmt = T::Stmt;
    type Error = T::Error;

    fn prepare_named(&self, query: &str) -> Result<Self::Stmt, Self::Error> {
        (**self).prepare_named(query)
    }

    fn reserve(&self, statements: usize) {
        (**self).reserve(statements)
    }
}

/// Compiled SQLite query descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqliteNamedStmt {
    sql: String,
    parameter_names: Vec<String>,
    parameter_count: usize,
    column_names: Vec<String>,
    readonly: bool,
}

impl SqliteNamedStmt {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Named placeholders (`:name`, `@name`, `$name`) in bind-index order.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Total bind parameters, positional ones included.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Returns the compiled statement from `conn`'s statement cache.
    ///
    /// The statement goes back to the cache when the returned value drops.
    pub fn cached<'conn>(
        &self,
        conn: &'conn Connection,
    ) -> rusqlite::Result<CachedStatement<'conn>> {
        conn.prepare_cached(&self.sql)
    }
}

impl NamedPreparer for Connection {
    type Stmt = SqliteNamedStmt;
    type Error = rusqlite::Error;

    fn prepare_named(&self, query: &str) -> rusqlite::Result<SqliteNamedStmt> {
        let stmt = self.prepare_cached(query)?;

        let parameter_count = stmt.parameter_count();
        // Bind indexes are 1-based. SQLite reports `?NNN` as a name and plain
        // `?` as none; both are positional.
        let parameter_names = (1..=parameter_count)
            .filter_map(|index| stmt.parameter_name(index))
            .filter(|name| !name.starts_with('?'))
            .map(str::to_string)
            .collect();
        let column_names = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(SqliteNamedStmt {
            sql: query.to_string(),
            parameter_names,
            parameter_count,
            column_names,
            readonly: stmt.readonly(),
        })
    }

    /// Grows the statement cache so no registered statement is evicted.
    ///
    /// The capacity never drops below the `DbOptions` default.
    fn reserve(&self, statements: usize) {
        self.set_prepared_statement_cache_capacity(
            statements.max(DEFAULT_STATEMENT_CACHE_CAPACITY),
        );
    }
}
