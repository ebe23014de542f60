//! Concurrency-safe map from query text to prepared handles.

use crate::logging::sanitize_message;
use crate::stmts::preparer::NamedPreparer;
use crate::stmts::{RegistryError, RegistryResult};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

const MAX_LOGGED_ERROR_CHARS: usize = 200;

type Entries<S> = BTreeMap<String, Option<Arc<S>>>;

/// Controls which registered queries `prepare_with` hands to the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrepareMode {
    /// Re-prepare every registered query, including prepared ones.
    #[default]
    Refresh,
    /// Prepare only queries that do not have a handle yet.
    PendingOnly,
}

/// Registry of named queries and their prepared statement handles.
///
/// A registered query without a handle is waiting for `prepare`.
pub struct StatementRegistry<S> {
    entries: RwLock<Entries<S>>,
}

impl<S> Default for StatementRegistry<S> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<S> StatementRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers queries for later preparation.
    ///
    /// Already registered queries keep their current handle, so overlapping
    /// batches are safe. An empty batch does not touch the lock.
    pub fn add<I, Q>(&self, queries: I)
    where
        I: IntoIterator<Item = Q>,
        Q: Into<String>,
    {
        let mut queries = queries.into_iter().peekable();
        if queries.peek().is_none() {
            return;
        }

        let mut entries = self.write();
        let before = entries.len();
        for query in queries {
            entries.entry(query.into()).or_insert(None);
        }
        debug!(
            "event=stmt_register module=stmts status=ok added={} total={}",
            entries.len() - before,
            entries.len()
        );
    }

    /// Prepares every registered query against `db`.
    ///
    /// Equivalent to `prepare_with(db, PrepareMode::Refresh)`.
    pub fn prepare<P>(&self, db: &P) -> RegistryResult<()>
    where
        P: NamedPreparer<Stmt = S>,
    {
        self.prepare_with(db, PrepareMode::Refresh)
    }

    /// Prepares registered queries against `db` according to `mode`.
    ///
    /// `db` is first asked to reserve room for every registered statement,
    /// prepared or not. The database call runs without the lock held; the
    /// write lock is taken once per query to publish its handle. Stops at the
    /// first failure and keeps handles published before it.
    ///
    /// # Errors
    /// - `RegistryError::NothingToPrepare` when no query is registered.
    /// - `RegistryError::Prepare` naming the first query `db` rejected.
    pub fn prepare_with<P>(&self, db: &P, mode: PrepareMode) -> RegistryResult<()>
    where
        P: NamedPreparer<Stmt = S>,
    {
        let started_at = Instant::now();
        let (targets, skipped) = {
            let entries = self.read();
            if entries.is_empty() {
                error!(
                    "event=stmt_prepare module=stmts status=error error_code={}",
                    RegistryError::NothingToPrepare.code()
                );
                return Err(RegistryError::NothingToPrepare);
            }
            let targets: Vec<String> = entries
                .iter()
                .filter(|(_, handle)| mode == PrepareMode::Refresh || handle.is_none())
                .map(|(query, _)| query.clone())
                .collect();
            let skipped = entries.len() - targets.len();
            (targets, skipped)
        };
        db.reserve(targets.len() + skipped);
        info!(
            "event=stmt_prepare module=stmts status=start mode={:?} count={}",
            mode,
            targets.len()
        );

        for (index, query) in targets.iter().enumerate() {
            let handle = match db.prepare_named(query) {
                Ok(handle) => Arc::new(handle),
                Err(err) => {
                    let err = RegistryError::Prepare {
                        query: query.clone(),
                        source: Box::new(err),
                    };
                    error!(
                        "event=stmt_prepare module=stmts status=error duration_ms={} prepared={} query_len={} error_code={} error={}",
                        started_at.elapsed().as_millis(),
                        index,
                        query.len(),
                        err.code(),
                        sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                    );
                    return Err(err);
                }
            };

            if let Some(slot) = self.write().get_mut(query.as_str()) {
                *slot = Some(handle);
            }
        }

        info!(
            "event=stmt_prepare module=stmts status=ok mode={:?} duration_ms={} prepared={} skipped={}",
            mode,
            started_at.elapsed().as_millis(),
            targets.len(),
            skipped
        );
        Ok(())
    }

    /// Prepares every registered query and hands any failure to `on_failure`.
    ///
    /// The handler runs at most once. Whether it logs, panics or aborts is up
    /// to the caller.
    pub fn must_prepare<P, F>(&self, db: &P, on_failure: F)
    where
        P: NamedPreparer<Stmt = S>,
        F: FnOnce(&RegistryError),
    {
        if let Err(err) = self.prepare(db) {
            on_failure(&err);
        }
    }

    /// Returns the prepared handle for `query`.
    ///
    /// `None` covers both unknown queries and registered queries that have
    /// not been prepared yet.
    pub fn stmt(&self, query: &str) -> Option<Arc<S>> {
        self.read().get(query).and_then(Clone::clone)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn is_registered(&self, query: &str) -> bool {
        self.read().contains_key(query)
    }

    pub fn is_prepared(&self, query: &str) -> bool {
        matches!(self.read().get(query), Some(Some(_)))
    }

    /// Returns sorted registered query texts.
    pub fn queries(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns sorted queries still waiting for a handle.
    pub fn pending(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, handle)| handle.is_none())
            .map(|(query, _)| query.clone())
            .collect()
    }

    pub fn prepared_count(&self) -> usize {
        self.read()
            .values()
            .filter(|handle| handle.is_some())
            .count()
    }

    // Critical sections only insert keys or swap whole `Arc`s, so the map is
    // consistent even if a holder panicked.
    fn read(&self) -> RwLockReadGuard<'_, Entries<S>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<S>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
