#![allow(dead_code)]

use namedstmt_core::NamedPreparer;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Error returned by `ScriptedPreparer` for rejected queries.
#[derive(Debug)]
pub struct ScriptedError(pub String);

impl Display for ScriptedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "scripted failure: {}", self.0)
    }
}

impl Error for ScriptedError {}

/// Handle produced by `ScriptedPreparer`.
#[derive(Debug, PartialEq, Eq)]
pub struct FakeStmt {
    pub query: String,
    pub checksum: usize,
}

impl FakeStmt {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            checksum: query.len() * 31,
        }
    }

    pub fn is_intact(&self) -> bool {
        self.checksum == self.query.len() * 31
    }
}

/// Preparer that rejects a fixed set of queries and records every call.
#[derive(Default)]
pub struct ScriptedPreparer {
    rejected: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedPreparer {
    pub fn rejecting(queries: &[&str]) -> Self {
        Self {
            rejected: queries.iter().map(|query| query.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl NamedPreparer for ScriptedPreparer {
    type Stmt = FakeStmt;
    type Error = ScriptedError;

    fn prepare_named(&self, query: &str) -> Result<FakeStmt, ScriptedError> {
        self.calls.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.rejected.contains(query) {
            return Err(ScriptedError(format!("cannot compile {query}")));
        }
        Ok(FakeStmt::new(query))
    }
}
