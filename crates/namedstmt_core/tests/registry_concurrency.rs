mod common;

use common::{FakeStmt, ScriptedError, ScriptedPreparer};
use namedstmt_core::{NamedPreparer, StatementRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn queries() -> Vec<String> {
    (0..16).map(|index| format!("SELECT {index}")).collect()
}

#[test]
fn readers_never_observe_partial_handles_during_prepare() {
    let registry = StatementRegistry::<FakeStmt>::new();
    let queries = queries();
    registry.add(queries.iter().cloned());
    let db = ScriptedPreparer::default().with_delay(Duration::from_millis(2));
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    for query in &queries {
                        if let Some(stmt) = registry.stmt(query) {
                            assert_eq!(&stmt.query, query);
                            assert!(stmt.is_intact());
                        }
                    }
                }
            });
        }

        registry.prepare(&db).expect("prepare should succeed");
        done.store(true, Ordering::Release);
    });

    assert_eq!(registry.prepared_count(), queries.len());
}

#[test]
fn concurrent_adds_register_each_query_once() {
    let registry = StatementRegistry::<FakeStmt>::new();
    let queries = queries();

    thread::scope(|scope| {
        for chunk in queries.chunks(3) {
            let registry = &registry;
            scope.spawn(move || {
                registry.add(chunk.iter().cloned());
                registry.add(queries_overlap());
            });
        }
    });

    assert_eq!(registry.len(), queries.len());
}

fn queries_overlap() -> Vec<String> {
    vec!["SELECT 0".to_string(), "SELECT 15".to_string()]
}

#[test]
fn lookups_from_many_threads_share_one_handle() {
    let registry = Arc::new(StatementRegistry::new());
    registry.add(["SELECT :id"]);
    registry.prepare(&ScriptedPreparer::default()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.stmt("SELECT :id"))
        })
        .collect();

    let expected = registry.stmt("SELECT :id").unwrap();
    for handle in handles {
        let stmt = handle.join().unwrap().expect("handle should be published");
        assert!(Arc::ptr_eq(&stmt, &expected));
    }
}

#[test]
fn adds_during_prepare_stay_registered() {
    let registry = StatementRegistry::<FakeStmt>::new();
    registry.add(queries());
    let db = ScriptedPreparer::default().with_delay(Duration::from_millis(1));

    thread::scope(|scope| {
        scope.spawn(|| registry.add(["SELECT late"]));
        registry.prepare(&db).unwrap();
    });

    assert!(registry.is_registered("SELECT late"));
    assert_eq!(registry.len(), queries().len() + 1);
}

/// Records how many entries were prepared each time it is asked for a new one.
struct SnapshotPreparer<'a> {
    registry: &'a StatementRegistry<FakeStmt>,
    snapshots: Mutex<Vec<(usize, usize)>>,
}

impl NamedPreparer for SnapshotPreparer<'_> {
    type Stmt = FakeStmt;
    type Error = ScriptedError;

    fn prepare_named(&self, query: &str) -> Result<FakeStmt, ScriptedError> {
        // Reading the registry here would deadlock if the write lock were held.
        let snapshot = (self.registry.prepared_count(), self.registry.pending().len());
        self.snapshots.lock().unwrap().push(snapshot);
        Ok(FakeStmt::new(query))
    }
}

#[test]
fn lookups_during_prepare_see_a_mix_of_prepared_and_pending() {
    let registry = StatementRegistry::<FakeStmt>::new();
    registry.add(["SELECT 1", "SELECT 2", "SELECT 3"]);
    let db = SnapshotPreparer {
        registry: &registry,
        snapshots: Mutex::new(Vec::new()),
    };

    registry.prepare(&db).unwrap();

    assert_eq!(
        db.snapshots.into_inner().unwrap(),
        vec![(0, 3), (1, 2), (2, 1)]
    );
    assert_eq!(registry.prepared_count(), 3);
}
