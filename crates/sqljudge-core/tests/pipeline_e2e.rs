//! End-to-end runs of the checking pipeline against real SQLite databases.

use sqljudge_core::checkers::{Checker, RestrictionChecker, SelectionChecker};
use sqljudge_core::errors::StoreError;
use sqljudge_core::model::{Restriction, SelectionInfo, Submission, Verdict};
use sqljudge_core::storage::{
    Database, JudgeStore, PendingBatch, QueryCatalog, SelectionPool, SqliteJudgeStore,
};
use sqljudge_core::{load_config, Pipeline};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(100);

const HR_DATA: &str = "
CREATE TABLE emp(id INTEGER PRIMARY KEY, name TEXT NOT NULL, dept TEXT NOT NULL);
INSERT INTO emp VALUES (1, 'ann', 'ops'), (2, 'bob', 'dev'), (3, 'cid', 'dev');
";

struct Fixture {
    store: SqliteJudgeStore,
    pool: SelectionPool,
    catalog: Arc<QueryCatalog>,
}

impl Fixture {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("sqljudge_core=debug")
            .try_init();

        let catalog = Arc::new(QueryCatalog::default());
        let store = SqliteJudgeStore::new(Database::memory("main").unwrap(), catalog.clone());
        store.init_schema().unwrap();

        let hr = Database::memory("hr").unwrap();
        hr.execute_batch(HR_DATA).unwrap();

        Self {
            store,
            pool: std::iter::once(hr).collect(),
            catalog,
        }
    }

    fn seed(&self, sql: &str) {
        self.store.database().execute_batch(sql).unwrap();
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            Arc::new(self.store.clone()),
            Arc::new(self.pool.clone()),
            self.catalog.clone(),
            PERIOD,
        )
    }

    fn stored(&self, id: i64) -> (Verdict, Option<String>) {
        self.store
            .database()
            .with_conn(|c| {
                let (status, message): (i64, Option<String>) = c.query_row(
                    "SELECT status_id, checker_message FROM submissions WHERE id = ?1",
                    [id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?;
                Ok((Verdict::from_id(status).unwrap(), message))
            })
            .unwrap()
    }
}

/// Wraps a checker and counts how often it actually ran.
struct Counting {
    inner: Arc<dyn Checker>,
    calls: AtomicUsize,
}

impl Counting {
    fn wrap(inner: Arc<dyn Checker>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Checker for Counting {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn check(&self, submission: Submission) -> Submission {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.check(submission)
    }
}

fn selection_task(task_id: i64, reference: &str, check_order: &str, check_column_names: &str) -> String {
    format!(
        "INSERT INTO selection_tasks VALUES ({task_id}, '{reference}', 'hr', '{check_order}', '{check_column_names}');
         INSERT INTO selection_task_schemas VALUES ({task_id}, 'hr');"
    )
}

#[tokio::test]
async fn keyword_restriction_stops_submission_before_selection() {
    let fx = Fixture::new();
    fx.seed(
        "INSERT INTO submissions(id, task_id, solution) VALUES (1, 10, 'DROP TABLE X');
         INSERT INTO restrictions(task_id, position, restriction_type, definition)
           VALUES (10, 0, 'KEYWORD', 'DROP');",
    );
    fx.seed(&selection_task(10, "SELECT name FROM emp", "N", "Y"));

    let store: Arc<dyn JudgeStore> = Arc::new(fx.store.clone());
    let selection = Counting::wrap(Arc::new(SelectionChecker::new(
        store.clone(),
        Arc::new(fx.pool.clone()),
        fx.catalog.clone(),
    )));
    let pipeline = Pipeline::with_checkers(
        store.clone(),
        Arc::new(RestrictionChecker::new(store)),
        selection.clone(),
        PERIOD,
    );

    let summary = pipeline.run_once().await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.count(Verdict::RestrictionViolated), 1);
    assert_eq!(selection.calls.load(Ordering::SeqCst), 0);
    let (status, message) = fx.stored(1);
    assert_eq!(status, Verdict::RestrictionViolated);
    assert_eq!(message.as_deref(), Some("restriction violated: KEYWORD \"DROP\""));
}

#[tokio::test]
async fn reordered_rows_accepted_without_order_check() {
    let fx = Fixture::new();
    fx.seed(
        "INSERT INTO submissions(id, task_id, solution)
           VALUES (1, 10, 'SELECT name FROM emp ORDER BY name DESC;');
         INSERT INTO restrictions(task_id, position, restriction_type, definition)
           VALUES (10, 0, 'KEYWORD', 'DROP'), (10, 1, 'REGEXP', '(?i)delete');",
    );
    fx.seed(&selection_task(10, "SELECT name FROM emp ORDER BY name", "N", "Y"));

    let summary = fx.pipeline().run_once().await;

    assert_eq!(summary.count(Verdict::Accepted), 1);
    assert_eq!(fx.stored(1), (Verdict::Accepted, None));
}

#[tokio::test]
async fn reordered_rows_rejected_with_order_check() {
    let fx = Fixture::new();
    fx.seed(
        "INSERT INTO submissions(id, task_id, solution)
           VALUES (1, 10, 'SELECT name FROM emp ORDER BY name DESC');",
    );
    fx.seed(&selection_task(10, "SELECT name FROM emp ORDER BY name", "Y", "Y"));

    fx.pipeline().run_once().await;

    assert_eq!(fx.stored(1).0, Verdict::IncorrectOrder);
}

#[tokio::test]
async fn missing_selection_metadata_is_execution_error() {
    let fx = Fixture::new();
    fx.seed("INSERT INTO submissions(id, task_id, solution) VALUES (1, 77, 'SELECT name FROM emp');");

    fx.pipeline().run_once().await;

    let (status, message) = fx.stored(1);
    assert_eq!(status, Verdict::ExecutionError);
    let message = message.unwrap();
    assert!(message.starts_with("checker error: "), "{message}");
}

#[tokio::test]
async fn mixed_batch_gets_one_verdict_each() {
    let fx = Fixture::new();
    fx.seed(&selection_task(10, "SELECT id, name FROM emp WHERE dept = ''dev''", "N", "Y"));
    fx.seed(
        "INSERT INTO submissions(id, task_id, solution, status_id) VALUES
           (1, 10, 'SELECT id, name FROM emp WHERE dept = ''dev''', 1),
           (2, 10, 'SELECT id FROM emp', 1),
           (3, 10, 'SELECT id, dept FROM emp', 1),
           (4, 10, 'SELECT id, name FROM emp', 1),
           (5, 10, 'SELECT id, name FROM nowhere', 1),
           (6, 10, 'SELECT 1', 2);",
    );

    let summary = fx.pipeline().run_once().await;

    assert_eq!(summary.processed, 5);
    assert_eq!(fx.stored(1).0, Verdict::Accepted);
    assert_eq!(fx.stored(2).0, Verdict::IncorrectColumnCount);
    assert_eq!(fx.stored(3).0, Verdict::IncorrectColumnNames);
    assert_eq!(fx.stored(4).0, Verdict::IncorrectContent);
    assert_eq!(fx.stored(5).0, Verdict::ExecutionError);
    // Already checked before the run: never fetched, never rewritten.
    assert_eq!(fx.stored(6), (Verdict::Accepted, None));
}

/// Delegates to SQLite but refuses to persist one submission.
struct FailingUpdate {
    inner: SqliteJudgeStore,
    fail_id: i64,
}

impl JudgeStore for FailingUpdate {
    fn fetch_pending_submissions(&self) -> Result<PendingBatch, StoreError> {
        self.inner.fetch_pending_submissions()
    }

    fn fetch_restrictions(&self, id: i64) -> Result<Vec<Restriction>, StoreError> {
        self.inner.fetch_restrictions(id)
    }

    fn fetch_selection_info(&self, id: i64) -> Result<SelectionInfo, StoreError> {
        self.inner.fetch_selection_info(id)
    }

    fn fetch_selection_schemas(&self, id: i64) -> Result<Vec<String>, StoreError> {
        self.inner.fetch_selection_schemas(id)
    }

    fn update_submission(&self, s: &Submission) -> Result<(), StoreError> {
        if s.id == self.fail_id {
            return Err(StoreError::Decode("disk full".into()));
        }
        self.inner.update_submission(s)
    }
}

#[tokio::test]
async fn persistence_failure_only_affects_that_submission() {
    let fx = Fixture::new();
    fx.seed(&selection_task(10, "SELECT name FROM emp", "N", "N"));
    fx.seed(
        "INSERT INTO submissions(id, task_id, solution) VALUES
           (1, 10, 'SELECT name FROM emp'),
           (2, 10, 'SELECT name FROM emp'),
           (3, 10, 'SELECT name FROM emp');",
    );

    let pipeline = Pipeline::new(
        Arc::new(FailingUpdate {
            inner: fx.store.clone(),
            fail_id: 2,
        }),
        Arc::new(fx.pool.clone()),
        fx.catalog.clone(),
        PERIOD,
    );
    let summary = pipeline.run_once().await;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.persist_failures, 1);
    assert_eq!(fx.stored(1).0, Verdict::Accepted);
    assert_eq!(fx.stored(2).0, Verdict::PendingCheck);
    assert_eq!(fx.stored(3).0, Verdict::Accepted);
}

#[tokio::test]
async fn continuous_run_checks_until_stopped() {
    let fx = Fixture::new();
    fx.seed(&selection_task(10, "SELECT name FROM emp", "N", "Y"));
    fx.seed("INSERT INTO submissions(id, task_id, solution) VALUES (1, 10, 'SELECT name FROM emp');");

    let pipeline = fx.pipeline();
    let handle = pipeline.stop_handle();

    let watcher = async {
        // A submission arriving after start is picked up by a later tick.
        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.seed("INSERT INTO submissions(id, task_id, solution) VALUES (2, 10, 'SELECT 1 AS name');");
        for _ in 0..200 {
            if fx.stored(1).0 != Verdict::PendingCheck && fx.stored(2).0 != Verdict::PendingCheck {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.stop();
        handle.stop();
    };

    let (summary, ()) = tokio::join!(pipeline.start(), watcher);

    assert!(handle.is_stopped());
    assert_eq!(fx.stored(1).0, Verdict::Accepted);
    assert_eq!(fx.stored(2).0, Verdict::IncorrectContent);
    assert_eq!(summary.count(Verdict::Accepted), 1);
    assert_eq!(summary.count(Verdict::IncorrectContent), 1);
}

#[tokio::test]
async fn stop_before_start_is_safe() {
    let fx = Fixture::new();
    fx.seed("INSERT INTO submissions(id, task_id, solution) VALUES (1, 10, 'SELECT 1');");

    let pipeline = fx.pipeline();
    pipeline.stop();
    pipeline.stop();

    let summary = pipeline.start().await;
    assert_eq!(summary.processed, 0);
    assert_eq!(fx.stored(1).0, Verdict::PendingCheck);

    // Stopping a finished pipeline is a no-op too.
    pipeline.stop();
}

#[tokio::test]
async fn pipeline_from_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("judge.db");
    let hr_path = dir.path().join("hr.db");

    {
        let hr = Database::create(
            "hr",
            &sqljudge_core::config::DbConfig {
                path: hr_path.clone(),
                read_only: false,
            },
        )
        .unwrap();
        hr.execute_batch(HR_DATA).unwrap();
    }

    let config_path = dir.path().join("judge.yaml");
    std::fs::write(
        &config_path,
        format!(
            "main_db:\n  path: {}\nselection_dbs:\n  hr:\n    path: {}\n    read_only: true\nchecking:\n  fetch_period_ms: 100\n",
            main_path.display(),
            hr_path.display()
        ),
    )
    .unwrap();
    let cfg = load_config(&config_path).unwrap();

    let main = SqliteJudgeStore::new(
        Database::create("main", &cfg.main_db).unwrap(),
        Arc::new(cfg.catalog.clone()),
    );
    main.init_schema().unwrap();
    main.database()
        .execute_batch(&format!(
            "{}
             INSERT INTO submissions(id, task_id, solution) VALUES
               (1, 10, 'SELECT name FROM emp'),
               (2, 10, 'DELETE FROM emp');",
            selection_task(10, "SELECT name FROM emp", "N", "Y")
        ))
        .unwrap();

    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let summary = pipeline.run_once().await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.count(Verdict::Accepted), 1);
    // DELETE is not a query and never reaches the schema.
    assert_eq!(summary.count(Verdict::ExecutionError), 1);

    let remaining: i64 = Database::open(
        "hr",
        &sqljudge_core::config::DbConfig {
            path: hr_path,
            read_only: true,
        },
    )
    .unwrap()
    .with_conn(|c| Ok(c.query_row("SELECT COUNT(*) FROM emp", [], |r| r.get(0))?))
    .unwrap();
    assert_eq!(remaining, 3);
}

#[test]
fn from_config_rejects_missing_database_files() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("judge.db");
    SqliteJudgeStore::new(
        Database::create(
            "main",
            &sqljudge_core::config::DbConfig {
                path: main_path.clone(),
                read_only: false,
            },
        )
        .unwrap(),
        Arc::new(QueryCatalog::default()),
    )
    .init_schema()
    .unwrap();

    let typo = dir.path().join("typo.db");
    let cfg = sqljudge_core::config::parse_config(
        &format!(
            "main_db:\n  path: {}\nselection_dbs:\n  hr:\n    path: {}\n",
            main_path.display(),
            typo.display()
        ),
        "yaml",
    )
    .unwrap();

    let err = Pipeline::from_config(&cfg).err().unwrap();
    assert!(format!("{err:#}").contains("hr"));
    assert!(!typo.exists());

    let missing_main = sqljudge_core::config::parse_config(
        &format!("main_db:\n  path: {}\n", dir.path().join("nope.db").display()),
        "yaml",
    )
    .unwrap();
    assert!(Pipeline::from_config(&missing_main).is_err());
}
