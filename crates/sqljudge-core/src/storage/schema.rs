//! SQLite schema for the main judge database.
//!
//! Tables:
//! - `submissions`: one row per graded attempt, `status_id` holds the verdict
//! - `restrictions`: keyword/pattern rules per task, evaluated by `position`
//! - `selection_tasks`: reference solution and comparison flags per task
//! - `selection_task_schemas`: schemas relevant to a task

/// DDL for the main judge database.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    id               INTEGER PRIMARY KEY,
    task_id          INTEGER NOT NULL,
    status_id        INTEGER NOT NULL DEFAULT 1,
    solution         TEXT NOT NULL,
    checker_message  TEXT,
    submitted_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_submissions_status ON submissions(status_id);

CREATE TABLE IF NOT EXISTS restrictions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id           INTEGER NOT NULL,
    position          INTEGER NOT NULL DEFAULT 0,
    restriction_type  TEXT NOT NULL,
    definition        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS selection_tasks (
    task_id             INTEGER PRIMARY KEY,
    reference_solution  TEXT NOT NULL,
    default_schema      TEXT NOT NULL,
    check_order         TEXT NOT NULL DEFAULT 'N',
    check_column_names  TEXT NOT NULL DEFAULT 'Y'
);

CREATE TABLE IF NOT EXISTS selection_task_schemas (
    task_id      INTEGER NOT NULL REFERENCES selection_tasks(task_id),
    schema_name  TEXT NOT NULL,
    PRIMARY KEY (task_id, schema_name)
);
"#;
