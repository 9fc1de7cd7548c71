//! Canonical SQLite schema for dodo.
//!
//! - `teams` / `team_members` hold membership; `role = 'manager'` rows are
//!   members with the manager flag, so managers are always members
//! - `projects` belong to one team; names are unique per team
//! - `todos` keep scalar fields; `todo_labels` and `todo_assignees` model the
//!   multi-valued sets that array-contains filters run against
//! - `todo_references` and `activities` hang off a to-do and cascade with it
//! - `activities` is append-only: a trigger aborts every `UPDATE`

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS teams (
    team_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE CHECK (length(trim(name)) > 0),
    description TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    team_id INTEGER NOT NULL REFERENCES teams(team_id) ON DELETE CASCADE,
    member TEXT NOT NULL CHECK (length(trim(member)) > 0),
    role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('member', 'manager')),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (team_id, member)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id INTEGER NOT NULL REFERENCES teams(team_id) ON DELETE RESTRICT,
    name TEXT NOT NULL COLLATE NOCASE CHECK (length(trim(name)) > 0),
    description TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    UNIQUE (team_id, name)
);

CREATE TABLE IF NOT EXISTS labels (
    label_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE CHECK (length(trim(name)) > 0),
    color TEXT NOT NULL CHECK (length(color) = 7 AND color LIKE '#%'),
    description TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS todos (
    todo_id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT,
    kind TEXT NOT NULL DEFAULT 'task' CHECK (kind IN ('issue', 'task', 'story')),
    status TEXT NOT NULL DEFAULT 'todo'
        CHECK (status IN ('backlog', 'todo', 'in_progress', 'done', 'canceled')),
    due_date TEXT CHECK (due_date IS NULL OR date(due_date) = due_date),
    author TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS todo_labels (
    todo_id INTEGER NOT NULL REFERENCES todos(todo_id) ON DELETE CASCADE,
    label_id INTEGER NOT NULL REFERENCES labels(label_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (todo_id, label_id)
);

CREATE TABLE IF NOT EXISTS todo_assignees (
    todo_id INTEGER NOT NULL REFERENCES todos(todo_id) ON DELETE CASCADE,
    assignee TEXT NOT NULL CHECK (length(trim(assignee)) > 0),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (todo_id, assignee)
);

CREATE TABLE IF NOT EXISTS todo_references (
    reference_id INTEGER PRIMARY KEY AUTOINCREMENT,
    todo_id INTEGER NOT NULL REFERENCES todos(todo_id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    title TEXT,
    created_at_us INTEGER NOT NULL,
    UNIQUE (todo_id, url)
);

CREATE TABLE IF NOT EXISTS activities (
    activity_id INTEGER PRIMARY KEY AUTOINCREMENT,
    todo_id INTEGER NOT NULL REFERENCES todos(todo_id) ON DELETE CASCADE,
    author TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN (
        'created', 'title', 'description', 'kind', 'status',
        'due_date', 'labels', 'assignees'
    )),
    old_value TEXT,
    new_value TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS activities_append_only
BEFORE UPDATE ON activities
BEGIN
    SELECT RAISE(ABORT, 'activities are append-only');
END;

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, CAST(strftime('%s', 'now') AS INTEGER) * 1000000);
";

/// Migration v2: read-path indexes for the search endpoints.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_team_members_member
    ON team_members(member, team_id);

CREATE INDEX IF NOT EXISTS idx_projects_team
    ON projects(team_id, name);

CREATE INDEX IF NOT EXISTS idx_todos_project_status_updated
    ON todos(project_id, status, updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_todos_due_date
    ON todos(due_date)
    WHERE due_date IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_todo_labels_label
    ON todo_labels(label_id, todo_id);

CREATE INDEX IF NOT EXISTS idx_todo_assignees_assignee
    ON todo_assignees(assignee, todo_id);

CREATE INDEX IF NOT EXISTS idx_todo_references_todo
    ON todo_references(todo_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_activities_todo_created
    ON activities(todo_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_activities_author
    ON activities(author, created_at_us DESC);
";

/// Indexes expected by the search query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_team_members_member",
    "idx_projects_team",
    "idx_todos_project_status_updated",
    "idx_todos_due_date",
    "idx_todo_labels_label",
    "idx_todo_assignees_assignee",
    "idx_todo_references_todo",
    "idx_activities_todo_created",
    "idx_activities_author",
];
