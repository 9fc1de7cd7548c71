use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::{Conditions, format_date, parse_date, parse_enum};
use crate::model::page::{Page, PageOf, SortDirection};
use crate::model::todo::{Status, Todo, TodoKind};

const TODO_COLUMNS: &str = "t.todo_id, t.project_id, t.title, t.description, t.kind, t.status, \
     t.due_date, t.author, t.created_at_us, t.updated_at_us";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoSortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    DueDate,
    Title,
    Status,
}

impl TodoSortField {
    /// Undated to-dos sort after dated ones in either direction.
    fn order_by(self, direction: SortDirection) -> String {
        let dir = direction.sql();
        match self {
            Self::CreatedAt => format!("t.created_at_us {dir}"),
            Self::UpdatedAt => format!("t.updated_at_us {dir}"),
            Self::DueDate => format!("t.due_date IS NULL ASC, t.due_date {dir}"),
            Self::Title => format!("t.title COLLATE NOCASE {dir}"),
            Self::Status => format!(
                "CASE t.status \
                 WHEN 'backlog' THEN 0 \
                 WHEN 'todo' THEN 1 \
                 WHEN 'in_progress' THEN 2 \
                 WHEN 'done' THEN 3 \
                 WHEN 'canceled' THEN 4 \
                 END {dir}, t.updated_at_us DESC"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoSort {
    pub field: TodoSortField,
    pub direction: SortDirection,
}

impl Default for TodoSort {
    fn default() -> Self {
        Self {
            field: TodoSortField::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Filter criteria for to-do search.
///
/// All fields are optional and combined with AND. `labels` and `assignees`
/// are array-contains-all predicates and must be deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub project_id: Option<i64>,
    pub team_id: Option<i64>,
    /// Any of these statuses.
    pub statuses: Vec<Status>,
    pub kind: Option<TodoKind>,
    pub labels: Vec<i64>,
    pub assignees: Vec<String>,
    /// Case-insensitive substring of the title.
    pub title_like: Option<String>,
    /// Inclusive upper bound on `due_date`.
    pub due_before: Option<NaiveDate>,
    /// Inclusive lower bound on `due_date`.
    pub due_after: Option<NaiveDate>,
}

/// Scalar columns written on insert and update.
#[derive(Debug, Clone, Copy)]
pub struct TodoRow<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub kind: TodoKind,
    pub status: Status,
    pub due_date: Option<NaiveDate>,
}

pub fn insert_todo(
    conn: &Connection,
    project_id: i64,
    row: TodoRow<'_>,
    author: &str,
    now_us: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO todos (
            project_id, title, description, kind, status, due_date, author,
            created_at_us, updated_at_us
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            project_id,
            row.title,
            row.description,
            row.kind.as_str(),
            row.status.as_str(),
            row.due_date.map(format_date),
            author,
            now_us
        ],
    )
    .with_context(|| format!("insert to-do '{}' into project {project_id}", row.title))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_todo(conn: &Connection, todo_id: i64, row: TodoRow<'_>, now_us: i64) -> Result<()> {
    conn.execute(
        "UPDATE todos SET title = ?2, description = ?3, kind = ?4, status = ?5,
             due_date = ?6, updated_at_us = ?7
         WHERE todo_id = ?1",
        params![
            todo_id,
            row.title,
            row.description,
            row.kind.as_str(),
            row.status.as_str(),
            row.due_date.map(format_date),
            now_us
        ],
    )
    .with_context(|| format!("update to-do {todo_id}"))?;
    Ok(())
}

/// Replace the label set of a to-do. `label_ids` must be deduplicated.
pub fn replace_labels(conn: &Connection, todo_id: i64, label_ids: &[i64], now_us: i64) -> Result<()> {
    conn.execute("DELETE FROM todo_labels WHERE todo_id = ?1", params![todo_id])
        .with_context(|| format!("clear labels of to-do {todo_id}"))?;
    let mut stmt = conn
        .prepare("INSERT INTO todo_labels (todo_id, label_id, created_at_us) VALUES (?1, ?2, ?3)")
        .context("prepare label insert")?;
    for label_id in label_ids {
        stmt.execute(params![todo_id, label_id, now_us])
            .with_context(|| format!("attach label {label_id} to to-do {todo_id}"))?;
    }
    Ok(())
}

/// Replace the assignee set of a to-do. `assignees` must be deduplicated.
pub fn replace_assignees(
    conn: &Connection,
    todo_id: i64,
    assignees: &[String],
    now_us: i64,
) -> Result<()> {
    conn.execute(
        "DELETE FROM todo_assignees WHERE todo_id = ?1",
        params![todo_id],
    )
    .with_context(|| format!("clear assignees of to-do {todo_id}"))?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO todo_assignees (todo_id, assignee, created_at_us) VALUES (?1, ?2, ?3)",
        )
        .context("prepare assignee insert")?;
    for assignee in assignees {
        stmt.execute(params![todo_id, assignee, now_us])
            .with_context(|| format!("assign '{assignee}' to to-do {todo_id}"))?;
    }
    Ok(())
}

/// Fetch a to-do with its label ids and assignees.
pub fn get_todo(conn: &Connection, todo_id: i64) -> Result<Option<Todo>> {
    let sql = format!("SELECT {TODO_COLUMNS} FROM todos t WHERE t.todo_id = ?1");
    let todo = conn
        .query_row(&sql, params![todo_id], row_to_todo)
        .optional()
        .with_context(|| format!("get_todo for {todo_id}"))?;

    match todo {
        Some(mut todo) => {
            load_sets(conn, &mut todo)?;
            Ok(Some(todo))
        }
        None => Ok(None),
    }
}

pub fn todo_exists(conn: &Connection, todo_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM todos WHERE todo_id = ?1)",
        params![todo_id],
        |row| row.get(0),
    )
    .with_context(|| format!("todo_exists for {todo_id}"))
}

pub fn delete_todo(conn: &Connection, todo_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM todos WHERE todo_id = ?1", params![todo_id])
        .with_context(|| format!("delete to-do {todo_id}"))?;
    Ok(changed > 0)
}

/// Assignees of any to-do in the given team's projects.
pub fn assignees_in_team(conn: &Connection, team_id: i64, member: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM todo_assignees a
             INNER JOIN todos t ON t.todo_id = a.todo_id
             INNER JOIN projects p ON p.project_id = t.project_id
             WHERE p.team_id = ?1 AND a.assignee = ?2",
            params![team_id, member],
            |row| row.get(0),
        )
        .with_context(|| format!("count assignments of '{member}' in team {team_id}"))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Search to-dos: filter, count, then fetch one sorted page.
pub fn search_todos(
    conn: &Connection,
    filter: &TodoFilter,
    sort: TodoSort,
    page: Page,
) -> Result<PageOf<Todo>> {
    let mut cond = Conditions::default();

    if let Some(project_id) = filter.project_id {
        let placeholder = cond.bind(project_id);
        cond.push(format!("t.project_id = {placeholder}"));
    }
    if let Some(team_id) = filter.team_id {
        let placeholder = cond.bind(team_id);
        cond.push(format!(
            "t.project_id IN (SELECT project_id FROM projects WHERE team_id = {placeholder})"
        ));
    }
    if !filter.statuses.is_empty() {
        let placeholders: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| cond.bind(s.as_str()))
            .collect();
        cond.push(format!("t.status IN ({})", placeholders.join(", ")));
    }
    if let Some(kind) = filter.kind {
        let placeholder = cond.bind(kind.as_str());
        cond.push(format!("t.kind = {placeholder}"));
    }
    cond.contains_all("t.todo_id", "todo_labels", "todo_id", "label_id", &filter.labels);
    cond.contains_all(
        "t.todo_id",
        "todo_assignees",
        "todo_id",
        "assignee",
        &filter.assignees,
    );
    if let Some(ref title) = filter.title_like {
        cond.like("t.title", title);
    }
    if let Some(before) = filter.due_before {
        let placeholder = cond.bind(format_date(before));
        cond.push(format!("t.due_date <= {placeholder}"));
    }
    if let Some(after) = filter.due_after {
        let placeholder = cond.bind(format_date(after));
        cond.push(format!("t.due_date >= {placeholder}"));
    }

    let total = cond.count(conn, "todos t")?;

    let sql = format!(
        "SELECT {TODO_COLUMNS} FROM todos t{} ORDER BY {}, t.todo_id ASC{}",
        cond.where_clause(),
        sort.field.order_by(sort.direction),
        page.sql_clause()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_todos query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), row_to_todo)
        .context("execute search_todos query")?;

    let mut todos = Vec::new();
    for row in rows {
        let mut todo = row.context("read search_todos row")?;
        load_sets(conn, &mut todo)?;
        todos.push(todo);
    }
    Ok(PageOf::new(todos, total, page))
}

fn load_sets(conn: &Connection, todo: &mut Todo) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT label_id FROM todo_labels WHERE todo_id = ?1 ORDER BY label_id")
        .context("prepare to-do labels query")?;
    let labels = stmt
        .query_map(params![todo.id], |row| row.get(0))
        .context("execute to-do labels query")?;
    todo.labels = labels
        .collect::<rusqlite::Result<Vec<i64>>>()
        .context("read to-do label row")?;

    let mut stmt = conn
        .prepare("SELECT assignee FROM todo_assignees WHERE todo_id = ?1 ORDER BY assignee")
        .context("prepare to-do assignees query")?;
    let assignees = stmt
        .query_map(params![todo.id], |row| row.get(0))
        .context("execute to-do assignees query")?;
    todo.assignees = assignees
        .collect::<rusqlite::Result<Vec<String>>>()
        .context("read to-do assignee row")?;
    Ok(())
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let kind: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(Todo {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        kind: parse_enum(4, &kind)?,
        status: parse_enum(5, &status)?,
        due_date: parse_date(6, row.get(6)?)?,
        labels: Vec::new(),
        assignees: Vec::new(),
        author: row.get(7)?,
        created_at_us: row.get(8)?,
        updated_at_us: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::test_support::{
        seed_assignee, seed_label, seed_project, seed_tag, seed_team, seed_todo, test_db,
    };

    fn ids(page: &PageOf<Todo>) -> Vec<i64> {
        page.items.iter().map(|t| t.id).collect()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> Connection {
        let conn = test_db();
        seed_team(&conn, 1, "core", 1);
        seed_team(&conn, 2, "mobile", 1);
        seed_project(&conn, 10, 1, "api");
        seed_project(&conn, 11, 1, "web");
        seed_project(&conn, 20, 2, "ios");
        seed_label(&conn, 1, "bug");
        seed_label(&conn, 2, "urgent");

        seed_todo(&conn, 100, 10, "Fix login timeout", "todo", Some("2026-05-01"), 100, 400);
        seed_todo(&conn, 101, 10, "Add 100% coverage", "in_progress", None, 200, 300);
        seed_todo(&conn, 102, 11, "Login page redesign", "done", Some("2026-04-01"), 300, 200);
        seed_todo(&conn, 103, 20, "Crash on login", "todo", Some("2026-06-01"), 400, 100);

        seed_tag(&conn, 100, 1);
        seed_tag(&conn, 100, 2);
        seed_tag(&conn, 103, 1);
        seed_assignee(&conn, 100, "alice");
        seed_assignee(&conn, 100, "bob");
        seed_assignee(&conn, 102, "alice");
        conn
    }

    #[test]
    fn insert_then_get_with_sets() {
        let conn = fixture();
        let row = TodoRow {
            title: "Write docs",
            description: Some("for the API"),
            kind: TodoKind::Story,
            status: Status::Backlog,
            due_date: Some(date("2026-07-04")),
        };
        let id = insert_todo(&conn, 10, row, "carol", 500).unwrap();
        replace_labels(&conn, id, &[2, 1], 500).unwrap();
        replace_assignees(&conn, id, &["bob".into(), "alice".into()], 500).unwrap();

        let todo = get_todo(&conn, id).unwrap().unwrap();
        assert_eq!(todo.title, "Write docs");
        assert_eq!(todo.kind, TodoKind::Story);
        assert_eq!(todo.status, Status::Backlog);
        assert_eq!(todo.due_date, Some(date("2026-07-04")));
        assert_eq!(todo.labels, vec![1, 2]);
        assert_eq!(todo.assignees, vec!["alice", "bob"]);
        assert_eq!(todo.author, "carol");
    }

    #[test]
    fn update_rewrites_scalars_and_replace_sets() {
        let conn = fixture();
        let row = TodoRow {
            title: "Fix login timeout (prod)",
            description: None,
            kind: TodoKind::Issue,
            status: Status::Done,
            due_date: None,
        };
        update_todo(&conn, 100, row, 999).unwrap();
        replace_labels(&conn, 100, &[], 999).unwrap();

        let todo = get_todo(&conn, 100).unwrap().unwrap();
        assert_eq!(todo.title, "Fix login timeout (prod)");
        assert_eq!(todo.status, Status::Done);
        assert_eq!(todo.due_date, None);
        assert!(todo.labels.is_empty());
        assert_eq!(todo.updated_at_us, 999);
        assert_eq!(todo.created_at_us, 100);
    }

    #[test]
    fn search_labels_contains_all() {
        let conn = fixture();
        let filter = TodoFilter {
            labels: vec![1],
            ..TodoFilter::default()
        };
        let mut page = search_todos(&conn, &filter, TodoSort::default(), Page::default()).unwrap();
        page.items.sort_by_key(|t| t.id);
        assert_eq!(ids(&page), vec![100, 103]);

        let filter = TodoFilter {
            labels: vec![1, 2],
            ..TodoFilter::default()
        };
        let page = search_todos(&conn, &filter, TodoSort::default(), Page::default()).unwrap();
        assert_eq!(ids(&page), vec![100]);
    }

    #[test]
    fn search_assignees_contains_all() {
        let conn = fixture();
        let filter = TodoFilter {
            assignees: vec!["alice".into(), "bob".into()],
            ..TodoFilter::default()
        };
        let page = search_todos(&conn, &filter, TodoSort::default(), Page::default()).unwrap();
        assert_eq!(ids(&page), vec![100]);
        assert_eq!(page.items[0].assignees, vec!["alice", "bob"]);
    }

    #[test]
    fn search_title_like_escapes_percent() {
        let conn = fixture();
        let filter = TodoFilter {
            title_like: Some("LOGIN".into()),
            ..TodoFilter::default()
        };
        let page = search_todos(&conn, &filter, TodoSort::default(), Page::default()).unwrap();
        assert_eq!(page.total, 3);

        let filter = TodoFilter {
            title_like: Some("100%".into()),
            ..TodoFilter::default()
        };
        let page = search_todos(&conn, &filter, TodoSort::default(), Page::default()).unwrap();
        assert_eq!(ids(&page), vec![101]);
    }

    #[test]
    fn search_by_team_status_and_due_window() {
        let conn = fixture();
        let filter = TodoFilter {
            team_id: Some(1),
            statuses: vec![Status::Todo, Status::Done],
            ..TodoFilter::default()
        };
        let sort = TodoSort {
            field: TodoSortField::CreatedAt,
            direction: SortDirection::Asc,
        };
        let page = search_todos(&conn, &filter, sort, Page::default()).unwrap();
        assert_eq!(ids(&page), vec![100, 102]);

        let filter = TodoFilter {
            due_after: Some(date("2026-04-15")),
            due_before: Some(date("2026-06-01")),
            ..TodoFilter::default()
        };
        let page = search_todos(&conn, &filter, sort, Page::default()).unwrap();
        assert_eq!(ids(&page), vec![100, 103]);
    }

    #[test]
    fn due_date_sort_puts_undated_last() {
        let conn = fixture();
        let sort = TodoSort {
            field: TodoSortField::DueDate,
            direction: SortDirection::Desc,
        };
        let page = search_todos(&conn, &TodoFilter::default(), sort, Page::default()).unwrap();
        assert_eq!(ids(&page), vec![103, 100, 102, 101]);

        let sort = TodoSort {
            field: TodoSortField::DueDate,
            direction: SortDirection::Asc,
        };
        let page = search_todos(&conn, &TodoFilter::default(), sort, Page::default()).unwrap();
        assert_eq!(ids(&page), vec![102, 100, 103, 101]);
    }

    #[test]
    fn default_sort_is_recently_updated_and_paginates() {
        let conn = fixture();
        let page = search_todos(
            &conn,
            &TodoFilter::default(),
            TodoSort::default(),
            Page::new(Some(1), Some(2)),
        )
        .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(ids(&page), vec![101, 102]);
        assert!(page.has_more());
    }

    #[test]
    fn assignments_are_counted_per_team() {
        let conn = fixture();
        assert_eq!(assignees_in_team(&conn, 1, "alice").unwrap(), 2);
        assert_eq!(assignees_in_team(&conn, 2, "alice").unwrap(), 0);
    }
}
