use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params, params_from_iter};

use super::{Conditions, parse_enum};
use crate::model::activity::{Activity, ActivityKind, FieldChange};
use crate::model::page::{Page, PageOf, SortDirection};

const ACTIVITY_COLUMNS: &str =
    "a.activity_id, a.todo_id, a.author, a.kind, a.old_value, a.new_value, a.created_at_us";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub todo_id: Option<i64>,
    pub author: Option<String>,
    /// Any of these kinds.
    pub kinds: Vec<ActivityKind>,
}

/// Append one audit-log row and return it as stored.
pub fn insert_activity(
    conn: &Connection,
    todo_id: i64,
    author: &str,
    change: &FieldChange,
    now_us: i64,
) -> Result<Activity> {
    conn.execute(
        "INSERT INTO activities (todo_id, author, kind, old_value, new_value, created_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            todo_id,
            author,
            change.kind.as_str(),
            change.old_value,
            change.new_value,
            now_us
        ],
    )
    .with_context(|| format!("insert {} activity for to-do {todo_id}", change.kind))?;

    Ok(Activity {
        id: conn.last_insert_rowid(),
        todo_id,
        author: author.to_string(),
        kind: change.kind,
        old_value: change.old_value.clone(),
        new_value: change.new_value.clone(),
        created_at_us: now_us,
    })
}

/// Full history of one to-do, oldest first.
pub fn list_activities(conn: &Connection, todo_id: i64) -> Result<Vec<Activity>> {
    let sql = format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities a
         WHERE a.todo_id = ?1 ORDER BY a.created_at_us, a.activity_id"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_activities")?;
    let rows = stmt
        .query_map(params![todo_id], row_to_activity)
        .context("execute list_activities")?;

    let mut activities = Vec::new();
    for row in rows {
        activities.push(row.context("read activity row")?);
    }
    Ok(activities)
}

/// Search the audit log, ordered by creation time.
pub fn search_activities(
    conn: &Connection,
    filter: &ActivityFilter,
    direction: SortDirection,
    page: Page,
) -> Result<PageOf<Activity>> {
    let mut cond = Conditions::default();

    if let Some(todo_id) = filter.todo_id {
        let placeholder = cond.bind(todo_id);
        cond.push(format!("a.todo_id = {placeholder}"));
    }
    if let Some(ref author) = filter.author {
        let placeholder = cond.bind(author.clone());
        cond.push(format!("a.author = {placeholder}"));
    }
    if !filter.kinds.is_empty() {
        let placeholders: Vec<String> = filter
            .kinds
            .iter()
            .map(|kind| cond.bind(kind.as_str()))
            .collect();
        cond.push(format!("a.kind IN ({})", placeholders.join(", ")));
    }

    let total = cond.count(conn, "activities a")?;

    let dir = direction.sql();
    let sql = format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities a{} \
         ORDER BY a.created_at_us {dir}, a.activity_id {dir}{}",
        cond.where_clause(),
        page.sql_clause()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_activities query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), row_to_activity)
        .context("execute search_activities query")?;

    let mut activities = Vec::new();
    for row in rows {
        activities.push(row.context("read search_activities row")?);
    }
    Ok(PageOf::new(activities, total, page))
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<Activity> {
    let kind: String = row.get(3)?;
    Ok(Activity {
        id: row.get(0)?,
        todo_id: row.get(1)?,
        author: row.get(2)?,
        kind: parse_enum(3, &kind)?,
        old_value: row.get(4)?,
        new_value: row.get(5)?,
        created_at_us: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::test_support::{seed_project, seed_team, seed_todo, test_db};

    fn change(kind: ActivityKind, old: Option<&str>, new: Option<&str>) -> FieldChange {
        FieldChange::new(kind, old.map(String::from), new.map(String::from))
    }

    fn fixture() -> Connection {
        let conn = test_db();
        seed_team(&conn, 1, "core", 1);
        seed_project(&conn, 1, 1, "api");
        seed_todo(&conn, 1, 1, "Ship", "todo", None, 1, 1);
        seed_todo(&conn, 2, 1, "Docs", "todo", None, 1, 1);

        insert_activity(&conn, 1, "alice", &change(ActivityKind::Created, None, Some("Ship")), 10)
            .unwrap();
        insert_activity(
            &conn,
            1,
            "bob",
            &change(ActivityKind::Status, Some("todo"), Some("in_progress")),
            20,
        )
        .unwrap();
        insert_activity(&conn, 2, "bob", &change(ActivityKind::Created, None, Some("Docs")), 15)
            .unwrap();
        conn
    }

    #[test]
    fn insert_returns_stored_row() {
        let conn = fixture();
        let activity = insert_activity(
            &conn,
            2,
            "carol",
            &change(ActivityKind::Labels, Some("[]"), Some("[1]")),
            30,
        )
        .unwrap();
        assert_eq!(activity.kind, ActivityKind::Labels);
        assert_eq!(activity.new_value.as_deref(), Some("[1]"));
        assert_eq!(list_activities(&conn, 2).unwrap().last(), Some(&activity));
    }

    #[test]
    fn list_is_chronological() {
        let conn = fixture();
        let kinds: Vec<_> = list_activities(&conn, 1)
            .unwrap()
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds, vec![ActivityKind::Created, ActivityKind::Status]);
    }

    #[test]
    fn search_by_author_and_kind() {
        let conn = fixture();
        let filter = ActivityFilter {
            author: Some("bob".into()),
            ..ActivityFilter::default()
        };
        let page = search_activities(&conn, &filter, SortDirection::Desc, Page::default()).unwrap();
        let stamps: Vec<_> = page.items.iter().map(|a| a.created_at_us).collect();
        assert_eq!(stamps, vec![20, 15]);

        let filter = ActivityFilter {
            kinds: vec![ActivityKind::Created],
            ..ActivityFilter::default()
        };
        let page = search_activities(&conn, &filter, SortDirection::Asc, Page::default()).unwrap();
        let todos: Vec<_> = page.items.iter().map(|a| a.todo_id).collect();
        assert_eq!(todos, vec![1, 2]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn rows_cannot_be_rewritten() {
        let conn = fixture();
        let err = conn
            .execute("UPDATE activities SET author = 'mallory'", [])
            .unwrap_err();
        assert!(err.to_string().contains("append-only"));
    }
}
