use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::reference::Reference;

const REFERENCE_COLUMNS: &str = "reference_id, todo_id, url, title, created_at_us";

pub fn insert_reference(
    conn: &Connection,
    todo_id: i64,
    url: &str,
    title: Option<&str>,
    now_us: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO todo_references (todo_id, url, title, created_at_us)
         VALUES (?1, ?2, ?3, ?4)",
        params![todo_id, url, title, now_us],
    )
    .with_context(|| format!("insert reference '{url}' for to-do {todo_id}"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_reference(conn: &Connection, reference_id: i64) -> Result<Option<Reference>> {
    let sql = format!("SELECT {REFERENCE_COLUMNS} FROM todo_references WHERE reference_id = ?1");
    conn.query_row(&sql, params![reference_id], row_to_reference)
        .optional()
        .with_context(|| format!("get_reference for {reference_id}"))
}

/// Exact URL lookup within one to-do.
pub fn find_reference_id_by_url(conn: &Connection, todo_id: i64, url: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT reference_id FROM todo_references WHERE todo_id = ?1 AND url = ?2",
        params![todo_id, url],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("find reference '{url}' on to-do {todo_id}"))
}

pub fn update_reference(
    conn: &Connection,
    reference_id: i64,
    url: &str,
    title: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE todo_references SET url = ?2, title = ?3 WHERE reference_id = ?1",
        params![reference_id, url, title],
    )
    .with_context(|| format!("update reference {reference_id}"))?;
    Ok(())
}

pub fn delete_reference(conn: &Connection, reference_id: i64) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM todo_references WHERE reference_id = ?1",
            params![reference_id],
        )
        .with_context(|| format!("delete reference {reference_id}"))?;
    Ok(changed > 0)
}

/// References of a to-do, oldest first.
pub fn list_references(conn: &Connection, todo_id: i64) -> Result<Vec<Reference>> {
    let sql = format!(
        "SELECT {REFERENCE_COLUMNS} FROM todo_references
         WHERE todo_id = ?1 ORDER BY created_at_us, reference_id"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_references")?;
    let rows = stmt
        .query_map(params![todo_id], row_to_reference)
        .context("execute list_references")?;

    let mut references = Vec::new();
    for row in rows {
        references.push(row.context("read reference row")?);
    }
    Ok(references)
}

fn row_to_reference(row: &Row<'_>) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: row.get(0)?,
        todo_id: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        created_at_us: row.get(4)?,
    })
}
