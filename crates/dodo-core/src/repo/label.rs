use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Conditions;
use crate::model::label::Label;
use crate::model::page::{Page, PageOf, SortDirection};

const LABEL_COLUMNS: &str =
    "l.label_id, l.name, l.color, l.description, l.created_at_us, l.updated_at_us";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    pub name_like: Option<String>,
}

pub fn insert_label(
    conn: &Connection,
    name: &str,
    color: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO labels (name, color, description, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![name, color, description, now_us],
    )
    .with_context(|| format!("insert label '{name}'"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_label(conn: &Connection, label_id: i64) -> Result<Option<Label>> {
    let sql = format!("SELECT {LABEL_COLUMNS} FROM labels l WHERE l.label_id = ?1");
    conn.query_row(&sql, params![label_id], row_to_label)
        .optional()
        .with_context(|| format!("get_label for {label_id}"))
}

/// Fetch labels by id, ordered by name. Unknown ids are skipped.
pub fn get_labels(conn: &Connection, label_ids: &[i64]) -> Result<Vec<Label>> {
    if label_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (1..=label_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {LABEL_COLUMNS} FROM labels l WHERE l.label_id IN ({}) ORDER BY l.name, l.label_id",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql).context("prepare get_labels")?;
    let rows = stmt
        .query_map(params_from_iter(label_ids), row_to_label)
        .context("execute get_labels")?;

    let mut labels = Vec::new();
    for row in rows {
        labels.push(row.context("read label row")?);
    }
    Ok(labels)
}

/// Ids from `label_ids` that have no label row.
pub fn missing_label_ids(conn: &Connection, label_ids: &[i64]) -> Result<Vec<i64>> {
    let found: Vec<i64> = get_labels(conn, label_ids)?
        .into_iter()
        .map(|label| label.id)
        .collect();
    Ok(label_ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect())
}

/// Case-insensitive name lookup.
pub fn find_label_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT label_id FROM labels WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("find label by name '{name}'"))
}

pub fn update_label(
    conn: &Connection,
    label_id: i64,
    name: &str,
    color: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE labels SET name = ?2, color = ?3, description = ?4, updated_at_us = ?5
         WHERE label_id = ?1",
        params![label_id, name, color, description, now_us],
    )
    .with_context(|| format!("update label {label_id}"))?;
    Ok(())
}

/// Deleting a label detaches it from every to-do.
pub fn delete_label(conn: &Connection, label_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM labels WHERE label_id = ?1", params![label_id])
        .with_context(|| format!("delete label {label_id}"))?;
    Ok(changed > 0)
}

/// Search labels by name, sorted by name.
pub fn search_labels(
    conn: &Connection,
    filter: &LabelFilter,
    direction: SortDirection,
    page: Page,
) -> Result<PageOf<Label>> {
    let mut cond = Conditions::default();
    if let Some(ref name) = filter.name_like {
        cond.like("l.name", name);
    }

    let total = cond.count(conn, "labels l")?;

    let sql = format!(
        "SELECT {LABEL_COLUMNS} FROM labels l{} ORDER BY l.name {}, l.label_id ASC{}",
        cond.where_clause(),
        direction.sql(),
        page.sql_clause()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_labels query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), row_to_label)
        .context("execute search_labels query")?;

    let mut labels = Vec::new();
    for row in rows {
        labels.push(row.context("read search_labels row")?);
    }
    Ok(PageOf::new(labels, total, page))
}

fn row_to_label(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        description: row.get(3)?,
        created_at_us: row.get(4)?,
        updated_at_us: row.get(5)?,
    })
}
