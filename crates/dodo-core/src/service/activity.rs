//! Audit-log synthesis and queries.
//!
//! [`diff`] compares two snapshots of the same to-do and yields one
//! [`FieldChange`] per field that differs, in a fixed field order. Scalars
//! are rendered as their display string; label and assignee sets as a JSON
//! array of sorted values, so a reordered set is not a change.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Entity, Error, Result};
use crate::model::activity::{Activity, ActivityKind, FieldChange};
use crate::model::page::{Page, PageOf, SortDirection};
use crate::model::todo::Todo;
use crate::repo::activity::{self as repo, ActivityFilter};
use crate::repo::format_date;
use crate::repo::todo::todo_exists;
use crate::validate::normalize_actors;

/// Field changes between `before` and `after`.
///
/// Both snapshots must hold sorted, deduplicated label and assignee sets, as
/// the repositories return them.
#[must_use]
pub fn diff(before: &Todo, after: &Todo) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if before.title != after.title {
        changes.push(FieldChange::new(
            ActivityKind::Title,
            Some(before.title.clone()),
            Some(after.title.clone()),
        ));
    }
    if before.description != after.description {
        changes.push(FieldChange::new(
            ActivityKind::Description,
            before.description.clone(),
            after.description.clone(),
        ));
    }
    if before.kind != after.kind {
        changes.push(FieldChange::new(
            ActivityKind::Kind,
            Some(before.kind.to_string()),
            Some(after.kind.to_string()),
        ));
    }
    if before.status != after.status {
        changes.push(FieldChange::new(
            ActivityKind::Status,
            Some(before.status.to_string()),
            Some(after.status.to_string()),
        ));
    }
    if before.due_date != after.due_date {
        changes.push(FieldChange::new(
            ActivityKind::DueDate,
            before.due_date.map(format_date),
            after.due_date.map(format_date),
        ));
    }
    if before.labels != after.labels {
        changes.push(FieldChange::new(
            ActivityKind::Labels,
            Some(set_value(&before.labels)),
            Some(set_value(&after.labels)),
        ));
    }
    if before.assignees != after.assignees {
        changes.push(FieldChange::new(
            ActivityKind::Assignees,
            Some(set_value(&before.assignees)),
            Some(set_value(&after.assignees)),
        ));
    }

    changes
}

/// The `created` entry logged when a to-do is first written.
#[must_use]
pub fn created(todo: &Todo) -> FieldChange {
    FieldChange::new(ActivityKind::Created, None, Some(todo.title.clone()))
}

fn set_value<T: Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| String::from("[]"))
}

/// Full history of a to-do, oldest first.
pub fn list_activities(conn: &Connection, todo_id: i64) -> Result<Vec<Activity>> {
    if !todo_exists(conn, todo_id)? {
        return Err(Error::not_found(Entity::Todo, todo_id));
    }
    Ok(repo::list_activities(conn, todo_id)?)
}

pub fn search_activities(
    conn: &Connection,
    filter: &ActivityFilter,
    direction: SortDirection,
    page: Page,
) -> Result<PageOf<Activity>> {
    let author = match filter.author {
        Some(ref author) => normalize_actors(std::slice::from_ref(author))?.pop(),
        None => None,
    };
    let mut kinds = filter.kinds.clone();
    kinds.sort_by_key(|kind| kind.as_str());
    kinds.dedup();

    let filter = ActivityFilter {
        todo_id: filter.todo_id,
        author,
        kinds,
    };
    Ok(repo::search_activities(conn, &filter, direction, page)?)
}
