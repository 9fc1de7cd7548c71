//! To-do lifecycle and the diff-and-log update flow.
//!
//! Every write that changes a to-do runs in one transaction: scalar columns,
//! label and assignee sets, and one activity row per changed field. The
//! actor is recorded as the activity author.

use anyhow::Context as _;
use rusqlite::Connection;
use tracing::{debug, info};

use super::activity::{created, diff};
use super::label::ensure_labels_exist;
use super::{check_description, patched, require_actor};
use crate::error::{Entity, Error, Result};
use crate::model::now_us;
use crate::model::page::{Page, PageOf};
use crate::model::todo::{NewTodo, Todo, TodoPatch};
use crate::repo::activity::insert_activity;
use crate::repo::project::get_project;
use crate::repo::team::get_team;
use crate::repo::todo::{self as repo, TodoFilter, TodoRow, TodoSort};
use crate::validate::{normalize_actors, normalize_ids, validate_title};

/// Every assignee must be a member of the team owning `project_id`.
fn ensure_assignable(conn: &Connection, project_id: i64, assignees: &[String]) -> Result<()> {
    if assignees.is_empty() {
        return Ok(());
    }
    let project =
        get_project(conn, project_id)?.ok_or_else(|| Error::not_found(Entity::Project, project_id))?;
    let team = get_team(conn, project.team_id)?
        .ok_or_else(|| Error::not_found(Entity::Team, project.team_id))?;
    match assignees.iter().find(|a| !team.is_member(a)) {
        Some(outsider) => Err(Error::NotATeamMember {
            team_id: team.id,
            member: outsider.clone(),
        }),
        None => Ok(()),
    }
}

fn write_row(todo: &Todo) -> TodoRow<'_> {
    TodoRow {
        title: &todo.title,
        description: todo.description.as_deref(),
        kind: todo.kind,
        status: todo.status,
        due_date: todo.due_date,
    }
}

/// Create a to-do and log its `created` activity.
pub fn create_todo(conn: &mut Connection, actor: &str, new: &NewTodo) -> Result<Todo> {
    require_actor(actor)?;
    validate_title(&new.title)?;
    check_description(new.description.as_deref())?;
    if get_project(conn, new.project_id)?.is_none() {
        return Err(Error::not_found(Entity::Project, new.project_id));
    }
    let labels = normalize_ids(&new.labels);
    ensure_labels_exist(conn, &labels)?;
    let assignees = normalize_actors(&new.assignees)?;
    ensure_assignable(conn, new.project_id, &assignees)?;

    let now = now_us();
    let tx = conn.transaction().context("begin create_todo")?;
    let row = TodoRow {
        title: &new.title,
        description: new.description.as_deref(),
        kind: new.kind,
        status: new.status,
        due_date: new.due_date,
    };
    let todo_id = repo::insert_todo(&tx, new.project_id, row, actor, now)?;
    repo::replace_labels(&tx, todo_id, &labels, now)?;
    repo::replace_assignees(&tx, todo_id, &assignees, now)?;
    let todo = get_todo(&tx, todo_id)?;
    insert_activity(&tx, todo_id, actor, &created(&todo), now)?;
    tx.commit().context("commit create_todo")?;

    info!(todo_id, project_id = new.project_id, actor, "created to-do");
    Ok(todo)
}

pub fn get_todo(conn: &Connection, todo_id: i64) -> Result<Todo> {
    repo::get_todo(conn, todo_id)?.ok_or_else(|| Error::not_found(Entity::Todo, todo_id))
}

/// The to-do as it would look with `patch` applied. Sets are normalized.
fn apply_patch(current: &Todo, patch: &TodoPatch) -> Result<Todo> {
    let mut next = current.clone();
    if let Some(ref title) = patch.title {
        next.title.clone_from(title);
    }
    next.description = patched(current.description.as_ref(), patch.description.as_ref());
    if let Some(kind) = patch.kind {
        next.kind = kind;
    }
    if let Some(status) = patch.status {
        next.status = status;
    }
    next.due_date = patched(current.due_date.as_ref(), patch.due_date.as_ref());
    if let Some(ref labels) = patch.labels {
        next.labels = normalize_ids(labels);
    }
    if let Some(ref assignees) = patch.assignees {
        next.assignees = normalize_actors(assignees)?;
    }
    Ok(next)
}

/// Apply a partial update and log one activity per changed field.
///
/// A patch that changes nothing writes nothing and leaves `updated_at`
/// untouched.
pub fn update_todo(
    conn: &mut Connection,
    actor: &str,
    todo_id: i64,
    patch: &TodoPatch,
) -> Result<Todo> {
    require_actor(actor)?;
    let current = get_todo(conn, todo_id)?;
    let next = apply_patch(&current, patch)?;

    if next.title != current.title {
        validate_title(&next.title)?;
    }
    if next.description != current.description {
        check_description(next.description.as_deref())?;
    }
    if next.labels != current.labels {
        ensure_labels_exist(conn, &next.labels)?;
    }
    if next.assignees != current.assignees {
        let added: Vec<String> = next
            .assignees
            .iter()
            .filter(|a| !current.assignees.contains(a))
            .cloned()
            .collect();
        ensure_assignable(conn, current.project_id, &added)?;
    }

    let changes = diff(&current, &next);
    if changes.is_empty() {
        debug!(todo_id, "to-do update changed nothing");
        return Ok(current);
    }

    let now = now_us();
    let tx = conn.transaction().context("begin update_todo")?;
    repo::update_todo(&tx, todo_id, write_row(&next), now)?;
    if next.labels != current.labels {
        repo::replace_labels(&tx, todo_id, &next.labels, now)?;
    }
    if next.assignees != current.assignees {
        repo::replace_assignees(&tx, todo_id, &next.assignees, now)?;
    }
    for change in &changes {
        insert_activity(&tx, todo_id, actor, change, now)?;
    }
    let updated = get_todo(&tx, todo_id)?;
    tx.commit().context("commit update_todo")?;

    let kinds: Vec<&str> = changes.iter().map(|c| c.kind.as_str()).collect();
    info!(todo_id, actor, changes = ?kinds, "updated to-do");
    Ok(updated)
}

/// Add labels to the current set.
pub fn add_labels(conn: &mut Connection, actor: &str, todo_id: i64, label_ids: &[i64]) -> Result<Todo> {
    let current = get_todo(conn, todo_id)?;
    let mut labels = current.labels;
    labels.extend_from_slice(label_ids);
    let patch = TodoPatch {
        labels: Some(labels),
        ..TodoPatch::default()
    };
    update_todo(conn, actor, todo_id, &patch)
}

/// Remove labels from the current set. Absent ids are ignored.
pub fn remove_labels(
    conn: &mut Connection,
    actor: &str,
    todo_id: i64,
    label_ids: &[i64],
) -> Result<Todo> {
    let current = get_todo(conn, todo_id)?;
    let labels: Vec<i64> = current
        .labels
        .into_iter()
        .filter(|id| !label_ids.contains(id))
        .collect();
    let patch = TodoPatch {
        labels: Some(labels),
        ..TodoPatch::default()
    };
    update_todo(conn, actor, todo_id, &patch)
}

/// Add assignees to the current set.
pub fn assign(conn: &mut Connection, actor: &str, todo_id: i64, assignees: &[String]) -> Result<Todo> {
    let current = get_todo(conn, todo_id)?;
    let mut next = current.assignees;
    next.extend_from_slice(assignees);
    let patch = TodoPatch {
        assignees: Some(next),
        ..TodoPatch::default()
    };
    update_todo(conn, actor, todo_id, &patch)
}

/// Remove assignees from the current set. Absent names are ignored.
pub fn unassign(
    conn: &mut Connection,
    actor: &str,
    todo_id: i64,
    assignees: &[String],
) -> Result<Todo> {
    let current = get_todo(conn, todo_id)?;
    let next: Vec<String> = current
        .assignees
        .into_iter()
        .filter(|a| !assignees.iter().any(|gone| gone.trim() == a.as_str()))
        .collect();
    let patch = TodoPatch {
        assignees: Some(next),
        ..TodoPatch::default()
    };
    update_todo(conn, actor, todo_id, &patch)
}

/// Delete a to-do with its references and activities.
pub fn delete_todo(conn: &Connection, todo_id: i64) -> Result<()> {
    if !repo::delete_todo(conn, todo_id)? {
        return Err(Error::not_found(Entity::Todo, todo_id));
    }
    info!(todo_id, "deleted to-do");
    Ok(())
}

pub fn search_todos(
    conn: &Connection,
    filter: &TodoFilter,
    sort: TodoSort,
    page: Page,
) -> Result<PageOf<Todo>> {
    let mut statuses = filter.statuses.clone();
    statuses.sort_by_key(|s| s.as_str());
    statuses.dedup();

    let filter = TodoFilter {
        statuses,
        labels: normalize_ids(&filter.labels),
        assignees: normalize_actors(&filter.assignees)?,
        ..filter.clone()
    };
    Ok(repo::search_todos(conn, &filter, sort, page)?)
}
