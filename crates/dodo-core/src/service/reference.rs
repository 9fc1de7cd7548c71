use rusqlite::Connection;
use tracing::info;

use super::patched;
use crate::error::{Entity, Error, Result};
use crate::model::now_us;
use crate::model::reference::{NewReference, Reference, ReferencePatch};
use crate::repo::reference as repo;
use crate::repo::todo::todo_exists;
use crate::validate::{validate_title, validate_url};

fn ensure_todo(conn: &Connection, todo_id: i64) -> Result<()> {
    if todo_exists(conn, todo_id)? {
        Ok(())
    } else {
        Err(Error::not_found(Entity::Todo, todo_id))
    }
}

/// Attach a URL to a to-do. A URL appears at most once per to-do.
pub fn add_reference(conn: &Connection, new: &NewReference) -> Result<Reference> {
    validate_url(&new.url)?;
    if let Some(ref title) = new.title {
        validate_title(title)?;
    }
    ensure_todo(conn, new.todo_id)?;
    if repo::find_reference_id_by_url(conn, new.todo_id, &new.url)?.is_some() {
        return Err(Error::Duplicate {
            entity: Entity::Reference,
            name: new.url.clone(),
        });
    }

    let reference_id = repo::insert_reference(
        conn,
        new.todo_id,
        &new.url,
        new.title.as_deref(),
        now_us(),
    )?;
    info!(reference_id, todo_id = new.todo_id, url = %new.url, "added reference");
    get_reference(conn, reference_id)
}

pub fn get_reference(conn: &Connection, reference_id: i64) -> Result<Reference> {
    repo::get_reference(conn, reference_id)?
        .ok_or_else(|| Error::not_found(Entity::Reference, reference_id))
}

pub fn update_reference(
    conn: &Connection,
    reference_id: i64,
    patch: &ReferencePatch,
) -> Result<Reference> {
    let current = get_reference(conn, reference_id)?;

    let url = patch.url.clone().unwrap_or_else(|| current.url.clone());
    validate_url(&url)?;
    let title = patched(current.title.as_ref(), patch.title.as_ref());
    if let Some(ref title) = title {
        validate_title(title)?;
    }

    if url != current.url
        && repo::find_reference_id_by_url(conn, current.todo_id, &url)?.is_some()
    {
        return Err(Error::Duplicate {
            entity: Entity::Reference,
            name: url,
        });
    }

    if url == current.url && title == current.title {
        return Ok(current);
    }
    repo::update_reference(conn, reference_id, &url, title.as_deref())?;
    info!(reference_id, url = %url, "updated reference");
    get_reference(conn, reference_id)
}

pub fn remove_reference(conn: &Connection, reference_id: i64) -> Result<()> {
    if !repo::delete_reference(conn, reference_id)? {
        return Err(Error::not_found(Entity::Reference, reference_id));
    }
    info!(reference_id, "removed reference");
    Ok(())
}

/// References of an existing to-do, oldest first.
pub fn list_references(conn: &Connection, todo_id: i64) -> Result<Vec<Reference>> {
    ensure_todo(conn, todo_id)?;
    Ok(repo::list_references(conn, todo_id)?)
}
