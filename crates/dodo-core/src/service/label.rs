use rusqlite::Connection;
use tracing::info;

use super::{check_description, patched};
use crate::error::{Entity, Error, Result};
use crate::model::label::{Label, LabelPatch, NewLabel};
use crate::model::now_us;
use crate::model::page::{Page, PageOf, SortDirection};
use crate::repo::label::{self as repo, LabelFilter};
use crate::validate::{normalize_color, normalize_ids, validate_label_name};

pub fn create_label(conn: &Connection, new: &NewLabel) -> Result<Label> {
    validate_label_name(&new.name)?;
    let color = normalize_color(&new.color)?;
    check_description(new.description.as_deref())?;
    if repo::find_label_id_by_name(conn, &new.name)?.is_some() {
        return Err(Error::Duplicate {
            entity: Entity::Label,
            name: new.name.clone(),
        });
    }

    let label_id = repo::insert_label(
        conn,
        &new.name,
        &color,
        new.description.as_deref(),
        now_us(),
    )?;
    info!(label_id, name = %new.name, "created label");
    get_label(conn, label_id)
}

pub fn get_label(conn: &Connection, label_id: i64) -> Result<Label> {
    repo::get_label(conn, label_id)?.ok_or_else(|| Error::not_found(Entity::Label, label_id))
}

/// Labels for the given ids, ordered by name. Unknown ids are skipped.
pub fn labels_by_ids(conn: &Connection, label_ids: &[i64]) -> Result<Vec<Label>> {
    Ok(repo::get_labels(conn, &normalize_ids(label_ids))?)
}

/// Fail with `LabelNotFound` naming the first unknown id.
pub(crate) fn ensure_labels_exist(conn: &Connection, label_ids: &[i64]) -> Result<()> {
    match repo::missing_label_ids(conn, label_ids)?.first() {
        Some(&missing) => Err(Error::not_found(Entity::Label, missing)),
        None => Ok(()),
    }
}

pub fn update_label(conn: &Connection, label_id: i64, patch: &LabelPatch) -> Result<Label> {
    let current = get_label(conn, label_id)?;

    let name = patch.name.clone().unwrap_or_else(|| current.name.clone());
    validate_label_name(&name)?;
    let color = match patch.color {
        Some(ref color) => normalize_color(color)?,
        None => current.color.clone(),
    };
    let description = patched(current.description.as_ref(), patch.description.as_ref());
    check_description(description.as_deref())?;

    if !name.eq_ignore_ascii_case(&current.name)
        && repo::find_label_id_by_name(conn, &name)?.is_some()
    {
        return Err(Error::Duplicate {
            entity: Entity::Label,
            name,
        });
    }

    if name == current.name && color == current.color && description == current.description {
        return Ok(current);
    }
    repo::update_label(
        conn,
        label_id,
        &name,
        &color,
        description.as_deref(),
        now_us(),
    )?;
    info!(label_id, name = %name, "updated label");
    get_label(conn, label_id)
}

/// Delete a label. To-dos carrying it lose it silently, with no activity.
pub fn delete_label(conn: &Connection, label_id: i64) -> Result<()> {
    if !repo::delete_label(conn, label_id)? {
        return Err(Error::not_found(Entity::Label, label_id));
    }
    info!(label_id, "deleted label");
    Ok(())
}

pub fn search_labels(
    conn: &Connection,
    filter: &LabelFilter,
    direction: SortDirection,
    page: Page,
) -> Result<PageOf<Label>> {
    Ok(repo::search_labels(conn, filter, direction, page)?)
}
