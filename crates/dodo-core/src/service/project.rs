use rusqlite::Connection;
use tracing::info;

use super::{check_description, patched};
use crate::error::{Entity, Error, Result};
use crate::model::now_us;
use crate::model::page::{Page, PageOf};
use crate::model::project::{NewProject, Project, ProjectPatch};
use crate::repo::project::{self as repo, ProjectFilter, ProjectSort};
use crate::repo::team::team_exists;
use crate::validate::validate_name;

/// Create a project inside an existing team.
pub fn create_project(conn: &Connection, new: &NewProject) -> Result<Project> {
    validate_name(&new.name)?;
    check_description(new.description.as_deref())?;
    if !team_exists(conn, new.team_id)? {
        return Err(Error::not_found(Entity::Team, new.team_id));
    }
    if repo::find_project_id_by_name(conn, new.team_id, &new.name)?.is_some() {
        return Err(Error::Duplicate {
            entity: Entity::Project,
            name: new.name.clone(),
        });
    }

    let project_id = repo::insert_project(
        conn,
        new.team_id,
        &new.name,
        new.description.as_deref(),
        now_us(),
    )?;
    info!(project_id, team_id = new.team_id, name = %new.name, "created project");
    get_project(conn, project_id)
}

pub fn get_project(conn: &Connection, project_id: i64) -> Result<Project> {
    repo::get_project(conn, project_id)?
        .ok_or_else(|| Error::not_found(Entity::Project, project_id))
}

pub fn update_project(conn: &Connection, project_id: i64, patch: &ProjectPatch) -> Result<Project> {
    let current = get_project(conn, project_id)?;

    let name = patch.name.clone().unwrap_or_else(|| current.name.clone());
    validate_name(&name)?;
    let description = patched(current.description.as_ref(), patch.description.as_ref());
    check_description(description.as_deref())?;

    if !name.eq_ignore_ascii_case(&current.name)
        && repo::find_project_id_by_name(conn, current.team_id, &name)?.is_some()
    {
        return Err(Error::Duplicate {
            entity: Entity::Project,
            name,
        });
    }

    if name == current.name && description == current.description {
        return Ok(current);
    }
    repo::update_project(conn, project_id, &name, description.as_deref(), now_us())?;
    info!(project_id, name = %name, "updated project");
    get_project(conn, project_id)
}

/// Delete a project together with its to-dos, references and activities.
pub fn delete_project(conn: &Connection, project_id: i64) -> Result<()> {
    if !repo::delete_project(conn, project_id)? {
        return Err(Error::not_found(Entity::Project, project_id));
    }
    info!(project_id, "deleted project");
    Ok(())
}

pub fn search_projects(
    conn: &Connection,
    filter: &ProjectFilter,
    sort: ProjectSort,
    page: Page,
) -> Result<PageOf<Project>> {
    Ok(repo::search_projects(conn, filter, sort, page)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::todo::NewTodo;
    use crate::service::test_support::{core_team_with_project, test_db};

    fn new_project(team_id: i64, name: &str) -> NewProject {
        NewProject {
            team_id,
            name: name.into(),
            description: None,
        }
    }

    #[test]
    fn team_must_exist() {
        let conn = test_db();
        let err = create_project(&conn, &new_project(42, "api")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TeamNotFound);
    }

    #[test]
    fn names_are_unique_within_team() {
        let mut conn = test_db();
        let (team_id, api_id) = core_team_with_project(&mut conn);

        let err = create_project(&conn, &new_project(team_id, "API")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateName);

        let web = create_project(&conn, &new_project(team_id, "web")).unwrap();
        let patch = ProjectPatch {
            name: Some("api".into()),
            ..ProjectPatch::default()
        };
        let err = update_project(&conn, web.id, &patch).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateName);

        let patch = ProjectPatch {
            description: Some(Some("public API".into())),
            ..ProjectPatch::default()
        };
        let api = update_project(&conn, api_id, &patch).unwrap();
        assert_eq!(api.description.as_deref(), Some("public API"));
    }

    #[test]
    fn delete_cascades_and_reports_missing() {
        let mut conn = test_db();
        let (_, project_id) = core_team_with_project(&mut conn);
        let todo = crate::service::todo::create_todo(
            &mut conn,
            "alice",
            &NewTodo {
                project_id,
                title: "Ship".into(),
                ..NewTodo::default()
            },
        )
        .unwrap();

        delete_project(&conn, project_id).unwrap();
        let err = crate::service::todo::get_todo(&conn, todo.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TodoNotFound);

        let err = delete_project(&conn, project_id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProjectNotFound);
    }
}
