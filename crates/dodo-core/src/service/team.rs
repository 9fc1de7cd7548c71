use rusqlite::Connection;
use tracing::{info, warn};

use anyhow::Context as _;

use super::{check_description, patched};
use crate::error::{Entity, Error, Result};
use crate::model::now_us;
use crate::model::page::{Page, PageOf};
use crate::model::team::{NewTeam, Team, TeamPatch};
use crate::repo::team::{self as repo, Role, TeamFilter, TeamSort};
use crate::repo::todo::assignees_in_team;
use crate::validate::{normalize_actors, validate_name};

/// Create a team. Managers are added as members too.
pub fn create_team(conn: &mut Connection, new: &NewTeam) -> Result<Team> {
    validate_name(&new.name)?;
    check_description(new.description.as_deref())?;
    let members = normalize_actors(&new.members)?;
    let managers = normalize_actors(&new.managers)?;

    if repo::find_team_id_by_name(conn, &new.name)?.is_some() {
        return Err(Error::Duplicate {
            entity: Entity::Team,
            name: new.name.clone(),
        });
    }

    let now = now_us();
    let tx = conn.transaction().context("begin create_team")?;
    let team_id = repo::insert_team(&tx, &new.name, new.description.as_deref(), now)?;
    for member in &members {
        repo::upsert_member(&tx, team_id, member, Role::Member, now)?;
    }
    for manager in &managers {
        repo::upsert_member(&tx, team_id, manager, Role::Manager, now)?;
    }
    tx.commit().context("commit create_team")?;

    info!(team_id, name = %new.name, members = members.len(), "created team");
    get_team(conn, team_id)
}

pub fn get_team(conn: &Connection, team_id: i64) -> Result<Team> {
    repo::get_team(conn, team_id)?.ok_or_else(|| Error::not_found(Entity::Team, team_id))
}

pub fn update_team(conn: &Connection, team_id: i64, patch: &TeamPatch) -> Result<Team> {
    let current = get_team(conn, team_id)?;

    let name = patch.name.clone().unwrap_or_else(|| current.name.clone());
    validate_name(&name)?;
    let description = patched(current.description.as_ref(), patch.description.as_ref());
    check_description(description.as_deref())?;

    if !name.eq_ignore_ascii_case(&current.name)
        && repo::find_team_id_by_name(conn, &name)?.is_some()
    {
        return Err(Error::Duplicate {
            entity: Entity::Team,
            name,
        });
    }

    if name == current.name && description == current.description {
        return Ok(current);
    }
    repo::update_team(conn, team_id, &name, description.as_deref(), now_us())?;
    info!(team_id, name = %name, "updated team");
    get_team(conn, team_id)
}

pub fn add_members(conn: &mut Connection, team_id: i64, members: &[String]) -> Result<Team> {
    let members = normalize_actors(members)?;
    get_team(conn, team_id)?;

    let now = now_us();
    let tx = conn.transaction().context("begin add_members")?;
    let mut changed = 0;
    for member in &members {
        if repo::upsert_member(&tx, team_id, member, Role::Member, now)? {
            changed += 1;
        }
    }
    if changed > 0 {
        repo::touch_team(&tx, team_id, now)?;
    }
    tx.commit().context("commit add_members")?;

    info!(team_id, added = changed, "added team members");
    get_team(conn, team_id)
}

/// Remove members. Removed managers lose the manager role with them.
pub fn remove_members(conn: &mut Connection, team_id: i64, members: &[String]) -> Result<Team> {
    let members = normalize_actors(members)?;
    get_team(conn, team_id)?;

    let now = now_us();
    let tx = conn.transaction().context("begin remove_members")?;
    let mut changed = 0;
    for member in &members {
        if repo::remove_member(&tx, team_id, member)? {
            changed += 1;
            let assignments = assignees_in_team(&tx, team_id, member)?;
            if assignments > 0 {
                warn!(
                    team_id,
                    member = %member,
                    assignments,
                    "removed member is still assigned to team to-dos"
                );
            }
        }
    }
    if changed > 0 {
        repo::touch_team(&tx, team_id, now)?;
    }
    tx.commit().context("commit remove_members")?;

    info!(team_id, removed = changed, "removed team members");
    get_team(conn, team_id)
}

/// Promote existing members to manager.
pub fn add_managers(conn: &mut Connection, team_id: i64, managers: &[String]) -> Result<Team> {
    let managers = normalize_actors(managers)?;
    let team = get_team(conn, team_id)?;
    if let Some(outsider) = managers.iter().find(|m| !team.is_member(m)) {
        return Err(Error::NotATeamMember {
            team_id,
            member: outsider.clone(),
        });
    }

    let now = now_us();
    let tx = conn.transaction().context("begin add_managers")?;
    let mut changed = 0;
    for manager in &managers {
        if repo::upsert_member(&tx, team_id, manager, Role::Manager, now)? {
            changed += 1;
        }
    }
    if changed > 0 {
        repo::touch_team(&tx, team_id, now)?;
    }
    tx.commit().context("commit add_managers")?;

    info!(team_id, promoted = changed, "added team managers");
    get_team(conn, team_id)
}

/// Demote managers to plain members. Unknown names are ignored.
pub fn remove_managers(conn: &mut Connection, team_id: i64, managers: &[String]) -> Result<Team> {
    let managers = normalize_actors(managers)?;
    get_team(conn, team_id)?;

    let now = now_us();
    let tx = conn.transaction().context("begin remove_managers")?;
    let mut changed = 0;
    for manager in &managers {
        if repo::demote_manager(&tx, team_id, manager)? {
            changed += 1;
        }
    }
    if changed > 0 {
        repo::touch_team(&tx, team_id, now)?;
    }
    tx.commit().context("commit remove_managers")?;

    info!(team_id, demoted = changed, "removed team managers");
    get_team(conn, team_id)
}

/// Delete a team. Fails while the team still owns projects.
pub fn delete_team(conn: &Connection, team_id: i64) -> Result<()> {
    get_team(conn, team_id)?;
    let projects = repo::count_projects(conn, team_id)?;
    if projects > 0 {
        return Err(Error::TeamHasProjects { team_id, projects });
    }
    repo::delete_team(conn, team_id)?;
    info!(team_id, "deleted team");
    Ok(())
}

pub fn search_teams(
    conn: &Connection,
    filter: &TeamFilter,
    sort: TeamSort,
    page: Page,
) -> Result<PageOf<Team>> {
    let filter = TeamFilter {
        name_like: filter.name_like.clone(),
        members: normalize_actors(&filter.members)?,
        managers: normalize_actors(&filter.managers)?,
    };
    Ok(repo::search_teams(conn, &filter, sort, page)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::test_support::{core_team_with_project, test_db};

    fn new_team(name: &str, members: &[&str], managers: &[&str]) -> NewTeam {
        NewTeam {
            name: name.into(),
            description: None,
            members: members.iter().map(|s| (*s).to_string()).collect(),
            managers: managers.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn create_adds_managers_as_members() {
        let mut conn = test_db();
        let team = create_team(&mut conn, &new_team("core", &["bob", "bob"], &["alice"])).unwrap();
        assert_eq!(team.members, vec!["alice", "bob"]);
        assert_eq!(team.managers, vec!["alice"]);
    }

    #[test]
    fn names_are_unique_case_insensitively() {
        let mut conn = test_db();
        let core = create_team(&mut conn, &new_team("core", &[], &[])).unwrap();
        let err = create_team(&mut conn, &new_team("CORE", &[], &[])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateName);

        let web = create_team(&mut conn, &new_team("web", &[], &[])).unwrap();
        let rename = TeamPatch {
            name: Some("Core".into()),
            ..TeamPatch::default()
        };
        let err = update_team(&conn, web.id, &rename).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateName);

        let recase = update_team(&conn, core.id, &rename).unwrap();
        assert_eq!(recase.name, "Core");
    }

    #[test]
    fn update_clears_description() {
        let mut conn = test_db();
        let mut new = new_team("core", &[], &[]);
        new.description = Some("platform".into());
        let team = create_team(&mut conn, &new).unwrap();

        let patch = TeamPatch {
            description: Some(None),
            ..TeamPatch::default()
        };
        let team = update_team(&conn, team.id, &patch).unwrap();
        assert_eq!(team.description, None);
        assert_eq!(team.name, "core");
    }

    #[test]
    fn managers_must_already_be_members() {
        let mut conn = test_db();
        let team = create_team(&mut conn, &new_team("core", &["bob"], &[])).unwrap();

        let err = add_managers(&mut conn, team.id, &["zed".into()]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotATeamMember);

        let team = add_managers(&mut conn, team.id, &["bob".into()]).unwrap();
        assert_eq!(team.managers, vec!["bob"]);

        let team = remove_managers(&mut conn, team.id, &["bob".into()]).unwrap();
        assert!(team.managers.is_empty());
        assert_eq!(team.members, vec!["bob"]);
    }

    #[test]
    fn removing_member_drops_manager_role() {
        let mut conn = test_db();
        let team = create_team(&mut conn, &new_team("core", &["bob"], &["alice"])).unwrap();
        let team = remove_members(&mut conn, team.id, &["alice".into()]).unwrap();
        assert_eq!(team.members, vec!["bob"]);
        assert!(team.managers.is_empty());

        let team = add_members(&mut conn, team.id, &["alice".into()]).unwrap();
        assert_eq!(team.members, vec!["alice", "bob"]);
        assert!(team.managers.is_empty());
    }

    #[test]
    fn removing_assigned_member_keeps_their_assignments() {
        let mut conn = test_db();
        let (team_id, project_id) = core_team_with_project(&mut conn);
        let todo = crate::service::todo::create_todo(
            &mut conn,
            "alice",
            &crate::model::todo::NewTodo {
                project_id,
                title: "Ship".into(),
                assignees: vec!["bob".into()],
                ..Default::default()
            },
        )
        .unwrap();

        let team = remove_members(&mut conn, team_id, &["bob".into()]).unwrap();
        assert!(!team.is_member("bob"));
        assert_eq!(assignees_in_team(&conn, team_id, "bob").unwrap(), 1);

        let todo = crate::service::todo::assign(&mut conn, "alice", todo.id, &["carol".into()])
            .unwrap();
        assert_eq!(todo.assignees, vec!["bob", "carol"]);
    }

    #[test]
    fn delete_refuses_while_projects_exist() {
        let mut conn = test_db();
        let (team_id, project_id) = core_team_with_project(&mut conn);

        let err = delete_team(&conn, team_id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TeamHasProjects);

        crate::service::project::delete_project(&conn, project_id).unwrap();
        delete_team(&conn, team_id).unwrap();
        assert_eq!(get_team(&conn, team_id).unwrap_err().code(), ErrorCode::TeamNotFound);
    }

    #[test]
    fn search_normalizes_member_filter() {
        let mut conn = test_db();
        create_team(&mut conn, &new_team("core", &["bob"], &["alice"])).unwrap();
        create_team(&mut conn, &new_team("web", &["bob"], &[])).unwrap();

        let filter = TeamFilter {
            members: vec![" bob ".into(), "bob".into()],
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        assert_eq!(page.total, 2);

        let filter = TeamFilter {
            managers: vec!["alice".into()],
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        let names: Vec<_> = page.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["core"]);
    }
}
