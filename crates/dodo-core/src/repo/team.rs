use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Conditions;
use crate::model::page::{Page, PageOf, SortDirection};
use crate::model::team::Team;

const TEAM_COLUMNS: &str = "t.team_id, t.name, t.description, t.created_at_us, t.updated_at_us";

/// Membership role stored in `team_members.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Manager,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeamSortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
}

impl TeamSortField {
    const fn column(self) -> &'static str {
        match self {
            Self::Name => "t.name",
            Self::CreatedAt => "t.created_at_us",
            Self::UpdatedAt => "t.updated_at_us",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamSort {
    pub field: TeamSortField,
    pub direction: SortDirection,
}

/// Filter criteria for team search, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter {
    /// Case-insensitive substring of the team name.
    pub name_like: Option<String>,
    /// Team must include every one of these members.
    pub members: Vec<String>,
    /// Team must include every one of these managers.
    pub managers: Vec<String>,
}

pub fn insert_team(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO teams (name, description, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?3)",
        params![name, description, now_us],
    )
    .with_context(|| format!("insert team '{name}'"))?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a team with its members and managers.
pub fn get_team(conn: &Connection, team_id: i64) -> Result<Option<Team>> {
    let sql = format!("SELECT {TEAM_COLUMNS} FROM teams t WHERE t.team_id = ?1");
    let team = conn
        .query_row(&sql, params![team_id], row_to_team)
        .optional()
        .with_context(|| format!("get_team for {team_id}"))?;

    match team {
        Some(mut team) => {
            load_membership(conn, &mut team)?;
            Ok(Some(team))
        }
        None => Ok(None),
    }
}

pub fn team_exists(conn: &Connection, team_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE team_id = ?1)",
        params![team_id],
        |row| row.get(0),
    )
    .with_context(|| format!("team_exists for {team_id}"))
}

/// Case-insensitive name lookup.
pub fn find_team_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT team_id FROM teams WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("find team by name '{name}'"))
}

pub fn update_team(
    conn: &Connection,
    team_id: i64,
    name: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE teams SET name = ?2, description = ?3, updated_at_us = ?4 WHERE team_id = ?1",
        params![team_id, name, description, now_us],
    )
    .with_context(|| format!("update team {team_id}"))?;
    Ok(())
}

pub fn touch_team(conn: &Connection, team_id: i64, now_us: i64) -> Result<()> {
    conn.execute(
        "UPDATE teams SET updated_at_us = ?2 WHERE team_id = ?1",
        params![team_id, now_us],
    )
    .with_context(|| format!("touch team {team_id}"))?;
    Ok(())
}

/// Add `member` with `role`. Existing rows are upgraded to manager but never
/// downgraded. Returns true when a row was inserted or changed.
pub fn upsert_member(
    conn: &Connection,
    team_id: i64,
    member: &str,
    role: Role,
    now_us: i64,
) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT INTO team_members (team_id, member, role, created_at_us)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (team_id, member) DO UPDATE SET role = excluded.role
             WHERE excluded.role = 'manager' AND team_members.role <> 'manager'",
            params![team_id, member, role.as_str(), now_us],
        )
        .with_context(|| format!("upsert member '{member}' of team {team_id}"))?;
    Ok(changed > 0)
}

/// Downgrade a manager to plain member. Returns true when a row changed.
pub fn demote_manager(conn: &Connection, team_id: i64, member: &str) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE team_members SET role = 'member'
             WHERE team_id = ?1 AND member = ?2 AND role = 'manager'",
            params![team_id, member],
        )
        .with_context(|| format!("demote manager '{member}' of team {team_id}"))?;
    Ok(changed > 0)
}

/// Returns true when a row was deleted.
pub fn remove_member(conn: &Connection, team_id: i64, member: &str) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM team_members WHERE team_id = ?1 AND member = ?2",
            params![team_id, member],
        )
        .with_context(|| format!("remove member '{member}' from team {team_id}"))?;
    Ok(changed > 0)
}

pub fn count_projects(conn: &Connection, team_id: i64) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM projects WHERE team_id = ?1",
            params![team_id],
            |row| row.get(0),
        )
        .with_context(|| format!("count projects of team {team_id}"))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn delete_team(conn: &Connection, team_id: i64) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM teams WHERE team_id = ?1", params![team_id])
        .with_context(|| format!("delete team {team_id}"))?;
    Ok(changed > 0)
}

/// Search teams. `filter.members`/`filter.managers` must be deduplicated.
pub fn search_teams(
    conn: &Connection,
    filter: &TeamFilter,
    sort: TeamSort,
    page: Page,
) -> Result<PageOf<Team>> {
    let mut cond = Conditions::default();

    if let Some(ref name) = filter.name_like {
        cond.like("t.name", name);
    }
    cond.contains_all("t.team_id", "team_members", "team_id", "member", &filter.members);
    if !filter.managers.is_empty() {
        let placeholders: Vec<String> = filter
            .managers
            .iter()
            .map(|m| cond.bind(m.clone()))
            .collect();
        cond.push(format!(
            "t.team_id IN (SELECT team_id FROM team_members \
             WHERE role = 'manager' AND member IN ({}) \
             GROUP BY team_id HAVING COUNT(DISTINCT member) = {})",
            placeholders.join(", "),
            filter.managers.len()
        ));
    }

    let total = cond.count(conn, "teams t")?;

    let sql = format!(
        "SELECT {TEAM_COLUMNS} FROM teams t{} ORDER BY {} {}, t.team_id ASC{}",
        cond.where_clause(),
        sort.field.column(),
        sort.direction.sql(),
        page.sql_clause()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_teams query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), row_to_team)
        .context("execute search_teams query")?;

    let mut teams = Vec::new();
    for row in rows {
        let mut team = row.context("read search_teams row")?;
        load_membership(conn, &mut team)?;
        teams.push(team);
    }
    Ok(PageOf::new(teams, total, page))
}

fn load_membership(conn: &Connection, team: &mut Team) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "SELECT member, role FROM team_members WHERE team_id = ?1 ORDER BY member",
        )
        .context("prepare membership query")?;
    let rows = stmt
        .query_map(params![team.id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .context("execute membership query")?;

    team.members.clear();
    team.managers.clear();
    for row in rows {
        let (member, role) = row.context("read membership row")?;
        if role == Role::Manager.as_str() {
            team.managers.push(member.clone());
        }
        team.members.push(member);
    }
    Ok(())
}

fn row_to_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        members: Vec::new(),
        managers: Vec::new(),
        created_at_us: row.get(3)?,
        updated_at_us: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::test_support::{seed_member, seed_project, seed_team, test_db};

    fn names(page: &PageOf<Team>) -> Vec<&str> {
        page.items.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = test_db();
        let id = insert_team(&conn, "Platform", Some("infra"), 100).unwrap();
        upsert_member(&conn, id, "bob", Role::Member, 100).unwrap();
        upsert_member(&conn, id, "alice", Role::Manager, 100).unwrap();

        let team = get_team(&conn, id).unwrap().unwrap();
        assert_eq!(team.name, "Platform");
        assert_eq!(team.description.as_deref(), Some("infra"));
        assert_eq!(team.members, vec!["alice", "bob"]);
        assert_eq!(team.managers, vec!["alice"]);
        assert_eq!(team.created_at_us, 100);
    }

    #[test]
    fn get_missing_team_is_none() {
        let conn = test_db();
        assert!(get_team(&conn, 42).unwrap().is_none());
        assert!(!team_exists(&conn, 42).unwrap());
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let conn = test_db();
        seed_team(&conn, 1, "Platform", 1);
        assert_eq!(find_team_id_by_name(&conn, "platform").unwrap(), Some(1));
        assert_eq!(find_team_id_by_name(&conn, "mobile").unwrap(), None);
    }

    #[test]
    fn upsert_promotes_but_never_demotes() {
        let conn = test_db();
        seed_team(&conn, 1, "core", 1);
        assert!(upsert_member(&conn, 1, "alice", Role::Member, 1).unwrap());
        assert!(!upsert_member(&conn, 1, "alice", Role::Member, 1).unwrap());
        assert!(upsert_member(&conn, 1, "alice", Role::Manager, 1).unwrap());
        assert!(!upsert_member(&conn, 1, "alice", Role::Member, 1).unwrap());

        let team = get_team(&conn, 1).unwrap().unwrap();
        assert_eq!(team.managers, vec!["alice"]);

        assert!(demote_manager(&conn, 1, "alice").unwrap());
        let team = get_team(&conn, 1).unwrap().unwrap();
        assert!(team.managers.is_empty());
        assert_eq!(team.members, vec!["alice"]);
    }

    #[test]
    fn remove_member_reports_change() {
        let conn = test_db();
        seed_team(&conn, 1, "core", 1);
        seed_member(&conn, 1, "alice", "manager");
        assert!(remove_member(&conn, 1, "alice").unwrap());
        assert!(!remove_member(&conn, 1, "alice").unwrap());
    }

    #[test]
    fn delete_is_blocked_by_projects_at_the_schema_level() {
        let conn = test_db();
        seed_team(&conn, 1, "core", 1);
        seed_project(&conn, 10, 1, "api");
        assert_eq!(count_projects(&conn, 1).unwrap(), 1);
        assert!(delete_team(&conn, 1).is_err());
    }

    #[test]
    fn search_filters_by_members_all_of() {
        let conn = test_db();
        seed_team(&conn, 1, "alpha", 1);
        seed_team(&conn, 2, "beta", 2);
        seed_team(&conn, 3, "gamma", 3);
        seed_member(&conn, 1, "alice", "member");
        seed_member(&conn, 1, "bob", "member");
        seed_member(&conn, 2, "alice", "manager");
        seed_member(&conn, 3, "bob", "member");

        let filter = TeamFilter {
            members: vec!["alice".into(), "bob".into()],
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        assert_eq!(names(&page), vec!["alpha"]);
        assert_eq!(page.total, 1);

        let filter = TeamFilter {
            members: vec!["alice".into()],
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        assert_eq!(names(&page), vec!["alpha", "beta"]);

        let filter = TeamFilter {
            managers: vec!["alice".into()],
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        assert_eq!(names(&page), vec!["beta"]);
    }

    #[test]
    fn search_like_sort_and_paginate() {
        let conn = test_db();
        seed_team(&conn, 1, "web-frontend", 30);
        seed_team(&conn, 2, "web-backend", 10);
        seed_team(&conn, 3, "mobile", 20);
        seed_team(&conn, 4, "WEB_ops", 40);

        let filter = TeamFilter {
            name_like: Some("web".into()),
            ..TeamFilter::default()
        };
        let sort = TeamSort {
            field: TeamSortField::CreatedAt,
            direction: SortDirection::Desc,
        };
        let page = search_teams(&conn, &filter, sort, Page::new(None, Some(2))).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(names(&page), vec!["WEB_ops", "web-frontend"]);
        assert!(page.has_more());

        let page = search_teams(&conn, &filter, sort, Page::new(Some(2), Some(2))).unwrap();
        assert_eq!(names(&page), vec!["web-backend"]);

        let filter = TeamFilter {
            name_like: Some("b_b".into()),
            ..TeamFilter::default()
        };
        let page = search_teams(&conn, &filter, TeamSort::default(), Page::default()).unwrap();
        assert_eq!(page.total, 0, "underscore is matched literally");
    }
}
