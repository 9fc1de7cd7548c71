use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Conditions;
use crate::model::page::{Page, PageOf, SortDirection};
use crate::model::project::Project;

const PROJECT_COLUMNS: &str =
    "p.project_id, p.team_id, p.name, p.description, p.created_at_us, p.updated_at_us";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
}

impl ProjectSortField {
    const fn column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::CreatedAt => "p.created_at_us",
            Self::UpdatedAt => "p.updated_at_us",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectSort {
    pub field: ProjectSortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub team_id: Option<i64>,
    pub name_like: Option<String>,
}

pub fn insert_project(
    conn: &Connection,
    team_id: i64,
    name: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects (team_id, name, description, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![team_id, name, description, now_us],
    )
    .with_context(|| format!("insert project '{name}' for team {team_id}"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_project(conn: &Connection, project_id: i64) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.project_id = ?1");
    conn.query_row(&sql, params![project_id], row_to_project)
        .optional()
        .with_context(|| format!("get_project for {project_id}"))
}

/// Case-insensitive lookup of a project name within one team.
pub fn find_project_id_by_name(conn: &Connection, team_id: i64, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT project_id FROM projects WHERE team_id = ?1 AND name = ?2",
        params![team_id, name],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("find project '{name}' in team {team_id}"))
}

pub fn update_project(
    conn: &Connection,
    project_id: i64,
    name: &str,
    description: Option<&str>,
    now_us: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE projects SET name = ?2, description = ?3, updated_at_us = ?4
         WHERE project_id = ?1",
        params![project_id, name, description, now_us],
    )
    .with_context(|| format!("update project {project_id}"))?;
    Ok(())
}

/// Deleting a project cascades to its to-dos and everything hanging off them.
pub fn delete_project(conn: &Connection, project_id: i64) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM projects WHERE project_id = ?1",
            params![project_id],
        )
        .with_context(|| format!("delete project {project_id}"))?;
    Ok(changed > 0)
}

pub fn search_projects(
    conn: &Connection,
    filter: &ProjectFilter,
    sort: ProjectSort,
    page: Page,
) -> Result<PageOf<Project>> {
    let mut cond = Conditions::default();

    if let Some(team_id) = filter.team_id {
        let placeholder = cond.bind(team_id);
        cond.push(format!("p.team_id = {placeholder}"));
    }
    if let Some(ref name) = filter.name_like {
        cond.like("p.name", name);
    }

    let total = cond.count(conn, "projects p")?;

    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p{} ORDER BY {} {}, p.project_id ASC{}",
        cond.where_clause(),
        sort.field.column(),
        sort.direction.sql(),
        page.sql_clause()
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare search_projects query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), row_to_project)
        .context("execute search_projects query")?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row.context("read search_projects row")?);
    }
    Ok(PageOf::new(projects, total, page))
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at_us: row.get(4)?,
        updated_at_us: row.get(5)?,
    })
}
