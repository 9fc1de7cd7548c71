use async_graphql::{Context, Enum, InputObject, MaybeUndefined, Object, Result};
use chrono::{DateTime, Utc};

use super::team::TeamNode;
use super::todo::{TodoFilterInput, TodoNode, TodoSortInput, todo_filter, todo_sort};
use super::{PageInput, Paged, SortDirectionValue, direction, nullable, run, timestamp};
use dodo_core::model::page::SortDirection;
use dodo_core::model::project::{NewProject, Project, ProjectPatch};
use dodo_core::repo::project::{ProjectFilter, ProjectSort};
use dodo_core::service::{project as service, team as team_service, todo as todo_service};

pub struct ProjectNode(pub Project);

#[Object(name = "Project")]
impl ProjectNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn team_id(&self) -> i64 {
        self.0.team_id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timestamp(self.0.created_at_us)
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        timestamp(self.0.updated_at_us)
    }

    async fn team(&self, ctx: &Context<'_>) -> Result<TeamNode> {
        let team_id = self.0.team_id;
        run(ctx, move |conn| team_service::get_team(conn, team_id))
            .await
            .map(TeamNode)
    }

    /// To-dos in this project. A `projectId` in the filter is ignored.
    async fn todos(
        &self,
        ctx: &Context<'_>,
        filter: Option<TodoFilterInput>,
        sort: Option<TodoSortInput>,
        page: Option<PageInput>,
    ) -> Result<Paged<TodoNode>> {
        let mut filter = todo_filter(filter);
        filter.project_id = Some(self.0.id);
        let sort = todo_sort(sort);
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| {
            todo_service::search_todos(conn, &filter, sort, page)
        })
        .await?;
        Ok(Paged::from_page(found, TodoNode))
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(
    name = "ProjectSortField",
    remote = "dodo_core::repo::project::ProjectSortField"
)]
pub enum ProjectSortFieldValue {
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(InputObject, Default)]
pub struct ProjectFilterInput {
    pub team_id: Option<i64>,
    /// Case-insensitive substring of the name.
    pub name_like: Option<String>,
}

#[derive(InputObject)]
pub struct ProjectSortInput {
    pub field: Option<ProjectSortFieldValue>,
    pub direction: Option<SortDirectionValue>,
}

#[derive(InputObject)]
pub struct CreateProjectInput {
    pub team_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    /// `null` clears the description.
    pub description: MaybeUndefined<String>,
}

#[derive(Default)]
pub struct ProjectQuery;

#[Object]
impl ProjectQuery {
    async fn project(&self, ctx: &Context<'_>, id: i64) -> Result<ProjectNode> {
        run(ctx, move |conn| service::get_project(conn, id))
            .await
            .map(ProjectNode)
    }

    async fn projects(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProjectFilterInput>,
        sort: Option<ProjectSortInput>,
        page: Option<PageInput>,
    ) -> Result<Paged<ProjectNode>> {
        let filter = filter.unwrap_or_default();
        let filter = ProjectFilter {
            team_id: filter.team_id,
            name_like: filter.name_like,
        };
        let sort = sort.map_or_else(ProjectSort::default, |sort| ProjectSort {
            field: sort.field.map(Into::into).unwrap_or_default(),
            direction: direction(sort.direction, SortDirection::Asc),
        });
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| {
            service::search_projects(conn, &filter, sort, page)
        })
        .await?;
        Ok(Paged::from_page(found, ProjectNode))
    }
}

#[derive(Default)]
pub struct ProjectMutation;

#[Object]
impl ProjectMutation {
    async fn create_project(
        &self,
        ctx: &Context<'_>,
        input: CreateProjectInput,
    ) -> Result<ProjectNode> {
        let new = NewProject {
            team_id: input.team_id,
            name: input.name,
            description: input.description,
        };
        run(ctx, move |conn| service::create_project(conn, &new))
            .await
            .map(ProjectNode)
    }

    async fn update_project(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateProjectInput,
    ) -> Result<ProjectNode> {
        let patch = ProjectPatch {
            name: input.name,
            description: nullable(input.description),
        };
        run(ctx, move |conn| service::update_project(conn, id, &patch))
            .await
            .map(ProjectNode)
    }

    /// Deletes the project's to-dos, references and activities too.
    async fn delete_project(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        run(ctx, move |conn| service::delete_project(conn, id)).await?;
        Ok(true)
    }
}
