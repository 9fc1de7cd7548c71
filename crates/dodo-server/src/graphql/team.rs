use async_graphql::{Context, Enum, InputObject, MaybeUndefined, Object, Result};
use chrono::{DateTime, Utc};

use super::project::ProjectNode;
use super::{PageInput, Paged, SortDirectionValue, direction, nullable, run, timestamp};
use dodo_core::model::page::SortDirection;
use dodo_core::model::team::{NewTeam, Team, TeamPatch};
use dodo_core::repo::project::{ProjectFilter, ProjectSort};
use dodo_core::repo::team::{TeamFilter, TeamSort};
use dodo_core::service::{project as project_service, team as service};

pub struct TeamNode(pub Team);

#[Object(name = "Team")]
impl TeamNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// Sorted member identifiers. Managers are members too.
    async fn members(&self) -> &[String] {
        &self.0.members
    }

    async fn managers(&self) -> &[String] {
        &self.0.managers
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timestamp(self.0.created_at_us)
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        timestamp(self.0.updated_at_us)
    }

    /// Projects owned by this team, by name.
    async fn projects(
        &self,
        ctx: &Context<'_>,
        page: Option<PageInput>,
    ) -> Result<Paged<ProjectNode>> {
        let filter = ProjectFilter {
            team_id: Some(self.0.id),
            name_like: None,
        };
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| {
            project_service::search_projects(conn, &filter, ProjectSort::default(), page)
        })
        .await?;
        Ok(Paged::from_page(found, ProjectNode))
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "TeamSortField", remote = "dodo_core::repo::team::TeamSortField")]
pub enum TeamSortFieldValue {
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(InputObject, Default)]
pub struct TeamFilterInput {
    /// Case-insensitive substring of the name.
    pub name_like: Option<String>,
    /// Teams containing all of these members.
    pub members: Option<Vec<String>>,
    /// Teams containing all of these managers.
    pub managers: Option<Vec<String>>,
}

#[derive(InputObject)]
pub struct TeamSortInput {
    pub field: Option<TeamSortFieldValue>,
    pub direction: Option<SortDirectionValue>,
}

#[derive(InputObject)]
pub struct CreateTeamInput {
    pub name: String,
    pub description: Option<String>,
    #[graphql(default)]
    pub members: Vec<String>,
    /// Added as members as well.
    #[graphql(default)]
    pub managers: Vec<String>,
}

#[derive(InputObject)]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    /// `null` clears the description.
    pub description: MaybeUndefined<String>,
}

#[derive(Default)]
pub struct TeamQuery;

#[Object]
impl TeamQuery {
    async fn team(&self, ctx: &Context<'_>, id: i64) -> Result<TeamNode> {
        run(ctx, move |conn| service::get_team(conn, id))
            .await
            .map(TeamNode)
    }

    async fn teams(
        &self,
        ctx: &Context<'_>,
        filter: Option<TeamFilterInput>,
        sort: Option<TeamSortInput>,
        page: Option<PageInput>,
    ) -> Result<Paged<TeamNode>> {
        let filter = filter.unwrap_or_default();
        let filter = TeamFilter {
            name_like: filter.name_like,
            members: filter.members.unwrap_or_default(),
            managers: filter.managers.unwrap_or_default(),
        };
        let sort = sort.map_or_else(TeamSort::default, |sort| TeamSort {
            field: sort.field.map(Into::into).unwrap_or_default(),
            direction: direction(sort.direction, SortDirection::Asc),
        });
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| service::search_teams(conn, &filter, sort, page)).await?;
        Ok(Paged::from_page(found, TeamNode))
    }
}

#[derive(Default)]
pub struct TeamMutation;

#[Object]
impl TeamMutation {
    async fn create_team(&self, ctx: &Context<'_>, input: CreateTeamInput) -> Result<TeamNode> {
        let new = NewTeam {
            name: input.name,
            description: input.description,
            members: input.members,
            managers: input.managers,
        };
        run(ctx, move |conn| service::create_team(conn, &new))
            .await
            .map(TeamNode)
    }

    async fn update_team(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateTeamInput,
    ) -> Result<TeamNode> {
        let patch = TeamPatch {
            name: input.name,
            description: nullable(input.description),
        };
        run(ctx, move |conn| service::update_team(conn, id, &patch))
            .await
            .map(TeamNode)
    }

    async fn add_team_members(
        &self,
        ctx: &Context<'_>,
        id: i64,
        members: Vec<String>,
    ) -> Result<TeamNode> {
        run(ctx, move |conn| service::add_members(conn, id, &members))
            .await
            .map(TeamNode)
    }

    /// Removed members also lose the manager role.
    async fn remove_team_members(
        &self,
        ctx: &Context<'_>,
        id: i64,
        members: Vec<String>,
    ) -> Result<TeamNode> {
        run(ctx, move |conn| service::remove_members(conn, id, &members))
            .await
            .map(TeamNode)
    }

    /// Managers must already be members.
    async fn add_team_managers(
        &self,
        ctx: &Context<'_>,
        id: i64,
        managers: Vec<String>,
    ) -> Result<TeamNode> {
        run(ctx, move |conn| service::add_managers(conn, id, &managers))
            .await
            .map(TeamNode)
    }

    async fn remove_team_managers(
        &self,
        ctx: &Context<'_>,
        id: i64,
        managers: Vec<String>,
    ) -> Result<TeamNode> {
        run(ctx, move |conn| service::remove_managers(conn, id, &managers))
            .await
            .map(TeamNode)
    }

    /// Fails while the team still owns projects.
    async fn delete_team(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        run(ctx, move |conn| service::delete_team(conn, id)).await?;
        Ok(true)
    }
}
