use async_graphql::{Context, Enum, InputObject, MaybeUndefined, Object, Result};
use chrono::{DateTime, NaiveDate, Utc};

use super::activity::ActivityNode;
use super::label::LabelNode;
use super::project::ProjectNode;
use super::reference::ReferenceNode;
use super::{PageInput, Paged, SortDirectionValue, actor, direction, nullable, run, timestamp};
use dodo_core::model::page::SortDirection;
use dodo_core::model::todo::{NewTodo, Todo, TodoPatch};
use dodo_core::repo::todo::{TodoFilter, TodoSort};
use dodo_core::service::{
    activity as activity_service, label as label_service, project as project_service,
    reference as reference_service, todo as service,
};

pub struct TodoNode(pub Todo);

#[Object(name = "Todo")]
impl TodoNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn project_id(&self) -> i64 {
        self.0.project_id
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn kind(&self) -> TodoKindValue {
        self.0.kind.into()
    }

    async fn status(&self) -> StatusValue {
        self.0.status.into()
    }

    async fn due_date(&self) -> Option<NaiveDate> {
        self.0.due_date
    }

    /// Sorted label ids.
    async fn label_ids(&self) -> &[i64] {
        &self.0.labels
    }

    /// Sorted assignee identifiers.
    async fn assignees(&self) -> &[String] {
        &self.0.assignees
    }

    async fn author(&self) -> &str {
        &self.0.author
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timestamp(self.0.created_at_us)
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        timestamp(self.0.updated_at_us)
    }

    async fn project(&self, ctx: &Context<'_>) -> Result<ProjectNode> {
        let project_id = self.0.project_id;
        run(ctx, move |conn| project_service::get_project(conn, project_id))
            .await
            .map(ProjectNode)
    }

    /// Labels ordered by name.
    async fn labels(&self, ctx: &Context<'_>) -> Result<Vec<LabelNode>> {
        if self.0.labels.is_empty() {
            return Ok(Vec::new());
        }
        let ids = self.0.labels.clone();
        let labels = run(ctx, move |conn| label_service::labels_by_ids(conn, &ids)).await?;
        Ok(labels.into_iter().map(LabelNode).collect())
    }

    async fn references(&self, ctx: &Context<'_>) -> Result<Vec<ReferenceNode>> {
        let todo_id = self.0.id;
        let references = run(ctx, move |conn| {
            reference_service::list_references(conn, todo_id)
        })
        .await?;
        Ok(references.into_iter().map(ReferenceNode).collect())
    }

    /// Full change history, oldest first.
    async fn activities(&self, ctx: &Context<'_>) -> Result<Vec<ActivityNode>> {
        let todo_id = self.0.id;
        let activities = run(ctx, move |conn| {
            activity_service::list_activities(conn, todo_id)
        })
        .await?;
        Ok(activities.into_iter().map(ActivityNode).collect())
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "TodoKind", remote = "dodo_core::model::todo::TodoKind")]
pub enum TodoKindValue {
    Issue,
    Task,
    Story,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "Status", remote = "dodo_core::model::todo::Status")]
pub enum StatusValue {
    Backlog,
    Todo,
    InProgress,
    Done,
    Canceled,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "TodoSortField", remote = "dodo_core::repo::todo::TodoSortField")]
pub enum TodoSortFieldValue {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
    Status,
}

#[derive(InputObject, Default)]
pub struct TodoFilterInput {
    pub project_id: Option<i64>,
    pub team_id: Option<i64>,
    /// Any of these statuses.
    pub statuses: Option<Vec<StatusValue>>,
    pub kind: Option<TodoKindValue>,
    /// To-dos carrying all of these labels.
    pub labels: Option<Vec<i64>>,
    /// To-dos assigned to all of these users.
    pub assignees: Option<Vec<String>>,
    /// Case-insensitive substring of the title.
    pub title_like: Option<String>,
    /// Due on or before this date.
    pub due_before: Option<NaiveDate>,
    /// Due on or after this date.
    pub due_after: Option<NaiveDate>,
}

/// Defaults to most recently updated first.
#[derive(InputObject)]
pub struct TodoSortInput {
    pub field: Option<TodoSortFieldValue>,
    pub direction: Option<SortDirectionValue>,
}

pub(crate) fn todo_filter(input: Option<TodoFilterInput>) -> TodoFilter {
    let input = input.unwrap_or_default();
    TodoFilter {
        project_id: input.project_id,
        team_id: input.team_id,
        statuses: input
            .statuses
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect(),
        kind: input.kind.map(Into::into),
        labels: input.labels.unwrap_or_default(),
        assignees: input.assignees.unwrap_or_default(),
        title_like: input.title_like,
        due_before: input.due_before,
        due_after: input.due_after,
    }
}

pub(crate) fn todo_sort(input: Option<TodoSortInput>) -> TodoSort {
    input.map_or_else(TodoSort::default, |sort| TodoSort {
        field: sort.field.map(Into::into).unwrap_or_default(),
        direction: direction(sort.direction, SortDirection::Desc),
    })
}

#[derive(InputObject)]
pub struct CreateTodoInput {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `TASK`.
    pub kind: Option<TodoKindValue>,
    /// Defaults to `TODO`.
    pub status: Option<StatusValue>,
    pub due_date: Option<NaiveDate>,
    #[graphql(default)]
    pub labels: Vec<i64>,
    #[graphql(default)]
    pub assignees: Vec<String>,
}

/// Omitted fields are kept. `null` clears `description` and `dueDate`.
/// `labels` and `assignees` replace the whole set.
#[derive(InputObject)]
pub struct UpdateTodoInput {
    pub title: Option<String>,
    pub description: MaybeUndefined<String>,
    pub kind: Option<TodoKindValue>,
    pub status: Option<StatusValue>,
    pub due_date: MaybeUndefined<NaiveDate>,
    pub labels: Option<Vec<i64>>,
    pub assignees: Option<Vec<String>>,
}

#[derive(Default)]
pub struct TodoQuery;

#[Object]
impl TodoQuery {
    async fn todo(&self, ctx: &Context<'_>, id: i64) -> Result<TodoNode> {
        run(ctx, move |conn| service::get_todo(conn, id))
            .await
            .map(TodoNode)
    }

    async fn todos(
        &self,
        ctx: &Context<'_>,
        filter: Option<TodoFilterInput>,
        sort: Option<TodoSortInput>,
        page: Option<PageInput>,
    ) -> Result<Paged<TodoNode>> {
        let filter = todo_filter(filter);
        let sort = todo_sort(sort);
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| service::search_todos(conn, &filter, sort, page)).await?;
        Ok(Paged::from_page(found, TodoNode))
    }
}

/// Every mutation here records activities under the request actor.
#[derive(Default)]
pub struct TodoMutation;

#[Object]
impl TodoMutation {
    async fn create_todo(&self, ctx: &Context<'_>, input: CreateTodoInput) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        let new = NewTodo {
            project_id: input.project_id,
            title: input.title,
            description: input.description,
            kind: input.kind.map(Into::into).unwrap_or_default(),
            status: input.status.map(Into::into).unwrap_or_default(),
            due_date: input.due_date,
            labels: input.labels,
            assignees: input.assignees,
        };
        run(ctx, move |conn| service::create_todo(conn, &actor, &new))
            .await
            .map(TodoNode)
    }

    async fn update_todo(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateTodoInput,
    ) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        let patch = TodoPatch {
            title: input.title,
            description: nullable(input.description),
            kind: input.kind.map(Into::into),
            status: input.status.map(Into::into),
            due_date: nullable(input.due_date),
            labels: input.labels,
            assignees: input.assignees,
        };
        run(ctx, move |conn| service::update_todo(conn, &actor, id, &patch))
            .await
            .map(TodoNode)
    }

    async fn add_todo_labels(
        &self,
        ctx: &Context<'_>,
        id: i64,
        labels: Vec<i64>,
    ) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        run(ctx, move |conn| service::add_labels(conn, &actor, id, &labels))
            .await
            .map(TodoNode)
    }

    async fn remove_todo_labels(
        &self,
        ctx: &Context<'_>,
        id: i64,
        labels: Vec<i64>,
    ) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        run(ctx, move |conn| service::remove_labels(conn, &actor, id, &labels))
            .await
            .map(TodoNode)
    }

    async fn assign_todo(
        &self,
        ctx: &Context<'_>,
        id: i64,
        assignees: Vec<String>,
    ) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        run(ctx, move |conn| service::assign(conn, &actor, id, &assignees))
            .await
            .map(TodoNode)
    }

    async fn unassign_todo(
        &self,
        ctx: &Context<'_>,
        id: i64,
        assignees: Vec<String>,
    ) -> Result<TodoNode> {
        let actor = actor(ctx)?;
        run(ctx, move |conn| service::unassign(conn, &actor, id, &assignees))
            .await
            .map(TodoNode)
    }

    /// Deletes the to-do with its references and activities.
    async fn delete_todo(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        run(ctx, move |conn| service::delete_todo(conn, id)).await?;
        Ok(true)
    }
}
