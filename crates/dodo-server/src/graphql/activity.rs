use async_graphql::{Context, Enum, InputObject, Object, Result};
use chrono::{DateTime, Utc};

use super::todo::TodoNode;
use super::{PageInput, Paged, SortDirectionValue, run, timestamp};
use dodo_core::model::activity::Activity;
use dodo_core::model::page::SortDirection;
use dodo_core::repo::activity::ActivityFilter;
use dodo_core::service::{activity as service, todo as todo_service};

/// One field change on a to-do. Set values are JSON arrays.
pub struct ActivityNode(pub Activity);

#[Object(name = "Activity")]
impl ActivityNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn todo_id(&self) -> i64 {
        self.0.todo_id
    }

    async fn author(&self) -> &str {
        &self.0.author
    }

    async fn kind(&self) -> ActivityKindValue {
        self.0.kind.into()
    }

    async fn old_value(&self) -> Option<&str> {
        self.0.old_value.as_deref()
    }

    async fn new_value(&self) -> Option<&str> {
        self.0.new_value.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timestamp(self.0.created_at_us)
    }

    async fn todo(&self, ctx: &Context<'_>) -> Result<TodoNode> {
        let todo_id = self.0.todo_id;
        run(ctx, move |conn| todo_service::get_todo(conn, todo_id))
            .await
            .map(TodoNode)
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(
    name = "ActivityKind",
    remote = "dodo_core::model::activity::ActivityKind"
)]
pub enum ActivityKindValue {
    Created,
    Title,
    Description,
    Kind,
    Status,
    DueDate,
    Labels,
    Assignees,
}

#[derive(InputObject, Default)]
pub struct ActivityFilterInput {
    pub todo_id: Option<i64>,
    pub author: Option<String>,
    /// Any of these kinds.
    pub kinds: Option<Vec<ActivityKindValue>>,
}

#[derive(Default)]
pub struct ActivityQuery;

#[Object]
impl ActivityQuery {
    /// Audit log entries, newest first unless `direction` is `ASC`.
    async fn activities(
        &self,
        ctx: &Context<'_>,
        filter: Option<ActivityFilterInput>,
        direction: Option<SortDirectionValue>,
        page: Option<PageInput>,
    ) -> Result<Paged<ActivityNode>> {
        let input = filter.unwrap_or_default();
        let filter = ActivityFilter {
            todo_id: input.todo_id,
            author: input.author,
            kinds: input
                .kinds
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        };
        let direction = super::direction(direction, SortDirection::Desc);
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| {
            service::search_activities(conn, &filter, direction, page)
        })
        .await?;
        Ok(Paged::from_page(found, ActivityNode))
    }
}
