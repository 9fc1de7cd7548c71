use async_graphql::{Context, InputObject, MaybeUndefined, Object, Result};
use chrono::{DateTime, Utc};

use super::{nullable, run, timestamp};
use dodo_core::model::reference::{NewReference, Reference, ReferencePatch};
use dodo_core::service::reference as service;

pub struct ReferenceNode(pub Reference);

#[Object(name = "Reference")]
impl ReferenceNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn todo_id(&self) -> i64 {
        self.0.todo_id
    }

    async fn url(&self) -> &str {
        &self.0.url
    }

    async fn title(&self) -> Option<&str> {
        self.0.title.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        timestamp(self.0.created_at_us)
    }
}

#[derive(InputObject)]
pub struct AddReferenceInput {
    pub todo_id: i64,
    /// `http://` or `https://` URL, unique per to-do.
    pub url: String,
    pub title: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateReferenceInput {
    pub url: Option<String>,
    /// `null` clears the title.
    pub title: MaybeUndefined<String>,
}

#[derive(Default)]
pub struct ReferenceQuery;

#[Object]
impl ReferenceQuery {
    /// References of a to-do, oldest first.
    async fn references(&self, ctx: &Context<'_>, todo_id: i64) -> Result<Vec<ReferenceNode>> {
        let references = run(ctx, move |conn| service::list_references(conn, todo_id)).await?;
        Ok(references.into_iter().map(ReferenceNode).collect())
    }
}

#[derive(Default)]
pub struct ReferenceMutation;

#[Object]
impl ReferenceMutation {
    async fn add_reference(
        &self,
        ctx: &Context<'_>,
        input: AddReferenceInput,
    ) -> Result<ReferenceNode> {
        let new = NewReference {
            todo_id: input.todo_id,
            url: input.url,
            title: input.title,
        };
        run(ctx, move |conn| service::add_reference(conn, &new))
            .await
            .map(ReferenceNode)
    }

    async fn update_reference(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateReferenceInput,
    ) -> Result<ReferenceNode> {
        let patch = ReferencePatch {
            url: input.url,
            title: nullable(input.title),
        };
        run(ctx, move |conn| service::update_reference(conn, id, &patch))
            .await
            .map(ReferenceNode)
    }

    async fn remove_reference(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        run(ctx, move |conn| service::remove_reference(conn, id)).await?;
        Ok(true)
    }
}
