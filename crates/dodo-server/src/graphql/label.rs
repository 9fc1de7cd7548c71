use async_graphql::{Context, InputObject, MaybeUndefined, Object, Result};
use chrono::{DateTime, Utc};

use super::{PageInput, Paged, SortDirectionValue, nullable, run, timestamp};
use dodo_core::model::label::{Label, LabelPatch, NewLabel};
use dodo_core::model::page::SortDirection;
use dodo_core::repo::label::LabelFilter;
use dodo_core::service::label as service;

pub struct LabelNode(pub Label);

#[Object(name = "Label")]
impl LabelNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    /// `#rrggbb`, lowercase.
    async fn color(&self) -> &str {
        &self.0.color
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
}

#[derive(InputObject, Default)]
pub struct LabelFilterInput {
    /// Case-insensitive substring of the name.
    pub name_like: Option<String>,
}

#[derive(InputObject)]
pub struct CreateLabelInput {
    pub name: String,
    /// `#rrggbb` in any case.
    pub color: String,
    pub description: Option<String>,
}

#[derive(InputObject)]
pub struct UpdateLabelInput {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `null` clears the description.
    pub description: MaybeUndefined<String>,
}

#[derive(Default)]
pub struct LabelQuery;

#[Object]
impl LabelQuery {
    async fn label(&self, ctx: &Context<'_>, id: i64) -> Result<LabelNode> {
        run(ctx, move |conn| service::get_label(conn, id))
            .await
            .map(LabelNode)
    }

    /// Labels sorted by name.
    async fn labels(
        &self,
        ctx: &Context<'_>,
        filter: Option<LabelFilterInput>,
        direction: Option<SortDirectionValue>,
        page: Option<PageInput>,
    ) -> Result<Paged<LabelNode>> {
        let filter = LabelFilter {
            name_like: filter.unwrap_or_default().name_like,
        };
        let direction = super::direction(direction, SortDirection::Asc);
        let page = PageInput::resolve(page);
        let found = run(ctx, move |conn| {
            service::search_labels(conn, &filter, direction, page)
        })
        .await?;
        Ok(Paged::from_page(found, LabelNode))
    }
}

#[derive(Default)]
pub struct LabelMutation;

#[Object]
impl LabelMutation {
    async fn create_label(&self, ctx: &Context<'_>, input: CreateLabelInput) -> Result<LabelNode> {
        let new = NewLabel {
            name: input.name,
            color: input.color,
            description: input.description,
        };
        run(ctx, move |conn| service::create_label(conn, &new))
            .await
            .map(LabelNode)
    }

    async fn update_label(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdateLabelInput,
    ) -> Result<LabelNode> {
        let patch = LabelPatch {
            name: input.name,
            color: input.color,
            description: nullable(input.description),
        };
        run(ctx, move |conn| service::update_label(conn, id, &patch))
            .await
            .map(LabelNode)
    }

    /// Detaches the label from every to-do without logging activities.
    async fn delete_label(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        run(ctx, move |conn| service::delete_label(conn, id)).await?;
        Ok(true)
    }
}
