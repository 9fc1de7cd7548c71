//! GraphQL schema: one query and one mutation object per domain module,
//! merged into the roots.
//!
//! Resolvers stay thin. They translate inputs into core types, run the
//! matching service through [`Store::call`], and wrap the result in an
//! object type whose relation fields resolve lazily.

mod activity;
mod label;
mod project;
mod reference;
mod team;
mod todo;

use async_graphql::{
    Context, EmptySubscription, Enum, ErrorExtensions, InputObject, MaybeUndefined, MergedObject,
    OutputType, Schema, SimpleObject,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::store::Store;
use dodo_core::model::page::{Page, PageOf, SortDirection};

pub use activity::ActivityNode;
pub use label::LabelNode;
pub use project::ProjectNode;
pub use reference::ReferenceNode;
pub use team::TeamNode;
pub use todo::TodoNode;

pub type DodoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    team::TeamQuery,
    project::ProjectQuery,
    label::LabelQuery,
    todo::TodoQuery,
    reference::ReferenceQuery,
    activity::ActivityQuery,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    team::TeamMutation,
    project::ProjectMutation,
    label::LabelMutation,
    todo::TodoMutation,
    reference::ReferenceMutation,
);

/// Identity of the user performing a request, attached as request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

/// Build the executable schema over `store`.
#[must_use]
pub fn build_schema(store: Store) -> DodoSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(store)
    .finish()
}

/// Schema definition language for `dodo schema`.
#[must_use]
pub fn schema_sdl() -> String {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .finish()
    .sdl()
}

/// Map a core error to a GraphQL error carrying `extensions.code`.
pub(crate) fn gql_error(err: &dodo_core::Error) -> async_graphql::Error {
    let code = err.code();
    if matches!(err, dodo_core::Error::Storage(_)) {
        tracing::error!(code = code.code(), error = %format!("{err:#}"), "storage failure");
    }
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| {
        ext.set("code", code.code());
        if let Some(hint) = code.hint() {
            ext.set("hint", hint);
        }
    })
}

/// Run a service call against the request's store.
pub(crate) async fn run<T, F>(ctx: &Context<'_>, f: F) -> async_graphql::Result<T>
where
    F: FnOnce(&mut Connection) -> dodo_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = ctx.data::<Store>()?;
    store.call(f).await.map_err(|err| gql_error(&err))
}

/// The request actor, or an `ActorRequired` error.
pub(crate) fn actor(ctx: &Context<'_>) -> async_graphql::Result<String> {
    ctx.data_opt::<Actor>()
        .map(|actor| actor.0.clone())
        .ok_or_else(|| gql_error(&dodo_core::Error::MissingActor))
}

pub(crate) fn timestamp(us: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(us).unwrap_or_default()
}

/// `undefined` keeps a field, `null` clears it.
pub(crate) fn nullable<T>(value: MaybeUndefined<T>) -> Option<Option<T>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(value) => Some(Some(value)),
    }
}

#[derive(InputObject, Default, Debug, Clone, Copy)]
pub struct PageInput {
    /// Rows to skip. Defaults to 0.
    pub offset: Option<u32>,
    /// Page size. Defaults to 20, clamped to 1..=100.
    pub limit: Option<u32>,
}

impl PageInput {
    pub(crate) fn resolve(page: Option<Self>) -> Page {
        let page = page.unwrap_or_default();
        Page::new(page.offset, page.limit)
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "SortDirection", remote = "dodo_core::model::page::SortDirection")]
pub enum SortDirectionValue {
    Asc,
    Desc,
}

pub(crate) fn direction(value: Option<SortDirectionValue>, default: SortDirection) -> SortDirection {
    value.map_or(default, Into::into)
}

/// One page of search results.
#[derive(SimpleObject)]
#[graphql(concrete(name = "TeamPage", params(TeamNode)))]
#[graphql(concrete(name = "ProjectPage", params(ProjectNode)))]
#[graphql(concrete(name = "LabelPage", params(LabelNode)))]
#[graphql(concrete(name = "TodoPage", params(TodoNode)))]
#[graphql(concrete(name = "ActivityPage", params(ActivityNode)))]
pub struct Paged<T: OutputType> {
    pub items: Vec<T>,
    /// Matches across all pages.
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T: OutputType> Paged<T> {
    pub(crate) fn from_page<U>(page: PageOf<U>, wrap: impl Fn(U) -> T) -> Self {
        let has_more = page.has_more();
        Self {
            items: page.items.into_iter().map(wrap).collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            has_more,
        }
    }
}
