//! HTTP surface: GraphQL endpoint, GraphiQL page and a health probe.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};

use crate::graphql::{Actor, DodoSchema};

/// Request header naming the acting user.
pub const ACTOR_HEADER: &str = "x-dodo-actor";

#[derive(Clone)]
pub struct AppState {
    schema: DodoSchema,
    graphiql: bool,
    default_actor: Option<String>,
}

impl AppState {
    #[must_use]
    pub const fn new(schema: DodoSchema, graphiql: bool, default_actor: Option<String>) -> Self {
        Self {
            schema,
            graphiql,
            default_actor,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql))
        .route("/health", get(health))
        .with_state(state)
}

/// Header value if present and non-blank, else the configured default.
fn request_actor(headers: &HeaderMap, default_actor: Option<&str>) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or(default_actor)
        .map(String::from)
}

async fn graphql(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    let actor = request_actor(&headers, state.default_actor.as_deref());
    tracing::debug!(
        operation = request.operation_name.as_deref().unwrap_or("-"),
        actor = actor.as_deref().unwrap_or("-"),
        "graphql request"
    );
    if let Some(actor) = actor {
        request = request.data(Actor(actor));
    }
    state.schema.execute(request).await.into()
}

async fn graphiql(State(state): State<AppState>) -> Response {
    if !state.graphiql {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({ "status": "ok" }))
}
