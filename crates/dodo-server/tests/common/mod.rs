//! Shared harness for GraphQL integration tests.
#![allow(dead_code)]

use async_graphql::{Request, Variables};
use dodo_server::{Actor, DodoSchema, Store, build_schema};
use serde_json::{Value, json};

/// A schema over a fresh in-memory store.
pub fn schema() -> DodoSchema {
    build_schema(Store::open_in_memory().expect("open in-memory store"))
}

/// Execute `query` and return the full response as JSON.
pub async fn execute(schema: &DodoSchema, actor: Option<&str>, query: &str, vars: Value) -> Value {
    let mut request = Request::new(query).variables(Variables::from_json(vars));
    if let Some(actor) = actor {
        request = request.data(Actor(actor.to_string()));
    }
    let response = schema.execute(request).await;
    serde_json::to_value(&response).expect("serialize response")
}

/// Execute as `alice` and return `data`, failing on any error.
pub async fn data(schema: &DodoSchema, query: &str, vars: Value) -> Value {
    data_as(schema, "alice", query, vars).await
}

pub async fn data_as(schema: &DodoSchema, actor: &str, query: &str, vars: Value) -> Value {
    let response = execute(schema, Some(actor), query, vars).await;
    assert!(
        response.get("errors").is_none_or(|errors| errors.as_array().is_some_and(Vec::is_empty)),
        "unexpected errors: {response}"
    );
    response["data"].clone()
}

/// The `extensions.code` of the first error.
pub fn error_code(response: &Value) -> String {
    response["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_else(|| panic!("no error code in {response}"))
        .to_string()
}

pub async fn create_team(schema: &DodoSchema, name: &str, members: &[&str], managers: &[&str]) -> i64 {
    let data = data(
        schema,
        "mutation($input: CreateTeamInput!) { createTeam(input: $input) { id } }",
        json!({ "input": { "name": name, "members": members, "managers": managers } }),
    )
    .await;
    data["createTeam"]["id"].as_i64().expect("team id")
}

pub async fn create_project(schema: &DodoSchema, team_id: i64, name: &str) -> i64 {
    let data = data(
        schema,
        "mutation($input: CreateProjectInput!) { createProject(input: $input) { id } }",
        json!({ "input": { "teamId": team_id, "name": name } }),
    )
    .await;
    data["createProject"]["id"].as_i64().expect("project id")
}

pub async fn create_label(schema: &DodoSchema, name: &str) -> i64 {
    let data = data(
        schema,
        "mutation($input: CreateLabelInput!) { createLabel(input: $input) { id } }",
        json!({ "input": { "name": name, "color": "#AA0000" } }),
    )
    .await;
    data["createLabel"]["id"].as_i64().expect("label id")
}

pub async fn create_todo(schema: &DodoSchema, input: Value) -> i64 {
    let data = data(
        schema,
        "mutation($input: CreateTodoInput!) { createTodo(input: $input) { id } }",
        json!({ "input": input }),
    )
    .await;
    data["createTodo"]["id"].as_i64().expect("todo id")
}

/// Team "core" (alice manager; bob, carol members) with project "api".
/// Returns `(team_id, project_id)`.
pub async fn core_project(schema: &DodoSchema) -> (i64, i64) {
    let team_id = create_team(schema, "core", &["bob", "carol"], &["alice"]).await;
    let project_id = create_project(schema, team_id, "api").await;
    (team_id, project_id)
}
