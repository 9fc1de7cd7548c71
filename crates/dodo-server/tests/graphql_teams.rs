//! Team and project operations through the GraphQL schema.
//!
//! Covers:
//! - create/get/update of teams with member and manager sets
//! - duplicate names and membership rules
//! - team deletion guarded by owned projects
//! - project relations in both directions

mod common;

use common::{core_project, create_team, data, error_code, execute, schema};
use serde_json::json;

#[tokio::test]
async fn create_team_normalizes_members_and_managers() {
    let schema = schema();
    let team_id = create_team(&schema, "core", &["carol", "bob", "bob"], &["alice"]).await;

    let data = data(
        &schema,
        "query($id: Int!) { team(id: $id) { name members managers } }",
        json!({ "id": team_id }),
    )
    .await;

    assert_eq!(data["team"]["name"], "core");
    assert_eq!(data["team"]["members"], json!(["alice", "bob", "carol"]));
    assert_eq!(data["team"]["managers"], json!(["alice"]));
}

#[tokio::test]
async fn duplicate_team_name_is_rejected() {
    let schema = schema();
    create_team(&schema, "core", &[], &[]).await;

    let response = execute(
        &schema,
        None,
        r#"mutation { createTeam(input: { name: "core" }) { id } }"#,
        json!({}),
    )
    .await;

    assert_eq!(error_code(&response), "E3001");
}

#[tokio::test]
async fn missing_team_reports_not_found() {
    let schema = schema();
    let response = execute(&schema, None, "{ team(id: 999) { id } }", json!({})).await;
    assert_eq!(error_code(&response), "E2001");
}

#[tokio::test]
async fn managers_must_be_members() {
    let schema = schema();
    let team_id = create_team(&schema, "core", &["bob"], &[]).await;

    let response = execute(
        &schema,
        None,
        "mutation($id: Int!) { addTeamManagers(id: $id, managers: [\"mallory\"]) { id } }",
        json!({ "id": team_id }),
    )
    .await;
    assert_eq!(error_code(&response), "E4002");

    let data = data(
        &schema,
        "mutation($id: Int!) { addTeamManagers(id: $id, managers: [\"bob\"]) { managers } }",
        json!({ "id": team_id }),
    )
    .await;
    assert_eq!(data["addTeamManagers"]["managers"], json!(["bob"]));
}

#[tokio::test]
async fn removing_a_member_drops_manager_role() {
    let schema = schema();
    let team_id = create_team(&schema, "core", &["bob"], &["alice"]).await;

    let data = data(
        &schema,
        "mutation($id: Int!) { removeTeamMembers(id: $id, members: [\"alice\"]) { members managers } }",
        json!({ "id": team_id }),
    )
    .await;

    assert_eq!(data["removeTeamMembers"]["members"], json!(["bob"]));
    assert_eq!(data["removeTeamMembers"]["managers"], json!([]));
}

#[tokio::test]
async fn update_team_clears_description_with_null() {
    let schema = schema();
    let created = data(
        &schema,
        r#"mutation { createTeam(input: { name: "core", description: "platform" }) { id } }"#,
        json!({}),
    )
    .await;
    let team_id = created["createTeam"]["id"].as_i64().expect("team id");

    let renamed = data(
        &schema,
        r#"mutation($id: Int!) { updateTeam(id: $id, input: { name: "platform" }) { name description } }"#,
        json!({ "id": team_id }),
    )
    .await;
    assert_eq!(renamed["updateTeam"]["name"], "platform");
    assert_eq!(renamed["updateTeam"]["description"], "platform");

    let cleared = data(
        &schema,
        "mutation($id: Int!) { updateTeam(id: $id, input: { description: null }) { description } }",
        json!({ "id": team_id }),
    )
    .await;
    assert!(cleared["updateTeam"]["description"].is_null());
}

#[tokio::test]
async fn team_with_projects_cannot_be_deleted() {
    let schema = schema();
    let (team_id, project_id) = core_project(&schema).await;

    let response = execute(
        &schema,
        None,
        "mutation($id: Int!) { deleteTeam(id: $id) }",
        json!({ "id": team_id }),
    )
    .await;
    assert_eq!(error_code(&response), "E4003");

    data(
        &schema,
        "mutation($id: Int!) { deleteProject(id: $id) }",
        json!({ "id": project_id }),
    )
    .await;
    let deleted = data(
        &schema,
        "mutation($id: Int!) { deleteTeam(id: $id) }",
        json!({ "id": team_id }),
    )
    .await;
    assert_eq!(deleted["deleteTeam"], true);
}

#[tokio::test]
async fn team_and_project_resolve_each_other() {
    let schema = schema();
    let (team_id, project_id) = core_project(&schema).await;

    let data = data(
        &schema,
        r"query($team: Int!, $project: Int!) {
            team(id: $team) { projects { total items { name } } }
            project(id: $project) { team { name } }
        }",
        json!({ "team": team_id, "project": project_id }),
    )
    .await;

    assert_eq!(data["team"]["projects"]["total"], 1);
    assert_eq!(data["team"]["projects"]["items"][0]["name"], "api");
    assert_eq!(data["project"]["team"]["name"], "core");
}

#[tokio::test]
async fn project_names_are_unique_per_team() {
    let schema = schema();
    let (team_id, _) = core_project(&schema).await;
    let other_team = create_team(&schema, "web", &[], &[]).await;

    let response = execute(
        &schema,
        None,
        r#"mutation($team: Int!) { createProject(input: { teamId: $team, name: "api" }) { id } }"#,
        json!({ "team": team_id }),
    )
    .await;
    assert_eq!(error_code(&response), "E3001");

    let data = data(
        &schema,
        r#"mutation($team: Int!) { createProject(input: { teamId: $team, name: "api" }) { teamId } }"#,
        json!({ "team": other_team }),
    )
    .await;
    assert_eq!(data["createProject"]["teamId"], other_team);
}

#[tokio::test]
async fn teams_filter_by_member_set() {
    let schema = schema();
    create_team(&schema, "core", &["bob", "carol"], &[]).await;
    create_team(&schema, "web", &["bob"], &[]).await;

    let data = data(
        &schema,
        r#"{ teams(filter: { members: ["bob", "carol"] }) { total items { name } } }"#,
        json!({}),
    )
    .await;

    assert_eq!(data["teams"]["total"], 1);
    assert_eq!(data["teams"]["items"][0]["name"], "core");
}
