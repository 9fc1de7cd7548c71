//! Filtering, sorting and pagination of list queries.
//!
//! Covers:
//! - label and assignee filters requiring every listed value
//! - case-insensitive title search with literal wildcards
//! - due-date windows and sort order
//! - page totals and `hasMore`
//! - activity search by author and kind

mod common;

use common::{core_project, create_label, create_todo, data, data_as, schema};
use serde_json::{Value, json};

const TODOS: &str = r"query($filter: TodoFilterInput, $sort: TodoSortInput, $page: PageInput) {
    todos(filter: $filter, sort: $sort, page: $page) {
        total offset limit hasMore
        items { title }
    }
}";

fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["title"].as_str().expect("title").to_string())
        .collect()
}

#[tokio::test]
async fn label_filter_requires_every_label() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    let bug = create_label(&schema, "bug").await;
    let ui = create_label(&schema, "ui").await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "both", "labels": [bug, ui] })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "bug only", "labels": [bug] })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "none" })).await;

    let both = data(&schema, TODOS, json!({ "filter": { "labels": [ui, bug] } })).await;
    assert_eq!(titles(&both["todos"]), vec!["both"]);

    let any_bug = data(
        &schema,
        TODOS,
        json!({ "filter": { "labels": [bug] }, "sort": { "field": "TITLE", "direction": "ASC" } }),
    )
    .await;
    assert_eq!(titles(&any_bug["todos"]), vec!["both", "bug only"]);
}

#[tokio::test]
async fn assignee_filter_requires_every_assignee() {
    let schema = schema();
    let (team_id, project_id) = core_project(&schema).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "pair", "assignees": ["bob", "carol"] })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "solo", "assignees": ["bob"] })).await;

    let pair = data(
        &schema,
        TODOS,
        json!({ "filter": { "teamId": team_id, "assignees": ["carol", "bob"] } }),
    )
    .await;
    assert_eq!(titles(&pair["todos"]), vec!["pair"]);
}

#[tokio::test]
async fn title_search_is_case_insensitive_and_literal() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "Reach 100% coverage" })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "Coverage report" })).await;

    let all = data(&schema, TODOS, json!({ "filter": { "titleLike": "COVERAGE" } })).await;
    assert_eq!(all["todos"]["total"], 2);

    let percent = data(&schema, TODOS, json!({ "filter": { "titleLike": "0% c" } })).await;
    assert_eq!(titles(&percent["todos"]), vec!["Reach 100% coverage"]);
}

#[tokio::test]
async fn due_date_window_and_sort_put_undated_last() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "late", "dueDate": "2026-12-20" })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "undated" })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "early", "dueDate": "2026-11-02" })).await;

    let sorted = data(
        &schema,
        TODOS,
        json!({ "sort": { "field": "DUE_DATE", "direction": "ASC" } }),
    )
    .await;
    assert_eq!(titles(&sorted["todos"]), vec!["early", "late", "undated"]);

    let window = data(
        &schema,
        TODOS,
        json!({ "filter": { "dueAfter": "2026-11-01", "dueBefore": "2026-11-30" } }),
    )
    .await;
    assert_eq!(titles(&window["todos"]), vec!["early"]);
}

#[tokio::test]
async fn status_filter_matches_any_listed_status() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "open", "status": "IN_PROGRESS" })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "closed", "status": "DONE" })).await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "parked", "status": "BACKLOG" })).await;

    let found = data(
        &schema,
        TODOS,
        json!({
            "filter": { "statuses": ["DONE", "IN_PROGRESS"] },
            "sort": { "field": "TITLE", "direction": "ASC" },
        }),
    )
    .await;
    assert_eq!(titles(&found["todos"]), vec!["closed", "open"]);
}

#[tokio::test]
async fn pages_report_totals_and_has_more() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    for n in 1..=5 {
        create_todo(&schema, json!({ "projectId": project_id, "title": format!("task {n}") })).await;
    }

    let first = data(
        &schema,
        TODOS,
        json!({
            "sort": { "field": "TITLE", "direction": "ASC" },
            "page": { "offset": 0, "limit": 2 },
        }),
    )
    .await;
    assert_eq!(first["todos"]["total"], 5);
    assert_eq!(first["todos"]["hasMore"], true);
    assert_eq!(titles(&first["todos"]), vec!["task 1", "task 2"]);

    let last = data(
        &schema,
        TODOS,
        json!({
            "sort": { "field": "TITLE", "direction": "ASC" },
            "page": { "offset": 4, "limit": 2 },
        }),
    )
    .await;
    assert_eq!(last["todos"]["offset"], 4);
    assert_eq!(last["todos"]["hasMore"], false);
    assert_eq!(titles(&last["todos"]), vec!["task 5"]);
}

#[tokio::test]
async fn project_todos_are_scoped_to_the_project() {
    let schema = schema();
    let (team_id, project_id) = core_project(&schema).await;
    let other = common::create_project(&schema, team_id, "web").await;
    create_todo(&schema, json!({ "projectId": project_id, "title": "api work" })).await;
    create_todo(&schema, json!({ "projectId": other, "title": "web work" })).await;

    let data = data(
        &schema,
        "query($id: Int!) { project(id: $id) { todos { total items { title } } } }",
        json!({ "id": other }),
    )
    .await;
    assert_eq!(titles(&data["project"]["todos"]), vec!["web work"]);
}

#[tokio::test]
async fn activities_filter_by_author_and_kind() {
    let schema = schema();
    let (_, project_id) = core_project(&schema).await;
    let id = create_todo(&schema, json!({ "projectId": project_id, "title": "audit" })).await;
    data_as(
        &schema,
        "bob",
        r#"mutation($id: Int!) { updateTodo(id: $id, input: { status: DONE, title: "audited" }) { id } }"#,
        json!({ "id": id }),
    )
    .await;

    let by_bob = data(
        &schema,
        r#"{ activities(filter: { author: "bob" }, direction: ASC) { total items { kind } } }"#,
        json!({}),
    )
    .await;
    assert_eq!(by_bob["activities"]["total"], 2);
    assert_eq!(
        by_bob["activities"]["items"],
        json!([{ "kind": "TITLE" }, { "kind": "STATUS" }])
    );

    let created = data(
        &schema,
        r"{ activities(filter: { kinds: [CREATED] }) { items { author todo { title } } } }",
        json!({}),
    )
    .await;
    assert_eq!(
        created["activities"]["items"],
        json!([{ "author": "alice", "todo": { "title": "audited" } }])
    );
}

#[tokio::test]
async fn labels_search_by_name() {
    let schema = schema();
    create_label(&schema, "bug").await;
    create_label(&schema, "debt").await;
    create_label(&schema, "ui").await;

    let found = data(
        &schema,
        r#"{ labels(filter: { nameLike: "b" }) { total items { name color } } }"#,
        json!({}),
    )
    .await;
    assert_eq!(found["labels"]["total"], 2);
    assert_eq!(
        found["labels"]["items"],
        json!([{ "name": "bug", "color": "#aa0000" }, { "name": "debt", "color": "#aa0000" }])
    );
}
