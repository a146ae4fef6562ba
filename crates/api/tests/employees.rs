mod common;

use async_graphql::Request;
use chrono::Duration;
use common::{employee, error_code, viewer, TestContext};
use directory_core::{today_utc, EmployeeId};
use futures::StreamExt;
use serde_json::{json, Value};

const LIST: &str = r#"
    query List($search: String, $department: String) {
        directory {
            employees(search: $search, department: $department) {
                items { id name department }
                departments
                stats { total departments filtered newThisYear }
            }
        }
    }
"#;

const CREATE: &str = r#"
    mutation Create($input: EmployeeInput!) {
        directory { createEmployee(input: $input) { ok id errors { field code message } } }
    }
"#;

fn input(name: &str, department: &str, start_date: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@x.com", name.split_whitespace().next().unwrap().to_lowercase()),
        "position": "Engineer",
        "department": department,
        "startDate": start_date,
    })
}

fn tomorrow() -> String {
    (today_utc() + Duration::days(1)).format("%Y-%m-%d").to_string()
}

async fn ann_and_bo() -> TestContext {
    TestContext::with_employees(vec![
        employee("emp-1", "Ann Lee", "backend", "2023-01-01"),
        employee("emp-2", "Bo Kim", "frontend", "2022-06-01"),
    ])
    .await
}

#[tokio::test]
async fn employee_data_requires_a_session() {
    let env = ann_and_bo().await;
    let resp = env.exec(LIST, json!({})).await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHENTICATED"));

    let resp = env
        .exec("{ directory { health me { id } } }", json!({}))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["directory"]["health"], "ok");
    assert!(data["directory"]["me"].is_null());
}

#[tokio::test]
async fn search_and_department_filters_narrow_the_listing() {
    let env = ann_and_bo().await;
    let user = viewer();

    let resp = env.exec_as(&user, LIST, json!({ "search": "ann" })).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let list = resp.data.into_json().unwrap()["directory"]["employees"].clone();
    let names: Vec<_> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ann Lee"]);
    assert_eq!(list["departments"], json!(["backend", "frontend"]));
    assert_eq!(list["stats"]["total"], 2);
    assert_eq!(list["stats"]["departments"], 2);
    assert_eq!(list["stats"]["filtered"], 1);

    let resp = env
        .exec_as(&user, LIST, json!({ "department": "frontend" }))
        .await;
    let list = resp.data.into_json().unwrap()["directory"]["employees"].clone();
    assert_eq!(list["items"][0]["name"], "Bo Kim");
    assert_eq!(list["stats"]["filtered"], 1);

    let resp = env.exec_as(&user, LIST, json!({})).await;
    let list = resp.data.into_json().unwrap()["directory"]["employees"].clone();
    assert_eq!(list["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn new_this_year_counts_recent_starts_only() {
    let recent = (today_utc() - Duration::days(30)).format("%Y-%m-%d").to_string();
    let env = TestContext::with_employees(vec![
        employee("emp-1", "Ann Lee", "backend", &recent),
        employee("emp-2", "Bo Kim", "frontend", "2019-01-01"),
        employee("emp-3", "Cy Ng", "", "not-a-date"),
    ])
    .await;
    let resp = env.exec_as(&viewer(), LIST, json!({})).await;
    let stats = resp.data.into_json().unwrap()["directory"]["employees"]["stats"].clone();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["departments"], 2);
    assert_eq!(stats["newThisYear"], 1);
}

#[tokio::test]
async fn valid_records_are_created_and_invalid_ones_rejected() {
    let env = TestContext::with_employees(vec![]).await;
    let user = viewer();

    let resp = env
        .exec_as(&user, CREATE, json!({ "input": input("Ann Lee", "backend", "2023-01-01") }))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let payload = resp.data.into_json().unwrap()["directory"]["createEmployee"].clone();
    assert_eq!(payload["ok"], true);
    let id = payload["id"].as_str().unwrap().to_string();
    assert!(env.sync.snapshot().contains(&EmployeeId::new(id)));

    let resp = env
        .exec_as(&user, CREATE, json!({ "input": input("Bo Kim", "frontend", &tomorrow()) }))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let payload = resp.data.into_json().unwrap()["directory"]["createEmployee"].clone();
    assert_eq!(payload["ok"], false);
    assert!(payload["id"].is_null());
    assert_eq!(
        payload["errors"],
        json!([{
            "field": "startDate",
            "code": "FUTURE_DATE",
            "message": "Start date cannot be in the future"
        }])
    );
    assert_eq!(env.sync.snapshot().len(), 1);
}

#[tokio::test]
async fn update_replaces_the_record_in_place() {
    let env = ann_and_bo().await;
    let user = viewer();
    let update = r#"
        mutation Update($id: ID!, $input: EmployeeInput!) {
            directory { updateEmployee(id: $id, input: $input) { ok id errors { field } } }
        }
    "#;
    let resp = env
        .exec_as(
            &user,
            update,
            json!({ "id": "emp-1", "input": input("Ann Park", "aiml", "2023-01-01") }),
        )
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let payload = resp.data.into_json().unwrap()["directory"]["updateEmployee"].clone();
    assert_eq!(payload["ok"], true);
    assert_eq!(payload["id"], "emp-1");

    let fetched = env
        .exec_as(
            &user,
            r#"query One($id: ID!) { directory { employee(id: $id) { name department } } }"#,
            json!({ "id": "emp-1" }),
        )
        .await
        .data
        .into_json()
        .unwrap();
    assert_eq!(fetched["directory"]["employee"]["name"], "Ann Park");
    assert_eq!(fetched["directory"]["employee"]["department"], "aiml");

    let missing = env
        .exec_as(
            &user,
            r#"query One($id: ID!) { directory { employee(id: $id) { name } } }"#,
            json!({ "id": "ghost" }),
        )
        .await;
    assert!(missing.errors.is_empty(), "{:?}", missing.errors);
    assert!(missing.data.into_json().unwrap()["directory"]["employee"].is_null());

    let resp = env
        .exec_as(
            &user,
            update,
            json!({ "id": "ghost", "input": input("Ann Park", "aiml", "2023-01-01") }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("REMOTE_OPERATION"));
}

#[tokio::test]
async fn deleting_an_unknown_id_is_a_remote_error_and_changes_nothing() {
    let env = ann_and_bo().await;
    let user = viewer();
    let before = env.sync.snapshot();
    let delete = r#"mutation Delete($id: ID!) { directory { deleteEmployee(id: $id) } }"#;

    let resp = env.exec_as(&user, delete, json!({ "id": "ghost" })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("REMOTE_OPERATION"));
    let after = env.sync.snapshot();
    assert_eq!(after.version(), before.version());
    assert_eq!(after.len(), 2);

    let resp = env.exec_as(&user, delete, json!({ "id": "emp-2" })).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    assert_eq!(
        resp.data.into_json().unwrap()["directory"]["deleteEmployee"],
        true
    );
    assert!(!env.sync.snapshot().contains(&EmployeeId::from("emp-2")));
}

#[tokio::test]
async fn validation_queries_report_field_issues() {
    let env = TestContext::with_employees(vec![]).await;
    let user = viewer();

    let resp = env
        .exec_as(
            &user,
            r#"query F($value: String!) {
                directory { validateField(field: START_DATE, value: $value) { field code } }
            }"#,
            json!({ "value": tomorrow() }),
        )
        .await;
    let issue = resp.data.into_json().unwrap()["directory"]["validateField"].clone();
    assert_eq!(issue, json!({ "field": "startDate", "code": "FUTURE_DATE" }));

    let resp = env
        .exec_as(
            &user,
            r#"{ directory { validateField(field: NAME, value: "Ann Lee") { code } } }"#,
            json!({}),
        )
        .await;
    assert!(resp.data.into_json().unwrap()["directory"]["validateField"].is_null());

    let resp = env
        .exec_as(
            &user,
            r#"query V($input: EmployeeInput!) {
                directory { validateEmployee(input: $input) { field code } }
            }"#,
            json!({ "input": input("A", "sales", "2023-02-30") }),
        )
        .await;
    let issues = resp.data.into_json().unwrap()["directory"]["validateEmployee"].clone();
    assert_eq!(
        issues,
        json!([
            { "field": "name", "code": "TOO_SHORT" },
            { "field": "department", "code": "INVALID_CHOICE" },
            { "field": "startDate", "code": "INVALID_FORMAT" },
        ])
    );
}

#[tokio::test]
async fn department_choices_list_the_enumeration() {
    let env = TestContext::with_employees(vec![]).await;
    let resp = env
        .exec_as(&viewer(), "{ directory { departmentChoices departments } }", json!({}))
        .await;
    let data = resp.data.into_json().unwrap();
    assert_eq!(
        data["directory"]["departmentChoices"],
        json!(["frontend", "backend", "aiml"])
    );
    assert_eq!(data["directory"]["departments"], json!([]));
}

#[tokio::test]
async fn subscription_streams_each_published_snapshot() {
    let env = ann_and_bo().await;
    let user = viewer();
    let mut stream = env.schema.execute_stream(
        Request::new(
            r#"subscription { employees(search: "kim") { items { name } stats { total filtered } } }"#,
        )
        .data(user.clone()),
    );

    let first = stream.next().await.unwrap().data.into_json().unwrap();
    assert_eq!(first["employees"]["stats"], json!({ "total": 2, "filtered": 1 }));

    let resp = env
        .exec_as(&user, CREATE, json!({ "input": input("Di Kim", "aiml", "2021-01-01") }))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);

    let next = stream.next().await.unwrap().data.into_json().unwrap();
    assert_eq!(next["employees"]["stats"], json!({ "total": 3, "filtered": 2 }));
}

#[tokio::test]
async fn subscription_requires_a_session() {
    let env = ann_and_bo().await;
    let mut stream = env
        .schema
        .execute_stream(Request::new("subscription { employees { stats { total } } }"));
    let resp = stream.next().await.unwrap();
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn sqlite_store_round_trips_through_the_schema() {
    let env = TestContext::on_sqlite().await;
    let user = viewer();

    let resp = env
        .exec_as(&user, CREATE, json!({ "input": input("Ann Lee", "backend", "2023-01-01") }))
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let id = resp.data.into_json().unwrap()["directory"]["createEmployee"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let stored = env.sync.snapshot().get(&EmployeeId::new(id.clone())).unwrap();
    assert_eq!(stored.body.start_date, "2023-01-01");
    assert!(stored.body.submitted_at.is_some());

    let delete = r#"mutation Delete($id: ID!) { directory { deleteEmployee(id: $id) } }"#;
    let resp = env.exec_as(&user, delete, json!({ "id": id })).await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    assert!(env.sync.snapshot().is_empty());

    let resp = env.exec_as(&user, delete, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("REMOTE_OPERATION"));
}
