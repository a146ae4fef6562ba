mod common;

use std::sync::Arc;

use api::{
    auth::{current_user_from_token, AuthConfig},
    schema::{build_schema, AppSchema},
    seed::{seed_demo, DEMO_EMAIL, DEMO_PASSWORD},
};
use async_graphql::{Request, Variables};
use common::{error_code, TestContext};
use entity::user_identity;
use serde_json::json;

const REGISTER: &str = r#"
    mutation Register($email: String!, $password: String!, $displayName: String) {
        directory {
            register(email: $email, password: $password, displayName: $displayName) {
                ok token error user { email displayName }
            }
        }
    }
"#;

const LOGIN: &str = r#"
    mutation Login($email: String!, $password: String!) {
        directory { login(email: $email, password: $password) { ok token error user { email } } }
    }
"#;

#[tokio::test]
async fn register_then_login_issues_a_session() {
    let env = TestContext::with_employees(vec![]).await;
    let resp = env
        .exec(
            REGISTER,
            json!({ "email": " Ann@X.com ", "password": "hunter22", "displayName": "Ann" }),
        )
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);
    let cookie = resp
        .http_headers
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap();
    assert!(cookie.starts_with("directory_session="));
    assert!(cookie.contains("HttpOnly"));
    let payload = resp.data.into_json().unwrap()["directory"]["register"].clone();
    assert_eq!(payload["ok"], true);
    assert_eq!(payload["user"]["email"], "ann@x.com");
    assert_eq!(payload["user"]["displayName"], "Ann");
    let identity = user_identity::Entity::find_local("ann@x.com")
        .one(env.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.provider, "local");
    assert!(user_identity::Entity::find_local(" Ann@X.com ")
        .one(env.db.as_ref())
        .await
        .unwrap()
        .is_none());

    let resp = env
        .exec(LOGIN, json!({ "email": "ann@x.com", "password": "hunter22" }))
        .await;
    let payload = resp.data.into_json().unwrap()["directory"]["login"].clone();
    assert_eq!(payload["ok"], true);
    let token = payload["token"].as_str().unwrap();
    let user = current_user_from_token(env.db.as_ref(), token, &env.auth)
        .await
        .unwrap();
    assert_eq!(user.email, "ann@x.com");
}

#[tokio::test]
async fn bad_credentials_fail_inside_the_payload() {
    let env = TestContext::with_employees(vec![]).await;
    env.exec(REGISTER, json!({ "email": "ann@x.com", "password": "hunter22" }))
        .await;

    for (email, password) in [("ann@x.com", "wrong-password"), ("nobody@x.com", "hunter22")] {
        let resp = env
            .exec(LOGIN, json!({ "email": email, "password": password }))
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let payload = resp.data.into_json().unwrap()["directory"]["login"].clone();
        assert_eq!(payload["ok"], false);
        assert!(payload["token"].is_null());
        assert_eq!(payload["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn registration_input_problems_are_reported() {
    let env = TestContext::with_employees(vec![]).await;
    env.exec(REGISTER, json!({ "email": "ann@x.com", "password": "hunter22" }))
        .await;

    let cases = [
        (
            json!({ "email": "ann@x.com", "password": "hunter22" }),
            "An account with this email already exists",
        ),
        (
            json!({ "email": "bo@x.com", "password": "short" }),
            "Password must be at least 6 characters",
        ),
        (
            json!({ "email": "not-an-email", "password": "hunter22" }),
            "Invalid email address",
        ),
    ];
    for (vars, message) in cases {
        let resp = env.exec(REGISTER, vars).await;
        let payload = resp.data.into_json().unwrap()["directory"]["register"].clone();
        assert_eq!(payload["ok"], false);
        assert_eq!(payload["error"], message);
    }
}

#[tokio::test]
async fn registration_can_be_switched_off() {
    let env = TestContext::with_employees(vec![]).await;
    let closed = Arc::new(AuthConfig {
        registration_enabled: false,
        ..env.auth.as_ref().clone()
    });
    let AppSchema(schema) = build_schema(env.db.clone(), closed, env.sync.clone());
    let resp = schema
        .execute(Request::new(REGISTER).variables(Variables::from_json(
            json!({ "email": "ann@x.com", "password": "hunter22" }),
        )))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let env = TestContext::with_employees(vec![]).await;
    let resp = env
        .exec("mutation { directory { logout } }", json!({}))
        .await;
    assert_eq!(resp.data.into_json().unwrap()["directory"]["logout"], true);
    let cookie = resp.http_headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn seeding_is_repeatable() {
    let env = TestContext::with_employees(vec![]).await;
    let first = seed_demo(env.db.as_ref(), &env.auth, &env.sync).await.unwrap();
    assert!(first.user.is_some());
    assert_eq!(first.employees.len(), 5);

    let second = seed_demo(env.db.as_ref(), &env.auth, &env.sync).await.unwrap();
    assert!(second.user.is_none());
    assert!(second.employees.is_empty());
    assert_eq!(env.sync.snapshot().len(), 5);

    let resp = env
        .exec(LOGIN, json!({ "email": DEMO_EMAIL, "password": DEMO_PASSWORD }))
        .await;
    assert_eq!(resp.data.into_json().unwrap()["directory"]["login"]["ok"], true);
}
