//! End-to-end tests through the dispatch table.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::{Value, json};
use tempfile::TempDir;

use uptime_core::Config;

use super::{Request, Response, Router};

const PHONE: &str = "5551234567";

async fn setup() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = dir.path().join("data");
    config.auth.hashing_secret = "router-test-secret".into();
    let router = Router::from_config(&config).await.unwrap();
    (dir, router)
}

async fn send(router: &Router, req: Request) -> Response {
    router.dispatch(&req).await
}

/// Register the standard user and return a token id.
async fn sign_up(router: &Router) -> String {
    let resp = send(
        router,
        Request::new("post", "api/users").with_body(json!({
            "firstName": "Alice",
            "lastName": "Liddell",
            "phone": PHONE,
            "password": "password123",
            "tosAgreement": true
        })),
    )
    .await;
    assert_eq!(resp.status_code, 200, "{}", resp.payload);
    assert!(resp.payload.get("hashedPassword").is_none());

    let resp = send(
        router,
        Request::new("post", "api/tokens")
            .with_body(json!({ "phone": PHONE, "password": "password123" })),
    )
    .await;
    assert_eq!(resp.status_code, 200, "{}", resp.payload);
    resp.payload["id"].as_str().unwrap().to_string()
}

fn new_check() -> Value {
    json!({
        "protocol": "https",
        "url": "example.com",
        "method": "get",
        "successCodes": [200, 201],
        "timeoutSeconds": 3
    })
}

async fn create_check(router: &Router, token: &str) -> String {
    let resp = send(
        router,
        Request::new("post", "api/checks")
            .with_token(Some(token))
            .with_body(new_check()),
    )
    .await;
    assert_eq!(resp.status_code, 200, "{}", resp.payload);
    resp.payload["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn ping_answers_any_verb() {
    let (_dir, router) = setup().await;
    for verb in ["get", "post", "PUT", "delete"] {
        let resp = send(&router, Request::new(verb, "/ping/")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.payload, json!({}));
    }
}

#[tokio::test]
async fn unknown_paths_and_verbs() {
    let (_dir, router) = setup().await;

    let resp = send(&router, Request::new("get", "api/nothing")).await;
    assert_eq!(resp.status_code, 404);
    assert!(resp.payload["Error"].is_string());

    let resp = send(&router, Request::new("patch", "api/users")).await;
    assert_eq!(resp.status_code, 405);

    let resp = send(&router, Request::new("get", "api/checks/link")).await;
    assert_eq!(resp.status_code, 405);
}

#[tokio::test]
async fn user_lifecycle() {
    let (_dir, router) = setup().await;
    let token = sign_up(&router).await;

    let resp = send(
        &router,
        Request::new("get", "api/users")
            .with_token(Some(&format!("Bearer {token}")))
            .with_query("phone", PHONE),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.payload["firstName"], "Alice");

    let resp = send(
        &router,
        Request::new("put", "api/users")
            .with_token(Some(&token))
            .with_body(json!({ "phone": PHONE, "lastName": "Pleasance" })),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.payload["lastName"], "Pleasance");

    let resp = send(
        &router,
        Request::new("get", "api/users").with_query("phone", PHONE),
    )
    .await;
    assert_eq!(resp.status_code, 403);

    let resp = send(
        &router,
        Request::new("post", "api/users").with_body(json!({
            "firstName": "Alice",
            "lastName": "Again",
            "phone": PHONE,
            "password": "pw",
            "tosAgreement": true
        })),
    )
    .await;
    assert_eq!(resp.status_code, 409);
}

#[tokio::test]
async fn token_lifecycle() {
    let (_dir, router) = setup().await;
    let token = sign_up(&router).await;

    let resp = send(&router, Request::new("get", "api/tokens").with_query("id", &token)).await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.payload["phone"], PHONE);
    let expires = resp.payload["expires"].as_i64().unwrap();

    let resp = send(
        &router,
        Request::new("put", "api/tokens").with_body(json!({ "id": token, "extend": false })),
    )
    .await;
    assert_eq!(resp.status_code, 400);

    let resp = send(
        &router,
        Request::new("put", "api/tokens").with_body(json!({ "id": token, "extend": true })),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.payload["expires"].as_i64().unwrap() >= expires);

    let resp = send(&router, Request::new("delete", "api/tokens").with_query("id", &token)).await;
    assert_eq!(resp.status_code, 200);

    let resp = send(&router, Request::new("delete", "api/tokens").with_query("id", &token)).await;
    assert_eq!(resp.status_code, 404);

    let resp = send(
        &router,
        Request::new("post", "api/tokens").with_body(json!({ "phone": PHONE, "password": "nope" })),
    )
    .await;
    assert_eq!(resp.status_code, 400);
}

#[tokio::test]
async fn check_lifecycle() {
    let (_dir, router) = setup().await;
    let token = sign_up(&router).await;
    let id = create_check(&router, &token).await;

    let resp = send(
        &router,
        Request::new("get", "api/checks")
            .with_token(Some(&token))
            .with_query("id", &id),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.payload["userPhone"], PHONE);
    assert_eq!(resp.payload["successCodes"], json!([200, 201]));

    let resp = send(
        &router,
        Request::new("put", "api/checks")
            .with_token(Some(&token))
            .with_body(json!({ "id": id, "method": "post", "successCodes": [204] })),
    )
    .await;
    assert_eq!(resp.status_code, 200, "{}", resp.payload);
    assert_eq!(resp.payload["method"], "post");
    assert_eq!(resp.payload["successCodes"], json!([204]));
    assert_eq!(resp.payload["url"], "example.com");

    let resp = send(
        &router,
        Request::new("delete", "api/checks")
            .with_token(Some(&token))
            .with_query("id", &id),
    )
    .await;
    assert_eq!(resp.status_code, 200);

    let resp = send(
        &router,
        Request::new("get", "api/users")
            .with_token(Some(&token))
            .with_query("phone", PHONE),
    )
    .await;
    assert_eq!(resp.payload["checks"], json!([]));
}

#[tokio::test]
async fn check_errors_map_to_status_codes() {
    let (_dir, router) = setup().await;
    let token = sign_up(&router).await;

    let mut body = new_check();
    body["timeoutSeconds"] = json!(6);
    let resp = send(
        &router,
        Request::new("post", "api/checks")
            .with_token(Some(&token))
            .with_body(body),
    )
    .await;
    assert_eq!(resp.status_code, 400);

    let resp = send(&router, Request::new("post", "api/checks").with_body(new_check())).await;
    assert_eq!(resp.status_code, 403);

    for _ in 0..5 {
        create_check(&router, &token).await;
    }
    let resp = send(
        &router,
        Request::new("post", "api/checks")
            .with_token(Some(&token))
            .with_body(new_check()),
    )
    .await;
    assert_eq!(resp.status_code, 400);
    assert!(resp.payload["Error"].as_str().unwrap().contains("quota"));
}

#[tokio::test]
async fn linking_an_orphan_through_the_router() {
    let (dir, router) = setup().await;
    let token = sign_up(&router).await;
    let id = create_check(&router, &token).await;

    // Drop the link by hand, as a failed second step would leave it.
    let user_path = dir.path().join("data").join("users").join(format!("{PHONE}.json"));
    let mut user: Value = serde_json::from_str(&std::fs::read_to_string(&user_path).unwrap()).unwrap();
    user["checks"] = json!([]);
    std::fs::write(&user_path, user.to_string()).unwrap();

    let resp = send(
        &router,
        Request::new("post", "api/checks/link")
            .with_token(Some(&token))
            .with_body(json!({ "id": id })),
    )
    .await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.payload["checks"], json!([id]));

    let resp = send(
        &router,
        Request::new("post", "api/checks/link")
            .with_token(Some(&token))
            .with_body(json!({ "id": id })),
    )
    .await;
    assert_eq!(resp.payload["checks"], json!([id]));
}

#[tokio::test]
async fn delete_user_cascades_over_the_router() {
    let (dir, router) = setup().await;
    let token = sign_up(&router).await;
    let first = create_check(&router, &token).await;
    let second = create_check(&router, &token).await;

    std::fs::remove_file(dir.path().join("data").join("checks").join(format!("{first}.json")))
        .unwrap();

    let resp = send(
        &router,
        Request::new("delete", "api/users")
            .with_token(Some(&token))
            .with_query("phone", PHONE),
    )
    .await;
    assert_eq!(resp.status_code, 500);
    assert_eq!(resp.payload["deleted"], 1);
    assert_eq!(resp.payload["total"], 2);
    assert_eq!(resp.payload["failed"], json!([first]));

    let resp = send(
        &router,
        Request::new("get", "api/checks")
            .with_token(Some(&token))
            .with_query("id", &second),
    )
    .await;
    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn delete_check_partial_failure_names_the_check() {
    let (dir, router) = setup().await;
    let token = sign_up(&router).await;
    let id = create_check(&router, &token).await;

    std::fs::write(
        dir.path().join("data").join("users").join(format!("{PHONE}.json")),
        "{ nope",
    )
    .unwrap();

    let resp = send(
        &router,
        Request::new("delete", "api/checks")
            .with_token(Some(&token))
            .with_query("id", &id),
    )
    .await;
    assert_eq!(resp.status_code, 500);
    assert_eq!(resp.payload["checkId"], id.as_str());
    assert!(resp.payload["Error"].is_string());
    assert!(
        !dir.path()
            .join("data")
            .join("checks")
            .join(format!("{id}.json"))
            .exists()
    );
}
