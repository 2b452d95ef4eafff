mod common;

use axum::http::StatusCode;
use common::{CLIENT_IP, PASSWORD, TestApp, registration};
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_returns_token_and_public_profile() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/users/register")
        .add_header("x-forwarded-for", CLIENT_IP)
        .json(&registration("Ada@Example.com", "recycler"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["success"], true);
    assert!(json["token"].as_str().unwrap().split('.').count() == 3);

    let user = &json["user"];
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "recycler");
    assert_eq!(user["impactScore"], 0);
    assert_eq!(user["totalWasteListed"], 0);
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.register("ada@example.com", "producer").await;

    let response = app
        .server
        .post("/api/users/register")
        .add_header("x-forwarded-for", "198.51.100.3")
        .json(&registration("ADA@example.com", "collector"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Email already registered"
    );
}

#[tokio::test]
async fn test_weak_password_is_rejected() {
    let app = TestApp::new();

    let mut body = registration("ada@example.com", "producer");
    body["password"] = json!("alllowercase1!");

    let response = app
        .server
        .post("/api/users/register")
        .add_header("x-forwarded-for", CLIENT_IP)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(
        response.json::<Value>()["message"]
            .as_str()
            .unwrap()
            .contains("uppercase")
    );
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/users/register")
        .add_header("x-forwarded-for", CLIENT_IP)
        .json(&registration("ada@example.com", "admin"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_correct_password() {
    let app = TestApp::new();
    let (id, _) = app.register("ada@example.com", "producer").await;

    let response = app
        .server
        .post("/api/users/login")
        .add_header("x-forwarded-for", CLIENT_IP)
        .json(&json!({ "email": "ADA@example.com", "password": PASSWORD }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["user"]["id"], id);
    assert!(json["user"]["lastLogin"].is_string());

    let token = json["token"].as_str().unwrap();
    app.server
        .get("/api/users/me")
        .add_header("x-forwarded-for", CLIENT_IP)
        .authorization_bearer(token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_wrong_password_counts_failed_attempt() {
    let app = TestApp::new();
    let (id, _) = app.register("ada@example.com", "producer").await;

    let response = app
        .server
        .post("/api/users/login")
        .add_header("x-forwarded-for", CLIENT_IP)
        .json(&json!({ "email": "ada@example.com", "password": "Wr0ng!Pass" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid credentials");
    assert_eq!(app.users.get(id).unwrap().login_attempts, 1);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let (_, token) = app.register("ada@example.com", "collector").await;

    let response = app
        .server
        .put("/api/users/profile")
        .add_header("x-forwarded-for", CLIENT_IP)
        .authorization_bearer(&token)
        .json(&json!({ "company": "Green Haulage", "location": "Utrecht" }))
        .await;

    response.assert_status_ok();
    let user = &response.json::<Value>()["user"];
    assert_eq!(user["company"], "Green Haulage");
    assert_eq!(user["location"], "Utrecht");
    assert_eq!(user["name"], "Test User");
}

#[tokio::test]
async fn test_update_profile_rejects_short_name() {
    let app = TestApp::new();
    let (_, token) = app.register("ada@example.com", "collector").await;

    let response = app
        .server
        .put("/api/users/profile")
        .add_header("x-forwarded-for", CLIENT_IP)
        .authorization_bearer(&token)
        .json(&json!({ "name": "A" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Name must be at least 2 characters"
    );
}
