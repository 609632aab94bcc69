mod common;

use serde_json::{Value, json};

use common::spawn_app;

#[tokio::test]
async fn health_check_responds() {
    let app = spawn_app().await;

    let res = app.get("/api/health", None).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "ThriftHub API is running!");
}

#[tokio::test]
async fn register_returns_token_for_new_profile() {
    let app = spawn_app().await;

    let res = app.register("Ada", "Ada@Example.com").await;
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["is_verified"], false);
    assert!(body["user"].get("password_hash").is_none());

    let token = body["access_token"].as_str().unwrap();
    let subject = app.state.tokens.verify(token).unwrap();
    assert_eq!(subject, body["user"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;

    assert_eq!(app.register("Ada", "ada@example.com").await.status(), 201);

    let res = app.register("Someone Else", "ada@example.com").await;
    assert_eq!(res.status(), 409);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_code"], "CONFLICT");
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn register_validates_input() {
    let app = spawn_app().await;

    let res = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({"name": "Ada", "email": "not-an-email", "phone": "", "password": "correct horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({"name": "Ada", "email": "ada@example.com", "phone": "", "password": "short"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_accepts_correct_secret_only() {
    let app = spawn_app().await;
    let user = app.register_user("Ada", "ada@example.com").await;

    let res = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "ADA@example.com", "password": "correct horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], user.id.as_str());

    let wrong_password = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "ada@example.com", "password": "battery staple"}))
        .send()
        .await
        .unwrap();
    let unknown_email = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "nobody@example.com", "password": "correct horse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_email.status(), 401);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["error"], b["error"]);
}

#[tokio::test]
async fn me_requires_valid_token() {
    let app = spawn_app().await;
    let user = app.register_user("Ada", "ada@example.com").await;

    let res = app.get("/api/auth/me", Some(&user)).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], user.id.as_str());

    let res = app.get("/api/auth/me", None).await;
    assert_eq!(res.status(), 401);

    let res = app
        .client
        .get(app.url("/api/auth/me"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error_code"], "AUTH_ERROR");
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let app = spawn_app().await;
    let token = app.state.tokens.issue("no-such-user", None).unwrap();

    let res = app
        .client
        .get(app.url("/api/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn profile_update_and_public_summary() {
    let app = spawn_app().await;
    let user = app.register_user("Ada", "ada@example.com").await;

    let res = app
        .patch("/api/auth/me", &user, json!({"location": "Portland, OR"}))
        .await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["location"], "Portland, OR");
    assert_eq!(body["name"], "Ada");

    let res = app.patch("/api/auth/me", &user, json!({})).await;
    assert_eq!(res.status(), 400);

    let res = app.get(&format!("/api/users/{}", user.id), None).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Ada");
    assert!(body.get("email").is_none());

    let res = app.get("/api/users/missing", None).await;
    assert_eq!(res.status(), 404);
}
