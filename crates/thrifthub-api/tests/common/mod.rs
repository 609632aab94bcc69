#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use thrifthub_api::images::ImageStore;
use thrifthub_api::token::TokenIssuer;
use thrifthub_api::{AppState, AppStateInner, router};
use thrifthub_db::Database;

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub uploads_dir: PathBuf,
    pub client: Client,
}

/// A registered user and their bearer token.
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// Serve the full router on an ephemeral port, backed by a private in-memory
/// database and a scratch uploads directory.
pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let uploads_dir = std::env::temp_dir().join(format!("thrifthub-test-{}", Uuid::new_v4()));
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory database"),
        tokens: TokenIssuer::new("integration-test-secret", chrono::Duration::minutes(30)),
        images: ImageStore::new(uploads_dir.clone(), "/uploads")
            .await
            .expect("uploads dir"),
    });

    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        state,
        uploads_dir,
        client: Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, name: &str, email: &str) -> Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": name,
                "email": email,
                "phone": "555-0100",
                "password": "correct horse",
            }))
            .send()
            .await
            .unwrap()
    }

    pub async fn register_user(&self, name: &str, email: &str) -> TestUser {
        let res = self.register(name, email).await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(user) = user {
            req = req.bearer_auth(&user.token);
        }
        req.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn patch(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, user: &TestUser) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }

    /// Create a listing and return its id.
    pub async fn create_listing(&self, seller: &TestUser, title: &str, price: f64) -> String {
        let res = self
            .post(
                "/api/products",
                seller,
                json!({
                    "title": title,
                    "description": "Solid wood, light wear",
                    "price": price,
                    "category": "furniture",
                    "condition": "good",
                    "location": "Portland, OR",
                    "tags": ["vintage"],
                }),
            )
            .await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.uploads_dir);
    }
}
