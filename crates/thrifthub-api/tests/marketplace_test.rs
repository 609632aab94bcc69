mod common;

use serde_json::{Value, json};

use common::spawn_app;

#[tokio::test]
async fn favorite_lifecycle() {
    let app = spawn_app().await;
    let seller = app.register_user("Sam", "sam@example.com").await;
    let buyer = app.register_user("Bea", "bea@example.com").await;
    let id = app.create_listing(&seller, "Oak chair", 45.0).await;
    let path = format!("/api/favorites/{}", id);

    let res = app.post(&path, &buyer, json!({})).await;
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Added to favorites");

    assert_eq!(app.post(&path, &buyer, json!({})).await.status(), 409);

    let body: Value = app.get("/api/favorites", Some(&buyer)).await.json().await.unwrap();
    let favorites = body.as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["id"], id.as_str());

    let res = app.delete(&path, &buyer).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Removed from favorites");

    assert_eq!(app.delete(&path, &buyer).await.status(), 404);

    let body: Value = app.get("/api/favorites", Some(&buyer)).await.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn favoriting_missing_listing_is_not_found() {
    let app = spawn_app().await;
    let buyer = app.register_user("Bea", "bea@example.com").await;

    let res = app.post("/api/favorites/missing", &buyer, json!({})).await;
    assert_eq!(res.status(), 404);
    assert_eq!(app.get("/api/favorites", None).await.status(), 401);
}

#[tokio::test]
async fn messaging_scenario_tracks_unread() {
    let app = spawn_app().await;
    let seller = app.register_user("Sam", "sam@example.com").await;
    let buyer = app.register_user("Bea", "bea@example.com").await;
    let id = app.create_listing(&seller, "Oak chair", 45.0).await;

    let res = app
        .post(
            "/api/messages",
            &buyer,
            json!({"recipient_id": seller.id, "product_id": id, "content": "Still available?"}),
        )
        .await;
    assert_eq!(res.status(), 201);
    let sent: Value = res.json().await.unwrap();
    assert_eq!(sent["is_read"], false);
    assert_eq!(sent["sender_id"], buyer.id.as_str());

    let body: Value = app
        .get("/api/messages/conversations", Some(&seller))
        .await
        .json()
        .await
        .unwrap();
    let conversations = body.as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["counterparty_id"], buyer.id.as_str());
    assert_eq!(conversations[0]["product_id"], id.as_str());
    assert_eq!(conversations[0]["unread_count"], 1);
    assert_eq!(conversations[0]["last_message"]["content"], "Still available?");
    assert_eq!(conversations[0]["counterparty"]["name"], "Bea");
    assert_eq!(conversations[0]["product"]["title"], "Oak chair");

    // The sender has nothing unread in the same conversation.
    let body: Value = app
        .get("/api/messages/conversations", Some(&buyer))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body[0]["unread_count"], 0);

    let thread_path = format!("/api/messages/{}/{}", buyer.id, id);
    for _ in 0..2 {
        let res = app.get(&thread_path, Some(&seller)).await;
        assert_eq!(res.status(), 200);
        let thread: Value = res.json().await.unwrap();
        assert_eq!(thread.as_array().unwrap().len(), 1);
        assert_eq!(thread[0]["is_read"], true);

        let body: Value = app
            .get("/api/messages/conversations", Some(&seller))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body[0]["unread_count"], 0);
    }
}

#[tokio::test]
async fn reply_updates_last_message_for_both_sides() {
    let app = spawn_app().await;
    let seller = app.register_user("Sam", "sam@example.com").await;
    let buyer = app.register_user("Bea", "bea@example.com").await;
    let id = app.create_listing(&seller, "Oak chair", 45.0).await;

    app.post(
        "/api/messages",
        &buyer,
        json!({"recipient_id": seller.id, "product_id": id, "content": "Still available?"}),
    )
    .await;
    app.post(
        "/api/messages",
        &seller,
        json!({"recipient_id": buyer.id, "product_id": id, "content": "Yes it is"}),
    )
    .await;

    for user in [&seller, &buyer] {
        let body: Value = app
            .get("/api/messages/conversations", Some(user))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["last_message"]["content"], "Yes it is");
    }

    let thread: Value = app
        .get(&format!("/api/messages/{}/{}", seller.id, id), Some(&buyer))
        .await
        .json()
        .await
        .unwrap();
    let contents: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, ["Still available?", "Yes it is"]);
}

#[tokio::test]
async fn send_message_validates() {
    let app = spawn_app().await;
    let seller = app.register_user("Sam", "sam@example.com").await;
    let buyer = app.register_user("Bea", "bea@example.com").await;
    let id = app.create_listing(&seller, "Oak chair", 45.0).await;

    let blank = app
        .post(
            "/api/messages",
            &buyer,
            json!({"recipient_id": seller.id, "product_id": id, "content": "   "}),
        )
        .await;
    assert_eq!(blank.status(), 400);

    let to_self = app
        .post(
            "/api/messages",
            &buyer,
            json!({"recipient_id": buyer.id, "product_id": id, "content": "hi"}),
        )
        .await;
    assert_eq!(to_self.status(), 400);

    let unknown_recipient = app
        .post(
            "/api/messages",
            &buyer,
            json!({"recipient_id": "nobody", "product_id": id, "content": "hi"}),
        )
        .await;
    assert_eq!(unknown_recipient.status(), 404);

    let unknown_listing = app
        .post(
            "/api/messages",
            &buyer,
            json!({"recipient_id": seller.id, "product_id": "missing", "content": "hi"}),
        )
        .await;
    assert_eq!(unknown_listing.status(), 404);
}

#[tokio::test]
async fn deleting_listing_cascades_to_favorites_and_messages() {
    let app = spawn_app().await;
    let seller = app.register_user("Sam", "sam@example.com").await;
    let buyer = app.register_user("Bea", "bea@example.com").await;
    let id = app.create_listing(&seller, "Oak chair", 45.0).await;

    app.post(&format!("/api/favorites/{}", id), &buyer, json!({})).await;
    app.post(
        "/api/messages",
        &buyer,
        json!({"recipient_id": seller.id, "product_id": id, "content": "Still available?"}),
    )
    .await;

    assert_eq!(app.delete(&format!("/api/products/{}", id), &seller).await.status(), 200);

    let favorites: Value = app.get("/api/favorites", Some(&buyer)).await.json().await.unwrap();
    assert!(favorites.as_array().unwrap().is_empty());

    for user in [&seller, &buyer] {
        let conversations: Value = app
            .get("/api/messages/conversations", Some(user))
            .await
            .json()
            .await
            .unwrap();
        assert!(conversations.as_array().unwrap().is_empty());
    }

    let stray = app.state.db.messages_for_user(&buyer.id).unwrap();
    assert!(stray.is_empty());
}
