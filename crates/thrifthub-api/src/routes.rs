use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::images::{MAX_IMAGE_BYTES, MAX_IMAGES_PER_LISTING};
use crate::{favorites, listings, messages};

/// Room for a full set of base64 images plus the rest of the listing.
const MAX_BODY_BYTES: usize = MAX_IMAGES_PER_LISTING * MAX_IMAGE_BYTES * 4 / 3 + 1024 * 1024;

/// The complete HTTP surface: JSON API under `/api`, stored images under
/// the image store's public prefix.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).patch(auth::update_me))
        .route("/users/{user_id}", get(auth::get_user))
        .route(
            "/products",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route(
            "/products/{product_id}",
            get(listings::get_listing)
                .patch(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/{product_id}",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route("/messages", post(messages::send_message))
        .route("/messages/conversations", get(messages::list_conversations))
        .route(
            "/messages/{counterparty_id}/{product_id}",
            get(messages::get_thread),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let uploads = ServeDir::new(state.images.dir());

    Router::new()
        .nest("/api", api)
        .nest_service(state.images.public_prefix(), uploads)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "ThriftHub API is running!" }))
}
