use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use thrifthub_types::api::StatusMessage;
use thrifthub_types::models::Listing;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extractors::CurrentUser;

/// GET /favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Listing>>> {
    let app = state.clone();
    let rows = blocking(move || Ok(app.db.list_favorites(&user.id)?)).await?;
    Ok(Json(rows.into_iter().map(Listing::from).collect()))
}

/// POST /favorites/{product_id}
pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let app = state.clone();
    let user_id = user.id.clone();
    let listing_id = product_id.clone();
    blocking(move || {
        Ok(app
            .db
            .add_favorite(&Uuid::new_v4().to_string(), &user_id, &listing_id, Utc::now())?)
    })
    .await?;

    info!("User {} favorited {}", user.id, product_id);
    Ok((StatusCode::CREATED, Json(StatusMessage::new("Added to favorites"))))
}

/// DELETE /favorites/{product_id}
pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    let app = state.clone();
    blocking(move || Ok(app.db.remove_favorite(&user.id, &product_id)?)).await?;
    Ok(Json(StatusMessage::new("Removed from favorites")))
}
