use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use thrifthub_db::models::{ListingFilter, ListingPatch, ListingRow, NewListing};
use thrifthub_types::api::{
    CreateListingRequest, ListingPage, ListingQuery, StatusMessage, UpdateListingRequest,
};
use thrifthub_types::models::{Listing, SellerSummary};

use crate::auth::{AppState, AppStateInner, required};
use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// GET /products: filtered, paginated, newest first.
pub async fn list_listings(
    State(state): State<AppState>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> ApiResult<Json<ListingPage>> {
    let Query(query) = query?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
        return Err(ApiError::validation("page starts at 1"));
    }
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!("limit must be between 1 and {}", MAX_PAGE_SIZE)));
    }
    if [query.price_min, query.price_max].iter().flatten().any(|p| !p.is_finite()) {
        return Err(ApiError::validation("price bounds must be finite numbers"));
    }

    let filter = ListingFilter {
        category: non_blank(query.category),
        location: non_blank(query.location),
        price_min: query.price_min,
        price_max: query.price_max,
        search: non_blank(query.search),
        seller_id: non_blank(query.seller_id),
        include_sold: query.include_sold,
    };

    let app = state.clone();
    let (products, total) = blocking(move || {
        let (rows, total) = app.db.query_listings(&filter, page, limit)?;
        Ok((with_sellers(&app, rows)?, total))
    })
    .await?;

    Ok(Json(ListingPage {
        products,
        total,
        page,
        limit,
    }))
}

/// GET /products/{product_id}: counts as a view.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Listing>> {
    let app = state.clone();
    let listing = blocking(move || {
        let row = app.db.view_listing(&product_id)?;
        let mut listings = with_sellers(&app, vec![row])?;
        listings.pop().ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))
    })
    .await?;

    Ok(Json(listing))
}

/// POST /products
pub async fn create_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateListingRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let title = required(&req.title, "Title")?;
    let category = required(&req.category, "Category")?;
    let condition = required(&req.condition, "Condition")?;
    let location = required(&req.location, "Location")?;
    let price = valid_price(req.price)?;

    let images = state.images.save_all(&req.images).await?;

    let new_listing = NewListing {
        id: Uuid::new_v4().to_string(),
        seller_id: user.id.clone(),
        title,
        description: req.description.trim().to_string(),
        price,
        category,
        condition,
        location,
        tags: normalize_tags(req.tags),
        images: images.clone(),
        created_at: Utc::now(),
    };

    let app = state.clone();
    let created = blocking(move || Ok(app.db.create_listing(&new_listing)?)).await;
    let row = match created {
        Ok(row) => row,
        Err(e) => {
            state.images.remove_all(&images).await;
            return Err(e);
        }
    };

    info!(
        "Listing {} created by {} with {} images",
        row.id,
        user.id,
        row.images.len()
    );
    Ok((StatusCode::CREATED, Json(Listing::from(row))))
}

/// PATCH /products/{product_id}: seller only.
pub async fn update_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
    payload: Result<Json<UpdateListingRequest>, JsonRejection>,
) -> ApiResult<Json<Listing>> {
    let Json(req) = payload?;

    let patch = ListingPatch {
        title: req.title.as_deref().map(|t| required(t, "Title")).transpose()?,
        description: req.description.map(|d| d.trim().to_string()),
        price: req.price.map(valid_price).transpose()?,
        category: req.category.as_deref().map(|c| required(c, "Category")).transpose()?,
        condition: req.condition.as_deref().map(|c| required(c, "Condition")).transpose()?,
        location: req.location.as_deref().map(|l| required(l, "Location")).transpose()?,
        tags: req.tags.map(normalize_tags),
        is_sold: req.is_sold,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let app = state.clone();
    let requester = user.id.clone();
    let row = blocking(move || {
        Ok(app.db.update_listing(&product_id, &requester, &patch, Utc::now())?)
    })
    .await?;

    info!("Listing {} updated by {}", row.id, user.id);
    Ok(Json(Listing::from(row)))
}

/// DELETE /products/{product_id}: seller only. Takes favorites and
/// messages about the listing with it.
pub async fn delete_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    let app = state.clone();
    let deleted = blocking(move || Ok(app.db.delete_listing(&product_id, &user.id)?)).await?;

    if !deleted.images.is_empty() {
        state.images.remove_all(&deleted.images).await;
    }

    Ok(Json(StatusMessage::new("Listing deleted")))
}

/// Attach public seller summaries, looking each seller up once.
fn with_sellers(app: &AppStateInner, rows: Vec<ListingRow>) -> ApiResult<Vec<Listing>> {
    let mut seller_ids: Vec<String> = rows.iter().map(|r| r.seller_id.clone()).collect();
    seller_ids.sort();
    seller_ids.dedup();

    let sellers: HashMap<String, SellerSummary> = app
        .db
        .get_users_by_ids(&seller_ids)?
        .iter()
        .map(|u| (u.id.clone(), SellerSummary::from(u)))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let seller = sellers.get(&row.seller_id).cloned();
            if seller.is_none() {
                warn!("Listing {} references missing seller {}", row.id, row.seller_id);
            }
            Listing {
                seller,
                ..Listing::from(row)
            }
        })
        .collect())
}

fn valid_price(price: f64) -> ApiResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("Price must be a non-negative number"));
    }
    Ok(price)
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
