use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use thrifthub_db::models::NewMessage;
use thrifthub_types::api::SendMessageRequest;
use thrifthub_types::models::{Conversation, ListingSummary, Message, SellerSummary};

use crate::auth::{AppState, required};
use crate::blocking;
use crate::conversations::aggregate;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;

/// 5000 characters per message
const MAX_CONTENT_CHARS: usize = 5000;

/// GET /messages/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Conversation>>> {
    let app = state.clone();
    let conversations = blocking(move || {
        let views = aggregate(&user.id, app.db.messages_for_user(&user.id)?);

        // One lookup per distinct counterparty and listing, not per message.
        let counterparty_ids: Vec<String> = distinct(views.iter().map(|v| &v.key.counterparty_id));
        let listing_ids: Vec<String> = distinct(views.iter().map(|v| &v.key.listing_id));

        let counterparties: HashMap<String, SellerSummary> = app
            .db
            .get_users_by_ids(&counterparty_ids)?
            .iter()
            .map(|u| (u.id.clone(), SellerSummary::from(u)))
            .collect();
        let listings: HashMap<String, ListingSummary> = app
            .db
            .get_listings_by_ids(&listing_ids)?
            .iter()
            .map(|l| (l.id.clone(), ListingSummary::from(l)))
            .collect();

        let conversations = views
            .into_iter()
            .map(|view| Conversation {
                counterparty: counterparties.get(&view.key.counterparty_id).cloned(),
                product: listings.get(&view.key.listing_id).cloned(),
                counterparty_id: view.key.counterparty_id,
                product_id: view.key.listing_id,
                last_message: view.last_message.into(),
                unread_count: view.unread_count,
            })
            .collect::<Vec<_>>();
        Ok(conversations)
    })
    .await?;

    Ok(Json(conversations))
}

/// GET /messages/{counterparty_id}/{product_id}: whole thread, oldest first.
/// Marks the caller's unread messages in it as read.
pub async fn get_thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((counterparty_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Message>>> {
    let app = state.clone();
    let rows =
        blocking(move || Ok(app.db.read_thread(&user.id, &counterparty_id, &product_id)?)).await?;

    Ok(Json(rows.into_iter().map(Message::from).collect()))
}

/// POST /messages
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let content = required(&req.content, "Message content")?;
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::validation(format!(
            "Message content exceeds {} characters",
            MAX_CONTENT_CHARS
        )));
    }
    if req.recipient_id == user.id {
        return Err(ApiError::validation("Cannot message yourself"));
    }

    let app = state.clone();
    let row = blocking(move || {
        Ok(app.db.insert_message(&NewMessage {
            id: Uuid::new_v4().to_string(),
            sender_id: user.id,
            recipient_id: req.recipient_id,
            listing_id: req.product_id,
            content,
            created_at: Utc::now(),
        })?)
    })
    .await?;

    info!(
        "Message {} from {} to {} about {}",
        row.id, row.sender_id, row.recipient_id, row.listing_id
    );
    Ok((StatusCode::CREATED, Json(Message::from(row))))
}

fn distinct<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&'a String> = HashSet::new();
    ids.filter(|id| seen.insert(*id)).cloned().collect()
}
