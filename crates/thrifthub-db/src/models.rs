//! Database row types and store inputs.
//! Distinct from thrifthub-types wire models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use thrifthub_types::models::{Listing, ListingSummary, Message, SellerSummary, UserProfile};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub total_sales: i64,
    pub total_purchases: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub views: i64,
    pub is_sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub listing_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub joined_at: DateTime<Utc>,
}

/// Profile fields a user may change. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.avatar.is_none() && self.location.is_none()
    }
}

pub struct NewListing {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_sold: Option<bool>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.condition.is_none()
            && self.location.is_none()
            && self.tags.is_none()
            && self.is_sold.is_none()
    }
}

/// Listing search filters. Every field is optional and independent.
#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    /// Exact match; the sentinel `"all"` disables the filter.
    pub category: Option<String>,
    /// Case-insensitive substring.
    pub location: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    /// Substring of title or description, or an exact tag.
    pub search: Option<String>,
    pub seller_id: Option<String>,
    pub include_sold: bool,
}

pub struct NewMessage {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub listing_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What a listing delete removed, so callers can clean up stored files.
#[derive(Debug)]
pub struct DeletedListing {
    pub images: Vec<String>,
    pub favorites_removed: usize,
    pub messages_removed: usize,
}

// -- Wire conversions --

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            avatar: row.avatar,
            location: row.location,
            is_verified: row.is_verified,
            rating: row.rating,
            total_sales: row.total_sales,
            total_purchases: row.total_purchases,
            joined_date: row.joined_at,
        }
    }
}

impl From<&UserRow> for SellerSummary {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            avatar: row.avatar.clone(),
            is_verified: row.is_verified,
            rating: row.rating,
            total_sales: row.total_sales,
            member_since: row.joined_at.format("%B %Y").to_string(),
        }
    }
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category,
            condition: row.condition,
            location: row.location,
            tags: row.tags,
            images: row.images,
            views: row.views,
            is_sold: row.is_sold,
            created_at: row.created_at,
            updated_at: row.updated_at,
            seller: None,
        }
    }
}

impl From<&ListingRow> for ListingSummary {
    fn from(row: &ListingRow) -> Self {
        Self {
            id: row.id.clone(),
            title: row.title.clone(),
            price: row.price,
            image: row.images.first().cloned(),
            is_sold: row.is_sold,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            product_id: row.listing_id,
            content: row.content,
            timestamp: row.created_at,
            is_read: row.is_read,
        }
    }
}
