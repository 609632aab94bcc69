use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as returned to the user themselves. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub total_sales: i64,
    pub total_purchases: i64,
    pub joined_date: DateTime<Utc>,
}

/// Public view of a seller, embedded in listings and conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerSummary {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub total_sales: i64,
    /// "Month YYYY", e.g. "March 2025".
    pub member_since: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerSummary>,
}

/// Just enough of a listing to label a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub image: Option<String>,
    pub is_sold: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub product_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Derived view over the message log, keyed by (counterparty, listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub counterparty_id: String,
    pub product_id: String,
    pub counterparty: Option<SellerSummary>,
    pub product: Option<ListingSummary>,
    pub last_message: Message,
    pub unread_count: usize,
}
