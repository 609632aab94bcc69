use serde::{Deserialize, Serialize};

use crate::models::{Listing, UserProfile};

// -- JWT Claims --

/// Session token claims. `sub` is the user id; `exp` and `iat` are unix
/// seconds, with `exp` rounded up. `exp_ns` is the exact expiry in unix
/// nanoseconds and takes precedence when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_ns: Option<i64>,
    #[serde(default)]
    pub iat: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<String>,
}

// -- Listings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Base64 payloads, optionally as `data:image/<type>;base64,` URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_sold: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub search: Option<String>,
    pub seller_id: Option<String>,
    #[serde(default)]
    pub include_sold: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingPage {
    pub products: Vec<Listing>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub product_id: String,
    pub content: String,
}

/// Plain acknowledgement body, e.g. `{"message": "Added to favorites"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
