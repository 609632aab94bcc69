use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use thrifthub_db::Database;
use thrifthub_db::models::{NewUser, UserPatch, UserRow};
use thrifthub_types::api::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest};
use thrifthub_types::models::{SellerSummary, UserProfile};

use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::images::ImageStore;
use crate::token::TokenIssuer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenIssuer,
    pub images: ImageStore,
}

const MIN_PASSWORD_LEN: usize = 8;
const BAD_LOGIN: &str = "Incorrect email or password";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let name = required(&req.name, "Name")?;
    let email = normalize_email(&req.email)?;
    let phone = req.phone.trim().to_string();
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let app = state.clone();
    let user = blocking(move || {
        if app.db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = app.db.create_user(&NewUser {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            password_hash,
            joined_at: Utc::now(),
        })?;
        Ok(user)
    })
    .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    // A malformed email can't match any account; answer like any other miss.
    let email = normalize_email(&req.email).map_err(|_| ApiError::auth(BAD_LOGIN))?;

    let app = state.clone();
    let user = blocking(move || {
        let user = app
            .db
            .get_user_by_email(&email)?
            .ok_or_else(|| ApiError::auth(BAD_LOGIN))?;
        verify_password(&req.password, &user.password_hash)?;
        Ok(user)
    })
    .await?;

    info!("User {} logged in", user.id);
    Ok(Json(auth_response(&state, user)?))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.into())
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(req) = payload?;

    let patch = UserPatch {
        name: req.name.as_deref().map(|n| required(n, "Name")).transpose()?,
        phone: req.phone.map(|p| p.trim().to_string()),
        avatar: req.avatar,
        location: req.location.map(|l| l.trim().to_string()),
    };
    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let app = state.clone();
    let updated = blocking(move || Ok(app.db.update_user(&user.id, &patch)?)).await?;

    info!("User {} updated their profile", updated.id);
    Ok(Json(updated.into()))
}

/// GET /users/{user_id}: public seller summary.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<SellerSummary>> {
    let app = state.clone();
    let user = blocking(move || Ok(app.db.get_user_by_id(&user_id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(SellerSummary::from(&user)))
}

fn auth_response(state: &AppState, user: UserRow) -> ApiResult<AuthResponse> {
    let access_token = state
        .tokens
        .issue(&user.id, None)
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(AuthResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    })
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> ApiResult<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::auth(BAD_LOGIN))
}

/// Trimmed, non-empty text field.
pub(crate) fn required(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trim, lower-case and sanity-check an email address.
pub(crate) fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    let invalid = || ApiError::validation("Invalid email address");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty());
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email)
}
