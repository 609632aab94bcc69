use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use tracing::debug;

use thrifthub_db::models::UserRow;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// The authenticated caller. Resolving it verifies the bearer token and loads
/// the user; a valid token for a user that no longer exists is rejected too.
///
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> ApiResult<...> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| ApiError::auth("Not authenticated"))?;

        let user_id = state.tokens.verify(token).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            ApiError::auth(INVALID_CREDENTIALS)
        })?;

        let app = state.clone();
        let user = blocking(move || Ok(app.db.get_user_by_id(&user_id)?))
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_CREDENTIALS))?;

        Ok(CurrentUser(user))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
