//! Session tokens: HS256 JWTs carrying the user id in `sub`.
//!
//! Expiry is checked here against the caller's clock rather than by
//! `jsonwebtoken`, so a token is valid exactly while `now` is before the
//! nanosecond expiry it carries.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use thrifthub_types::api::Claims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token has no subject")]
    MissingSubject,

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `subject`, valid for `ttl` (or the default) from now.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now + ttl.unwrap_or(self.default_ttl);
        let round_up = i64::from(expires_at.timestamp_subsec_nanos() > 0);

        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp() + round_up,
            exp_ns: expires_at.timestamp_nanos_opt(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check signature, algorithm, subject and expiry. Returns the subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;

        let expired = match (data.claims.exp_ns, now.timestamp_nanos_opt()) {
            (Some(exp_ns), Some(now_ns)) => now_ns >= exp_ns,
            _ => now.timestamp() >= data.claims.exp,
        };
        if expired {
            return Err(TokenError::Expired);
        }
        if data.claims.sub.is_empty() {
            return Err(TokenError::MissingSubject);
        }
        Ok(data.claims.sub)
    }
}
