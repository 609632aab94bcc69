use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key-change-in-production",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub token_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let jwt_secret = var("THRIFTHUB_JWT_SECRET", "");
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("THRIFTHUB_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port: u16 = var("THRIFTHUB_PORT", "8001")
            .parse()
            .context("THRIFTHUB_PORT must be a port number")?;

        let token_ttl_minutes: i64 = var("THRIFTHUB_TOKEN_TTL_MINUTES", "30")
            .parse()
            .context("THRIFTHUB_TOKEN_TTL_MINUTES must be a whole number of minutes")?;
        if token_ttl_minutes <= 0 {
            bail!("THRIFTHUB_TOKEN_TTL_MINUTES must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path: var("THRIFTHUB_DB_PATH", "thrifthub.db").into(),
            host: var("THRIFTHUB_HOST", "0.0.0.0"),
            port,
            uploads_dir: var("THRIFTHUB_UPLOADS_DIR", "./uploads").into(),
            token_ttl_minutes,
        })
    }
}
