use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes: match lookup("JWT_TTL_MINUTES") {
                Some(v) => {
                    let minutes = v
                        .trim()
                        .parse::<i64>()
                        .context("JWT_TTL_MINUTES must be an integer")?;
                    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
                        bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}");
                    }
                    minutes
                }
                None => 60 * 24,
            },
        };
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            jwt,
            host,
            port,
        })
    }
}
