use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secret = lookup("SECRET_KEY")
            .or_else(|| lookup("JWT_SECRET"))
            .filter(|s| !s.is_empty())
            .context("SECRET_KEY is not set")?;

        let ttl_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("ACCESS_TOKEN_EXPIRE_MINUTES is not a number: {v}"))?,
            None => 30,
        };
        anyhow::ensure!(ttl_minutes > 0, "ACCESS_TOKEN_EXPIRE_MINUTES must be positive");

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "minimarket".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "minimarket-users".into()),
            ttl_minutes,
        };
        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}
