use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Base64-encoded HMAC-SHA256 key.
    pub secret: String,
    pub expiration_minutes: i64,
}

/// Where user records live.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectoryConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };

        let backend = std::env::var("USER_DIRECTORY").unwrap_or_else(|_| "postgres".into());
        let directory = match backend.as_str() {
            "memory" => DirectoryConfig::Memory,
            "postgres" => DirectoryConfig::Postgres {
                database_url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set for the postgres directory")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            },
            other => anyhow::bail!("unknown USER_DIRECTORY backend: {other}"),
        };

        Ok(Self { directory, jwt })
    }
}
