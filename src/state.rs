use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, DirectoryConfig, JwtConfig};
use crate::users::repo::{MemoryUserDirectory, PgUserDirectory, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub keys: Arc<JwtKeys>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        Self::connect(AppConfig::from_env()?).await
    }

    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt)?);

        let directory: Arc<dyn UserDirectory> = match &config.directory {
            DirectoryConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let db = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await
                    .context("connect to database")?;

                // Run migrations if present
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserDirectory::new(db))
            }
            DirectoryConfig::Memory => {
                info!("using in-memory user directory");
                Arc::new(MemoryUserDirectory::new())
            }
        };

        Ok(Self::from_parts(directory, keys))
    }

    pub fn from_parts(directory: Arc<dyn UserDirectory>, keys: Arc<JwtKeys>) -> Self {
        Self { directory, keys }
    }

    /// State backed by an empty in-memory directory; no database involved.
    pub fn in_memory(jwt: JwtConfig) -> anyhow::Result<Self> {
        let keys = Arc::new(JwtKeys::from_config(&jwt)?);
        Ok(Self::from_parts(Arc::new(MemoryUserDirectory::new()), keys))
    }
}
