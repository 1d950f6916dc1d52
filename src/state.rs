use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::users::repo::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok(Self { db, store, config })
    }

    pub fn from_parts(db: PgPool, store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { db, store, config }
    }
}
