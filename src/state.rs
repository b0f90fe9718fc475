use std::sync::Arc;

use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions};

use crate::config::Config;

/// Catalog schema: users, manga, chapters, favorites, reading history and the audit trail.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(thiserror::Error, Debug)]
pub enum StateError {
    #[error("Failed to migrate the catalog schema")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn init(config: Config) -> Result<Self, StateError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.database.min_connections)
            .max_connections(config.database.max_connections)
            .connect_lazy_with(config.database.with_db());

        if config.application.run_migration {
            tracing::warn!(
                database = %config.database.database_name,
                "Running catalog migrations..."
            );
            MIGRATOR.run(&pool).await?;
        }

        Ok(AppState { pool, config })
    }
}
