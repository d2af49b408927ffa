use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::AppConfig;

/// Build a lazy Postgres pool from config. Returns `Ok(None)` when no
/// DATABASE_URL is set so the app can boot without a database; data
/// routes then answer with a dependency error until one is configured.
pub fn build_pool(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = config.database_url.as_deref() else {
        return Ok(None);
    };

    let options: PgConnectOptions = url.parse()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_pool_max_connections)
        .min_connections(config.db_pool_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_pool_acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.db_pool_idle_timeout_seconds))
        .connect_lazy_with(options);

    Ok(Some(pool))
}
