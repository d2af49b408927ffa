use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use moka::future::Cache;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<sqlx::PgPool>,
    pub report_cache: ResponseCache,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, sqlx::Error> {
        let db_pool = db::build_pool(&config)?;
        let report_cache = ResponseCache::new(
            config.report_cache_ttl_seconds,
            config.report_cache_max_entries,
        );
        Ok(Self {
            config: Arc::new(config),
            db_pool,
            report_cache,
        })
    }

    /// Today's date in the property's timezone. Billing months roll over
    /// at the property's midnight, not UTC's.
    pub fn today(&self) -> NaiveDate {
        Utc::now()
            .with_timezone(&self.config.property_timezone)
            .date_naive()
    }
}

/// Cached JSON responses for derived reports, keyed by the request shape.
/// Readers `get`/`put`; every mutation of the underlying data calls
/// `clear` so reads never serve stale entries past a write.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, Value>,
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl ResponseCache {
    pub fn new(ttl_seconds: u64, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(Duration::from_secs(ttl_seconds.max(1)))
                .max_capacity(max_entries)
                .build(),
            locks: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(max_entries.max(64))
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).await
    }

    pub async fn put(&self, key: String, value: Value) {
        self.entries.insert(key, value).await;
    }

    /// One lock per key so concurrent misses compute the response once.
    pub async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(key.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }

    pub async fn clear(&self) {
        self.entries.invalidate_all();
    }
}
