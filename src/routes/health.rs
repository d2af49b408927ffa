use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use crate::services::months::MonthKey;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbStatus {
    Ok,
    Unconfigured,
    Error,
}

impl DbStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Unconfigured => "unconfigured",
            Self::Error => "error",
        }
    }
}

/// Liveness plus a time-bounded database check. The payload reports the db
/// state, the configured property timezone, and the billing month currently
/// derived from it.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db = match &state.db_pool {
        Some(pool) => {
            let timeout = Duration::from_secs(state.config.health_db_timeout_seconds);
            check_database(pool, timeout).await
        }
        None => DbStatus::Unconfigured,
    };

    Json(health_payload(
        db,
        state.today(),
        state.config.property_timezone,
    ))
}

async fn check_database(pool: &sqlx::PgPool, timeout: Duration) -> DbStatus {
    match tokio::time::timeout(timeout, sqlx::query("SELECT 1").fetch_one(pool)).await {
        Ok(Ok(_)) => DbStatus::Ok,
        Ok(Err(error)) => {
            tracing::error!(error = %error, "Health check DB query failed");
            DbStatus::Error
        }
        Err(_) => {
            tracing::error!(
                timeout_seconds = timeout.as_secs(),
                "Health check DB query timed out"
            );
            DbStatus::Error
        }
    }
}

fn health_payload(db: DbStatus, today: NaiveDate, timezone: Tz) -> Value {
    let status = if db == DbStatus::Error { "degraded" } else { "ok" };
    json!({
        "status": status,
        "now": Utc::now().to_rfc3339(),
        "db": db.as_str(),
        "propertyTimezone": timezone.name(),
        "billingMonth": MonthKey::from_date(today).to_string(),
    })
}
