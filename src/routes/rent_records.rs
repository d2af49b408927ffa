use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::Tenant,
    repository::store::{self, Collection},
    schemas::RentRecordsQuery,
    services::months::{self, MonthKey},
    services::rent_report::{self, PaidFilter},
    state::AppState,
};

const MONTH_OPTION_COUNT: usize = 6;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/rent-records", axum::routing::get(list_rent_records))
        .route("/rent-records/months", axum::routing::get(month_options))
        .route("/stats", axum::routing::get(stats))
}

/// The rent roll: one row per active tenant per billing month, derived on
/// read from the tenant documents. Responses are cached per filter
/// combination; tenant mutations clear the cache.
async fn list_rent_records(
    State(state): State<AppState>,
    Query(query): Query<RentRecordsQuery>,
) -> AppResult<Json<Value>> {
    let month_filter = match non_empty_opt(query.month.as_deref()) {
        Some(raw) => Some(raw.parse::<MonthKey>()?),
        None => None,
    };
    let status_filter = match non_empty_opt(query.status.as_deref()) {
        Some(raw) => Some(PaidFilter::parse(&raw)?),
        None => None,
    };

    let cache_key = rent_records_cache_key(month_filter, status_filter);
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let key_lock = state.report_cache.key_lock(&cache_key).await;
    let _guard = key_lock.lock().await;

    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let tenants = load_active_tenants(&state).await?;
    let records =
        rent_report::build_rent_records(&tenants, state.today(), month_filter, status_filter);

    let response = json!({ "data": records });
    state.report_cache.put(cache_key, response.clone()).await;
    Ok(Json(response))
}

/// Month filter options for the rent roll: the current month and the five
/// before it, with display labels.
async fn month_options(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let options = months::recent_months(state.today(), MONTH_OPTION_COUNT)
        .into_iter()
        .map(|key| json!({ "key": key.to_string(), "label": key.label() }))
        .collect::<Vec<_>>();
    Ok(Json(json!({ "data": options })))
}

/// Dashboard counters for the current month.
async fn stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let month = MonthKey::from_date(state.today());
    let cache_key = format!("stats:{month}");
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let key_lock = state.report_cache.key_lock(&cache_key).await;
    let _guard = key_lock.lock().await;

    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let tenants = load_active_tenants(&state).await?;
    let summary = rent_report::month_summary(&tenants, month);

    let response = serde_json::to_value(&summary)
        .map_err(|error| AppError::Internal(format!("Could not serialize summary: {error}")))?;
    state.report_cache.put(cache_key, response.clone()).await;
    Ok(Json(response))
}

async fn load_active_tenants(state: &AppState) -> AppResult<Vec<Tenant>> {
    let pool = db_pool(state)?;
    let docs =
        store::list_docs(pool, Collection::Tenants, false, state.config.list_max_rows).await?;
    docs.into_iter().map(Tenant::from_doc).collect()
}

fn rent_records_cache_key(month: Option<MonthKey>, status: Option<PaidFilter>) -> String {
    format!(
        "rent-records:month={}:status={}",
        month.map(|key| key.to_string()).unwrap_or_default(),
        status.map(PaidFilter::as_str).unwrap_or_default(),
    )
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}

fn non_empty_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::rent_records_cache_key;
    use crate::services::rent_report::PaidFilter;

    #[test]
    fn cache_keys_distinguish_filter_combinations() {
        let month = "2025-04".parse().unwrap();
        let unfiltered = rent_records_cache_key(None, None);
        let by_month = rent_records_cache_key(Some(month), None);
        let by_status = rent_records_cache_key(None, Some(PaidFilter::Unpaid));
        let both = rent_records_cache_key(Some(month), Some(PaidFilter::Paid));

        let keys = [&unfiltered, &by_month, &by_status, &both];
        for (index, key) in keys.iter().enumerate() {
            for other in &keys[index + 1..] {
                assert_ne!(key, other);
            }
        }
        assert_eq!(both, "rent-records:month=2025-04:status=paid");
    }
}
