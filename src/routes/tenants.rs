use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::Tenant,
    repository::store::{self, Collection},
    schemas::{
        remove_nulls, serialize_to_map, validate_input, CreateTenantInput, RecordPaymentInput,
        TenantPath, UpdateTenantInput,
    },
    services::rent_ledger,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/tenants",
            axum::routing::get(list_tenants).post(create_tenant),
        )
        .route("/tenants/all", axum::routing::get(list_all_tenants))
        .route(
            "/tenants/{tenant_id}",
            axum::routing::get(get_tenant)
                .put(update_tenant)
                .delete(archive_tenant),
        )
        .route(
            "/tenants/{tenant_id}/payment",
            axum::routing::post(record_payment),
        )
}

/// Active tenants, newest first.
async fn list_tenants(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let docs =
        store::list_docs(pool, Collection::Tenants, false, state.config.list_max_rows).await?;
    Ok(Json(Value::Array(docs)))
}

/// Archive view: every tenant ever created, soft-deleted ones included.
async fn list_all_tenants(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let docs =
        store::list_docs(pool, Collection::Tenants, true, state.config.list_max_rows).await?;
    Ok(Json(Value::Array(docs)))
}

async fn get_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let doc = store::get_doc(pool, Collection::Tenants, &path.tenant_id).await?;
    Ok(Json(doc))
}

async fn create_tenant(
    State(state): State<AppState>,
    Json(payload): Json<CreateTenantInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let pool = db_pool(&state)?;

    let join_date = payload.join_date.unwrap_or_else(|| state.today());

    let mut doc = serialize_to_map(&payload);
    doc.insert(
        "joinDate".to_string(),
        Value::String(join_date.to_string()),
    );
    doc.insert("deleted".to_string(), Value::Bool(false));
    doc.insert("deletedAt".to_string(), Value::Null);
    doc.insert("rentHistory".to_string(), Value::Array(Vec::new()));

    let created = store::insert_doc(pool, Collection::Tenants, &doc).await?;
    state.report_cache.clear().await;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

/// Patch the provided fields; everything else, the payment history
/// included, stays as stored. Archived tenants can still be edited.
async fn update_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<UpdateTenantInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let pool = db_pool(&state)?;

    let patch = remove_nulls(serialize_to_map(&payload));
    let updated = store::patch_doc(pool, Collection::Tenants, &path.tenant_id, &patch).await?;
    state.report_cache.clear().await;
    Ok(Json(updated))
}

/// Soft delete: flag the tenant and stamp the time. The document and its
/// payment history stay in the store and remain visible via /tenants/all.
async fn archive_tenant(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;

    let mut patch = Map::new();
    patch.insert("deleted".to_string(), Value::Bool(true));
    patch.insert(
        "deletedAt".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    store::patch_doc(pool, Collection::Tenants, &path.tenant_id, &patch).await?;
    state.report_cache.clear().await;
    Ok(Json(serde_json::json!({
        "message": "Tenant archived (soft deleted)"
    })))
}

/// Insert-or-replace one month's payment and persist the re-sorted
/// history. Returns the full updated tenant document.
async fn record_payment(
    State(state): State<AppState>,
    Path(path): Path<TenantPath>,
    Json(payload): Json<RecordPaymentInput>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;

    let tenant =
        Tenant::from_doc(store::get_doc(pool, Collection::Tenants, &path.tenant_id).await?)?;
    let history = rent_ledger::upsert_payment(&tenant.rent_history, &payload)?;

    let mut patch = Map::new();
    patch.insert(
        "rentHistory".to_string(),
        serde_json::to_value(&history).map_err(|error| {
            AppError::Internal(format!("Could not serialize rent history: {error}"))
        })?,
    );

    let updated = store::patch_doc(pool, Collection::Tenants, &path.tenant_id, &patch).await?;
    state.report_cache.clear().await;
    Ok(Json(updated))
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}
