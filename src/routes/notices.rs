use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::NoticeCategory,
    repository::store::{self, Collection},
    schemas::{
        remove_nulls, serialize_to_map, validate_input, CreateNoticeInput, NoticePath,
        NoticesQuery, UpdateNoticeInput,
    },
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/notices",
            axum::routing::get(list_notices).post(create_notice),
        )
        .route(
            "/notices/{notice_id}",
            axum::routing::get(get_notice)
                .put(update_notice)
                .delete(delete_notice),
        )
}

/// Notices, newest first, optionally narrowed to one category.
async fn list_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticesQuery>,
) -> AppResult<Json<Value>> {
    let category = match non_empty_opt(query.category.as_deref()) {
        Some(raw) => Some(NoticeCategory::parse(&raw)?),
        None => None,
    };

    let pool = db_pool(&state)?;
    let mut docs =
        store::list_docs(pool, Collection::Notices, true, state.config.list_max_rows).await?;

    if let Some(category) = category {
        docs.retain(|doc| {
            doc.as_object()
                .and_then(|obj| obj.get("category"))
                .and_then(Value::as_str)
                == Some(category.as_str())
        });
    }

    Ok(Json(Value::Array(docs)))
}

async fn get_notice(
    State(state): State<AppState>,
    Path(path): Path<NoticePath>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let doc = store::get_doc(pool, Collection::Notices, &path.notice_id).await?;
    Ok(Json(doc))
}

async fn create_notice(
    State(state): State<AppState>,
    Json(payload): Json<CreateNoticeInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let category = NoticeCategory::parse(&payload.category)?;
    let pool = db_pool(&state)?;

    let mut doc = serialize_to_map(&payload);
    doc.insert(
        "category".to_string(),
        Value::String(category.as_str().to_string()),
    );
    doc.insert(
        "date".to_string(),
        Value::String(payload.date.unwrap_or_else(Utc::now).to_rfc3339()),
    );

    let created = store::insert_doc(pool, Collection::Notices, &doc).await?;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn update_notice(
    State(state): State<AppState>,
    Path(path): Path<NoticePath>,
    Json(payload): Json<UpdateNoticeInput>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;

    let mut patch = remove_nulls(serialize_to_map(&payload));
    if let Some(raw) = payload.category.as_deref() {
        let category = NoticeCategory::parse(raw)?;
        patch.insert(
            "category".to_string(),
            Value::String(category.as_str().to_string()),
        );
    }

    let pool = db_pool(&state)?;
    let updated = store::patch_doc(pool, Collection::Notices, &path.notice_id, &patch).await?;
    Ok(Json(updated))
}

/// Notices are disposable announcements; unlike tenants they are deleted
/// for real.
async fn delete_notice(
    State(state): State<AppState>,
    Path(path): Path<NoticePath>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    store::delete_doc(pool, Collection::Notices, &path.notice_id).await?;
    Ok(Json(json!({ "message": "Notice deleted successfully" })))
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
