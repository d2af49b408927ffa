use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::AppError;

/// Each collection is a Postgres table of jsonb documents:
/// `(id uuid, doc jsonb, created_at, updated_at)`. Reads merge the
/// columns into the document so callers always see `id`, `createdAt`
/// and `updatedAt` as ordinary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tenants,
    Notices,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Self::Tenants => "tenants",
            Self::Notices => "notices",
        }
    }

    fn not_found(self) -> AppError {
        match self {
            Self::Tenants => AppError::NotFound("Tenant not found.".to_string()),
            Self::Notices => AppError::NotFound("Notice not found.".to_string()),
        }
    }
}

const DOC_PROJECTION: &str = "t.doc || jsonb_build_object('id', t.id, 'createdAt', t.created_at, 'updatedAt', t.updated_at) AS doc";

/// List documents, newest first. With `include_deleted` false, documents
/// whose `deleted` field is true are filtered out; collections without
/// the flag are unaffected.
pub async fn list_docs(
    pool: &PgPool,
    collection: Collection,
    include_deleted: bool,
    limit: i64,
) -> Result<Vec<Value>, AppError> {
    let mut query = list_query(collection, include_deleted, limit);
    let rows = query.build().fetch_all(pool).await.map_err(map_db_error)?;
    Ok(read_docs(rows))
}

pub async fn get_doc(pool: &PgPool, collection: Collection, id: &str) -> Result<Value, AppError> {
    let doc_id = parse_doc_id(collection, id)?;
    let mut query = get_query(collection, doc_id);
    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(read_doc).ok_or_else(|| collection.not_found())
}

pub async fn insert_doc(
    pool: &PgPool,
    collection: Collection,
    doc: &Map<String, Value>,
) -> Result<Value, AppError> {
    if doc.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Could not create {} record.",
            collection.table()
        )));
    }

    let mut query = insert_query(collection, doc);
    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(read_doc).ok_or_else(|| {
        AppError::Internal(format!("Could not create {} record.", collection.table()))
    })
}

/// Shallow-merge `patch` into the stored document and bump `updated_at`.
/// Top-level keys in the patch replace the stored values wholesale.
pub async fn patch_doc(
    pool: &PgPool,
    collection: Collection,
    id: &str,
    patch: &Map<String, Value>,
) -> Result<Value, AppError> {
    let doc_id = parse_doc_id(collection, id)?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }

    let mut query = patch_query(collection, doc_id, patch);
    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(read_doc).ok_or_else(|| collection.not_found())
}

pub async fn delete_doc(
    pool: &PgPool,
    collection: Collection,
    id: &str,
) -> Result<Value, AppError> {
    let doc_id = parse_doc_id(collection, id)?;
    let mut query = delete_query(collection, doc_id);
    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(read_doc).ok_or_else(|| collection.not_found())
}

fn list_query(
    collection: Collection,
    include_deleted: bool,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("SELECT ");
    query
        .push(DOC_PROJECTION)
        .push(" FROM ")
        .push(collection.table())
        .push(" t");
    if !include_deleted {
        query.push(" WHERE NOT coalesce((t.doc->>'deleted')::boolean, false)");
    }
    query
        .push(" ORDER BY t.created_at DESC LIMIT ")
        .push_bind(sanitized_limit(limit));
    query
}

fn get_query(collection: Collection, doc_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("SELECT ");
    query
        .push(DOC_PROJECTION)
        .push(" FROM ")
        .push(collection.table())
        .push(" t WHERE t.id = ")
        .push_bind(doc_id)
        .push(" LIMIT 1");
    query
}

fn insert_query(
    collection: Collection,
    doc: &Map<String, Value>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("INSERT INTO ");
    query
        .push(collection.table())
        .push(" AS t (doc) VALUES (")
        .push_bind(Value::Object(doc.clone()))
        .push(") RETURNING ")
        .push(DOC_PROJECTION);
    query
}

fn patch_query(
    collection: Collection,
    doc_id: Uuid,
    patch: &Map<String, Value>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE ");
    query
        .push(collection.table())
        .push(" t SET doc = t.doc || ")
        .push_bind(Value::Object(patch.clone()))
        .push(", updated_at = now() WHERE t.id = ")
        .push_bind(doc_id)
        .push(" RETURNING ")
        .push(DOC_PROJECTION);
    query
}

fn delete_query(collection: Collection, doc_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("DELETE FROM ");
    query
        .push(collection.table())
        .push(" t WHERE t.id = ")
        .push_bind(doc_id)
        .push(" RETURNING ")
        .push(DOC_PROJECTION);
    query
}

// A malformed id cannot match any stored document.
fn parse_doc_id(collection: Collection, id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| collection.not_found())
}

// Listings must ask for at least one row; the ceiling is the caller's
// configured bound, not this layer's.
fn sanitized_limit(limit: i64) -> i64 {
    limit.max(1)
}

fn read_docs(rows: Vec<PgRow>) -> Vec<Value> {
    rows.into_iter().filter_map(read_doc).collect()
}

fn read_doc(row: PgRow) -> Option<Value> {
    row.try_get::<Option<Value>, _>("doc").ok().flatten()
}

fn map_db_error(error: sqlx::Error) -> AppError {
    let message = error.to_string();
    tracing::error!(db_error = %message, "Database query failed");

    if message.contains("23505")
        || message
            .to_ascii_lowercase()
            .contains("duplicate key value violates unique constraint")
    {
        return AppError::Conflict("Duplicate value violates a unique constraint.".to_string());
    }
    AppError::Dependency("Database operation failed.".to_string())
}
