use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::error::AppError;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::BadRequest(format!("Validation failed: {errors}")))
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub room_number: String,
    #[validate(length(min = 1, max = 128))]
    pub contact: String,
    #[validate(range(min = 0.0))]
    pub rent_amount: f64,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub deposit: f64,
    /// Defaults to today (property timezone) when omitted.
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub room_number: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub contact: Option<String>,
    #[validate(range(min = 0.0))]
    pub rent_amount: Option<f64>,
    #[validate(range(min = 0.0))]
    pub deposit: Option<f64>,
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentInput {
    pub month: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "bool_from_bool_or_string")]
    pub paid: bool,
    pub proof_url: Option<String>,
}

/// Clients submit `paid` as a boolean or as the strings "true"/"false";
/// anything else counts as unpaid. Normalized here so the ledger only
/// ever sees a bool.
fn bool_from_bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(flag) => flag,
        serde_json::Value::String(text) => text == "true",
        _ => false,
    })
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct CreateNoticeInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub category: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    /// Effective date shown on the board; defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Validate)]
pub struct UpdateNoticeInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub category: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub content: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct NoticesQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct RentRecordsQuery {
    pub month: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TenantPath {
    pub tenant_id: String,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct NoticePath {
    pub notice_id: String,
}

pub fn serialize_to_map<T>(value: &T) -> serde_json::Map<String, serde_json::Value>
where
    T: serde::Serialize,
{
    let json = serde_json::to_value(value)
        .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
    json.as_object().cloned().unwrap_or_default()
}

pub fn remove_nulls(
    mut map: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    map.retain(|_, value| !value.is_null());
    map
}
