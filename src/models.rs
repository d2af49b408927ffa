use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::months::MonthKey;

/// One month's rent payment, embedded in the owning tenant's
/// `rentHistory`. Month keys are unique within a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub month: MonthKey,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub proof_url: String,
}

/// A tenant document as stored: the caller-supplied fields plus the
/// soft-delete flags and the embedded payment history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub room_number: String,
    pub contact: String,
    pub rent_amount: f64,
    pub deposit: f64,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rent_history: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Decode a stored document. Failures mean the store holds something
    /// this code never wrote, so they surface as internal errors.
    pub fn from_doc(doc: Value) -> AppResult<Self> {
        serde_json::from_value(doc)
            .map_err(|error| AppError::Internal(format!("Malformed tenant document: {error}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    Maintenance,
    Complaint,
    Update,
    Announcement,
}

impl NoticeCategory {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim() {
            "maintenance" => Ok(Self::Maintenance),
            "complaint" => Ok(Self::Complaint),
            "update" => Ok(Self::Update),
            "announcement" => Ok(Self::Announcement),
            other => Err(AppError::BadRequest(format!(
                "Invalid category '{other}'. Expected one of: maintenance, complaint, update, announcement."
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Complaint => "complaint",
            Self::Update => "update",
            Self::Announcement => "announcement",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{NoticeCategory, Tenant};

    #[test]
    fn decodes_a_stored_tenant_document() {
        let doc = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Asha Verma",
            "roomNumber": "12B",
            "contact": "+91 98765 43210",
            "rentAmount": 5000,
            "deposit": 10000,
            "joinDate": "2025-01-15",
            "deleted": false,
            "deletedAt": null,
            "rentHistory": [
                { "month": "2025-02", "amount": 5000, "date": "2025-02-03", "paid": true, "proofUrl": "" }
            ],
            "createdAt": "2025-01-15T08:00:00Z",
            "updatedAt": "2025-02-03T09:30:00Z"
        });

        let tenant = Tenant::from_doc(doc).unwrap();
        assert_eq!(tenant.name, "Asha Verma");
        assert_eq!(tenant.room_number, "12B");
        assert_eq!(tenant.rent_history.len(), 1);
        assert!(tenant.rent_history[0].paid);
        assert_eq!(tenant.rent_history[0].month.to_string(), "2025-02");
        assert!(!tenant.deleted);
        assert!(tenant.deleted_at.is_none());
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let doc = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Ravi Kumar",
            "roomNumber": "3A",
            "contact": "ravi@example.com",
            "rentAmount": 4200.5,
            "deposit": 8000,
            "joinDate": "2024-11-01",
            "createdAt": "2024-11-01T08:00:00Z",
            "updatedAt": "2024-11-01T08:00:00Z"
        });

        let tenant = Tenant::from_doc(doc).unwrap();
        assert!(!tenant.deleted);
        assert!(tenant.rent_history.is_empty());
    }

    #[test]
    fn rejects_documents_with_the_wrong_shape() {
        let doc = json!({
            "id": "not-a-uuid",
            "name": "Broken",
        });
        assert!(Tenant::from_doc(doc).is_err());
    }

    #[test]
    fn parses_notice_categories() {
        assert_eq!(
            NoticeCategory::parse(" maintenance ").unwrap(),
            NoticeCategory::Maintenance
        );
        assert_eq!(NoticeCategory::parse("update").unwrap().as_str(), "update");
        assert!(NoticeCategory::parse("Maintenance").is_err());
        assert!(NoticeCategory::parse("gossip").is_err());
        assert!(NoticeCategory::parse("").is_err());
    }
}
