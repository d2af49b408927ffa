use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Tenant;
use crate::services::months::{billing_months, MonthKey};

/// One rent-roll row: a (tenant, billing month) pair joined with the
/// tenant's payment history for that month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRecord {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub room_number: String,
    pub month: MonthKey,
    pub month_label: String,
    /// The tenant's current rent, shown for past months too; amounts
    /// actually charged live on the payment entries.
    pub amount: f64,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub proof_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidFilter {
    Paid,
    Unpaid,
}

impl PaidFilter {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim() {
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            other => Err(AppError::BadRequest(format!(
                "Invalid status '{other}'. Expected 'paid' or 'unpaid'."
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
        }
    }
}

/// Build the rent roll: one row per active tenant per billing month,
/// newest month first within each tenant. Archived tenants never appear.
/// A month without a payment entry renders as an unpaid row.
pub fn build_rent_records(
    tenants: &[Tenant],
    today: NaiveDate,
    month_filter: Option<MonthKey>,
    status_filter: Option<PaidFilter>,
) -> Vec<RentRecord> {
    let mut records = Vec::new();

    for tenant in tenants.iter().filter(|tenant| !tenant.deleted) {
        for month in billing_months(tenant.join_date, today) {
            if month_filter.is_some_and(|wanted| wanted != month) {
                continue;
            }

            let payment = tenant.rent_history.iter().find(|entry| entry.month == month);
            let paid = payment.is_some_and(|entry| entry.paid);
            if status_filter.is_some_and(|wanted| (wanted == PaidFilter::Paid) != paid) {
                continue;
            }

            records.push(RentRecord {
                tenant_id: tenant.id,
                tenant_name: tenant.name.clone(),
                room_number: tenant.room_number.clone(),
                month,
                month_label: month.label(),
                amount: tenant.rent_amount,
                paid,
                payment_date: payment.map(|entry| entry.date),
                proof_url: payment
                    .map(|entry| entry.proof_url.clone())
                    .unwrap_or_default(),
            });
        }
    }

    records
}

/// Dashboard counters for one month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentSummary {
    pub month: MonthKey,
    pub month_label: String,
    pub total_tenants: usize,
    pub occupied_rooms: usize,
    pub paid: usize,
    pub pending: usize,
}

/// Count tenants paid/pending for the given month. `occupied_rooms`
/// equals the active-tenant count; rooms and tenants are one-to-one in
/// this model. Tenants whose billing hasn't reached the month yet count
/// as pending.
pub fn month_summary(tenants: &[Tenant], month: MonthKey) -> RentSummary {
    let active: Vec<&Tenant> = tenants.iter().filter(|tenant| !tenant.deleted).collect();
    let paid = active
        .iter()
        .filter(|tenant| {
            tenant
                .rent_history
                .iter()
                .any(|entry| entry.month == month && entry.paid)
        })
        .count();

    RentSummary {
        month,
        month_label: month.label(),
        total_tenants: active.len(),
        occupied_rooms: active.len(),
        paid,
        pending: active.len() - paid,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use super::{build_rent_records, month_summary, PaidFilter};
    use crate::models::{Payment, Tenant};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn payment(month: &str, amount: f64, paid: bool) -> Payment {
        Payment {
            month: month.parse().unwrap(),
            amount,
            date: date(2025, 2, 3),
            paid,
            proof_url: "https://example.com/p.png".to_string(),
        }
    }

    fn tenant(name: &str, join: NaiveDate, rent: f64, history: Vec<Payment>) -> Tenant {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            room_number: "1A".to_string(),
            contact: "c".to_string(),
            rent_amount: rent,
            deposit: 0.0,
            join_date: join,
            deleted: false,
            deleted_at: None,
            rent_history: history,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn one_row_per_tenant_per_billing_month() {
        let tenants = vec![
            tenant("A", date(2025, 2, 1), 5000.0, vec![]),
            tenant("B", date(2025, 4, 1), 6000.0, vec![]),
        ];
        let records = build_rent_records(&tenants, date(2025, 4, 10), None, None);

        // A owes Feb-Apr, B owes Apr.
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].tenant_name, "A");
        assert_eq!(records[0].month.to_string(), "2025-04");
        assert_eq!(records[2].month.to_string(), "2025-02");
        assert_eq!(records[3].tenant_name, "B");
    }

    #[test]
    fn archived_tenants_are_excluded() {
        let mut archived = tenant("Gone", date(2025, 1, 1), 5000.0, vec![]);
        archived.deleted = true;
        let tenants = vec![archived, tenant("Here", date(2025, 4, 1), 5000.0, vec![])];

        let records = build_rent_records(&tenants, date(2025, 4, 10), None, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tenant_name, "Here");
    }

    #[test]
    fn months_without_payments_render_as_unpaid_rows() {
        let tenants = vec![tenant(
            "A",
            date(2025, 3, 1),
            5000.0,
            vec![payment("2025-03", 5000.0, true)],
        )];
        let records = build_rent_records(&tenants, date(2025, 4, 10), None, None);

        assert_eq!(records.len(), 2);
        let april = &records[0];
        assert_eq!(april.month.to_string(), "2025-04");
        assert!(!april.paid);
        assert!(april.payment_date.is_none());
        assert_eq!(april.proof_url, "");

        let march = &records[1];
        assert!(march.paid);
        assert_eq!(march.payment_date, Some(date(2025, 2, 3)));
        assert_eq!(march.proof_url, "https://example.com/p.png");
    }

    #[test]
    fn rows_show_the_current_rent_even_for_past_months() {
        // The payment recorded 4500 but the tenant's rent is now 5000;
        // rows report the current rent, the history keeps the 4500.
        let tenants = vec![tenant(
            "A",
            date(2025, 3, 1),
            5000.0,
            vec![payment("2025-03", 4500.0, true)],
        )];
        let records = build_rent_records(&tenants, date(2025, 4, 10), None, None);
        assert!(records.iter().all(|row| row.amount == 5000.0));
    }

    #[test]
    fn month_filter_keeps_only_that_month() {
        let tenants = vec![
            tenant("A", date(2025, 1, 1), 5000.0, vec![]),
            tenant("B", date(2025, 3, 1), 6000.0, vec![]),
        ];
        let wanted = "2025-03".parse().unwrap();
        let records = build_rent_records(&tenants, date(2025, 4, 10), Some(wanted), None);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|row| row.month == wanted));
    }

    #[test]
    fn status_filter_splits_paid_from_unpaid() {
        let tenants = vec![tenant(
            "A",
            date(2025, 3, 1),
            5000.0,
            vec![payment("2025-03", 5000.0, true)],
        )];

        let paid = build_rent_records(&tenants, date(2025, 4, 10), None, Some(PaidFilter::Paid));
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].month.to_string(), "2025-03");

        let unpaid =
            build_rent_records(&tenants, date(2025, 4, 10), None, Some(PaidFilter::Unpaid));
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].month.to_string(), "2025-04");
    }

    #[test]
    fn summary_counts_paid_and_pending_for_the_month() {
        let month = "2025-04".parse().unwrap();
        let mut archived = tenant("Gone", date(2025, 1, 1), 5000.0, vec![]);
        archived.deleted = true;

        let tenants = vec![
            tenant("Paid", date(2025, 1, 1), 5000.0, vec![payment("2025-04", 5000.0, true)]),
            tenant("Unpaid entry", date(2025, 1, 1), 5000.0, vec![payment("2025-04", 5000.0, false)]),
            tenant("No entry", date(2025, 1, 1), 5000.0, vec![]),
            archived,
        ];

        let summary = month_summary(&tenants, month);
        assert_eq!(summary.total_tenants, 3);
        assert_eq!(summary.occupied_rooms, 3);
        assert_eq!(summary.paid, 1);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.month_label, "Apr 2025");
    }

    #[test]
    fn parses_status_filters() {
        assert_eq!(PaidFilter::parse("paid").unwrap(), PaidFilter::Paid);
        assert_eq!(PaidFilter::parse(" unpaid ").unwrap(), PaidFilter::Unpaid);
        assert!(PaidFilter::parse("overdue").is_err());
        assert!(PaidFilter::parse("").is_err());
    }
}
