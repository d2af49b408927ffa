use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::Payment;
use crate::schemas::RecordPaymentInput;
use crate::services::months::MonthKey;

/// Insert-or-replace one month's payment in a tenant's history.
///
/// The month key is the identity: an entry with the same key is replaced
/// in full, otherwise the record is appended. The result is sorted by
/// month descending, which is the order histories are persisted and
/// served in. Validation failures leave the history untouched.
pub fn upsert_payment(history: &[Payment], input: &RecordPaymentInput) -> AppResult<Vec<Payment>> {
    let record = validate_payment(input)?;

    let mut next = history.to_vec();
    match next.iter_mut().find(|entry| entry.month == record.month) {
        Some(existing) => *existing = record,
        None => next.push(record),
    }
    next.sort_by(|a, b| b.month.cmp(&a.month));
    Ok(next)
}

fn validate_payment(input: &RecordPaymentInput) -> AppResult<Payment> {
    let month: MonthKey = input.month.trim().parse()?;

    if !input.amount.is_finite() || input.amount < 0.0 {
        return Err(AppError::BadRequest(
            "Payment amount must be zero or positive.".to_string(),
        ));
    }

    let proof_url = input
        .proof_url
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if !proof_url.is_empty() {
        Url::parse(proof_url)
            .map_err(|_| AppError::BadRequest(format!("Invalid proof URL '{proof_url}'.")))?;
    }

    Ok(Payment {
        month,
        amount: input.amount,
        date: input.date,
        paid: input.paid,
        proof_url: proof_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::upsert_payment;
    use crate::models::Payment;
    use crate::schemas::RecordPaymentInput;

    fn payment(month: &str, amount: f64, paid: bool) -> Payment {
        Payment {
            month: month.parse().unwrap(),
            amount,
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            paid,
            proof_url: String::new(),
        }
    }

    fn input(month: &str, amount: f64) -> RecordPaymentInput {
        RecordPaymentInput {
            month: month.to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            paid: true,
            proof_url: None,
        }
    }

    #[test]
    fn appends_new_months_and_keeps_newest_first() {
        let history = vec![payment("2025-02", 5000.0, true)];
        let next = upsert_payment(&history, &input("2025-01", 5000.0)).unwrap();

        let months: Vec<String> = next.iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months, vec!["2025-02", "2025-01"]);
        assert_eq!(next.len(), history.len() + 1);
    }

    #[test]
    fn replaces_the_entry_with_the_same_month() {
        let history = vec![payment("2025-02", 5000.0, false), payment("2025-01", 5000.0, true)];
        let next = upsert_payment(&history, &input("2025-02", 5500.0)).unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next[0].month.to_string(), "2025-02");
        assert_eq!(next[0].amount, 5500.0);
        assert!(next[0].paid);
    }

    #[test]
    fn is_idempotent_for_the_same_submission() {
        let history = vec![payment("2025-03", 5000.0, true)];
        let once = upsert_payment(&history, &input("2025-03", 5200.0)).unwrap();
        let twice = upsert_payment(&once, &input("2025-03", 5200.0)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn sorts_an_unsorted_history() {
        let history = vec![
            payment("2024-12", 4800.0, true),
            payment("2025-03", 5000.0, false),
            payment("2025-01", 5000.0, true),
        ];
        let next = upsert_payment(&history, &input("2025-02", 5000.0)).unwrap();

        let months: Vec<String> = next.iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months, vec!["2025-03", "2025-02", "2025-01", "2024-12"]);
    }

    #[test]
    fn never_produces_duplicate_months() {
        let history = vec![payment("2025-02", 5000.0, true)];
        let next = upsert_payment(&history, &input("2025-02", 5000.0)).unwrap();
        let with_same_month = next
            .iter()
            .filter(|p| p.month.to_string() == "2025-02")
            .count();
        assert_eq!(with_same_month, 1);
    }

    #[test]
    fn rejects_bad_inputs_without_touching_history() {
        let history = vec![payment("2025-02", 5000.0, true)];

        let mut bad_month = input("2025-2", 5000.0);
        assert!(upsert_payment(&history, &bad_month).is_err());
        bad_month.month = "not-a-month".to_string();
        assert!(upsert_payment(&history, &bad_month).is_err());

        assert!(upsert_payment(&history, &input("2025-03", -1.0)).is_err());

        let mut bad_url = input("2025-03", 5000.0);
        bad_url.proof_url = Some("not a url".to_string());
        assert!(upsert_payment(&history, &bad_url).is_err());

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 5000.0);
    }

    #[test]
    fn accepts_valid_proof_urls_and_blank_ones() {
        let mut with_proof = input("2025-04", 5000.0);
        with_proof.proof_url = Some("https://example.com/receipts/april.png".to_string());
        let next = upsert_payment(&[], &with_proof).unwrap();
        assert_eq!(next[0].proof_url, "https://example.com/receipts/april.png");

        let mut blank = input("2025-05", 5000.0);
        blank.proof_url = Some("   ".to_string());
        let next = upsert_payment(&[], &blank).unwrap();
        assert_eq!(next[0].proof_url, "");
    }
}
