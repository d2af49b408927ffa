pub mod months;
pub mod rent_ledger;
pub mod rent_report;
