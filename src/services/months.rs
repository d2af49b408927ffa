use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month in "YYYY-MM" form.
///
/// The zero-padded encoding makes lexicographic order on the wire agree
/// with chronological order, so stored histories and filters can compare
/// keys as plain strings. Parsing is strict: four digits, a dash, two
/// digits, month 01-12. Nothing else round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short label for dropdowns and report rows, e.g. "Jan 2025".
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_LABELS[(self.month - 1) as usize], self.year)
    }

    fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl FromStr for MonthKey {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid =
            || AppError::BadRequest(format!("Invalid month '{raw}'. Expected \"YYYY-MM\"."));

        let bytes = raw.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        if !bytes[..4].iter().all(u8::is_ascii_digit)
            || !bytes[5..].iter().all(u8::is_ascii_digit)
        {
            return Err(invalid());
        }

        let year: i32 = raw[..4].parse().map_err(|_| invalid())?;
        let month: u32 = raw[5..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Every month a tenant owes rent for: the join month through the current
/// month inclusive, newest first. A join month after the current month is
/// not an error; the tenant simply owes nothing yet.
pub fn billing_months(join_date: NaiveDate, today: NaiveDate) -> Vec<MonthKey> {
    let start = MonthKey::from_date(join_date);
    let end = MonthKey::from_date(today);
    if start > end {
        return Vec::new();
    }

    let mut months = Vec::new();
    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.next();
    }
    months.reverse();
    months
}

/// The current month and the `count - 1` months before it, newest first.
pub fn recent_months(today: NaiveDate, count: usize) -> Vec<MonthKey> {
    let mut months = Vec::with_capacity(count);
    let mut current = MonthKey::from_date(today);
    for _ in 0..count {
        months.push(current);
        current = current.prev();
    }
    months
}
