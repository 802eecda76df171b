// 📊 Monthly Reporting
// Calendar periods, UTC windows and aggregated totals

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::db::Direction;
use crate::error::{LedgerError, Result};

// ============================================================================
// PERIOD
// ============================================================================

/// A calendar month, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod(format!(
                "month {} is outside 1-12",
                month
            )));
        }

        let period = Period { year, month };
        // Rejects years chrono cannot represent, including the rollover year.
        // Must run before any caller can reach next(), which assumes year + 1 fits.
        period.window()?;
        Ok(period)
    }

    /// Month containing the current UTC instant
    pub fn current() -> Self {
        let now = Utc::now();
        Period {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month after this one (December rolls into January)
    pub fn next(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }

    /// Half-open `[first day 00:00 UTC, first day of next month 00:00 UTC)`
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = month_start(self.year, self.month)?;
        let (next_year, next_month) = self.next();
        let end = month_start(next_year, next_month)?;
        Ok((start, end))
    }
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| LedgerError::InvalidPeriod(format!("{}-{:02} is not representable", year, month)))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`
impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidPeriod(format!("expected YYYY-MM, got {:?}", s));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;

        Period::new(year, month)
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Sum of amounts for one (direction, label) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    pub direction: Direction,
    pub label: String,
    pub total: f64,
}

/// Aggregates for one owner over one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub period: Period,

    /// Directions with no transactions in the window are absent
    pub totals: BTreeMap<Direction, f64>,

    /// Sorted by descending total, then direction, then label
    pub by_label: Vec<LabelTotal>,
}

impl MonthlyReport {
    pub fn total(&self, direction: Direction) -> f64 {
        self.totals.get(&direction).copied().unwrap_or(0.0)
    }

    pub fn income(&self) -> f64 {
        self.total(Direction::Income)
    }

    pub fn expense(&self) -> f64 {
        self.total(Direction::Expense)
    }

    pub fn balance(&self) -> f64 {
        self.income() - self.expense()
    }

    /// No transactions in the window (distinct from a failed query)
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}
