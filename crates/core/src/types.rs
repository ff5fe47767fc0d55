//! Typed row shapes and period primitives. Raw store rows are converted
//! into these records once at the ingestion boundary, never per access
//! site.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Quarter;

/// Brand value marking the cross-brand total row in summary tables.
pub const ALL_BRANDS: &str = "ALL";

/// One transaction-grain row: per user, per day, per brand.
///
/// `unique_code` identifies a person across brands; `user_key` identifies
/// an account within one brand + currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub user_key: String,
    pub unique_code: String,
    pub currency: String,
    pub brand: String,
    pub date: NaiveDate,
    pub deposit_amount: f64,
    pub deposit_cases: i64,
    pub withdraw_amount: f64,
    pub withdraw_cases: i64,
    pub bonus: f64,
    pub add_bonus: f64,
    pub deduct_bonus: f64,
    /// Earliest deposit date ever recorded for this account.
    pub first_deposit_date: Option<NaiveDate>,
}

/// One pre-aggregated summary row per (currency, brand, period).
///
/// `period_label` is a date string (`2025-01-07`) for daily rows or a
/// quarter label (`2025-Q1`) for quarterly rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub period_label: String,
    pub currency: String,
    pub brand: String,
    pub deposit_amount: f64,
    pub deposit_cases: i64,
    pub withdraw_amount: f64,
    pub withdraw_cases: i64,
    pub ggr: f64,
    pub net_profit: f64,
    pub bonus: f64,
    pub add_bonus: f64,
    pub deduct_bonus: f64,
    pub valid_amount: f64,
    pub new_register: i64,
    pub new_depositor: i64,
    pub target_ggr: f64,
}

impl SummaryRow {
    pub fn is_all_brands(&self) -> bool {
        self.brand == ALL_BRANDS
    }
}

/// An inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Calendar days covered, inclusive of both endpoints.
    pub fn elapsed_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Clip the end to the maximum observed date, never before the start.
    pub fn clip_end(&self, max_observed: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: self.end.min(max_observed).max(self.start),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// How the previous period is compared against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonMode {
    /// Pre-aggregated summary of the prior complete quarter.
    QuarterToQuarter,
    /// Daily rows over an equivalent elapsed-day window.
    DateToDate,
}

/// The requested reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportMode {
    Daily { start: NaiveDate, end: NaiveDate },
    Quarterly { year: i32, quarter: Quarter },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn elapsed_days_is_inclusive() {
        let w = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 10));
        assert_eq!(w.elapsed_days(), 10);
        let one_day = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 1));
        assert_eq!(one_day.elapsed_days(), 1);
    }

    #[test]
    fn clip_end_respects_max_observed() {
        let w = PeriodWindow::new(d(2025, 1, 1), d(2025, 3, 31));
        assert_eq!(w.clip_end(d(2025, 2, 10)).end, d(2025, 2, 10));
        assert_eq!(w.clip_end(d(2025, 6, 1)).end, d(2025, 3, 31));
        // max observed before the window start never inverts the window
        assert_eq!(w.clip_end(d(2024, 12, 1)).end, d(2025, 1, 1));
    }

    #[test]
    fn comparison_mode_serializes_as_screaming_snake() {
        let json = serde_json::to_string(&ComparisonMode::QuarterToQuarter).unwrap();
        assert_eq!(json, "\"QUARTER_TO_QUARTER\"");
        let json = serde_json::to_string(&ComparisonMode::DateToDate).unwrap();
        assert_eq!(json, "\"DATE_TO_DATE\"");
    }

    #[test]
    fn all_brands_row_detection() {
        let row = SummaryRow {
            brand: ALL_BRANDS.to_string(),
            ..SummaryRow::default()
        };
        assert!(row.is_all_brands());
        assert!(!SummaryRow::default().is_all_brands());
    }
}
