//! Query filters for the two relation kinds. A filter carries every
//! predicate the core needs; store implementations translate it into
//! their native query form.

use chrono::NaiveDate;
use opsdash_core::types::{PeriodWindow, SummaryRow, TransactionRecord};

/// Predicates over transaction-grain rows.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub currency: Option<String>,
    pub brand: Option<String>,
    /// Inclusion filter; ignored when `brand` is set.
    pub brands: Option<Vec<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_deposit_cases: Option<i64>,
    pub order_by_date: bool,
}

impl TransactionFilter {
    /// Depositing rows for a currency inside an inclusive window,
    /// optionally narrowed to one brand.
    pub fn depositors(currency: &str, brand: Option<&str>, window: PeriodWindow) -> Self {
        Self {
            currency: Some(currency.to_string()),
            brand: brand.map(str::to_string),
            date_from: Some(window.start),
            date_to: Some(window.end),
            min_deposit_cases: Some(1),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(currency) = &self.currency {
            if &record.currency != currency {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if &record.brand != brand {
                return false;
            }
        } else if let Some(brands) = &self.brands {
            if !brands.contains(&record.brand) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }
        if let Some(min) = self.min_deposit_cases {
            if record.deposit_cases < min {
                return false;
            }
        }
        true
    }
}

/// Predicates over pre-aggregated summary rows.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub currency: Option<String>,
    pub brand: Option<String>,
    pub period_label: Option<String>,
    /// Inclusion filter; ignored when `period_label` is set.
    pub period_labels: Option<Vec<String>>,
}

impl SummaryFilter {
    pub fn for_periods(currency: &str, labels: Vec<String>) -> Self {
        Self {
            currency: Some(currency.to_string()),
            period_labels: Some(labels),
            ..Self::default()
        }
    }

    pub fn matches(&self, row: &SummaryRow) -> bool {
        if let Some(currency) = &self.currency {
            if &row.currency != currency {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if &row.brand != brand {
                return false;
            }
        }
        if let Some(label) = &self.period_label {
            if &row.period_label != label {
                return false;
            }
        } else if let Some(labels) = &self.period_labels {
            if !labels.contains(&row.period_label) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(brand: &str, date: NaiveDate, deposit_cases: i64) -> TransactionRecord {
        TransactionRecord {
            user_key: "u1".into(),
            unique_code: "c1".into(),
            currency: "MYR".into(),
            brand: brand.into(),
            date,
            deposit_amount: 100.0,
            deposit_cases,
            withdraw_amount: 0.0,
            withdraw_cases: 0,
            bonus: 0.0,
            add_bonus: 0.0,
            deduct_bonus: 0.0,
            first_deposit_date: None,
        }
    }

    #[test]
    fn depositors_filter_applies_window_and_threshold() {
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 31));
        let filter = TransactionFilter::depositors("MYR", None, window);

        assert!(filter.matches(&record("X", d(2025, 1, 15), 2)));
        assert!(!filter.matches(&record("X", d(2025, 2, 1), 2)));
        assert!(!filter.matches(&record("X", d(2025, 1, 15), 0)));
    }

    #[test]
    fn brand_equality_beats_inclusion_list() {
        let filter = TransactionFilter {
            brand: Some("X".into()),
            brands: Some(vec!["Y".into()]),
            ..TransactionFilter::default()
        };
        assert!(filter.matches(&record("X", d(2025, 1, 1), 1)));
        assert!(!filter.matches(&record("Y", d(2025, 1, 1), 1)));
    }

    #[test]
    fn summary_filter_matches_label_inclusion() {
        let filter = SummaryFilter::for_periods("MYR", vec!["2025-Q1".into()]);
        let row = SummaryRow {
            currency: "MYR".into(),
            period_label: "2025-Q1".into(),
            ..SummaryRow::default()
        };
        assert!(filter.matches(&row));
        let other = SummaryRow {
            currency: "MYR".into(),
            period_label: "2024-Q4".into(),
            ..SummaryRow::default()
        };
        assert!(!filter.matches(&other));
    }
}
