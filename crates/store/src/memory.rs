//! In-memory store used by tests and fixtures. Rows are owned vectors;
//! queries apply the filter predicates directly.

use async_trait::async_trait;
use chrono::NaiveDate;
use opsdash_core::error::DashResult;
use opsdash_core::types::{SummaryRow, TransactionRecord, ALL_BRANDS};

use crate::filter::{SummaryFilter, TransactionFilter};
use crate::MetricsStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Vec<TransactionRecord>,
    summaries: Vec<SummaryRow>,
}

impl MemoryStore {
    pub fn new(transactions: Vec<TransactionRecord>, summaries: Vec<SummaryRow>) -> Self {
        Self {
            transactions,
            summaries,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A small deterministic multi-brand dataset: three depositors across
    /// two brands in Q1 2025 (MYR), one of them active under both brands,
    /// with quarterly summary rows for 2025-Q1 and 2024-Q4.
    pub fn seeded() -> Self {
        let d = |m: u32, day: u32| {
            NaiveDate::from_ymd_opt(2025, m, day).expect("valid fixture date")
        };
        let tx = |user: &str, code: &str, brand: &str, date: NaiveDate, amount: f64| {
            TransactionRecord {
                user_key: user.to_string(),
                unique_code: code.to_string(),
                currency: "MYR".to_string(),
                brand: brand.to_string(),
                date,
                deposit_amount: amount,
                deposit_cases: 1,
                withdraw_amount: amount * 0.4,
                withdraw_cases: 1,
                bonus: 10.0,
                add_bonus: 0.0,
                deduct_bonus: 0.0,
                first_deposit_date: Some(
                    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid fixture date"),
                ),
            }
        };

        let transactions = vec![
            tx("acct-ax", "person-a", "X", d(1, 5), 500.0),
            tx("acct-ay", "person-a", "Y", d(1, 6), 300.0),
            tx("acct-bx", "person-b", "X", d(1, 10), 800.0),
            tx("acct-cy", "person-c", "Y", d(2, 2), 200.0),
        ];

        let summary = |label: &str, brand: &str, deposit: f64, target: f64| SummaryRow {
            period_label: label.to_string(),
            currency: "MYR".to_string(),
            brand: brand.to_string(),
            deposit_amount: deposit,
            deposit_cases: 4,
            withdraw_amount: deposit * 0.4,
            withdraw_cases: 2,
            ggr: deposit * 0.6,
            net_profit: deposit * 0.5,
            bonus: 40.0,
            add_bonus: 0.0,
            deduct_bonus: 0.0,
            valid_amount: deposit * 2.0,
            new_register: 10,
            new_depositor: 2,
            target_ggr: target,
        };

        let summaries = vec![
            summary("2025-Q1", ALL_BRANDS, 1800.0, 0.0),
            summary("2025-Q1", "X", 1300.0, 1500.0),
            summary("2025-Q1", "Y", 500.0, 700.0),
            summary("2024-Q4", ALL_BRANDS, 1500.0, 0.0),
            summary("2024-Q4", "X", 1000.0, 1400.0),
            summary("2024-Q4", "Y", 500.0, 600.0),
        ];

        Self::new(transactions, summaries)
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> DashResult<Vec<TransactionRecord>> {
        let mut rows: Vec<TransactionRecord> = self
            .transactions
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        if filter.order_by_date {
            rows.sort_by_key(|r| r.date);
        }
        Ok(rows)
    }

    async fn fetch_summaries(&self, filter: &SummaryFilter) -> DashResult<Vec<SummaryRow>> {
        Ok(self
            .summaries
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn count_transactions(&self, filter: &TransactionFilter) -> DashResult<u64> {
        Ok(self.transactions.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn max_transaction_date(&self, currency: &str) -> DashResult<Option<NaiveDate>> {
        Ok(self
            .transactions
            .iter()
            .filter(|r| r.currency == currency)
            .map(|r| r.date)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdash_core::types::PeriodWindow;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn fetch_respects_window_filter() {
        let store = MemoryStore::seeded();
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 31));
        let filter = TransactionFilter::depositors("MYR", None, window);
        let rows = store.fetch_transactions(&filter).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.date <= d(2025, 1, 31)));
    }

    #[tokio::test]
    async fn count_matches_fetch() {
        let store = MemoryStore::seeded();
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 3, 31));
        let filter = TransactionFilter::depositors("MYR", Some("Y"), window);
        let rows = store.fetch_transactions(&filter).await.unwrap();
        let count = store.count_transactions(&filter).await.unwrap();
        assert_eq!(rows.len() as u64, count);
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn max_date_scoped_by_currency() {
        let store = MemoryStore::seeded();
        assert_eq!(
            store.max_transaction_date("MYR").await.unwrap(),
            Some(d(2025, 2, 2))
        );
        assert_eq!(store.max_transaction_date("USD").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ordering_by_date() {
        let store = MemoryStore::seeded();
        let filter = TransactionFilter {
            currency: Some("MYR".into()),
            order_by_date: true,
            ..TransactionFilter::default()
        };
        let rows = store.fetch_transactions(&filter).await.unwrap();
        assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
