//! Read-only queryable store collaborator. The analytics core issues
//! only read queries against two relation kinds: transaction-grain rows
//! and pre-aggregated summary rows.

pub mod filter;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use opsdash_core::error::DashResult;
use opsdash_core::types::{SummaryRow, TransactionRecord};

use crate::filter::{SummaryFilter, TransactionFilter};

pub use memory::MemoryStore;

/// Queryable tabular store supporting equality/range/inclusion filters,
/// ordering, and both row-returning and count-only query modes.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn fetch_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> DashResult<Vec<TransactionRecord>>;

    async fn fetch_summaries(&self, filter: &SummaryFilter) -> DashResult<Vec<SummaryRow>>;

    async fn count_transactions(&self, filter: &TransactionFilter) -> DashResult<u64>;

    /// Latest transaction date present for a currency, used to clip an
    /// in-progress quarter.
    async fn max_transaction_date(&self, currency: &str) -> DashResult<Option<NaiveDate>>;
}
