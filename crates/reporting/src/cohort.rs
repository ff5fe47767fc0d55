//! Cohort set operations — distinct active-identity sets per window and
//! the retention/churn/reactivation figures derived from them.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use opsdash_core::error::DashResult;
use opsdash_core::types::{PeriodWindow, TransactionRecord};
use opsdash_store::filter::TransactionFilter;
use opsdash_store::MetricsStore;

use crate::kpi::ratio;

/// Scope for a cohort query: currency plus optional brand.
#[derive(Debug, Clone)]
pub struct CohortScope {
    pub currency: String,
    pub brand: Option<String>,
}

impl CohortScope {
    pub fn currency(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            brand: None,
        }
    }

    pub fn brand(currency: &str, brand: &str) -> Self {
        Self {
            currency: currency.to_string(),
            brand: Some(brand.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMetrics {
    pub retention_members: u64,
    pub retention_rate: f64,
    /// Set-difference churn: previously active accounts with no deposit in
    /// the current window. The KPI snapshot separately reports churn as
    /// the retention complement.
    pub churn_members: u64,
    pub churn_rate: f64,
    pub reactivation_members: u64,
    pub reactivation_rate: f64,
}

/// Distinct accounts (`user_key`) with at least one deposit among the
/// given rows.
pub fn active_set(rows: &[TransactionRecord]) -> HashSet<String> {
    rows.iter()
        .filter(|r| r.deposit_cases > 0)
        .map(|r| r.user_key.clone())
        .collect()
}

/// Distinct persons (`unique_code`) with at least one deposit among the
/// given rows.
pub fn pure_set(rows: &[TransactionRecord]) -> HashSet<String> {
    rows.iter()
        .filter(|r| r.deposit_cases > 0)
        .map(|r| r.unique_code.clone())
        .collect()
}

/// Pure-user GGR: deposit minus withdraw grouped per `unique_code`, then
/// totalled.
pub fn pure_user_ggr(rows: &[TransactionRecord]) -> f64 {
    let mut per_user: HashMap<&str, f64> = HashMap::new();
    for row in rows.iter().filter(|r| r.deposit_cases > 0) {
        *per_user.entry(row.unique_code.as_str()).or_insert(0.0) +=
            row.deposit_amount - row.withdraw_amount;
    }
    per_user.values().sum()
}

/// Members retained from the previous window, with the rate against the
/// previous active count.
pub fn retention(current: &HashSet<String>, previous: &HashSet<String>) -> (u64, f64) {
    let members = current.intersection(previous).count() as u64;
    (members, ratio(members as f64, previous.len() as f64) * 100.0)
}

/// Set-difference churn: previously active, absent now.
pub fn churn(current: &HashSet<String>, previous: &HashSet<String>) -> (u64, f64) {
    let members = previous.difference(current).count() as u64;
    (members, ratio(members as f64, previous.len() as f64) * 100.0)
}

/// Lapsed users returning: active now, absent from the baseline window,
/// and first-ever deposit before the current window's start. Brand-new
/// depositors are excluded.
pub fn reactivation(
    current_rows: &[TransactionRecord],
    current: &HashSet<String>,
    baseline: &HashSet<String>,
    current_start: NaiveDate,
) -> (u64, f64) {
    let mut first_deposit: HashMap<&str, NaiveDate> = HashMap::new();
    for row in current_rows.iter().filter(|r| r.deposit_cases > 0) {
        if let Some(first) = row.first_deposit_date {
            first_deposit
                .entry(row.user_key.as_str())
                .and_modify(|d| *d = (*d).min(first))
                .or_insert(first);
        }
    }

    let members = current
        .iter()
        .filter(|user| !baseline.contains(*user))
        .filter(|user| {
            first_deposit
                .get(user.as_str())
                .is_some_and(|first| *first < current_start)
        })
        .count() as u64;

    (members, ratio(members as f64, current.len() as f64) * 100.0)
}

async fn fetch_depositors<S: MetricsStore + ?Sized>(
    store: &S,
    scope: &CohortScope,
    window: PeriodWindow,
) -> DashResult<Vec<TransactionRecord>> {
    let filter =
        TransactionFilter::depositors(&scope.currency, scope.brand.as_deref(), window);
    store.fetch_transactions(&filter).await
}

/// Compute the full retention/churn/reactivation trio. The three window
/// fetches are independent and issued concurrently.
pub async fn compute_cohorts<S: MetricsStore + ?Sized>(
    store: &S,
    scope: &CohortScope,
    current: PeriodWindow,
    previous: PeriodWindow,
    reactivation_previous: PeriodWindow,
) -> DashResult<CohortMetrics> {
    let (current_rows, previous_rows, baseline_rows) = tokio::join!(
        fetch_depositors(store, scope, current),
        fetch_depositors(store, scope, previous),
        fetch_depositors(store, scope, reactivation_previous),
    );
    let current_rows = current_rows?;
    let previous_rows = previous_rows?;
    let baseline_rows = baseline_rows?;

    let current_set = active_set(&current_rows);
    let previous_set = active_set(&previous_rows);
    let baseline_set = active_set(&baseline_rows);

    let (retention_members, retention_rate) = retention(&current_set, &previous_set);
    let (churn_members, churn_rate) = churn(&current_set, &previous_set);
    let (reactivation_members, reactivation_rate) =
        reactivation(&current_rows, &current_set, &baseline_set, current.start);

    Ok(CohortMetrics {
        retention_members,
        retention_rate,
        churn_members,
        churn_rate,
        reactivation_members,
        reactivation_rate,
    })
}
