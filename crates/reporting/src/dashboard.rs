//! Dashboard composition — resolves the reporting windows, issues the
//! fetches, and merges KPIs, cohorts, charts, and the sankey graph into
//! one response.
//!
//! Only the primary current-period financial summary is fail-fast; every
//! secondary enrichment degrades to its neutral value on failure and is
//! recorded in `degraded_sections`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use opsdash_core::calendar::Quarter;
use opsdash_core::config::ReportingConfig;
use opsdash_core::error::{DashResult, DashboardError};
use opsdash_core::types::{ComparisonMode, PeriodWindow, ReportMode};
use opsdash_store::filter::{SummaryFilter, TransactionFilter};
use opsdash_store::MetricsStore;

use crate::charts::{self, CategoryAxis, ChartData};
use crate::cohort::{self, CohortMetrics, CohortScope};
use crate::kpi::{self, KpiInputs, KpiSnapshot};
use crate::period::{self, ResolvedPeriods};
use crate::sankey::{self, SankeyGraph};

#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub currency: String,
    pub mode: ReportMode,
}

impl DashboardRequest {
    /// Build a request from raw dashboard parameters: an explicit date
    /// range when the flag is set, otherwise the given year + quarter
    /// label.
    pub fn from_params(
        currency: &str,
        year: i32,
        quarter: &str,
        use_date_range: bool,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DashResult<Self> {
        let mode = if use_date_range {
            let (start, end) = start.zip(end).ok_or_else(|| {
                DashboardError::InvalidPeriod(
                    "explicit date range requires both start and end dates".to_string(),
                )
            })?;
            ReportMode::Daily { start, end }
        } else {
            ReportMode::Quarterly {
                year,
                quarter: quarter.parse()?,
            }
        };
        Ok(Self {
            currency: currency.to_string(),
            mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousPeriod {
    pub resolved_start: NaiveDate,
    pub resolved_end: NaiveDate,
    pub comparison_mode: ComparisonMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub kpis: KpiSnapshot,
    pub daily_average: BTreeMap<String, f64>,
    pub comparison: BTreeMap<String, f64>,
    pub charts: BTreeMap<String, ChartData>,
    pub sankey: SankeyGraph,
    pub previous_period: PreviousPeriod,
    /// Sub-sections that fell back to neutral values after a fetch
    /// failure.
    pub degraded_sections: Vec<String>,
}

/// Compute the full dashboard for one request. Independent fetches run
/// concurrently; previous-period figures are derived only after the
/// windows are resolved.
pub async fn build_dashboard<S: MetricsStore + ?Sized>(
    store: &S,
    config: &ReportingConfig,
    request: &DashboardRequest,
) -> DashResult<DashboardResponse> {
    let currency = request.currency.as_str();

    let max_observed = match store.max_transaction_date(currency).await {
        Ok(Some(date)) => date,
        Ok(None) => Utc::now().date_naive(),
        Err(e) => {
            warn!(error = %e, "max observed date unavailable, falling back to today");
            Utc::now().date_naive()
        }
    };

    let periods = period::resolve(request.mode, max_observed)?;

    // Primary current-period financial summary: a failure here aborts the
    // request.
    let current_summary_rows = store
        .fetch_summaries(&SummaryFilter::for_periods(
            currency,
            current_labels(request.mode, periods.clipped),
        ))
        .await?;

    let mut degraded: Vec<String> = Vec::new();
    let scope = CohortScope::currency(currency);

    let current_tx_filter = TransactionFilter::depositors(currency, None, periods.clipped);
    let previous_tx_filter = TransactionFilter::depositors(currency, None, periods.previous);
    let chart_tx_filter =
        TransactionFilter::depositors(currency, None, chart_window(request.mode, &periods));
    let previous_summary_filter =
        SummaryFilter::for_periods(currency, previous_labels(request.mode, &periods));
    let target_filter = SummaryFilter::for_periods(currency, target_labels(request.mode));

    let (current_tx, cohorts, previous_rows, previous_tx, chart_tx, target_rows) = tokio::join!(
        store.fetch_transactions(&current_tx_filter),
        cohort::compute_cohorts(
            store,
            &scope,
            periods.clipped,
            periods.previous,
            periods.reactivation_previous,
        ),
        store.fetch_summaries(&previous_summary_filter),
        store.fetch_transactions(&previous_tx_filter),
        store.fetch_transactions(&chart_tx_filter),
        store.fetch_summaries(&target_filter),
    );

    let current_tx = section("transactions", current_tx, &mut degraded);
    let cohorts = section("cohorts", cohorts, &mut degraded);
    let previous_rows = section("previousSummary", previous_rows, &mut degraded);
    let previous_tx = section("previousTransactions", previous_tx, &mut degraded);
    let chart_tx = section("charts", chart_tx, &mut degraded);
    let target_rows = section("targets", target_rows, &mut degraded);

    let target_by_period = kpi::target_totals_by_period(&target_rows);
    let current_target = target_by_period
        .get(&current_quarter_label(request.mode))
        .copied()
        .unwrap_or(0.0);

    // Missing summary row: an all-zero snapshot, not an error.
    let kpis = if current_summary_rows.iter().any(|r| r.is_all_brands()) {
        let summary = kpi::aggregate_all_brand_rows(&current_summary_rows);
        kpi::build_snapshot(&KpiInputs {
            summary: &summary,
            active_member: cohort::active_set(&current_tx).len() as u64,
            pure_user_ggr: cohort::pure_user_ggr(&current_tx),
            target_ggr_total: current_target,
            cohorts: &cohorts,
        })
    } else {
        KpiSnapshot::default()
    };

    let previous_kpis = if previous_rows.iter().any(|r| r.is_all_brands()) {
        let summary = kpi::aggregate_all_brand_rows(&previous_rows);
        let mut snapshot = kpi::build_snapshot(&KpiInputs {
            summary: &summary,
            active_member: cohort::active_set(&previous_tx).len() as u64,
            pure_user_ggr: cohort::pure_user_ggr(&previous_tx),
            target_ggr_total: 0.0,
            cohorts: &CohortMetrics::default(),
        });
        // Cohort rates are not re-derived for the comparison window;
        // their deltas compare against 0.
        snapshot.retention_rate = 0.0;
        snapshot.churn_rate = 0.0;
        snapshot.reactivation_rate = 0.0;
        snapshot
    } else {
        KpiSnapshot::default()
    };

    let axis = match request.mode {
        ReportMode::Daily { .. } => {
            CategoryAxis::daily(periods.clipped, &config.chart_date_format)
        }
        ReportMode::Quarterly { .. } => CategoryAxis::quarterly(),
    };

    let mut chart_map: BTreeMap<String, ChartData> = BTreeMap::new();
    chart_map.insert(
        "depositTrend".to_string(),
        charts::trend_chart(&axis, "Deposits", &chart_tx, |r| r.deposit_amount),
    );
    chart_map.insert(
        "ggrTrend".to_string(),
        charts::trend_chart(&axis, "GGR", &chart_tx, |r| {
            r.deposit_amount - r.withdraw_amount
        }),
    );
    chart_map.insert(
        "depositWithdraw".to_string(),
        charts::dual_axis_chart(
            &axis,
            ("Deposits", |r: &opsdash_core::types::TransactionRecord| {
                r.deposit_amount
            }),
            ("Withdrawals", |r: &opsdash_core::types::TransactionRecord| {
                r.withdraw_amount
            }),
            &chart_tx,
        ),
    );
    chart_map.insert(
        "brandDeposits".to_string(),
        charts::brand_breakdown_chart(&axis, &chart_tx, |r| r.deposit_amount),
    );
    chart_map.insert(
        "targetForecast".to_string(),
        match request.mode {
            ReportMode::Daily { .. } => charts::forecast_daily(&axis, current_target),
            ReportMode::Quarterly { year, .. } => {
                charts::forecast_quarterly(&target_by_period, year)
            }
        },
    );

    let sankey = sankey::build_brand_flow(&current_tx);

    let daily_average = kpi::daily_averages(&kpis, periods.clipped.elapsed_days());
    let comparison = kpi::comparisons(&kpis, &previous_kpis);

    Ok(DashboardResponse {
        kpis,
        daily_average,
        comparison,
        charts: chart_map,
        sankey,
        previous_period: PreviousPeriod {
            resolved_start: periods.previous.start,
            resolved_end: periods.previous.end,
            comparison_mode: periods.comparison_mode,
        },
        degraded_sections: degraded,
    })
}

/// Unwrap a secondary result, degrading to the neutral value on failure.
fn section<T: Default>(name: &str, result: DashResult<T>, degraded: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(section = name, error = %e, "dashboard section degraded to neutral value");
            degraded.push(name.to_string());
            T::default()
        }
    }
}

fn daily_labels(window: PeriodWindow) -> Vec<String> {
    window
        .start
        .iter_days()
        .take(window.elapsed_days() as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

fn current_labels(mode: ReportMode, clipped: PeriodWindow) -> Vec<String> {
    match mode {
        ReportMode::Quarterly { year, quarter } => vec![quarter.period_label(year)],
        ReportMode::Daily { .. } => daily_labels(clipped),
    }
}

fn previous_labels(mode: ReportMode, periods: &ResolvedPeriods) -> Vec<String> {
    match (mode, periods.comparison_mode) {
        (ReportMode::Quarterly { year, quarter }, ComparisonMode::QuarterToQuarter) => {
            let (prev_year, prev_quarter) = quarter.preceding(year);
            vec![prev_quarter.period_label(prev_year)]
        }
        _ => daily_labels(periods.previous),
    }
}

/// Quarterly targets live in quarterly summary rows regardless of mode:
/// all four quarters of the year in quarterly mode, the quarter
/// containing the range start in daily mode.
fn target_labels(mode: ReportMode) -> Vec<String> {
    match mode {
        ReportMode::Quarterly { year, .. } => Quarter::ALL
            .iter()
            .map(|q| q.period_label(year))
            .collect(),
        ReportMode::Daily { start, .. } => {
            vec![Quarter::for_date(start).period_label(start.year())]
        }
    }
}

fn current_quarter_label(mode: ReportMode) -> String {
    match mode {
        ReportMode::Quarterly { year, quarter } => quarter.period_label(year),
        ReportMode::Daily { start, .. } => Quarter::for_date(start).period_label(start.year()),
    }
}

/// Trend charts span the whole category axis: the selected range in daily
/// mode, the full year in quarterly mode (clipped by the resolver's max
/// observed date).
fn chart_window(mode: ReportMode, periods: &ResolvedPeriods) -> PeriodWindow {
    match mode {
        ReportMode::Daily { .. } => periods.clipped,
        ReportMode::Quarterly { year, .. } => PeriodWindow::new(
            Quarter::Q1.window(year).start,
            Quarter::Q4.window(year).end,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn request_from_explicit_date_range() {
        let req = DashboardRequest::from_params(
            "MYR",
            2025,
            "Q1",
            true,
            Some(d(2025, 1, 1)),
            Some(d(2025, 1, 10)),
        )
        .unwrap();
        assert!(matches!(req.mode, ReportMode::Daily { .. }));
    }

    #[test]
    fn request_requires_complete_range() {
        let result =
            DashboardRequest::from_params("MYR", 2025, "Q1", true, Some(d(2025, 1, 1)), None);
        assert!(result.is_err());
    }

    #[test]
    fn request_falls_back_to_quarter() {
        let req = DashboardRequest::from_params("MYR", 2025, "q2", false, None, None).unwrap();
        assert_eq!(
            req.mode,
            ReportMode::Quarterly {
                year: 2025,
                quarter: Quarter::Q2
            }
        );
    }

    #[test]
    fn daily_labels_cover_each_day() {
        let window = PeriodWindow::new(d(2025, 1, 30), d(2025, 2, 2));
        let labels = daily_labels(window);
        assert_eq!(labels, ["2025-01-30", "2025-01-31", "2025-02-01", "2025-02-02"]);
    }

    #[test]
    fn target_labels_follow_the_mode() {
        let quarterly = ReportMode::Quarterly {
            year: 2025,
            quarter: Quarter::Q2,
        };
        assert_eq!(
            target_labels(quarterly),
            ["2025-Q1", "2025-Q2", "2025-Q3", "2025-Q4"]
        );
        let daily = ReportMode::Daily {
            start: d(2025, 8, 1),
            end: d(2025, 8, 10),
        };
        assert_eq!(target_labels(daily), ["2025-Q3"]);
    }
}
