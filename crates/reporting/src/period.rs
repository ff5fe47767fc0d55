//! Period resolution — turns a reporting mode plus the maximum observed
//! date into the current window, the comparison window, and the
//! reactivation baseline window.

use chrono::Duration;

use opsdash_core::calendar::shift_back_one_month;
use opsdash_core::error::{DashResult, DashboardError};
use opsdash_core::types::{ComparisonMode, PeriodWindow, ReportMode};

/// Fully resolved reporting windows for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriods {
    /// The requested window at full extent (quarter boundaries in
    /// quarterly mode).
    pub current: PeriodWindow,
    /// `current` with the end clipped to the max observed date; this is
    /// the window actual aggregation runs over.
    pub clipped: PeriodWindow,
    /// Comparison window for retention/churn and period-over-period KPIs.
    pub previous: PeriodWindow,
    /// Baseline window for reactivation: the same number of elapsed days
    /// immediately preceding the current start.
    pub reactivation_previous: PeriodWindow,
    pub comparison_mode: ComparisonMode,
}

/// Resolve the reporting windows. Pure and idempotent: identical inputs
/// always yield identical windows.
pub fn resolve(
    mode: ReportMode,
    max_observed: chrono::NaiveDate,
) -> DashResult<ResolvedPeriods> {
    match mode {
        ReportMode::Daily { start, end } => {
            if end < start {
                return Err(DashboardError::InvalidPeriod(format!(
                    "end date {end} precedes start date {start}"
                )));
            }
            let current = PeriodWindow::new(start, end);
            // Both endpoints shift back one calendar month independently;
            // unequal window lengths are accepted, not corrected.
            let previous =
                PeriodWindow::new(shift_back_one_month(start), shift_back_one_month(end));
            Ok(ResolvedPeriods {
                current,
                clipped: current,
                previous,
                reactivation_previous: preceding_elapsed_window(current),
                comparison_mode: ComparisonMode::DateToDate,
            })
        }
        ReportMode::Quarterly { year, quarter } => {
            let current = quarter.window(year);
            let (prev_year, prev_quarter) = quarter.preceding(year);
            let prev_full = prev_quarter.window(prev_year);

            if max_observed >= current.end {
                // Complete quarter: compare against the full prior quarter
                // via its pre-aggregated summary.
                Ok(ResolvedPeriods {
                    current,
                    clipped: current,
                    previous: prev_full,
                    reactivation_previous: preceding_elapsed_window(current),
                    comparison_mode: ComparisonMode::QuarterToQuarter,
                })
            } else {
                // In-progress quarter: compare equivalent elapsed-day
                // windows using daily rows.
                let clipped = current.clip_end(max_observed);
                let elapsed = clipped.elapsed_days();
                let prev_end =
                    (prev_full.start + Duration::days(elapsed - 1)).min(prev_full.end);
                let previous = PeriodWindow::new(prev_full.start, prev_end);
                Ok(ResolvedPeriods {
                    current,
                    clipped,
                    previous,
                    reactivation_previous: preceding_elapsed_window(clipped),
                    comparison_mode: ComparisonMode::DateToDate,
                })
            }
        }
    }
}

fn preceding_elapsed_window(window: PeriodWindow) -> PeriodWindow {
    let days = window.elapsed_days();
    PeriodWindow::new(
        window.start - Duration::days(days),
        window.start - Duration::days(1),
    )
}
