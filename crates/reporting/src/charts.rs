//! Chart data building — reshapes fetched rows into named
//! category/series structures for trend, dual-axis, and stacked
//! visualizations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use opsdash_core::calendar::Quarter;
use opsdash_core::types::{PeriodWindow, TransactionRecord, ALL_BRANDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// The category axis every series is aligned to: one slot per day in
/// daily mode, one per quarter label in quarterly mode.
#[derive(Debug, Clone)]
pub struct CategoryAxis {
    labels: Vec<String>,
    kind: AxisKind,
}

#[derive(Debug, Clone, Copy)]
enum AxisKind {
    Daily { start: NaiveDate },
    Quarterly,
}

impl CategoryAxis {
    pub fn daily(window: PeriodWindow, date_format: &str) -> Self {
        let labels = window
            .start
            .iter_days()
            .take(window.elapsed_days() as usize)
            .map(|d| d.format(date_format).to_string())
            .collect();
        Self {
            labels,
            kind: AxisKind::Daily {
                start: window.start,
            },
        }
    }

    pub fn quarterly() -> Self {
        Self {
            labels: Quarter::ALL.iter().map(|q| q.to_string()).collect(),
            kind: AxisKind::Quarterly,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        match self.kind {
            AxisKind::Daily { start } => {
                let offset = (date - start).num_days();
                (0..self.labels.len() as i64)
                    .contains(&offset)
                    .then_some(offset as usize)
            }
            AxisKind::Quarterly => Some(match Quarter::for_date(date) {
                Quarter::Q1 => 0,
                Quarter::Q2 => 1,
                Quarter::Q3 => 2,
                Quarter::Q4 => 3,
            }),
        }
    }
}

fn sum_into_axis<F>(axis: &CategoryAxis, rows: &[TransactionRecord], value: F) -> Vec<f64>
where
    F: Fn(&TransactionRecord) -> f64,
{
    let mut data = vec![0.0; axis.len()];
    for row in rows {
        if let Some(i) = axis.index_of(row.date) {
            data[i] += value(row);
        }
    }
    data
}

/// Single-series trend aligned to the axis.
pub fn trend_chart<F>(
    axis: &CategoryAxis,
    name: &str,
    rows: &[TransactionRecord],
    value: F,
) -> ChartData
where
    F: Fn(&TransactionRecord) -> f64,
{
    ChartData {
        categories: axis.labels().to_vec(),
        series: vec![Series {
            name: name.to_string(),
            data: sum_into_axis(axis, rows, value),
        }],
    }
}

/// Two series over one axis, for dual-axis rendering.
pub fn dual_axis_chart<F, G>(
    axis: &CategoryAxis,
    first: (&str, F),
    second: (&str, G),
    rows: &[TransactionRecord],
) -> ChartData
where
    F: Fn(&TransactionRecord) -> f64,
    G: Fn(&TransactionRecord) -> f64,
{
    ChartData {
        categories: axis.labels().to_vec(),
        series: vec![
            Series {
                name: first.0.to_string(),
                data: sum_into_axis(axis, rows, first.1),
            },
            Series {
                name: second.0.to_string(),
                data: sum_into_axis(axis, rows, second.1),
            },
        ],
    }
}

/// Distinct non-"ALL", non-empty brands with at least one qualifying
/// deposit, sorted alphabetically.
pub fn discover_brands(rows: &[TransactionRecord]) -> Vec<String> {
    let brands: BTreeSet<&str> = rows
        .iter()
        .filter(|r| r.deposit_cases > 0 && !r.brand.is_empty() && r.brand != ALL_BRANDS)
        .map(|r| r.brand.as_str())
        .collect();
    brands.into_iter().map(str::to_string).collect()
}

/// One series per discovered brand, densely aligned to the axis; missing
/// (brand, period) combinations are filled with 0.
pub fn brand_breakdown_chart<F>(
    axis: &CategoryAxis,
    rows: &[TransactionRecord],
    value: F,
) -> ChartData
where
    F: Fn(&TransactionRecord) -> f64,
{
    let series = discover_brands(rows)
        .into_iter()
        .map(|brand| {
            let data = sum_into_axis(
                axis,
                rows,
                |r| if r.brand == brand { value(r) } else { 0.0 },
            );
            Series { name: brand, data }
        })
        .collect();

    ChartData {
        categories: axis.labels().to_vec(),
        series,
    }
}

/// Daily forecast: the single per-quarter target total divided evenly by
/// the number of days in the selected range, producing a flat line.
pub fn forecast_daily(axis: &CategoryAxis, quarter_target: f64) -> ChartData {
    let per_day = if axis.is_empty() {
        0.0
    } else {
        quarter_target / axis.len() as f64
    };
    ChartData {
        categories: axis.labels().to_vec(),
        series: vec![Series {
            name: "Target".to_string(),
            data: vec![per_day; axis.len()],
        }],
    }
}

/// Quarterly forecast: one unsmoothed target total per quarter, looked up
/// by period label for the given year.
pub fn forecast_quarterly(targets_by_period: &BTreeMap<String, f64>, year: i32) -> ChartData {
    let axis = CategoryAxis::quarterly();
    let data = Quarter::ALL
        .iter()
        .map(|q| {
            targets_by_period
                .get(&q.period_label(year))
                .copied()
                .unwrap_or(0.0)
        })
        .collect();
    ChartData {
        categories: axis.labels().to_vec(),
        series: vec![Series {
            name: "Target".to_string(),
            data,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(brand: &str, date: NaiveDate, deposit: f64) -> TransactionRecord {
        TransactionRecord {
            user_key: "u".into(),
            unique_code: "c".into(),
            currency: "MYR".into(),
            brand: brand.into(),
            date,
            deposit_amount: deposit,
            deposit_cases: 1,
            withdraw_amount: deposit * 0.25,
            withdraw_cases: 1,
            bonus: 0.0,
            add_bonus: 0.0,
            deduct_bonus: 0.0,
            first_deposit_date: None,
        }
    }

    #[test]
    fn daily_axis_labels_and_indexing() {
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 10));
        let axis = CategoryAxis::daily(window, "%d/%m");
        assert_eq!(axis.len(), 10);
        assert_eq!(axis.labels()[0], "01/01");
        assert_eq!(axis.index_of(d(2025, 1, 3)), Some(2));
        assert_eq!(axis.index_of(d(2025, 1, 11)), None);
        assert_eq!(axis.index_of(d(2024, 12, 31)), None);
    }

    #[test]
    fn quarterly_axis_has_four_labels() {
        let axis = CategoryAxis::quarterly();
        assert_eq!(axis.labels(), ["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(axis.index_of(d(2025, 5, 10)), Some(1));
        assert_eq!(axis.index_of(d(2025, 11, 1)), Some(3));
    }

    #[test]
    fn trend_sums_per_category() {
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 3));
        let axis = CategoryAxis::daily(window, "%d/%m");
        let rows = vec![
            row("X", d(2025, 1, 1), 100.0),
            row("X", d(2025, 1, 1), 50.0),
            row("Y", d(2025, 1, 3), 25.0),
        ];
        let chart = trend_chart(&axis, "Deposits", &rows, |r| r.deposit_amount);
        assert_eq!(chart.series[0].data, vec![150.0, 0.0, 25.0]);
    }

    #[test]
    fn brand_breakdown_is_dense_and_sorted() {
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 2));
        let axis = CategoryAxis::daily(window, "%d/%m");
        let rows = vec![
            row("zeta", d(2025, 1, 1), 10.0),
            row("alpha", d(2025, 1, 2), 20.0),
            row(ALL_BRANDS, d(2025, 1, 1), 999.0),
            row("", d(2025, 1, 1), 999.0),
        ];
        let chart = brand_breakdown_chart(&axis, &rows, |r| r.deposit_amount);
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        // missing (brand, period) combinations fill with 0
        assert_eq!(chart.series[0].data, vec![0.0, 20.0]);
        assert_eq!(chart.series[1].data, vec![10.0, 0.0]);
    }

    #[test]
    fn discover_brands_requires_a_deposit() {
        let mut idle = row("idle", d(2025, 1, 1), 0.0);
        idle.deposit_cases = 0;
        let rows = vec![idle, row("X", d(2025, 1, 1), 10.0)];
        assert_eq!(discover_brands(&rows), ["X"]);
    }

    #[test]
    fn daily_forecast_is_flat() {
        // 10-day range, quarter target 9000 -> 900 flat.
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 10));
        let axis = CategoryAxis::daily(window, "%d/%m");
        let chart = forecast_daily(&axis, 9_000.0);
        assert_eq!(chart.categories.len(), 10);
        assert_eq!(chart.series[0].data, vec![900.0; 10]);
    }

    #[test]
    fn quarterly_forecast_is_unsmoothed_per_quarter() {
        let mut targets = BTreeMap::new();
        targets.insert("2025-Q1".to_string(), 9_000.0);
        targets.insert("2025-Q3".to_string(), 4_500.0);
        let chart = forecast_quarterly(&targets, 2025);
        assert_eq!(chart.series[0].data, vec![9_000.0, 0.0, 4_500.0, 0.0]);
    }

    #[test]
    fn dual_axis_series_share_the_axis() {
        let window = PeriodWindow::new(d(2025, 1, 1), d(2025, 1, 2));
        let axis = CategoryAxis::daily(window, "%d/%m");
        let rows = vec![row("X", d(2025, 1, 1), 100.0)];
        let chart = dual_axis_chart(
            &axis,
            ("Deposits", |r: &TransactionRecord| r.deposit_amount),
            ("Withdrawals", |r: &TransactionRecord| r.withdraw_amount),
            &rows,
        );
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].data, vec![100.0, 0.0]);
        assert_eq!(chart.series[1].data, vec![25.0, 0.0]);
    }
}
