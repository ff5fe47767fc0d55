//! KPI derivation — merges summary sums and cohort outputs into the full
//! metric snapshot, plus daily averages and period-over-period deltas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use opsdash_core::types::SummaryRow;

use crate::cohort::CohortMetrics;

/// Division that short-circuits to 0 on a zero denominator; KPI ratios
/// never produce NaN or infinity.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Period-over-period percentage change, defined as 0 when the previous
/// value is 0.
pub fn pct_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// One period's full metric snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub deposit_amount: f64,
    pub deposit_cases: f64,
    pub withdraw_amount: f64,
    pub withdraw_cases: f64,
    /// Headline GGR: the cross-identity pure-user figure, not the raw
    /// summary-row ggr column. The two may legitimately differ.
    pub gross_gaming_revenue: f64,
    pub net_profit: f64,
    pub bonus: f64,
    pub valid_amount: f64,
    pub active_member: f64,
    pub new_register: f64,
    pub new_depositor: f64,
    pub pure_active: f64,
    pub atv: f64,
    pub purchase_frequency: f64,
    pub ggr_user: f64,
    pub da_user: f64,
    /// Raw ratio, deliberately not multiplied by 100 unlike the adjacent
    /// rate KPIs.
    pub bonus_usage_rate: f64,
    pub winrate: f64,
    pub withdrawal_rate: f64,
    pub hold_percentage: f64,
    pub conversion_rate: f64,
    pub target_achieve_rate: f64,
    pub retention_rate: f64,
    pub churn_rate: f64,
    pub reactivation_rate: f64,
}

/// Inputs merged into one snapshot.
#[derive(Debug, Clone)]
pub struct KpiInputs<'a> {
    pub summary: &'a SummaryRow,
    pub active_member: u64,
    pub pure_user_ggr: f64,
    /// Target figures summed across every brand row for the period.
    pub target_ggr_total: f64,
    pub cohorts: &'a CohortMetrics,
}

pub fn build_snapshot(inputs: &KpiInputs<'_>) -> KpiSnapshot {
    let s = inputs.summary;
    let active = inputs.active_member as f64;
    let deposit_cases = s.deposit_cases as f64;

    KpiSnapshot {
        deposit_amount: s.deposit_amount,
        deposit_cases,
        withdraw_amount: s.withdraw_amount,
        withdraw_cases: s.withdraw_cases as f64,
        gross_gaming_revenue: inputs.pure_user_ggr,
        net_profit: s.net_profit,
        bonus: s.bonus,
        valid_amount: s.valid_amount,
        active_member: active,
        new_register: s.new_register as f64,
        new_depositor: s.new_depositor as f64,
        pure_active: active - s.new_depositor as f64,
        atv: ratio(s.deposit_amount, deposit_cases),
        purchase_frequency: ratio(deposit_cases, active),
        ggr_user: ratio(s.net_profit, active),
        da_user: ratio(s.deposit_amount, active),
        bonus_usage_rate: ratio(s.bonus + s.add_bonus - s.deduct_bonus, active),
        winrate: ratio(s.ggr, s.deposit_amount) * 100.0,
        withdrawal_rate: ratio(s.withdraw_cases as f64, deposit_cases) * 100.0,
        hold_percentage: ratio(s.net_profit, s.valid_amount) * 100.0,
        conversion_rate: ratio(s.new_depositor as f64, s.new_register as f64) * 100.0,
        target_achieve_rate: ratio(inputs.pure_user_ggr, inputs.target_ggr_total) * 100.0,
        retention_rate: inputs.cohorts.retention_rate,
        // Complement form at this call site; the cohort module exposes the
        // set-difference form separately.
        churn_rate: 100.0 - inputs.cohorts.retention_rate,
        reactivation_rate: inputs.cohorts.reactivation_rate,
    }
}

impl KpiSnapshot {
    /// Every KPI field, named as serialized.
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("depositAmount", self.deposit_amount),
            ("depositCases", self.deposit_cases),
            ("withdrawAmount", self.withdraw_amount),
            ("withdrawCases", self.withdraw_cases),
            ("grossGamingRevenue", self.gross_gaming_revenue),
            ("netProfit", self.net_profit),
            ("bonus", self.bonus),
            ("validAmount", self.valid_amount),
            ("activeMember", self.active_member),
            ("newRegister", self.new_register),
            ("newDepositor", self.new_depositor),
            ("pureActive", self.pure_active),
            ("atv", self.atv),
            ("purchaseFrequency", self.purchase_frequency),
            ("ggrUser", self.ggr_user),
            ("daUser", self.da_user),
            ("bonusUsageRate", self.bonus_usage_rate),
            ("winrate", self.winrate),
            ("withdrawalRate", self.withdrawal_rate),
            ("holdPercentage", self.hold_percentage),
            ("conversionRate", self.conversion_rate),
            ("targetAchieveRate", self.target_achieve_rate),
            ("retentionRate", self.retention_rate),
            ("churnRate", self.churn_rate),
            ("reactivationRate", self.reactivation_rate),
        ]
    }
}

/// The additive KPIs that support a per-day average.
pub const ADDITIVE_KPIS: &[&str] = &[
    "depositAmount",
    "depositCases",
    "withdrawAmount",
    "withdrawCases",
    "grossGamingRevenue",
    "netProfit",
    "bonus",
    "validAmount",
    "newRegister",
    "newDepositor",
];

/// Per-day averages over the elapsed calendar days of the (clipped)
/// window.
pub fn daily_averages(snapshot: &KpiSnapshot, elapsed_days: i64) -> BTreeMap<String, f64> {
    let days = elapsed_days as f64;
    snapshot
        .fields()
        .into_iter()
        .filter(|(name, _)| ADDITIVE_KPIS.contains(name))
        .map(|(name, value)| (name.to_string(), ratio(value, days)))
        .collect()
}

/// Period-over-period percentage change for every KPI field.
pub fn comparisons(current: &KpiSnapshot, previous: &KpiSnapshot) -> BTreeMap<String, f64> {
    current
        .fields()
        .into_iter()
        .zip(previous.fields())
        .map(|((name, cur), (_, prev))| (name.to_string(), pct_change(cur, prev)))
        .collect()
}

/// Reduce summary rows into one total row by summing the cross-brand
/// ("ALL") rows across period labels.
pub fn aggregate_all_brand_rows(rows: &[SummaryRow]) -> SummaryRow {
    let mut total = SummaryRow::default();
    for row in rows.iter().filter(|r| r.is_all_brands()) {
        total.deposit_amount += row.deposit_amount;
        total.deposit_cases += row.deposit_cases;
        total.withdraw_amount += row.withdraw_amount;
        total.withdraw_cases += row.withdraw_cases;
        total.ggr += row.ggr;
        total.net_profit += row.net_profit;
        total.bonus += row.bonus;
        total.add_bonus += row.add_bonus;
        total.deduct_bonus += row.deduct_bonus;
        total.valid_amount += row.valid_amount;
        total.new_register += row.new_register;
        total.new_depositor += row.new_depositor;
    }
    total
}

/// Target GGR summed across every per-brand row (the "ALL" total row is
/// excluded so brands are not double-counted).
pub fn target_ggr_total(rows: &[SummaryRow]) -> f64 {
    rows.iter()
        .filter(|r| !r.is_all_brands())
        .map(|r| r.target_ggr)
        .sum()
}

/// Per-period target totals keyed by period label, from per-brand rows.
pub fn target_totals_by_period(rows: &[SummaryRow]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.is_all_brands()) {
        *totals.entry(row.period_label.clone()).or_insert(0.0) += row.target_ggr;
    }
    totals
}
