//! Business-performance KPI and cohort analytics for the operations
//! dashboard — period resolution, cohort set operations, KPI derivation,
//! and chart/flow-graph structure building.

pub mod charts;
pub mod cohort;
pub mod dashboard;
pub mod kpi;
pub mod period;
pub mod sankey;

pub use dashboard::{build_dashboard, DashboardRequest, DashboardResponse};
pub use kpi::KpiSnapshot;
pub use period::ResolvedPeriods;
pub use sankey::SankeyGraph;
