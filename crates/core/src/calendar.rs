//! Shared period calendar — fixed quarter boundaries and calendar-month
//! arithmetic used by every reporting component.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::types::PeriodWindow;

/// A calendar quarter with fixed boundaries:
/// Q1 Jan 1 – Mar 31, Q2 Apr 1 – Jun 30, Q3 Jul 1 – Sep 30, Q4 Oct 1 – Dec 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn start_month(self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 4,
            Quarter::Q3 => 7,
            Quarter::Q4 => 10,
        }
    }

    pub fn months(self) -> [u32; 3] {
        let m = self.start_month();
        [m, m + 1, m + 2]
    }

    /// The inclusive date window this quarter covers in the given year.
    pub fn window(self, year: i32) -> PeriodWindow {
        let start = month_start(year, self.start_month());
        let end = match self {
            Quarter::Q4 => month_start(year + 1, 1).pred_opt().unwrap_or(start),
            _ => month_start(year, self.start_month() + 3)
                .pred_opt()
                .unwrap_or(start),
        };
        PeriodWindow::new(start, end)
    }

    /// The immediately preceding quarter, crossing the year boundary for Q1.
    pub fn preceding(self, year: i32) -> (i32, Quarter) {
        match self {
            Quarter::Q1 => (year - 1, Quarter::Q4),
            Quarter::Q2 => (year, Quarter::Q1),
            Quarter::Q3 => (year, Quarter::Q2),
            Quarter::Q4 => (year, Quarter::Q3),
        }
    }

    pub fn for_date(date: NaiveDate) -> Quarter {
        match date.month() {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// Label for a quarterly summary row, e.g. `2025-Q1`.
    pub fn period_label(self, year: i32) -> String {
        format!("{year}-{self}")
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        };
        f.write_str(s)
    }
}

impl FromStr for Quarter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "Q1" => Ok(Quarter::Q1),
            "Q2" => Ok(Quarter::Q2),
            "Q3" => Ok(Quarter::Q3),
            "Q4" => Ok(Quarter::Q4),
            other => Err(DashboardError::InvalidPeriod(format!(
                "unknown quarter label: {other}"
            ))),
        }
    }
}

/// Shift a date back one calendar month, clamping the day when the target
/// month is shorter (Mar 31 -> Feb 28/29).
pub fn shift_back_one_month(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(1)).unwrap_or(date)
}

fn month_start(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 here
    NaiveDate::from_ymd_opt(year, month, 1).expect("first day of month is a valid date")
}
