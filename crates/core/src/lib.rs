//! Shared types, period calendar, configuration, and errors for the
//! operations dashboard analytics workspace.

pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{DashResult, DashboardError};
