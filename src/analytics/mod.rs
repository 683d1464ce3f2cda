//! Canned aggregations over a normalized board.
//!
//! Every routine is pure: it reads a [`Table`](crate::table::Table) and
//! returns a fresh result. Ordering ties are always broken by the order in
//! which a category was first encountered on the board.

pub mod aggregate;
pub mod delays;
pub mod health;
pub mod portfolio;

pub use aggregate::{aggregate, Breakdown};
pub use delays::{
    delays, DelayReport, OverdueRecord, CLOSED_STATUSES, DEFAULT_DELAY_THRESHOLD_DAYS,
};
pub use health::data_health;
pub use portfolio::{
    portfolio_metrics, sector_performance, stage_distribution, PortfolioMetrics, SectorRow,
};

/// Aggregation applied per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Number of records.
    Count,
    /// Total `Value`.
    Sum,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Sum => "sum",
        }
    }
}
