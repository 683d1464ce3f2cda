//! Overdue detection against each record's target date.

use chrono::NaiveDate;

use crate::error::BoardError;
use crate::table::{Field, Record, Table};

/// Used when the question names no threshold.
pub const DEFAULT_DELAY_THRESHOLD_DAYS: i64 = 30;

/// Statuses that are finished and can never be overdue.
pub const CLOSED_STATUSES: &[&str] = &["done", "won", "closed", "completed", "paid", "billed"];

#[derive(Debug, Clone, PartialEq)]
pub struct OverdueRecord {
    pub record: Record,
    pub overdue_days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelayReport {
    pub threshold_days: i64,
    pub overdue_count: usize,
    /// Records with a missing or unparseable date.
    pub undated_count: usize,
    /// Most overdue first.
    pub overdue: Vec<OverdueRecord>,
}

pub fn is_closed_status(status: &str) -> bool {
    let s = status.trim();
    CLOSED_STATUSES.iter().any(|c| s.eq_ignore_ascii_case(c))
}

/// Records more than `threshold_days` past their date as of `today`.
///
/// Closed statuses are skipped regardless of how late they are. The
/// comparison is strict: a record exactly `threshold_days` late is not
/// overdue.
pub fn delays(
    table: &Table,
    threshold_days: i64,
    today: NaiveDate,
) -> Result<DelayReport, BoardError> {
    if !table.has(Field::Date) {
        return Err(BoardError::MissingDateColumn);
    }

    let mut undated_count = 0;
    let mut overdue = Vec::new();
    for record in &table.records {
        let Some(date) = record.date else {
            undated_count += 1;
            continue;
        };
        let overdue_days = (today - date).num_days();
        if overdue_days > threshold_days && !is_closed_status(&record.status) {
            overdue.push(OverdueRecord {
                record: record.clone(),
                overdue_days,
            });
        }
    }

    overdue.sort_by(|a, b| b.overdue_days.cmp(&a.overdue_days));

    Ok(DelayReport {
        threshold_days,
        overdue_count: overdue.len(),
        undated_count,
        overdue,
    })
}
