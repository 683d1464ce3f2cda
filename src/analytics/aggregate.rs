//! Ad-hoc single-level grouping: count or sum of `Value` per category.

use std::collections::HashMap;

use super::Metric;
use crate::error::BoardError;
use crate::table::{Field, Table};

/// Dimensions tried, in order, when the requested one is unusable.
pub const FALLBACK_DIMENSIONS: [Field; 3] = [Field::Status, Field::Group, Field::Item];

/// Result of grouping a table by one categorical field.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub dimension: Field,
    pub metric: Metric,
    /// (category, count or total), highest first.
    pub rows: Vec<(String, f64)>,
}

impl Breakdown {
    pub fn top(&self) -> Option<&(String, f64)> {
        self.rows.first()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|(_, v)| v).sum()
    }
}

/// Group `table` by `dimension` and apply `metric`.
///
/// Falls back through Status → Group → Item when `dimension` is missing,
/// not categorical, or not on the board. Groups are ordered by descending
/// value; equal values keep first-encountered order.
pub fn aggregate(
    table: &Table,
    dimension: Option<Field>,
    metric: Metric,
) -> Result<Breakdown, BoardError> {
    if table.is_empty() {
        return Err(BoardError::NoRecords);
    }

    let dimension = resolve_dimension(table, dimension)?;

    let metric = if metric == Metric::Sum && !table.has(Field::Value) {
        log::warn!("No Value column; counting instead of summing");
        Metric::Count
    } else {
        metric
    };

    let mut rows: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in &table.records {
        let key = record.text(dimension).unwrap_or(crate::table::UNKNOWN);
        let amount = match metric {
            Metric::Count => 1.0,
            Metric::Sum => record.value,
        };
        match index.get(key) {
            Some(&i) => rows[i].1 += amount,
            None => {
                index.insert(key, rows.len());
                rows.push((key.to_string(), amount));
            }
        }
    }

    if let Some((category, _)) = rows.iter().find(|(_, v)| !v.is_finite()) {
        return Err(BoardError::AnalysisFailure(format!(
            "total for '{}' is not a finite number",
            category
        )));
    }

    // Stable sort keeps first-encountered order for ties.
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(Breakdown {
        dimension,
        metric,
        rows,
    })
}

fn resolve_dimension(table: &Table, requested: Option<Field>) -> Result<Field, BoardError> {
    if let Some(field) = requested {
        if field.is_categorical() && table.has(field) {
            return Ok(field);
        }
        log::debug!("Dimension {} unavailable, falling back", field);
    }
    FALLBACK_DIMENSIONS
        .iter()
        .copied()
        .find(|f| table.has(*f))
        .ok_or_else(|| {
            let last = FALLBACK_DIMENSIONS[FALLBACK_DIMENSIONS.len() - 1];
            BoardError::ColumnNotFound(last.canonical().to_string())
        })
}
