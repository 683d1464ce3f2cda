//! Portfolio roll-ups used by the executive summary.

use std::collections::HashMap;

use crate::table::{Field, Table, UNKNOWN};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioMetrics {
    pub total_value: f64,
    /// 0 for an empty board.
    pub mean_value: f64,
    /// Σ weighted value; 0 when the board carries no probabilities.
    pub weighted_value: f64,
    pub deal_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorRow {
    pub sector: String,
    pub value: f64,
    pub weighted_value: f64,
    pub count: usize,
}

pub fn portfolio_metrics(table: &Table) -> PortfolioMetrics {
    let deal_count = table.len();
    let total_value: f64 = table.records.iter().map(|r| r.value).sum();
    let weighted_value: f64 = table.records.iter().filter_map(|r| r.weighted_value).sum();
    let mean_value = if deal_count == 0 {
        0.0
    } else {
        total_value / deal_count as f64
    };
    PortfolioMetrics {
        total_value,
        mean_value,
        weighted_value,
        deal_count,
    }
}

/// Value, weighted value and count per sector, largest value first.
///
/// `None` when the board has no sector column.
pub fn sector_performance(table: &Table) -> Option<Vec<SectorRow>> {
    if !table.has(Field::Group) {
        return None;
    }

    let mut rows: Vec<SectorRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in &table.records {
        let i = *index.entry(record.group.as_str()).or_insert_with(|| {
            rows.push(SectorRow {
                sector: record.group.clone(),
                value: 0.0,
                weighted_value: 0.0,
                count: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        row.value += record.value;
        row.weighted_value += record.weighted_value.unwrap_or(0.0);
        row.count += 1;
    }

    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    Some(rows)
}

/// Record count per stage, ordered by stage label.
///
/// `None` when the board has no stage column.
pub fn stage_distribution(table: &Table) -> Option<Vec<(String, usize)>> {
    if !table.has(Field::Stage) {
        return None;
    }

    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for record in &table.records {
        let stage = record.stage.as_deref().unwrap_or(UNKNOWN);
        *counts.entry(stage.to_string()).or_insert(0) += 1;
    }
    Some(counts.into_iter().collect())
}
