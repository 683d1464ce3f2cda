//! Reply text for computed results.
//!
//! Formatting only: every function takes numbers that were already
//! computed and turns them into markdown. Absent inputs drop their clause.

use crate::analytics::{Breakdown, DelayReport, Metric, PortfolioMetrics, SectorRow};

/// Render a money amount as `$1,234,567`, rounded to whole units.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Render a breakdown cell: currency for sums, a plain integer for counts.
pub fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::Sum => format_currency(value),
        Metric::Count => format!("{:.0}", value),
    }
}

/// Most frequent stage; on ties the first in label order.
fn bottleneck(stages: &[(String, usize)]) -> Option<&(String, usize)> {
    stages.iter().fold(None, |best: Option<&(String, usize)>, s| match best {
        Some(b) if b.1 >= s.1 => Some(b),
        _ => Some(s),
    })
}

/// Founder-level summary of a pipeline board.
pub fn executive_summary(
    portfolio: &PortfolioMetrics,
    sectors: Option<&[SectorRow]>,
    stages: Option<&[(String, usize)]>,
    health: &[String],
) -> String {
    let mut out = String::from("### Executive Summary\n");
    out.push_str(&format!(
        "You have **{} active deals** with a total face value of **{}**.\n",
        portfolio.deal_count,
        format_currency(portfolio.total_value)
    ));
    out.push_str(&format!(
        "Based on deal probabilities, your **risk-adjusted forecast is {}**.\n\n",
        format_currency(portfolio.weighted_value)
    ));

    if let Some(top) = sectors.and_then(|s| s.first()) {
        out.push_str(&format!(
            "**Top performer:** the **{}** sector is leading with {} in pipeline.\n",
            top.sector,
            format_currency(top.value)
        ));
    }

    if let Some((stage, count)) = stages.and_then(bottleneck) {
        out.push_str(&format!(
            "**Bottleneck:** the majority of your deals ({}) are sitting in **'{}'**.\n\n",
            count, stage
        ));
    }

    if !health.is_empty() {
        out.push_str("---\n**Data health check:**\n");
        for issue in health {
            out.push_str(&format!("- {}\n", issue));
        }
    }

    out
}

pub fn breakdown_reply(board_name: &str, breakdown: &Breakdown) -> String {
    let mut out = format!("### Source: {}\n", board_name);
    out.push_str(&format!(
        "Breaking down **{}** by **{}**:\n\n",
        breakdown.metric.label(),
        breakdown.dimension
    ));
    if let Some((category, value)) = breakdown.top() {
        out.push_str(&format!(
            "**Top result:** '{}' with {}.\n",
            category,
            format_metric(breakdown.metric, *value)
        ));
    }
    out
}

pub fn delay_reply(board_name: &str, report: &DelayReport) -> String {
    let mut out = format!("### Source: {}\n", board_name);
    match report.overdue.first() {
        None => out.push_str(&format!(
            "Nothing open is more than {} days past its date.\n",
            report.threshold_days
        )),
        Some(worst) => {
            out.push_str(&format!(
                "**{} items** are more than {} days past their date.\n",
                report.overdue_count, report.threshold_days
            ));
            out.push_str(&format!(
                "**Most overdue:** '{}' ({} days, status '{}', owner {}).\n",
                worst.record.item, worst.overdue_days, worst.record.status, worst.record.owner
            ));
        }
    }
    if report.undated_count > 0 {
        out.push_str(&format!(
            "{} items have no usable date and were not checked.\n",
            report.undated_count
        ));
    }
    out
}
