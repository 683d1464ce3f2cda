//! Keyword-based intent routing for free-text questions.
//!
//! Maps a question to a board and an analysis mode using ordered rule
//! tables. Each table is evaluated top to bottom and the first match wins.
//! Coverage is extended by adding rows to the tables, not by touching the
//! dispatch code.
//!
//! This is plain substring matching on the lower-cased question: there is
//! no synonym expansion, no word-boundary check ("late" matches
//! "translate") and no ambiguity resolution beyond rule order.

use std::sync::OnceLock;

use regex::Regex;

use crate::analytics::{Metric, DEFAULT_DELAY_THRESHOLD_DAYS};
use crate::boards::{fallback_board, BoardConfig, BOARDS};
use crate::table::Field;

pub const DELAY_TERMS: &[&str] = &["delay", "overdue", "late", "stuck"];

pub const SUMMARY_TERMS: &[&str] = &[
    "summary",
    "summarize",
    "overview",
    "executive",
    "health check",
];

/// Terms that switch the metric from count to summed value.
pub const MONEY_TERMS: &[&str] = &["value", "revenue", "amount", "budget"];

/// Analysis modes a question can select before falling back to a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Delays,
    Summary,
}

pub struct ModeRule {
    pub terms: &'static [&'static str],
    pub kind: ModeKind,
}

pub static MODE_RULES: &[ModeRule] = &[
    ModeRule {
        terms: DELAY_TERMS,
        kind: ModeKind::Delays,
    },
    ModeRule {
        terms: SUMMARY_TERMS,
        kind: ModeKind::Summary,
    },
];

pub struct DimensionRule {
    pub terms: &'static [&'static str],
    pub dimension: Field,
}

pub static DIMENSION_RULES: &[DimensionRule] = &[
    DimensionRule {
        terms: &["owner", "personnel"],
        dimension: Field::Owner,
    },
    DimensionRule {
        terms: &["sector", "group"],
        dimension: Field::Group,
    },
    DimensionRule {
        terms: &["stage"],
        dimension: Field::Stage,
    },
    DimensionRule {
        terms: &["item", "name"],
        dimension: Field::Item,
    },
];

pub const DEFAULT_DIMENSION: Field = Field::Status;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Delays { threshold_days: i64 },
    Summary,
    Breakdown { metric: Metric, dimension: Field },
}

#[derive(Debug, Clone, Copy)]
pub struct Intent {
    pub board: &'static BoardConfig,
    pub mode: Mode,
}

fn re_first_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").unwrap())
}

fn contains_any(lowered: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| lowered.contains(t))
}

/// Route a question against the configured boards.
pub fn route(text: &str) -> Intent {
    route_with(text, BOARDS)
}

/// Route a question against an explicit board table.
pub fn route_with(text: &str, boards: &'static [BoardConfig]) -> Intent {
    let lowered = text.to_lowercase();
    let board = select_board(&lowered, boards);
    let mode = select_mode(&lowered);
    log::debug!("Routed question to board '{}' with {:?}", board.key, mode);
    Intent { board, mode }
}

fn select_board(lowered: &str, boards: &'static [BoardConfig]) -> &'static BoardConfig {
    boards
        .iter()
        .find(|b| b.matches(lowered))
        .unwrap_or_else(fallback_board)
}

fn select_mode(lowered: &str) -> Mode {
    let kind = MODE_RULES
        .iter()
        .find(|rule| contains_any(lowered, rule.terms))
        .map(|rule| rule.kind);

    match kind {
        Some(ModeKind::Delays) => Mode::Delays {
            threshold_days: extract_threshold(lowered),
        },
        Some(ModeKind::Summary) => Mode::Summary,
        None => Mode::Breakdown {
            metric: select_metric(lowered),
            dimension: select_dimension(lowered),
        },
    }
}

/// First integer literal in the text, else the default threshold.
pub fn extract_threshold(text: &str) -> i64 {
    re_first_integer()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_DELAY_THRESHOLD_DAYS)
}

fn select_metric(lowered: &str) -> Metric {
    if contains_any(lowered, MONEY_TERMS) {
        Metric::Sum
    } else {
        Metric::Count
    }
}

fn select_dimension(lowered: &str) -> Field {
    DIMENSION_RULES
        .iter()
        .find(|rule| contains_any(lowered, rule.terms))
        .map(|rule| rule.dimension)
        .unwrap_or(DEFAULT_DIMENSION)
}
