//! One question in, one reply out.
//!
//! `answer` runs the whole turn: route → fetch → normalize → analyse →
//! narrate. Every failure becomes an assistant message; nothing is retried
//! and nothing is cached between turns.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::{
    aggregate, data_health, delays, portfolio_metrics, sector_performance, stage_distribution,
    Breakdown, DelayReport, SectorRow,
};
use crate::error::BoardError;
use crate::monday::BoardSource;
use crate::narrative::{self, format_currency, format_metric};
use crate::normalize::normalize;
use crate::router::{route, Mode};
use crate::types::Config;

pub const GREETING: &str = "I can analyze your **Sales Pipeline** and **Work Orders**. \
Try asking:\n\
- *Show me revenue by sector*\n\
- *Which work orders are overdue by more than 45 days?*\n\
- *Give me an executive summary*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Tabular data shown under a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Attachment {
    /// Plain-text table with left-aligned, padded columns.
    pub fn render_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(self.columns.as_slice());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row.as_slice()));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            attachment: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Linear message history for one session.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Forget everything but the greeting.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The whole session as a pretty-printed JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.messages)
    }
}

/// Assistant message for a failed turn.
pub fn error_message(err: &BoardError) -> ChatMessage {
    match err {
        BoardError::EmptyResult { board } => ChatMessage::assistant(format!(
            "I connected to **{}**, but found no data. Check your board id.",
            board
        )),
        other => ChatMessage::assistant(format!(
            "**{}**\n\n_{}_",
            other,
            other.recovery_suggestion()
        )),
    }
}

/// Answer one question against `source`.
pub async fn answer(
    source: &mut dyn BoardSource,
    config: &Config,
    text: &str,
    today: NaiveDate,
) -> ChatMessage {
    match run_turn(source, config, text, today).await {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Turn failed: {}", e);
            if e.is_connection() {
                source.disconnect();
            }
            error_message(&e)
        }
    }
}

async fn run_turn(
    source: &mut dyn BoardSource,
    config: &Config,
    text: &str,
    today: NaiveDate,
) -> Result<ChatMessage, BoardError> {
    let intent = route(text);
    let board = intent.board;

    let board_id = config.board_id(board).ok_or_else(|| {
        BoardError::ConfigurationError(format!(
            "Board ID for '{}' not found. Set {}.",
            board.name, board.env_var
        ))
    })?;

    source.ensure_connected().await?;
    let raw = source.fetch_board(board_id).await?;
    if raw.is_empty() {
        return Err(BoardError::EmptyResult {
            board: board.name.to_string(),
        });
    }

    let table = normalize(&raw, board.columns);

    let message = match intent.mode {
        Mode::Breakdown { metric, dimension } => {
            let breakdown = aggregate(&table, Some(dimension), metric)?;
            ChatMessage::assistant(narrative::breakdown_reply(board.name, &breakdown))
                .with_attachment(breakdown_attachment(&breakdown))
        }
        Mode::Delays { threshold_days } => {
            let report = delays(&table, threshold_days, today)?;
            let message = ChatMessage::assistant(narrative::delay_reply(board.name, &report));
            if report.overdue.is_empty() {
                message
            } else {
                message.with_attachment(delay_attachment(&report))
            }
        }
        Mode::Summary => {
            let portfolio = portfolio_metrics(&table);
            let sectors = sector_performance(&table);
            let stages = stage_distribution(&table);
            let health = data_health(&table);
            let content = narrative::executive_summary(
                &portfolio,
                sectors.as_deref(),
                stages.as_deref(),
                &health,
            );
            let message =
                ChatMessage::assistant(format!("### Source: {}\n{}", board.name, content));
            match sectors.as_deref() {
                Some(rows) if !rows.is_empty() => message.with_attachment(sector_attachment(rows)),
                _ => message,
            }
        }
    };

    Ok(message)
}

fn breakdown_attachment(breakdown: &Breakdown) -> Attachment {
    let value_column = match breakdown.metric {
        crate::analytics::Metric::Count => "Count",
        crate::analytics::Metric::Sum => "Value",
    };
    Attachment {
        columns: vec![breakdown.dimension.to_string(), value_column.to_string()],
        rows: breakdown
            .rows
            .iter()
            .map(|(category, value)| {
                vec![category.clone(), format_metric(breakdown.metric, *value)]
            })
            .collect(),
    }
}

fn delay_attachment(report: &DelayReport) -> Attachment {
    Attachment {
        columns: ["Item", "Owner", "Status", "Date", "Days overdue"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        rows: report
            .overdue
            .iter()
            .map(|o| {
                vec![
                    o.record.item.clone(),
                    o.record.owner.clone(),
                    o.record.status.clone(),
                    o.record
                        .date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    o.overdue_days.to_string(),
                ]
            })
            .collect(),
    }
}

fn sector_attachment(rows: &[SectorRow]) -> Attachment {
    Attachment {
        columns: ["Sector", "Value", "Weighted", "Deals"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    r.sector.clone(),
                    format_currency(r.value),
                    format_currency(r.weighted_value),
                    r.count.to_string(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryBoard {
        table: RawTable,
        connected: bool,
        refuse_connection: bool,
        drop_fetch: bool,
        fetches: AtomicUsize,
    }

    impl MemoryBoard {
        fn new(rows: Vec<Vec<(&str, &str)>>) -> Self {
            Self {
                table: RawTable::from_rows(
                    rows.into_iter()
                        .map(|r| {
                            r.into_iter()
                                .map(|(k, v)| (k.to_string(), v.to_string()))
                                .collect()
                        })
                        .collect(),
                ),
                connected: false,
                refuse_connection: false,
                drop_fetch: false,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BoardSource for MemoryBoard {
        async fn ensure_connected(&mut self) -> Result<(), BoardError> {
            if self.refuse_connection {
                return Err(BoardError::ConnectionError("Not Authenticated".to_string()));
            }
            self.connected = true;
            Ok(())
        }

        async fn fetch_board(&self, _board_id: &str) -> Result<RawTable, BoardError> {
            assert!(self.connected);
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.drop_fetch {
                return Err(BoardError::ConnectionError("connection reset".to_string()));
            }
            Ok(self.table.clone())
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.api_key = Some("key".to_string());
        config.boards.insert("deals".to_string(), "1".to_string());
        config.boards.insert("work_orders".to_string(), "2".to_string());
        config
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn deals_board() -> MemoryBoard {
        MemoryBoard::new(vec![
            vec![
                ("Name", "Acme"),
                ("Deal Status", "Open"),
                ("Masked Deal value", "1,000"),
                ("Sector/service", "Mining"),
                ("Deal Stage", "A. Lead"),
                ("Closure Probability", "High"),
                ("Tentative Close Date", "01-01-2026"),
            ],
            vec![
                ("Name", "Globex"),
                ("Deal Status", "Done"),
                ("Masked Deal value", "$3,000"),
                ("Sector/service", "Powerline"),
                ("Deal Stage", "B. Proposal"),
                ("Closure Probability", "Won"),
                ("Tentative Close Date", "01-10-2025"),
            ],
            vec![
                ("Name", "Initech"),
                ("Deal Status", "Open"),
                ("Masked Deal value", "abc"),
                ("Sector/service", "Mining"),
                ("Deal Stage", "A. Lead"),
                ("Closure Probability", "Low"),
                ("Tentative Close Date", ""),
            ],
        ])
    }

    #[tokio::test]
    async fn test_revenue_by_sector() {
        let mut board = deals_board();
        let reply = answer(&mut board, &config(), "show revenue by sector", today()).await;
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.contains("Breaking down **sum** by **Group**"));
        assert!(reply.content.contains("'Powerline' with $3,000."));
        let attachment = reply.attachment.unwrap();
        assert_eq!(attachment.columns, vec!["Group", "Value"]);
        assert_eq!(attachment.rows[1], vec!["Mining".to_string(), "$1,000".to_string()]);
    }

    #[tokio::test]
    async fn test_overdue_excludes_done() {
        let mut board = deals_board();
        let question = "which deals are overdue by 30 days";
        let reply = answer(&mut board, &config(), question, today()).await;
        assert!(reply.content.contains("**1 items** are more than 30 days"));
        assert!(reply.content.contains("'Acme' (59 days"));
        assert!(reply.content.contains("1 items have no usable date"));
        let attachment = reply.attachment.unwrap();
        assert_eq!(attachment.rows.len(), 1);
        assert_eq!(attachment.rows[0][0], "Acme");
    }

    #[tokio::test]
    async fn test_executive_summary() {
        let mut board = deals_board();
        let question = "executive summary of the pipeline";
        let reply = answer(&mut board, &config(), question, today()).await;
        assert!(reply.content.contains("**3 active deals**"));
        assert!(reply.content.contains("**$4,000**"));
        assert!(reply.content.contains("forecast is $3,800"));
        assert!(reply.content.contains("**Powerline** sector"));
        assert!(reply.content.contains("(2) are sitting in **'A. Lead'**"));
        assert!(reply.content.contains("1 records are missing a target close date."));
        assert_eq!(reply.attachment.unwrap().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_board_is_distinct_from_connection_failure() {
        let mut empty = MemoryBoard::new(vec![]);
        let reply = answer(&mut empty, &config(), "deals by status", today()).await;
        assert!(reply.content.contains("found no data"));
        assert!(!reply.content.contains("Connection error"));

        let mut refused = deals_board();
        refused.refuse_connection = true;
        let reply = answer(&mut refused, &config(), "deals by status", today()).await;
        assert!(reply.content.contains("Connection error"));
        assert!(!reply.content.contains("found no data"));
        assert_eq!(refused.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_board_id() {
        let mut board = deals_board();
        let mut config = config();
        config.boards.remove("work_orders");
        let reply = answer(&mut board, &config, "work orders by owner", today()).await;
        assert!(reply.content.contains("Board ID for 'Work Orders' not found"));
        assert_eq!(board.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delay_without_date_column() {
        let mut board =
            MemoryBoard::new(vec![vec![("Name", "WO-1"), ("Execution Status", "Ongoing")]]);
        let reply = answer(&mut board, &config(), "delayed work orders", today()).await;
        assert!(reply.content.contains("No date column"));
        assert!(reply.attachment.is_none());
    }

    #[tokio::test]
    async fn test_each_turn_refetches() {
        let mut board = deals_board();
        let config = config();
        answer(&mut board, &config, "deals by stage", today()).await;
        answer(&mut board, &config, "deals by owner", today()).await;
        assert_eq!(board.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connection_failure_disconnects_source() {
        let mut board = deals_board();
        board.drop_fetch = true;
        let reply = answer(&mut board, &config(), "deals by status", today()).await;
        assert!(reply.content.contains("connection reset"));
        assert!(!board.connected);

        board.drop_fetch = false;
        let reply = answer(&mut board, &config(), "deals by status", today()).await;
        assert!(board.connected);
        assert!(reply.attachment.is_some());
    }

    #[test]
    fn test_transcript_exports_json() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("deals by status"));
        transcript.push(
            ChatMessage::assistant("### Source: Sales Pipeline").with_attachment(Attachment {
                columns: vec!["Status".into(), "Count".into()],
                rows: vec![vec!["Open".into(), "2".into()]],
            }),
        );
        let json: serde_json::Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
        let messages = json.as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1].get("attachment").is_none());
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["attachment"]["rows"][0][1], "2");
    }

    #[test]
    fn test_render_text_aligns_columns() {
        let attachment = Attachment {
            columns: vec!["Group".into(), "Value".into()],
            rows: vec![
                vec!["Powerline".into(), "$3,000".into()],
                vec!["Mining".into(), "$1,000".into()],
            ],
        };
        assert_eq!(
            attachment.render_text(),
            "Group      Value\n---------  ------\nPowerline  $3,000\nMining     $1,000"
        );
    }

    #[test]
    fn test_transcript_clear_keeps_greeting() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("hi"));
        transcript.push(ChatMessage::assistant("hello"));
        assert_eq!(transcript.messages().len(), 3);
        transcript.clear();
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.messages()[0].content, GREETING);
    }
}
