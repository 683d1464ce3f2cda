//! Error types for a single chat turn
//!
//! Errors are classified by who can fix them:
//! - Configuration: missing board id or API key, fixed by editing config
//! - Connection: auth or network failure, the client stays disconnected
//! - Data: the board has no rows, or lacks the columns an analysis needs

use thiserror::Error;

/// Everything that can stop a turn from producing an analysis.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Not a failure of the pipeline: the board answered with zero rows.
    #[error("Board '{board}' returned no data")]
    EmptyResult { board: String },

    /// An analysis was handed a table with no records.
    #[error("No records to analyze")]
    NoRecords,

    #[error("Could not group by '{0}'. Column not found.")]
    ColumnNotFound(String),

    #[error("No date column available for delay analysis")]
    MissingDateColumn,

    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),
}

impl BoardError {
    /// True when the board was reachable but had nothing in it.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, BoardError::EmptyResult { .. } | BoardError::NoRecords)
    }

    /// True for failures that leave the client disconnected.
    pub fn is_connection(&self) -> bool {
        matches!(self, BoardError::ConnectionError(_))
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BoardError::ConfigurationError(_) => {
                "Set MONDAY_API_KEY and the board ids in .env or ~/.boardbi/config.json"
            }
            BoardError::ConnectionError(_) => {
                "Check your API key and internet connection, then ask again."
            }
            BoardError::EmptyResult { .. } | BoardError::NoRecords => {
                "Check that the board id points at a populated board."
            }
            BoardError::ColumnNotFound(_) => "Try grouping by status, owner, sector or stage.",
            BoardError::MissingDateColumn => {
                "This board has no date column mapped. \
                 Ask about the sales pipeline or work orders instead."
            }
            BoardError::AnalysisFailure(_) => "Try a simpler question.",
        }
    }
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::ConnectionError(err.to_string())
    }
}
