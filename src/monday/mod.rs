//! monday.com board integration.
//!
//! Fetches one page of items per question from the monday.com GraphQL API.
//! The client is an explicit value owned by the caller; there is no global
//! connection.

pub mod client;

use async_trait::async_trait;

use crate::error::BoardError;
use crate::table::RawTable;

/// Connection lifecycle of a board client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected { user_name: String },
}

/// Anything that can hand back a board as a raw table.
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Validate credentials if not already connected.
    async fn ensure_connected(&mut self) -> Result<(), BoardError>;

    /// Fetch the board's first page of items.
    async fn fetch_board(&self, board_id: &str) -> Result<RawTable, BoardError>;

    /// Drop the validated connection so the next turn checks credentials.
    fn disconnect(&mut self);
}
