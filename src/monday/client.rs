//! GraphQL client for the monday.com API.
//!
//! Uses reqwest with the API token in the `Authorization` header. A cheap
//! `me { name }` query validates the token before any board is read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{BoardSource, ConnectionState};
use crate::error::BoardError;
use crate::table::RawTable;
use crate::types::Config;

pub const MONDAY_API_URL: &str = "https://api.monday.com/v2";
pub const MONDAY_API_VERSION: &str = "2023-10";

/// Items requested per board query. Only the first page is read.
pub const PAGE_SIZE: usize = 500;

/// Header under which the item's own name is stored.
pub const NAME_HEADER: &str = "Name";

/// Account info returned by the validation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MondayViewer {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    me: Option<MondayViewer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BoardsResponse {
    #[serde(default)]
    boards: Option<Vec<BoardNode>>,
}

#[derive(Debug, Deserialize)]
struct BoardNode {
    #[serde(default)]
    items_page: Option<ItemsPage>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(default)]
    items: Vec<ItemNode>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    column_values: Vec<ColumnValueNode>,
}

#[derive(Debug, Deserialize)]
struct ColumnValueNode {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    column: Option<ColumnRef>,
}

#[derive(Debug, Deserialize)]
struct ColumnRef {
    #[serde(default)]
    title: Option<String>,
}

pub struct MondayClient {
    client: reqwest::Client,
    api_key: String,
    api_url: Url,
    api_version: String,
    state: ConnectionState,
}

impl MondayClient {
    pub fn new(api_key: &str, api_url: &str, api_version: &str) -> Result<Self, BoardError> {
        if api_key.trim().is_empty() {
            return Err(BoardError::ConfigurationError("API key is empty".to_string()));
        }
        let api_url = Url::parse(api_url).map_err(|e| {
            BoardError::ConfigurationError(format!("Invalid API URL '{}': {}", api_url, e))
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.trim().to_string(),
            api_url,
            api_version: api_version.to_string(),
            state: ConnectionState::Disconnected,
        })
    }

    /// Build a client from config. Fails when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, BoardError> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            BoardError::ConfigurationError("API key not found. Set MONDAY_API_KEY.".to_string())
        })?;
        Self::new(api_key, &config.api_url, &config.api_version)
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    async fn graphql<T: serde::de::DeserializeOwned>(&self, query: &str) -> Result<T, BoardError> {
        let body = serde_json::json!({ "query": query });
        let resp = self
            .client
            .post(self.api_url.clone())
            .header("Authorization", self.api_key.as_str())
            .header("API-Version", self.api_version.as_str())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BoardError::ConnectionError(format!("monday.com request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(BoardError::ConnectionError(format!(
                "monday.com API error {}: {}",
                status, text
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| {
                BoardError::ConnectionError(format!("Failed to parse monday.com response: {}", e))
            })?;

        decode_graphql(json)
    }

    /// Validate the token and mark the client connected.
    pub async fn connect(&mut self) -> Result<MondayViewer, BoardError> {
        self.state = ConnectionState::Disconnected;
        let resp: MeResponse = self.graphql("query { me { name } }").await?;
        let viewer = viewer_from(resp)?;

        log::info!("Connected to monday.com as {}", viewer.name);
        self.state = ConnectionState::Connected {
            user_name: viewer.name.clone(),
        };
        Ok(viewer)
    }

    /// Fetch the first page of a board's items.
    pub async fn query_board(&self, board_id: &str) -> Result<RawTable, BoardError> {
        let query = board_query(board_id)?;
        let resp: BoardsResponse = self.graphql(&query).await?;
        let table = items_to_table(resp);
        log::info!("Fetched {} items from board {}", table.len(), board_id);
        Ok(table)
    }
}

#[async_trait]
impl BoardSource for MondayClient {
    async fn ensure_connected(&mut self) -> Result<(), BoardError> {
        if self.is_connected() {
            return Ok(());
        }
        self.connect().await.map(|_| ())
    }

    async fn fetch_board(&self, board_id: &str) -> Result<RawTable, BoardError> {
        if !self.is_connected() {
            return Err(BoardError::ConnectionError("Not connected to monday.com".to_string()));
        }
        self.query_board(board_id).await
    }

    fn disconnect(&mut self) {
        MondayClient::disconnect(self)
    }
}

/// Split a GraphQL envelope into its `data`, surfacing `errors` first.
fn decode_graphql<T: serde::de::DeserializeOwned>(
    json: serde_json::Value,
) -> Result<T, BoardError> {
    if let Some(errors) = json.get("errors") {
        let message = errors
            .get(0)
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| errors.to_string());
        return Err(BoardError::ConnectionError(format!("monday.com API error: {}", message)));
    }

    let data = json.get("data").ok_or_else(|| {
        BoardError::ConnectionError("Missing 'data' in monday.com response".to_string())
    })?;

    serde_json::from_value(data.clone()).map_err(|e| {
        BoardError::ConnectionError(format!("Failed to deserialize monday.com data: {}", e))
    })
}

fn viewer_from(resp: MeResponse) -> Result<MondayViewer, BoardError> {
    resp.me
        .ok_or_else(|| BoardError::ConnectionError("Unknown connection error.".to_string()))
}

/// GraphQL query for one page of a board. Board ids are numeric.
pub fn board_query(board_id: &str) -> Result<String, BoardError> {
    let id = board_id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(BoardError::ConfigurationError(format!(
            "Board id '{}' is not a numeric monday.com id",
            board_id
        )));
    }
    Ok(format!(
        "query {{ boards(ids: {}) {{ items_page(limit: {}) {{ items {{ \
         name column_values {{ text column {{ title }} }} }} }} }} }}",
        id, PAGE_SIZE
    ))
}

/// Flatten the first board's items into a raw table.
///
/// Column values with no title are skipped; a null text is an empty cell.
pub(crate) fn items_to_table(resp: BoardsResponse) -> RawTable {
    let items = resp
        .boards
        .and_then(|boards| boards.into_iter().next())
        .and_then(|board| board.items_page)
        .map(|page| page.items)
        .unwrap_or_default();

    if items.len() >= PAGE_SIZE {
        log::warn!(
            "Board returned {} items; only the first page is read and the rest is truncated",
            items.len()
        );
    }

    let rows = items
        .into_iter()
        .map(|item| {
            let mut row = vec![(NAME_HEADER.to_string(), item.name.unwrap_or_default())];
            for cv in item.column_values {
                let title = cv.column.and_then(|c| c.title).filter(|t| !t.is_empty());
                if let Some(title) = title {
                    row.push((title, cv.text.unwrap_or_default()));
                }
            }
            row
        })
        .collect();

    RawTable::from_rows(rows)
}
