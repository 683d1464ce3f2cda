use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::boards::BoardConfig;
use crate::monday::client::{MONDAY_API_URL, MONDAY_API_VERSION};

/// Configuration stored in ~/.boardbi/config.json
///
/// Every field is optional on disk; environment variables
/// (`MONDAY_API_KEY`, `MONDAY_API_URL`, each board's `env_var`) override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Board key (`deals`, `work_orders`) → monday.com board id.
    #[serde(default)]
    pub boards: HashMap<String, String>,
}

fn default_api_url() -> String {
    MONDAY_API_URL.to_string()
}

fn default_api_version() -> String {
    MONDAY_API_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            api_version: default_api_version(),
            boards: HashMap::new(),
        }
    }
}

impl Config {
    /// Board id for a configured board, if one was set.
    pub fn board_id(&self, board: &BoardConfig) -> Option<&str> {
        self.boards
            .get(board.key)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::board_by_key;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_url, MONDAY_API_URL);
        assert_eq!(config.api_version, MONDAY_API_VERSION);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_board_id_lookup() {
        let json = r#"{ "apiKey": "k", "boards": { "deals": " 123 ", "work_orders": "" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.board_id(board_by_key("deals").unwrap()), Some("123"));
        assert_eq!(config.board_id(board_by_key("work_orders").unwrap()), None);
    }
}
