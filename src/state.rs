//! Configuration discovery and the per-session state of the shell.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::boards::BOARDS;
use crate::chat::{self, ChatMessage, Transcript};
use crate::error::BoardError;
use crate::monday::client::MondayClient;
use crate::types::Config;

pub const API_KEY_ENV: &str = "MONDAY_API_KEY";
pub const API_URL_ENV: &str = "MONDAY_API_URL";

/// Everything one chat session owns: config, the board client and the
/// transcript. Dropped when the session ends; nothing is persisted.
pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured; each turn then reports it.
    pub client: Option<MondayClient>,
    pub transcript: Transcript,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = match MondayClient::from_config(&config) {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("Board client unavailable: {}", e);
                None
            }
        };
        Self {
            config,
            client,
            transcript: Transcript::new(),
        }
    }

    /// Answer one question and record both sides in the transcript.
    pub async fn ask(&mut self, text: &str, today: NaiveDate) -> &ChatMessage {
        self.transcript.push(ChatMessage::user(text));
        let reply = match self.client.as_mut() {
            Some(client) => chat::answer(client, &self.config, text, today).await,
            None => chat::error_message(&BoardError::ConfigurationError(format!(
                "API key not found. Set {} in .env or ~/.boardbi/config.json.",
                API_KEY_ENV
            ))),
        };
        self.transcript.push(reply)
    }
}

/// Get the canonical config file path (~/.boardbi/config.json)
pub fn config_path() -> Result<PathBuf, BoardError> {
    let home = dirs::home_dir().ok_or_else(|| {
        BoardError::ConfigurationError("Could not find home directory".to_string())
    })?;
    Ok(home.join(".boardbi").join("config.json"))
}

/// Load configuration: `.env` first, then ~/.boardbi/config.json, then
/// environment overrides. A missing config file is not an error.
pub fn load_config() -> Result<Config, BoardError> {
    load_dotenv();
    let path = config_path()?;
    load_config_from(&path, |key| std::env::var(key).ok())
}

/// Load `.env` from the current directory if it exists.
fn load_dotenv() {
    if !Path::new(".env").exists() {
        return;
    }
    match dotenv::from_filename(".env") {
        Ok(_) => log::info!("Loaded .env from current directory"),
        Err(e) => log::warn!("Failed to load .env file: {}", e),
    }
}

/// Read a config file (if present) and apply overrides from `env`.
pub fn load_config_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, BoardError> {
    let config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| {
            BoardError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            BoardError::ConfigurationError(format!("Failed to parse {}: {}", path.display(), e))
        })?
    } else {
        log::debug!("No config file at {}, using defaults", path.display());
        Config::default()
    };

    Ok(apply_env_overrides(config, env))
}

fn apply_env_overrides(mut config: Config, env: impl Fn(&str) -> Option<String>) -> Config {
    let set = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(key) = set(API_KEY_ENV) {
        config.api_key = Some(key);
    }
    if let Some(url) = set(API_URL_ENV) {
        config.api_url = url;
    }
    for board in BOARDS {
        if let Some(id) = set(board.env_var) {
            config.boards.insert(board.key.to_string(), id);
        }
    }
    config
}
