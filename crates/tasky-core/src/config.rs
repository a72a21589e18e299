use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TaskyError;

/// Top-level Tasky configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Bearer token for the Graph API.
    #[serde(default)]
    pub access_token: String,
    /// Phone number id owning the business account.
    #[serde(default)]
    pub phone_number_id: String,
    /// Token echoed back during the webhook verification handshake.
    #[serde(default)]
    pub verify_token: String,
    /// Shared secret for webhook payload signatures.
    #[serde(default)]
    pub app_secret: String,
    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// OpenAI API key for Whisper voice transcription. Presence = voice enabled.
    #[serde(default)]
    pub whisper_api_key: Option<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            phone_number_id: String::new(),
            verify_token: String::new(),
            app_secret: String::new(),
            api_version: default_api_version(),
            whisper_api_key: None,
        }
    }
}

/// Agent runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Google Gemini API key.
    #[serde(default)]
    pub gemini_api_key: String,
    /// Model for the conversational tool-calling agent.
    #[serde(default = "default_agent_model")]
    pub model: String,
    /// Model for one-shot summary generation.
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    /// Upper bound on tool-call round trips per turn.
    #[serde(default = "default_max_tool_turns")]
    pub max_tool_turns: u32,
    /// How many prior session messages are replayed as history.
    #[serde(default = "default_max_context")]
    pub max_context_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            model: default_agent_model(),
            summary_model: default_summary_model(),
            max_tool_turns: default_max_tool_turns(),
            max_context_messages: default_max_context(),
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Optional overrides for the built-in prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    /// Task-manager system prompt. `{CURRENT_DATETIME}` is substituted.
    #[serde(default)]
    pub system: Option<String>,
    /// Daily summary template. `{date}`, `{user_name}`, `{tasks}` are substituted.
    #[serde(default)]
    pub daily_summary: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_version() -> String {
    "v17.0".to_string()
}

fn default_agent_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_summary_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_tool_turns() -> u32 {
    8
}

fn default_max_context() -> usize {
    20
}

fn default_db_path() -> String {
    "~/.tasky/data/tasky.db".to_string()
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist; `validate` decides
/// whether the result is actually runnable.
pub fn load(path: &str) -> Result<Config, TaskyError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| TaskyError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| TaskyError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

impl Config {
    /// Refuse to run partially configured: every required secret must be set.
    pub fn validate(&self) -> Result<(), TaskyError> {
        let mut missing = Vec::new();
        if self.whatsapp.access_token.is_empty() {
            missing.push("whatsapp.access_token");
        }
        if self.whatsapp.phone_number_id.is_empty() {
            missing.push("whatsapp.phone_number_id");
        }
        if self.whatsapp.verify_token.is_empty() {
            missing.push("whatsapp.verify_token");
        }
        if self.whatsapp.app_secret.is_empty() {
            missing.push("whatsapp.app_secret");
        }
        if self.agent.gemini_api_key.is_empty() {
            missing.push("agent.gemini_api_key");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TaskyError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}
