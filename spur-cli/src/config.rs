use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use spur_chat::PollerConfig;
use spur_sdk::spur::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use spur_sdk::{SdkError, SpurClient};

const ENV_PREFIX: &str = "SPURCHAT";

const DEFAULT_CONFIG: &str = r#"# spurchat configuration
# Any key can be overridden from the environment, e.g.
#   SPURCHAT_SERVER__BASE_URL=http://spur.internal:6080/api
#   SPURCHAT_CHAT__WORKFLOW_ID=S1

[server]
base_url = "http://localhost:6080/api"
request_timeout_secs = 30
# api_token = "your-token"

[chat]
# workflow_id = "S1"
# session_id = "chat_session_..."
poll_interval_ms = 1000
# max_attempts = 120
send_history = true
history_limit = 50
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SpurConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub workflow_id: Option<String>,
    pub session_id: Option<String>,
    pub poll_interval_ms: u64,
    pub max_attempts: Option<u32>,
    pub send_history: bool,
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let poller = PollerConfig::default();
        Self {
            workflow_id: None,
            session_id: None,
            poll_interval_ms: poller.poll_interval.as_millis() as u64,
            max_attempts: poller.max_attempts,
            send_history: poller.send_history,
            history_limit: poller.history_limit,
        }
    }
}

impl SpurConfig {
    /// Load from `path`, or from the per-user config file (created with
    /// defaults on first use), then apply `SPURCHAT_*` overrides.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = get_config_path();
                write_default_config(&default_path)?;
                default_path
            }
        };

        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Load one file plus environment overrides, without creating anything
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::default()
            .with_poll_interval(Duration::from_millis(self.chat.poll_interval_ms))
            .with_max_attempts(self.chat.max_attempts)
            .with_history(self.chat.send_history, self.chat.history_limit)
    }

    pub fn client(&self) -> Result<SpurClient, SdkError> {
        let timeout = Duration::from_secs(self.server.request_timeout_secs);
        let client = SpurClient::with_timeout(timeout)?.with_base_url(&self.server.base_url);
        Ok(match self.server.api_token.as_deref() {
            Some(token) if !token.is_empty() => client.with_api_token(token),
            _ => client,
        })
    }

    /// Copy safe to print: the API token is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.server.api_token.is_some() {
            config.server.api_token = Some("********".to_string());
        }
        config
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("spurchat/config.toml")
    } else {
        PathBuf::from("spurchat.toml")
    }
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))
}
