use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/news";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Whether summaries are served with keywords highlighted
    #[serde(default = "default_highlight")]
    pub highlight: bool,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_url() -> String {
    "sqlite:summary_feed.db?mode=rwc".to_string()
}

fn default_highlight() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Endpoint accepting manually entered articles, if the backend has one
    #[serde(default)]
    pub manual_url: Option<String>,
    /// Keyword sent with every poll
    #[serde(default)]
    pub keyword: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            manual_url: None,
            keyword: None,
            timeout: default_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            bind_address: default_bind_address(),
            database_url: default_database_url(),
            highlight: default_highlight(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load from `path`, falling back to the built-in defaults when the file
    /// does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.poll_interval == 0 {
            anyhow::bail!("poll_interval must be at least 1 second");
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}
