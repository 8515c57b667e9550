// ABOUTME: Configuration loading for vinnie.
// ABOUTME: Reads ~/.vinnie/config.toml, then applies .env / environment overrides.

use std::path::PathBuf;

use serde::Deserialize;

/// Languages the backend understands for `/set_language/<code>`.
pub const LANGUAGES: &[(&str, &str)] = &[("en", "English"), ("sw", "Kiswahili")];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub render: RenderConfig,
    pub log: LogConfig,
}

/// Where the backend lives and which assistant endpoint to call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Slug used to build the prompt endpoint: `/api/<assistant>-prompt`.
    pub assistant: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            assistant: "gemini".to_string(),
        }
    }
}

impl ServerConfig {
    /// Full URL of the prompt endpoint.
    pub fn prompt_url(&self) -> String {
        format!(
            "{}/api/{}-prompt",
            self.base_url.trim_end_matches('/'),
            self.assistant
        )
    }
}

/// Speaker labels and the initial session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub assistant_name: String,
    pub user_label: String,
    pub language: String,
    pub initial_session: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Vinnie AI".to_string(),
            user_label: "You".to_string(),
            language: "en".to_string(),
            initial_session: "current".to_string(),
        }
    }
}

/// Which rendering capabilities are switched on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub markdown: bool,
    pub sanitize: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            markdown: true,
            sanitize: true,
        }
    }
}

/// Log filter and destination directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl Config {
    /// Load config from ~/.vinnie/config.toml, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `VINNIE_*` overrides using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VINNIE_SERVER_URL").filter(|s| !s.is_empty()) {
            self.server.base_url = url;
        }
        if let Some(lang) = lookup("VINNIE_LANGUAGE").filter(|s| !s.is_empty()) {
            self.chat.language = lang;
        }
    }

    /// Base directory for vinnie's files.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vinnie")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Directory the log file is written to.
    pub fn log_dir(&self) -> PathBuf {
        self.log
            .dir
            .clone()
            .unwrap_or_else(|| Self::home_dir().join("logs"))
    }
}

/// Whether the backend accepts this language code.
pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}
