use crate::core::truncate_utf8;
use crate::error::ConfigError;
use crate::network::protocol::NAME_MAX;
use crate::player::ai::Tier;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "gomoku_config.json";

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub nickname: String,
    pub ai_tier: Tier,
    /// Zero or less disables turn timers.
    pub turn_time_seconds: i32,
    pub default_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            nickname: "Player".to_string(),
            ai_tier: Tier::Medium,
            turn_time_seconds: 30,
            default_port: 4242,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    /// A missing file silently yields the defaults; an unreadable one is
    /// logged first.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            Self::default()
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.nickname = truncate_utf8(self.nickname.trim(), NAME_MAX).to_string();
        if self.nickname.is_empty() {
            self.nickname = Self::default().nickname;
        }
        self
    }

    pub fn timers_enabled(&self) -> bool {
        self.turn_time_seconds > 0
    }

    /// Installs the process-wide config. Later calls are ignored.
    pub fn init(config: AppConfig) -> &'static AppConfig {
        CONFIG.get_or_init(|| config)
    }

    pub fn get() -> &'static AppConfig {
        CONFIG.get_or_init(AppConfig::default)
    }
}
