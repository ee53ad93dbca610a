use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// X API bearer token. Collection is unavailable without it.
    pub bearer_token: Option<String>,

    /// Account handles to collect from, without the leading `@`.
    #[serde(default)]
    pub handles: Vec<String>,

    #[serde(default = "default_collect_interval")]
    pub collect_interval_minutes: u32,

    #[serde(default = "default_max_posts")]
    pub max_posts_per_handle: u32,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stock-pulse");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("posts.db").to_string_lossy().to_string()
}

fn default_collect_interval() -> u32 {
    60
}

fn default_max_posts() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bearer_token: None,
            handles: Vec::new(),
            collect_interval_minutes: default_collect_interval(),
            max_posts_per_handle: default_max_posts(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&content)?;
            // Tolerate handles entered with the marker; stored bare.
            for handle in &mut config.handles {
                *handle = handle.trim().trim_start_matches('@').to_string();
            }
            config.handles.retain(|h| !h.is_empty());
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stock-pulse")
            .join("config.toml")
    }
}
