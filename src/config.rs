use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::generator::recent::{DEFAULT_HISTORY, DEFAULT_MAX_REROLLS};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_pack")]
    pub pack: String,
    #[serde(default)]
    pub pack_path: Option<PathBuf>,
    #[serde(default)]
    pub storage_namespace: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default = "default_recent_history")]
    pub recent_history: usize,
    #[serde(default = "default_max_rerolls")]
    pub max_rerolls: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_pack() -> String {
    "science".to_string()
}
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sprouts")
}
fn default_recent_history() -> usize {
    DEFAULT_HISTORY
}
fn default_max_rerolls() -> usize {
    DEFAULT_MAX_REROLLS
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pack: default_pack(),
            pack_path: None,
            storage_namespace: None,
            data_dir: default_data_dir(),
            mode: None,
            theme: None,
            difficulty: None,
            recent_history: default_recent_history(),
            max_rerolls: default_max_rerolls(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sprouts")
            .join("config.toml")
    }

    /// Clamp numeric knobs into usable ranges.
    pub fn validate(&mut self) {
        self.recent_history = self.recent_history.clamp(1, 64);
        self.max_rerolls = self.max_rerolls.min(100);
    }

    /// Prefix of both storage keys. Each pack gets its own namespace unless
    /// one is configured.
    pub fn namespace(&self, pack_id: &str) -> String {
        self.storage_namespace
            .clone()
            .unwrap_or_else(|| format!("{pack_id}_sprouts"))
    }

    pub fn progress_key(&self, pack_id: &str) -> String {
        format!("{}_progress", self.namespace(pack_id))
    }

    pub fn parent_settings_key(&self, pack_id: &str) -> String {
        format!("{}_parent_settings", self.namespace(pack_id))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
