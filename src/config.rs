use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const LEGACY_FILE_NAME: &str = "group_ringtone_file.txt";
pub const PLATFORM_DEFAULT_RINGTONE: &str = "content://settings/system/ringtone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    FlatFile,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_store_path")]
    pub store_path: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_ringtone_uri")]
    pub default_ringtone_uri: String,

    /// Rename a legacy file to `*.migrated` once it has been imported.
    #[serde(default = "default_true")]
    pub rename_after_import: bool,
}

fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("group-ringtones");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir
}

fn default_store_path() -> String {
    data_dir().join(LEGACY_FILE_NAME).to_string_lossy().to_string()
}

fn default_db_path() -> String {
    data_dir().join("ringtones.db").to_string_lossy().to_string()
}

fn default_ringtone_uri() -> String {
    PLATFORM_DEFAULT_RINGTONE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            store_path: default_store_path(),
            db_path: default_db_path(),
            default_ringtone_uri: default_ringtone_uri(),
            rename_after_import: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let path = match self.backend {
            BackendKind::FlatFile => &self.store_path,
            BackendKind::Sqlite => &self.db_path,
        };
        if path.trim().is_empty() {
            return Err(AppError::Config(format!(
                "no storage path configured for {:?} backend",
                self.backend
            )));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("group-ringtones")
            .join("config.toml")
    }
}
