//! Configuration management

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for raw conversation export files.
    pub export_dir: PathBuf,
    /// Directory that receives `*_parsed.json` output.
    pub parsed_dir: PathBuf,
    /// Previous run's parsed output is rotated here before each run.
    pub archive_dir: PathBuf,
    /// Mirror database location.
    pub db_path: PathBuf,
    /// Collection that message items are synced into.
    pub table_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            export_dir: PathBuf::from("chatgpt-export-json"),
            parsed_dir: PathBuf::from("output_json"),
            archive_dir: PathBuf::from("parsed_archive"),
            db_path: home.join(".chat-mirror/mirror.db"),
            table_name: "ChatConversations".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "export_dir" => Ok(self.export_dir.display().to_string()),
            "parsed_dir" => Ok(self.parsed_dir.display().to_string()),
            "archive_dir" => Ok(self.archive_dir.display().to_string()),
            "db_path" => Ok(self.db_path.display().to_string()),
            "table_name" => Ok(self.table_name.clone()),
            _ => bail!("Unknown config key: {}", key),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "export_dir" => self.export_dir = PathBuf::from(value),
            "parsed_dir" => self.parsed_dir = PathBuf::from(value),
            "archive_dir" => self.archive_dir = PathBuf::from(value),
            "db_path" => self.db_path = PathBuf::from(value),
            "table_name" => self.table_name = value.to_string(),
            _ => bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("chat-mirror").join("config.json"))
    }
}
