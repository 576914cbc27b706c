//! CLI settings: ~/.config/feedgen/config.toml, overridable per shell with
//! `FEEDGEN_URL` and `FEEDGEN_API_KEY`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const URL_ENV: &str = "FEEDGEN_URL";
pub const API_KEY_ENV: &str = "FEEDGEN_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("feedgen").join("config.toml"))
    }

    /// Settings as stored on disk (defaults when the file is absent)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::parse(&text)
    }

    /// Stored settings with environment overrides applied; never saved
    pub fn effective() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config file")
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.set_base_url(url);
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }

        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write config to {:?}", path))
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_base_url_uses_default() {
        let config = Config::parse("api_key = \"secret\"\n").unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_unset_api_key_is_not_written() {
        let mut config = Config::default();
        config.set_base_url("https://feeds.example/".into());
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("api_key"));

        let back = Config::parse(&text).unwrap();
        assert_eq!(back.base_url, "https://feeds.example");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut config = Config::parse("api_key = \"from-file\"\nbase_url = \"http://a\"\n").unwrap();
        config.apply_overrides(|key| match key {
            URL_ENV => Some("https://prod.example/".to_string()),
            API_KEY_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://prod.example");
        // Blank values are ignored
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }
}
