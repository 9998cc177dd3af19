// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "bablootooth";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for permission grants.
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Location services settings.
    pub location: LocationConfig,

    /// Sign-in backend settings.
    pub auth: AuthConfig,

    /// Notice timing.
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// How long the adapter stays discoverable after Connect.
    pub discoverable_timeout_secs: u64,

    /// Length of one inquiry before discovery is reported finished.
    pub inquiry_secs: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            discoverable_timeout_secs: 300,
            inquiry_secs: 12,
        }
    }
}

impl BluetoothConfig {
    pub fn discoverable_window(&self) -> Duration {
        Duration::from_secs(self.discoverable_timeout_secs)
    }

    pub fn inquiry_window(&self) -> Duration {
        Duration::from_secs(self.inquiry_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Refuse to scan while the desktop location switch is off.
    pub required: bool,

    /// Command that opens the location settings panel.
    pub settings_command: Vec<String>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            required: true,
            settings_command: vec!["gnome-control-center".to_string(), "location".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Web API key of the identity project.
    pub api_key: String,

    /// Identity Toolkit base URL.
    pub endpoint: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub notice_short_secs: u32,
    pub notice_long_secs: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_short_secs: 2,
            notice_long_secs: 4,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir(), &data_dir())
    }

    /// Load from explicit directories.
    pub fn load_from(config_dir: &Path, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir)?;

        let config_path = config_dir.join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            config.save_to(config_dir)?;
            config
        };

        // Set data directory
        config.data_dir = data_dir.to_path_buf();
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(config)
    }

    /// Save configuration into `config_dir`.
    pub fn save_to(&self, config_dir: &Path) -> Result<()> {
        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bluetooth.discoverable_window(), Duration::from_secs(300));
        assert_eq!(config.bluetooth.inquiry_window(), Duration::from_secs(12));
        assert!(config.location.required);
        assert!(config.auth.api_key.is_empty());
    }

    #[test]
    fn test_first_load_writes_file() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("config");
        let data_dir = dir.path().join("data");

        let config = Config::load_from(&config_dir, &data_dir).unwrap();
        assert!(config_dir.join("config.toml").exists());
        assert!(data_dir.exists());
        assert_eq!(config.data_dir, data_dir);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[bluetooth]\ndiscoverable_timeout_secs = 120\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path(), &dir.path().join("data")).unwrap();
        assert_eq!(config.bluetooth.discoverable_timeout_secs, 120);
        assert_eq!(config.bluetooth.inquiry_secs, 12);
        assert_eq!(config.ui.notice_long_secs, 4);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::load_from(dir.path(), &dir.path().join("data")).unwrap();
        config.auth.api_key = "key-123".to_string();
        config.save_to(dir.path()).unwrap();

        let reloaded = Config::load_from(dir.path(), &dir.path().join("data")).unwrap();
        assert_eq!(reloaded.auth.api_key, "key-123");
    }
}
