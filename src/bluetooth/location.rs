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

//! Location services check.

use anyhow::{anyhow, Result};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::LocationConfig;

/// Operating-system location boundary.
#[allow(async_fn_in_trait)]
pub trait LocationServices {
    /// Whether a location provider is switched on.
    async fn is_enabled(&self) -> bool;

    /// Send the user to the system location settings.
    async fn open_settings(&self) -> Result<()>;
}

/// GNOME location switch read through `gsettings`.
#[derive(Debug, Clone)]
pub struct DesktopLocation {
    required: bool,
    settings_command: Vec<String>,
}

impl DesktopLocation {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            required: config.required,
            settings_command: config.settings_command.clone(),
        }
    }
}

/// Parse `gsettings get` output.
fn parse_gsettings_bool(output: &str) -> Option<bool> {
    match output.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl LocationServices for DesktopLocation {
    async fn is_enabled(&self) -> bool {
        if !self.required {
            return true;
        }

        let output = Command::new("gsettings")
            .args(["get", "org.gnome.system.location", "enabled"])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout);
                debug!("Location setting: {}", text.trim());
                parse_gsettings_bool(&text).unwrap_or(true)
            }
            Ok(out) => {
                warn!("gsettings exited with {}, assuming location enabled", out.status);
                true
            }
            Err(e) => {
                warn!("gsettings unavailable ({}), assuming location enabled", e);
                true
            }
        }
    }

    async fn open_settings(&self) -> Result<()> {
        let (program, args) = self
            .settings_command
            .split_first()
            .ok_or_else(|| anyhow!("No location settings command configured"))?;

        Command::new(program).args(args).spawn()?;
        info!("Opened location settings: {}", self.settings_command.join(" "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gsettings_output() {
        assert_eq!(parse_gsettings_bool("true\n"), Some(true));
        assert_eq!(parse_gsettings_bool("false\n"), Some(false));
        assert_eq!(parse_gsettings_bool("No such schema"), None);
    }

    #[tokio::test]
    async fn test_not_required_is_enabled() {
        let location = DesktopLocation::new(&LocationConfig {
            required: false,
            settings_command: vec![],
        });
        assert!(location.is_enabled().await);
    }

    #[tokio::test]
    async fn test_empty_settings_command_fails() {
        let location = DesktopLocation::new(&LocationConfig {
            required: true,
            settings_command: vec![],
        });
        assert!(location.open_settings().await.is_err());
    }
}
