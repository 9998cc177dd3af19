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

//! System tray implementation using ksni.

use anyhow::Result;
use ksni::{self, menu::StandardItem, Handle, MenuItem, Tray, TrayService};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::events::AppCommand;
use crate::state::{AppState, ScanStatus};

/// Actions that can be triggered from the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Connect,
    Scan,
    ResetPermissions,
    Quit,
}

impl TrayAction {
    /// The command this menu entry stands for.
    pub fn command(self) -> AppCommand {
        match self {
            TrayAction::Connect => AppCommand::Connect,
            TrayAction::Scan => AppCommand::Scan,
            TrayAction::ResetPermissions => AppCommand::ResetPermissions,
            TrayAction::Quit => AppCommand::Shutdown,
        }
    }
}

/// System tray icon and menu.
pub struct BablootoothTray {
    state: Arc<AppState>,
    action_tx: mpsc::UnboundedSender<TrayAction>,
}

impl BablootoothTray {
    pub fn new(state: Arc<AppState>, action_tx: mpsc::UnboundedSender<TrayAction>) -> Self {
        Self { state, action_tx }
    }
}

impl Tray for BablootoothTray {
    fn icon_name(&self) -> String {
        self.state.get_status().icon_name().to_string()
    }

    fn title(&self) -> String {
        "Bablootooth".to_string()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        let status = self.state.get_status();
        let description = match status {
            ScanStatus::SignedOut => "Not signed in".to_string(),
            ScanStatus::Idle | ScanStatus::Scanning => {
                let mut text = format!(
                    "{}\n{} device(s) found",
                    status.as_str(),
                    self.state.get_device_count()
                );
                if let Some(notice) = self.state.get_last_notice() {
                    text.push('\n');
                    text.push_str(&notice);
                }
                text
            }
        };

        ksni::ToolTip {
            icon_name: String::new(),
            icon_pixmap: Vec::new(),
            title: "Bablootooth".to_string(),
            description,
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let status = self.state.get_status();
        let signed_in = status != ScanStatus::SignedOut;

        let mut items = vec![];

        // Status header
        let status_text = match status {
            ScanStatus::SignedOut => "○ Signed out".to_string(),
            ScanStatus::Idle => format!("● {}", self.state.get_user().unwrap_or_default()),
            ScanStatus::Scanning => "◐ Scanning...".to_string(),
        };

        items.push(MenuItem::Standard(StandardItem {
            label: status_text,
            enabled: false,
            ..Default::default()
        }));

        items.push(MenuItem::Separator);

        items.push(MenuItem::Standard(StandardItem {
            label: "Connect".to_string(),
            enabled: signed_in,
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::Connect);
            }),
            ..Default::default()
        }));

        items.push(MenuItem::Standard(StandardItem {
            label: "Scan for Devices".to_string(),
            enabled: signed_in,
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::Scan);
            }),
            ..Default::default()
        }));

        items.push(MenuItem::Standard(StandardItem {
            label: "Reset Permissions".to_string(),
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::ResetPermissions);
            }),
            ..Default::default()
        }));

        items.push(MenuItem::Separator);

        // Quit
        items.push(MenuItem::Standard(StandardItem {
            label: "Quit".to_string(),
            activate: Box::new(|tray: &mut Self| {
                let _ = tray.action_tx.send(TrayAction::Quit);
            }),
            ..Default::default()
        }));

        items
    }

    fn id(&self) -> String {
        "bablootooth".to_string()
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::Hardware
    }
}

/// Run the system tray service.
pub fn run_tray(
    state: Arc<AppState>,
) -> Result<(
    mpsc::UnboundedReceiver<TrayAction>,
    Handle<BablootoothTray>,
)> {
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let tray = BablootoothTray::new(state, action_tx);
    let service = TrayService::new(tray);
    let handle = service.handle();

    // Spawn the tray service
    std::thread::spawn(move || {
        let _ = service.run();
    });

    info!("System tray started");

    Ok((action_rx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_map_to_commands() {
        assert!(matches!(TrayAction::Connect.command(), AppCommand::Connect));
        assert!(matches!(TrayAction::Scan.command(), AppCommand::Scan));
        assert!(matches!(
            TrayAction::ResetPermissions.command(),
            AppCommand::ResetPermissions
        ));
        assert!(matches!(TrayAction::Quit.command(), AppCommand::Shutdown));
    }

    #[test]
    fn test_menu_disables_actions_when_signed_out() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let tray = BablootoothTray::new(AppState::new(), tx);
        let disabled = tray
            .menu()
            .iter()
            .filter(|item| matches!(item, MenuItem::Standard(s) if !s.enabled))
            .count();
        // Status header, Connect and Scan.
        assert_eq!(disabled, 3);
    }
}
