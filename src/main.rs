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

//! Bablootooth Desktop Application

use anyhow::Result;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bablootooth_desktop::auth::{FirebaseAuth, LoginFlow};
use bablootooth_desktop::bluetooth::{AdapterController, BluezRadio, DesktopLocation};
use bablootooth_desktop::config::Config;
use bablootooth_desktop::controller::DeviceController;
use bablootooth_desktop::events::{AppCommand, ChannelView, EventProcessor, ViewUpdate};
use bablootooth_desktop::state::AppState;
use bablootooth_desktop::storage::PermissionStore;
use bablootooth_desktop::ui::{self, BablootoothTray, TrayAction};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bablootooth_desktop=info".parse()?)
                .add_directive("bablootooth=info".parse()?),
        )
        .init();

    info!("Starting Bablootooth Desktop v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Initialize storage
    let permissions = PermissionStore::new(&config.data_dir)?;
    info!("Permission store initialized");

    // Create application state
    let state = AppState::new();

    let (command_tx, command_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (view_tx, view_rx) = mpsc::unbounded_channel::<ViewUpdate>();

    // Start system tray
    let (tray_rx, tray_handle) = ui::run_tray(state.clone())?;

    let core = spawn_core(
        config.clone(),
        permissions,
        state,
        command_tx.clone(),
        command_rx,
        view_tx,
        tray_rx,
        tray_handle,
    )?;

    info!("Ready.");
    ui::run_app(config.ui.clone(), command_tx, view_rx)?;

    if core.join().is_err() {
        error!("Core thread panicked");
    }

    info!("Bablootooth Desktop stopped");
    Ok(())
}

/// Run the event loop on its own single-threaded runtime.
#[allow(clippy::too_many_arguments)]
fn spawn_core(
    config: Config,
    permissions: PermissionStore,
    state: Arc<AppState>,
    command_tx: mpsc::UnboundedSender<AppCommand>,
    command_rx: mpsc::UnboundedReceiver<AppCommand>,
    view_tx: mpsc::UnboundedSender<ViewUpdate>,
    mut tray_rx: mpsc::UnboundedReceiver<TrayAction>,
    tray_handle: ksni::Handle<BablootoothTray>,
) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("bablootooth-core".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to build runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let (radio_tx, radio_rx) = mpsc::unbounded_channel();
                let radio = BluezRadio::new(config.bluetooth.inquiry_window(), radio_tx).await;
                if let Some(name) = radio.adapter_name() {
                    info!("Bluetooth radio ready on {}", name);
                }

                let view = ChannelView::new(view_tx.clone(), state.clone());
                let controller = DeviceController::new(
                    radio,
                    DesktopLocation::new(&config.location),
                    permissions,
                    AdapterController::new(config.bluetooth.discoverable_window()),
                    view.clone(),
                    view,
                );
                let login = LoginFlow::new(FirebaseAuth::new(&config.auth));

                // Forward tray actions into the command stream
                tokio::spawn(async move {
                    while let Some(action) = tray_rx.recv().await {
                        info!("Tray action: {:?}", action);
                        if command_tx.send(action.command()).is_err() {
                            break;
                        }
                    }
                });

                EventProcessor::new(controller, login, state, view_tx)
                    .with_change_listener(move || {
                        tray_handle.update(|_| {});
                    })
                    .run(command_rx, radio_rx)
                    .await;
            });
        })?;

    Ok(handle)
}
