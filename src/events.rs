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

//! Event processing and message dispatch.
//!
//! All application logic runs inside [`EventProcessor::run`], one command
//! or radio event at a time. The UI only sends [`AppCommand`]s and renders
//! [`ViewUpdate`]s.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::{Authenticator, LoginFlow, LoginOutcome};
use crate::bluetooth::{LocationServices, Radio, RadioEvent};
use crate::controller::DeviceController;
use crate::permissions::{ConsentRequest, PermissionAuthority, PermissionOutcome, PromptToken};
use crate::presenter::{Notice, Notifier, Presenter};
use crate::state::AppState;

/// Requests from the UI and tray.
#[derive(Debug, Clone)]
pub enum AppCommand {
    SignIn { email: String, password: String },
    Connect,
    Scan,
    ConsentResolved {
        token: PromptToken,
        outcome: PermissionOutcome,
    },
    ResetPermissions,
    Shutdown,
}

/// Changes the UI must render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Leave the login screen for the device screen.
    SignedIn { email: String },
    Notice(Notice),
    /// Replace the whole list.
    ListReset(Vec<String>),
    /// Append one row.
    ListInserted { index: usize, entry: String },
    ConsentPrompt(ConsentRequest),
    Quit,
}

/// Presenter and notifier that forward to the UI thread.
#[derive(Clone)]
pub struct ChannelView {
    tx: mpsc::UnboundedSender<ViewUpdate>,
    state: Arc<AppState>,
}

impl ChannelView {
    pub fn new(tx: mpsc::UnboundedSender<ViewUpdate>, state: Arc<AppState>) -> Self {
        Self { tx, state }
    }

    fn send(&self, update: ViewUpdate) {
        if self.tx.send(update).is_err() {
            debug!("UI gone, dropping view update");
        }
    }
}

impl Presenter for ChannelView {
    fn refresh(&mut self, items: &[String]) {
        self.state.set_device_count(items.len());
        self.send(ViewUpdate::ListReset(items.to_vec()));
    }

    fn inserted(&mut self, index: usize, item: &str) {
        self.state.set_device_count(index + 1);
        self.send(ViewUpdate::ListInserted {
            index,
            entry: item.to_string(),
        });
    }
}

impl Notifier for ChannelView {
    fn notice(&mut self, notice: Notice) {
        info!("Notice: {}", notice.text);
        self.state.set_last_notice(notice.text.clone());
        self.send(ViewUpdate::Notice(notice));
    }

    fn prompt(&mut self, request: ConsentRequest) {
        self.send(ViewUpdate::ConsentPrompt(request));
    }
}

/// Process commands and radio events on a single task.
pub struct EventProcessor<R, L, A, P, N, T> {
    controller: DeviceController<R, L, A, P, N>,
    login: LoginFlow<T>,
    state: Arc<AppState>,
    view_tx: mpsc::UnboundedSender<ViewUpdate>,
    on_change: Option<Box<dyn Fn()>>,
}

impl<R, L, A, P, N, T> EventProcessor<R, L, A, P, N, T>
where
    R: Radio,
    L: LocationServices,
    A: PermissionAuthority,
    P: Presenter,
    N: Notifier,
    T: Authenticator,
{
    /// Create a new event processor.
    pub fn new(
        controller: DeviceController<R, L, A, P, N>,
        login: LoginFlow<T>,
        state: Arc<AppState>,
        view_tx: mpsc::UnboundedSender<ViewUpdate>,
    ) -> Self {
        Self {
            controller,
            login,
            state,
            view_tx,
            on_change: None,
        }
    }

    /// Call `f` after every processed event (used to refresh the tray).
    pub fn with_change_listener(mut self, f: impl Fn() + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Process a single command. Returns false once the loop should stop.
    pub async fn process_command(&mut self, command: AppCommand) -> bool {
        match command {
            AppCommand::SignIn { email, password } => {
                match self.login.submit(&email, &password).await {
                    LoginOutcome::SignedIn(session) => {
                        self.state.set_user(session.email.clone());
                        self.send(ViewUpdate::SignedIn {
                            email: session.email,
                        });
                    }
                    LoginOutcome::Invalid(notice) | LoginOutcome::Failed(notice) => {
                        self.send(ViewUpdate::Notice(notice));
                    }
                }
            }
            AppCommand::Connect => {
                if self.require_session() {
                    let outcome = self.controller.connect().await;
                    debug!("Connect: {:?}", outcome);
                }
            }
            AppCommand::Scan => {
                if self.require_session() {
                    let outcome = self.controller.scan().await;
                    debug!("Scan: {:?}", outcome);
                }
            }
            AppCommand::ConsentResolved { token, outcome } => {
                let result = self.controller.resolve_consent(token, &outcome).await;
                debug!("Consent {}: {:?}", token.id(), result);
            }
            AppCommand::ResetPermissions => {
                info!("Resetting permissions");
                self.controller.reset_permissions();
            }
            AppCommand::Shutdown => {
                info!("Shutdown requested");
                self.controller.shutdown().await;
                self.send(ViewUpdate::Quit);
                return false;
            }
        }

        self.sync_state();
        true
    }

    /// Process a single radio notification.
    pub fn process_radio_event(&mut self, event: RadioEvent) {
        self.controller.handle_radio_event(event);
        self.sync_state();
    }

    /// Run until shutdown or until the UI goes away.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<AppCommand>,
        mut radio_events: mpsc::UnboundedReceiver<RadioEvent>,
    ) {
        info!("Event loop started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.process_command(command).await {
                            break;
                        }
                    }
                    None => {
                        info!("Command channel closed");
                        self.controller.shutdown().await;
                        break;
                    }
                },
                Some(event) = radio_events.recv() => {
                    self.process_radio_event(event);
                }
            }
        }

        info!("Event loop stopped");
    }

    fn require_session(&self) -> bool {
        if self.state.is_signed_in() {
            true
        } else {
            warn!("Ignoring device action before sign-in");
            false
        }
    }

    fn sync_state(&self) {
        self.state.set_scanning(self.controller.is_scanning());
        if let Some(f) = &self.on_change {
            f();
        }
    }

    fn send(&self, update: ViewUpdate) {
        if self.view_tx.send(update).is_err() {
            debug!("UI gone, dropping view update");
        }
    }
}
