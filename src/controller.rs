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

//! Discovery screen logic: ties the gate, adapter and session together.

use tracing::{error, info, warn};

use crate::bluetooth::{
    AdapterController, ConnectOutcome, DiscoverySession, LocationServices, Radio, RadioEvent,
    ScanOutcome,
};
use crate::permissions::{
    PendingAction, PermissionAuthority, PermissionGate, PermissionOutcome, PromptToken,
    Resolution,
};
use crate::presenter::{Notice, Notifier, Presenter, ResultSet};

/// Outcome of running an action, for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Connect(ConnectOutcome),
    Scan(ScanOutcome),
}

/// Owns everything the discovery screen acts on.
pub struct DeviceController<R, L, A, P, N> {
    radio: R,
    location: L,
    gate: PermissionGate<A>,
    adapter: AdapterController,
    session: DiscoverySession,
    results: ResultSet<P>,
    notifier: N,
}

impl<R, L, A, P, N> DeviceController<R, L, A, P, N>
where
    R: Radio,
    L: LocationServices,
    A: PermissionAuthority,
    P: Presenter,
    N: Notifier,
{
    pub fn new(
        radio: R,
        location: L,
        authority: A,
        adapter: AdapterController,
        presenter: P,
        notifier: N,
    ) -> Self {
        Self {
            radio,
            location,
            gate: PermissionGate::new(authority),
            adapter,
            session: DiscoverySession::new(),
            results: ResultSet::new(presenter),
            notifier,
        }
    }

    /// Power on the adapter or make it discoverable.
    pub async fn connect(&mut self) -> ConnectOutcome {
        self.adapter
            .connect(&self.radio, &mut self.gate, &mut self.notifier)
            .await
    }

    /// Start a fresh discovery.
    pub async fn scan(&mut self) -> ScanOutcome {
        self.session
            .scan(
                &self.radio,
                &self.location,
                &mut self.gate,
                &mut self.results,
                &mut self.notifier,
            )
            .await
    }

    async fn run(&mut self, action: PendingAction) -> ActionOutcome {
        match action {
            PendingAction::Connect => ActionOutcome::Connect(self.connect().await),
            PendingAction::Scan => ActionOutcome::Scan(self.scan().await),
        }
    }

    /// Apply the answer to a consent prompt.
    ///
    /// A full grant re-runs the original action once; anything else drops it.
    pub async fn resolve_consent(
        &mut self,
        token: PromptToken,
        outcome: &PermissionOutcome,
    ) -> Option<ActionOutcome> {
        match self.gate.resolve(token, outcome) {
            Ok(Resolution::Retry(action)) => {
                info!("Permissions granted, retrying {:?}", action);
                Some(self.run(action).await)
            }
            Ok(Resolution::Denied(action)) => {
                info!("Permissions denied, abandoning {:?}", action);
                self.notifier
                    .notice(Notice::short("Required permissions denied"));
                None
            }
            Err(e) => {
                error!("Consent answer ignored: {}", e);
                None
            }
        }
    }

    /// Forget every permission decision so the next action prompts again.
    pub fn reset_permissions(&mut self) {
        match self.gate.reset() {
            Ok(()) => self.notifier.notice(Notice::short("Permissions reset")),
            Err(e) => {
                error!("Failed to reset permissions: {}", e);
                self.notifier
                    .notice(Notice::short("Failed to reset permissions"));
            }
        }
    }

    /// Handle a notification posted by the radio.
    pub fn handle_radio_event(&mut self, event: RadioEvent) -> bool {
        match event {
            RadioEvent::DeviceFound {
                subscription,
                device,
            } => self
                .session
                .on_device_found(subscription, device, &self.gate, &mut self.results),
            RadioEvent::DiscoveryFinished { subscription } => {
                self.session.on_finished(subscription)
            }
        }
    }

    /// Stop any discovery and drop the subscription.
    pub async fn shutdown(&mut self) {
        if let Some(subscription) = self.session.end() {
            info!("Ending discovery {} on shutdown", subscription);
            if let Err(e) = self.radio.cancel_discovery().await {
                warn!("Failed to cancel discovery: {}", e);
            }
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.session.is_active()
    }

    pub fn devices(&self) -> &[String] {
        self.results.entries()
    }

}
