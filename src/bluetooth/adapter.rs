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

//! Adapter power and discoverability.

use std::time::Duration;
use tracing::{info, warn};

use super::{Radio, RadioError};
use crate::permissions::{
    GateDecision, PendingAction, PermissionAuthority, PermissionGate, PermissionKind,
};
use crate::presenter::{Notice, Notifier};

/// What a connect request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    NotSupported,
    AwaitingConsent,
    EnableRequested,
    Discoverable,
    Failed,
}

/// Brings the local adapter up and makes it visible.
#[derive(Debug, Clone)]
pub struct AdapterController {
    discoverable_window: Duration,
}

impl AdapterController {
    pub fn new(discoverable_window: Duration) -> Self {
        Self {
            discoverable_window,
        }
    }

    pub fn discoverable_window(&self) -> Duration {
        self.discoverable_window
    }

    /// Power the adapter on, or make it discoverable if it already is.
    pub async fn connect<R, A, N>(
        &self,
        radio: &R,
        gate: &mut PermissionGate<A>,
        notifier: &mut N,
    ) -> ConnectOutcome
    where
        R: Radio,
        A: PermissionAuthority,
        N: Notifier,
    {
        if !radio.is_present().await {
            notifier.notice(Notice::short("Bluetooth not supported"));
            return ConnectOutcome::NotSupported;
        }

        if let GateDecision::Pending(request) =
            gate.ensure(&[PermissionKind::Connect], PendingAction::Connect)
        {
            notifier.prompt(request);
            return ConnectOutcome::AwaitingConsent;
        }

        let enabled = match radio.is_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => return Self::fail(e, "Permission denied while accessing Bluetooth", notifier),
        };

        if !enabled {
            info!("Adapter is off, requesting power on");
            return match radio.request_enable().await {
                Ok(()) => ConnectOutcome::EnableRequested,
                Err(e) => Self::fail(e, "Permission denied while accessing Bluetooth", notifier),
            };
        }

        if let GateDecision::Pending(request) =
            gate.ensure(&[PermissionKind::Advertise], PendingAction::Connect)
        {
            notifier.prompt(request);
            return ConnectOutcome::AwaitingConsent;
        }

        match radio.request_discoverable(self.discoverable_window).await {
            Ok(()) => {
                info!(
                    "Adapter discoverable for {}s",
                    self.discoverable_window.as_secs()
                );
                notifier.notice(Notice::short("Bluetooth is ON. Ready to pair."));
                ConnectOutcome::Discoverable
            }
            Err(e) => Self::fail(e, "Permission denied: advertise", notifier),
        }
    }

    fn fail<N: Notifier>(err: RadioError, denied_text: &str, notifier: &mut N) -> ConnectOutcome {
        warn!("Adapter request failed: {}", err);
        let text = match err {
            RadioError::NotAuthorized => denied_text.to_string(),
            RadioError::Unavailable => "Bluetooth not supported".to_string(),
            RadioError::Platform(_) => "Bluetooth request failed".to_string(),
        };
        notifier.notice(Notice::short(text));
        ConnectOutcome::Failed
    }
}
