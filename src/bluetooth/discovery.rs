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

//! Discovery session: scan preconditions, subscription lifetime and
//! accumulation of found devices.

use tracing::{debug, error, info, warn};

use super::{DeviceHandle, DiscoveredDevice, LocationServices, Radio, RadioError, SubscriptionId};
use crate::permissions::{
    GateDecision, PendingAction, PermissionAuthority, PermissionGate, PermissionKind,
};
use crate::presenter::{Notice, Notifier, Presenter, ResultSet};

/// Name shown when the device reports none.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Name shown when reading the name is not authorized.
pub const DENIED_NAME: &str = "Permission Denied";

/// What a scan request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    NotSupported,
    AwaitingConsent,
    RadioOff,
    LocationOff,
    Started,
    Failed,
}

/// Pick the display name for a found device.
pub fn resolve_display_name(device: &DeviceHandle, connect_granted: bool) -> String {
    if !connect_granted {
        return DENIED_NAME.to_string();
    }

    match &device.name {
        Ok(Some(name)) if !name.is_empty() => name.clone(),
        Ok(_) => UNKNOWN_NAME.to_string(),
        Err(RadioError::NotAuthorized) => DENIED_NAME.to_string(),
        Err(e) => {
            debug!("Name lookup for {} failed: {}", device.address, e);
            UNKNOWN_NAME.to_string()
        }
    }
}

/// Tracks the one discovery that may be active at a time.
#[derive(Debug, Default)]
pub struct DiscoverySession {
    active: Option<SubscriptionId>,
    next_id: u64,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscription currently receiving notifications.
    pub fn active(&self) -> Option<SubscriptionId> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Open a new subscription, dropping any previous one.
    fn begin(&mut self) -> SubscriptionId {
        if let Some(previous) = self.end() {
            debug!("Subscription {} replaced", previous);
        }
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.active = Some(id);
        id
    }

    /// Close the active subscription, returning it.
    pub fn end(&mut self) -> Option<SubscriptionId> {
        self.active.take()
    }

    /// Start a fresh discovery.
    pub async fn scan<R, L, A, P, N>(
        &mut self,
        radio: &R,
        location: &L,
        gate: &mut PermissionGate<A>,
        results: &mut ResultSet<P>,
        notifier: &mut N,
    ) -> ScanOutcome
    where
        R: Radio,
        L: LocationServices,
        A: PermissionAuthority,
        P: Presenter,
        N: Notifier,
    {
        if !radio.is_present().await {
            notifier.notice(Notice::short("Bluetooth not supported"));
            return ScanOutcome::NotSupported;
        }

        if let GateDecision::Pending(request) = gate.ensure(
            &[PermissionKind::Scan, PermissionKind::FineLocation],
            PendingAction::Scan,
        ) {
            notifier.prompt(request);
            return ScanOutcome::AwaitingConsent;
        }

        match radio.is_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                notifier.notice(Notice::short("Bluetooth is disabled. Turn it on first."));
                return ScanOutcome::RadioOff;
            }
            Err(e) => return Self::fail(e, notifier),
        }

        if !location.is_enabled().await {
            notifier.notice(Notice::long("Please enable location services"));
            if let Err(e) = location.open_settings().await {
                error!("Failed to open location settings: {}", e);
            }
            return ScanOutcome::LocationOff;
        }

        match radio.is_discovering().await {
            Ok(true) => {
                info!("Cancelling discovery still in progress");
                if let Err(e) = radio.cancel_discovery().await {
                    warn!("Failed to cancel discovery: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Could not query discovery state: {}", e),
        }

        results.clear();
        let subscription = self.begin();

        match radio.start_discovery(subscription).await {
            Ok(true) => {
                info!("Discovery {} started", subscription);
                notifier.notice(Notice::short("Scanning for devices..."));
                ScanOutcome::Started
            }
            Ok(false) => {
                self.end();
                notifier.notice(Notice::short("Failed to start scanning"));
                ScanOutcome::Failed
            }
            Err(e) => {
                self.end();
                Self::fail(e, notifier)
            }
        }
    }

    /// Handle a found notification. Returns whether the list grew.
    pub fn on_device_found<A, P>(
        &mut self,
        subscription: SubscriptionId,
        device: DeviceHandle,
        gate: &PermissionGate<A>,
        results: &mut ResultSet<P>,
    ) -> bool
    where
        A: PermissionAuthority,
        P: Presenter,
    {
        if self.active != Some(subscription) {
            debug!("Dropping event from stale subscription {}", subscription);
            return false;
        }

        let display_name = resolve_display_name(&device, gate.is_granted(PermissionKind::Connect));
        let found = DiscoveredDevice {
            display_name,
            address: device.address,
        };

        let entry = found.display();
        let added = results.append_unique(entry);
        if added {
            info!("Found device: {}", found.display());
        }
        added
    }

    /// Handle the end of an inquiry. Returns whether it was the active one.
    pub fn on_finished(&mut self, subscription: SubscriptionId) -> bool {
        if self.active == Some(subscription) {
            self.end();
            info!("Discovery {} finished", subscription);
            true
        } else {
            false
        }
    }

    fn fail<N: Notifier>(err: RadioError, notifier: &mut N) -> ScanOutcome {
        warn!("Scan failed: {}", err);
        let text = match err {
            RadioError::NotAuthorized => "Permission denied while accessing Bluetooth",
            RadioError::Unavailable => "Bluetooth not supported",
            RadioError::Platform(_) => "Failed to start scanning",
        };
        notifier.notice(Notice::short(text));
        ScanOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_used_when_authorized() {
        let device = DeviceHandle::new("AA:BB:CC:DD:EE:FF", Some("Pixel"));
        assert_eq!(resolve_display_name(&device, true), "Pixel");
    }

    #[test]
    fn test_missing_name_is_unknown() {
        let device = DeviceHandle::new("AA:BB:CC:DD:EE:FF", None);
        assert_eq!(resolve_display_name(&device, true), UNKNOWN_NAME);
    }

    #[test]
    fn test_unauthorized_name_is_denied() {
        let device = DeviceHandle::new("AA:BB:CC:DD:EE:FF", Some("Pixel"));
        assert_eq!(resolve_display_name(&device, false), DENIED_NAME);

        let refused = DeviceHandle {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            name: Err(RadioError::NotAuthorized),
        };
        assert_eq!(resolve_display_name(&refused, true), DENIED_NAME);
    }

    #[test]
    fn test_begin_replaces_subscription() {
        let mut session = DiscoverySession::new();
        let first = session.begin();
        let second = session.begin();

        assert_ne!(first, second);
        assert_eq!(session.active(), Some(second));
        assert!(!session.on_finished(first));
        assert!(session.on_finished(second));
        assert!(!session.is_active());
    }
}
