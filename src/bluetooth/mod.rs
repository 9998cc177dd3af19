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

//! Bluetooth adapter control and device discovery.
//!
//! The [`Radio`] and [`LocationServices`] traits are the seams to the
//! operating system; [`BluezRadio`] and [`DesktopLocation`] are the BlueZ
//! and GNOME implementations.

mod adapter;
mod bluez;
mod discovery;
mod location;

pub use adapter::{AdapterController, ConnectOutcome};
pub use bluez::BluezRadio;
pub use discovery::{resolve_display_name, DiscoverySession, ScanOutcome};
pub use location::{DesktopLocation, LocationServices};

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by the radio.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RadioError {
    /// The platform refused the call for lack of authorization.
    #[error("not authorized")]
    NotAuthorized,
    /// No adapter is present.
    #[error("Bluetooth adapter unavailable")]
    Unavailable,
    #[error("Bluetooth error: {0}")]
    Platform(String),
}

impl From<bluer::Error> for RadioError {
    fn from(err: bluer::Error) -> Self {
        match err.kind {
            bluer::ErrorKind::NotAuthorized => RadioError::NotAuthorized,
            bluer::ErrorKind::NotAvailable => RadioError::Unavailable,
            _ => RadioError::Platform(err.to_string()),
        }
    }
}

/// Identifies one discovery subscription.
///
/// Events tagged with an id other than the active one are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A device as delivered by a found notification.
///
/// The address is always readable; the name lookup may have been refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub address: String,
    pub name: Result<Option<String>, RadioError>,
}

impl DeviceHandle {
    pub fn new(address: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            address: address.into(),
            name: Ok(name.map(str::to_string)),
        }
    }
}

/// A device after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub display_name: String,
    pub address: String,
}

impl DiscoveredDevice {
    /// The rendered list entry, also used as the dedup identity.
    pub fn display(&self) -> String {
        format!("{} ({})", self.display_name, self.address)
    }
}

/// Asynchronous notifications posted by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    DeviceFound {
        subscription: SubscriptionId,
        device: DeviceHandle,
    },
    DiscoveryFinished {
        subscription: SubscriptionId,
    },
}

/// Operating-system Bluetooth boundary.
#[allow(async_fn_in_trait)]
pub trait Radio {
    /// Whether any adapter exists.
    async fn is_present(&self) -> bool;

    async fn is_enabled(&self) -> Result<bool, RadioError>;

    /// Ask the system to power the adapter on. Nothing is confirmed.
    async fn request_enable(&self) -> Result<(), RadioError>;

    /// Make the adapter visible to others for `window`.
    async fn request_discoverable(&self, window: Duration) -> Result<(), RadioError>;

    async fn is_discovering(&self) -> Result<bool, RadioError>;

    /// Start an inquiry whose notifications are tagged with `subscription`.
    ///
    /// Returns whether the system accepted the request.
    async fn start_discovery(&self, subscription: SubscriptionId) -> Result<bool, RadioError>;

    async fn cancel_discovery(&self) -> Result<(), RadioError>;
}
