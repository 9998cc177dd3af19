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

//! Permission kinds and the consent gate.
//!
//! Every Bluetooth operation passes through the [`PermissionGate`] first.
//! Grants are owned by a [`PermissionAuthority`] and are re-read on every
//! check; nothing here caches a decision past a single check-then-act.

mod gate;

pub use gate::{
    ConsentRequest, GateDecision, GateError, PendingAction, PermissionGate, PromptToken,
    Resolution,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A named capability gate that must be granted before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Search for nearby devices.
    Scan,
    /// Talk to devices and read their names.
    Connect,
    /// Make this computer visible to others.
    Advertise,
    /// Precise location, required alongside scanning.
    FineLocation,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 4] = [
        PermissionKind::Scan,
        PermissionKind::Connect,
        PermissionKind::Advertise,
        PermissionKind::FineLocation,
    ];

    /// Human readable label shown in the consent dialog.
    pub fn label(&self) -> &'static str {
        match self {
            PermissionKind::Scan => "Find nearby Bluetooth devices",
            PermissionKind::Connect => "Connect to paired devices",
            PermissionKind::Advertise => "Make this computer discoverable",
            PermissionKind::FineLocation => "Access precise location",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionKind::Scan => "scan",
            PermissionKind::Connect => "connect",
            PermissionKind::Advertise => "advertise",
            PermissionKind::FineLocation => "fine_location",
        };
        f.write_str(name)
    }
}

/// Per-kind answer from a consent prompt.
pub type PermissionOutcome = HashMap<PermissionKind, bool>;

/// Source of truth for permission grants.
pub trait PermissionAuthority {
    /// Whether `kind` is currently granted.
    fn is_granted(&self, kind: PermissionKind) -> bool;

    /// Record the user's decision for `kind`.
    fn record(&mut self, kind: PermissionKind, granted: bool) -> Result<()>;

    /// Forget the decision for `kind` so the next use prompts again.
    fn revoke(&mut self, kind: PermissionKind) -> Result<()>;
}
