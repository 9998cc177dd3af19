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

//! Persistent permission grants.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::permissions::{PermissionAuthority, PermissionKind};

/// Decision recorded for a permission kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub granted: bool,
    pub decided_at: chrono::DateTime<chrono::Local>,
}

/// Permission grants stored as JSON in the data directory.
pub struct PermissionStore {
    path: PathBuf,
    grants: BTreeMap<PermissionKind, PermissionGrant>,
}

impl PermissionStore {
    /// Create or open the grant store.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("permissions.json");
        let grants = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, grants })
    }

    /// Get the stored decision for a kind.
    pub fn get(&self, kind: PermissionKind) -> Option<&PermissionGrant> {
        self.grants.get(&kind)
    }

    /// Save to disk.
    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.grants)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PermissionAuthority for PermissionStore {
    fn is_granted(&self, kind: PermissionKind) -> bool {
        self.grants.get(&kind).map(|g| g.granted).unwrap_or(false)
    }

    fn record(&mut self, kind: PermissionKind, granted: bool) -> Result<()> {
        self.grants.insert(
            kind,
            PermissionGrant {
                granted,
                decided_at: chrono::Local::now(),
            },
        );
        info!(
            "Permission {} {}",
            kind,
            if granted { "granted" } else { "denied" }
        );
        self.save()
    }

    fn revoke(&mut self, kind: PermissionKind) -> Result<()> {
        if self.grants.remove(&kind).is_some() {
            info!("Permission {} revoked", kind);
        }
        self.save()
    }
}
