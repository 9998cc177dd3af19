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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;

/// Discovery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    SignedOut,
    Idle,
    Scanning,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::SignedOut => "Signed out",
            ScanStatus::Idle => "Idle",
            ScanStatus::Scanning => "Scanning...",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            ScanStatus::SignedOut => "bluetooth-disabled",
            ScanStatus::Idle => "bluetooth-active",
            ScanStatus::Scanning => "bluetooth-acquiring",
        }
    }
}

/// Shared application state, read by the tray.
#[derive(Debug)]
pub struct AppState {
    /// Signed-in account email.
    pub user: RwLock<Option<String>>,

    /// Whether a discovery is running.
    pub scanning: RwLock<bool>,

    /// Entries in the result list.
    pub device_count: RwLock<usize>,

    /// Last notice shown (for tooltip).
    pub last_notice: RwLock<Option<String>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: RwLock::new(None),
            scanning: RwLock::new(false),
            device_count: RwLock::new(0),
            last_notice: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_user(&self, email: String) {
        *self.user.write() = Some(email);
    }

    pub fn get_user(&self) -> Option<String> {
        self.user.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.read().is_some()
    }

    pub fn set_scanning(&self, scanning: bool) {
        *self.scanning.write() = scanning;
    }

    pub fn set_device_count(&self, count: usize) {
        *self.device_count.write() = count;
    }

    pub fn get_device_count(&self) -> usize {
        *self.device_count.read()
    }

    pub fn get_status(&self) -> ScanStatus {
        if !self.is_signed_in() {
            ScanStatus::SignedOut
        } else if *self.scanning.read() {
            ScanStatus::Scanning
        } else {
            ScanStatus::Idle
        }
    }

    pub fn set_last_notice(&self, text: String) {
        *self.last_notice.write() = Some(text);
    }

    pub fn get_last_notice(&self) -> Option<String> {
        self.last_notice.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_sign_in_and_scan() {
        let state = AppState::new();
        assert_eq!(state.get_status(), ScanStatus::SignedOut);

        state.set_user("a@b.c".to_string());
        assert_eq!(state.get_status(), ScanStatus::Idle);

        state.set_scanning(true);
        assert_eq!(state.get_status(), ScanStatus::Scanning);
    }
}
