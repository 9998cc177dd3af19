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

//! UI module for windows, dialogs and the system tray.

mod app;
mod consent_dialog;
mod devices_window;
mod login_window;
mod tray;

pub use app::run_app;
pub use consent_dialog::show_consent_dialog;
pub use tray::{run_tray, BablootoothTray, TrayAction};
