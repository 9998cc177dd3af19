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

//! Permission consent dialog.

use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Button, CheckButton, Label, Orientation,
};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::info;

use crate::permissions::{ConsentRequest, PermissionKind, PermissionOutcome};

fn all_denied(kinds: &[PermissionKind]) -> PermissionOutcome {
    kinds.iter().map(|kind| (*kind, false)).collect()
}

/// Show the consent dialog for the kinds in `request`.
///
/// Each kind gets its own check box, so a partial grant is possible.
/// Closing the window counts as denying everything.
pub fn show_consent_dialog(
    app: &impl IsA<Application>,
    request: &ConsentRequest,
) -> oneshot::Receiver<PermissionOutcome> {
    info!("Showing consent dialog for {:?}", request.kinds);
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));

    let window = ApplicationWindow::builder()
        .application(app)
        .title("Bablootooth - Permission Request")
        .default_width(380)
        .default_height(200)
        .modal(true)
        .resizable(false)
        .build();
    // Modal over whichever screen is showing.
    window.set_transient_for(app.active_window().as_ref());

    let main_box = GtkBox::new(Orientation::Vertical, 16);
    main_box.set_margin_top(24);
    main_box.set_margin_bottom(24);
    main_box.set_margin_start(24);
    main_box.set_margin_end(24);

    let title = Label::new(Some("Allow Bablootooth to:"));
    title.add_css_class("title-3");
    title.set_xalign(0.0);
    main_box.append(&title);

    let checks: Vec<(PermissionKind, CheckButton)> = request
        .kinds
        .iter()
        .map(|kind| {
            let check = CheckButton::with_label(kind.label());
            check.set_active(true);
            main_box.append(&check);
            (*kind, check)
        })
        .collect();

    let button_box = GtkBox::new(Orientation::Horizontal, 12);
    button_box.set_halign(gtk4::Align::Center);
    button_box.set_margin_top(8);

    let deny_button = Button::with_label("Deny");
    deny_button.set_width_request(80);

    let allow_button = Button::with_label("Allow");
    allow_button.add_css_class("suggested-action");
    allow_button.set_width_request(80);

    button_box.append(&deny_button);
    button_box.append(&allow_button);
    main_box.append(&button_box);

    window.set_child(Some(&main_box));

    // Deny handler
    let window_deny = window.clone();
    let tx_deny = tx.clone();
    let kinds = request.kinds.clone();
    deny_button.connect_clicked(move |_| {
        info!("User denied permissions");
        if let Some(tx) = tx_deny.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = tx.send(all_denied(&kinds));
        }
        window_deny.close();
    });

    // Allow handler: each kind as ticked
    let window_allow = window.clone();
    let tx_allow = tx.clone();
    allow_button.connect_clicked(move |_| {
        let outcome: PermissionOutcome = checks
            .iter()
            .map(|(kind, check)| (*kind, check.is_active()))
            .collect();
        info!("User answered consent: {:?}", outcome);
        if let Some(tx) = tx_allow.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = tx.send(outcome);
        }
        window_allow.close();
    });

    // Window close handler (X button = deny)
    let tx_close = tx.clone();
    let kinds = request.kinds.clone();
    window.connect_close_request(move |_| {
        if let Some(tx) = tx_close.lock().ok().and_then(|mut guard| guard.take()) {
            info!("Consent dialog closed without answer");
            let _ = tx.send(all_denied(&kinds));
        }
        glib::Propagation::Proceed
    });

    window.present();
    allow_button.grab_focus();

    rx
}
