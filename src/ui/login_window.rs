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

//! Sign-in window.

use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Button, Entry, Label, Orientation,
    PasswordEntry,
};
use libadwaita as adw;
use tokio::sync::mpsc;
use tracing::error;

use crate::events::AppCommand;

/// The login screen.
pub struct LoginWindow {
    window: ApplicationWindow,
    toasts: adw::ToastOverlay,
}

impl LoginWindow {
    pub fn new(app: &impl IsA<Application>, commands: mpsc::UnboundedSender<AppCommand>) -> Self {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("Bablootooth - Sign In")
            .default_width(360)
            .default_height(260)
            .build();

        let main_box = GtkBox::new(Orientation::Vertical, 12);
        main_box.set_margin_top(24);
        main_box.set_margin_bottom(24);
        main_box.set_margin_start(24);
        main_box.set_margin_end(24);

        let title = Label::new(Some("Sign In"));
        title.add_css_class("title-2");
        main_box.append(&title);

        let email_entry = Entry::builder()
            .placeholder_text("Email")
            .input_purpose(gtk4::InputPurpose::Email)
            .build();
        main_box.append(&email_entry);

        let password_entry = PasswordEntry::builder()
            .placeholder_text("Password")
            .show_peek_icon(true)
            .build();
        main_box.append(&password_entry);

        let sign_in_button = Button::with_label("Sign In");
        sign_in_button.add_css_class("suggested-action");
        sign_in_button.set_margin_top(8);
        main_box.append(&sign_in_button);

        let toasts = adw::ToastOverlay::new();
        toasts.set_child(Some(&main_box));
        window.set_child(Some(&toasts));

        let email_ref = email_entry.clone();
        let password_ref = password_entry.clone();
        let submit = move || {
            let command = AppCommand::SignIn {
                email: email_ref.text().to_string(),
                password: password_ref.text().to_string(),
            };
            if let Err(e) = commands.send(command) {
                error!("Failed to send sign-in: {}", e);
            }
        };

        let submit_click = submit.clone();
        sign_in_button.connect_clicked(move |_| submit_click());
        password_entry.connect_activate(move |_| submit());

        Self { window, toasts }
    }

    pub fn present(&self) {
        self.window.present();
    }

    pub fn toasts(&self) -> &adw::ToastOverlay {
        &self.toasts
    }

    /// Discard the login screen.
    pub fn close(&self) {
        self.window.destroy();
    }
}
