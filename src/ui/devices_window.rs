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

//! Device discovery window.

use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Button, Label, ListBox, ListBoxRow,
    Orientation, ScrolledWindow, SelectionMode,
};
use libadwaita as adw;
use tokio::sync::mpsc;
use tracing::error;

use crate::events::AppCommand;

/// The discovery screen: Connect and Scan buttons above the device list.
pub struct DevicesWindow {
    window: ApplicationWindow,
    toasts: adw::ToastOverlay,
    list_box: ListBox,
}

impl DevicesWindow {
    pub fn new(
        app: &impl IsA<Application>,
        email: &str,
        commands: mpsc::UnboundedSender<AppCommand>,
    ) -> Self {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("Bablootooth")
            .default_width(420)
            .default_height(520)
            .build();

        let main_box = GtkBox::new(Orientation::Vertical, 12);
        main_box.set_margin_top(16);
        main_box.set_margin_bottom(16);
        main_box.set_margin_start(16);
        main_box.set_margin_end(16);

        let header = Label::new(Some(&format!("Signed in as {}", email)));
        header.add_css_class("dim-label");
        header.set_xalign(0.0);
        main_box.append(&header);

        let button_box = GtkBox::new(Orientation::Horizontal, 8);
        button_box.set_homogeneous(true);

        let connect_button = Button::with_label("Connect");
        let scan_button = Button::with_label("Scan");
        scan_button.add_css_class("suggested-action");
        button_box.append(&connect_button);
        button_box.append(&scan_button);
        main_box.append(&button_box);

        let scrolled = ScrolledWindow::builder()
            .hexpand(true)
            .vexpand(true)
            .build();

        let list_box = ListBox::new();
        list_box.set_selection_mode(SelectionMode::None);
        list_box.add_css_class("boxed-list");
        scrolled.set_child(Some(&list_box));
        main_box.append(&scrolled);

        let toasts = adw::ToastOverlay::new();
        toasts.set_child(Some(&main_box));
        window.set_child(Some(&toasts));

        let tx_connect = commands.clone();
        connect_button.connect_clicked(move |_| {
            if let Err(e) = tx_connect.send(AppCommand::Connect) {
                error!("Failed to send Connect: {}", e);
            }
        });

        scan_button.connect_clicked(move |_| {
            if let Err(e) = commands.send(AppCommand::Scan) {
                error!("Failed to send Scan: {}", e);
            }
        });

        Self {
            window,
            toasts,
            list_box,
        }
    }

    pub fn present(&self) {
        self.window.present();
    }

    pub fn toasts(&self) -> &adw::ToastOverlay {
        &self.toasts
    }

    /// Full refresh.
    pub fn refresh(&self, items: &[String]) {
        while let Some(child) = self.list_box.first_child() {
            self.list_box.remove(&child);
        }
        for item in items {
            self.list_box.append(&device_row(item));
        }
    }

    /// Incremental insert of one row.
    pub fn insert(&self, index: usize, entry: &str) {
        let position = i32::try_from(index).unwrap_or(-1);
        self.list_box.insert(&device_row(entry), position);
    }
}

fn device_row(entry: &str) -> ListBoxRow {
    let row = ListBoxRow::new();
    row.set_activatable(false);
    row.set_selectable(false);

    let label = Label::new(Some(entry));
    label.set_xalign(0.0);
    label.set_margin_top(8);
    label.set_margin_bottom(8);
    label.set_margin_start(12);
    label.set_margin_end(12);

    row.set_child(Some(&label));
    row
}
