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

//! GTK application: screen switching and rendering of view updates.

use anyhow::Result;
use gtk4::prelude::*;
use libadwaita as adw;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::consent_dialog::show_consent_dialog;
use super::devices_window::DevicesWindow;
use super::login_window::LoginWindow;
use crate::config::UiConfig;
use crate::events::{AppCommand, ViewUpdate};
use crate::presenter::{Notice, NoticeLength};

const APP_ID: &str = "io.github.bablootooth.Desktop";

/// Which screen is showing.
enum Screen {
    None,
    Login(LoginWindow),
    Devices(DevicesWindow),
}

fn show_toast(overlay: &adw::ToastOverlay, notice: &Notice, ui: &UiConfig) {
    let toast = adw::Toast::new(&notice.text);
    toast.set_timeout(match notice.length {
        NoticeLength::Short => ui.notice_short_secs,
        NoticeLength::Long => ui.notice_long_secs,
    });
    overlay.add_toast(toast);
}

fn apply_update(
    app: &adw::Application,
    screen: &Rc<RefCell<Screen>>,
    commands: &mpsc::UnboundedSender<AppCommand>,
    ui: &UiConfig,
    update: ViewUpdate,
) {
    match update {
        ViewUpdate::SignedIn { email } => {
            let devices = DevicesWindow::new(app, &email, commands.clone());
            devices.present();
            let previous = screen.replace(Screen::Devices(devices));
            if let Screen::Login(login) = previous {
                login.close();
            }
            info!("Switched to device screen");
        }
        ViewUpdate::Notice(notice) => match &*screen.borrow() {
            Screen::Login(login) => show_toast(login.toasts(), &notice, ui),
            Screen::Devices(devices) => show_toast(devices.toasts(), &notice, ui),
            Screen::None => debug!("No window for notice: {}", notice.text),
        },
        ViewUpdate::ListReset(items) => {
            if let Screen::Devices(devices) = &*screen.borrow() {
                devices.refresh(&items);
            }
        }
        ViewUpdate::ListInserted { index, entry } => {
            if let Screen::Devices(devices) = &*screen.borrow() {
                devices.insert(index, &entry);
            }
        }
        ViewUpdate::ConsentPrompt(request) => {
            let answer = show_consent_dialog(app, &request);
            let commands = commands.clone();
            let token = request.token;
            glib::MainContext::default().spawn_local(async move {
                if let Ok(outcome) = answer.await {
                    if let Err(e) = commands.send(AppCommand::ConsentResolved { token, outcome }) {
                        error!("Failed to send consent answer: {}", e);
                    }
                }
            });
        }
        ViewUpdate::Quit => {
            info!("Quitting UI");
            app.quit();
        }
    }
}

/// Run the GTK application until the last window closes.
pub fn run_app(
    ui: UiConfig,
    commands: mpsc::UnboundedSender<AppCommand>,
    mut updates: mpsc::UnboundedReceiver<ViewUpdate>,
) -> Result<()> {
    let app = adw::Application::builder().application_id(APP_ID).build();
    let screen = Rc::new(RefCell::new(Screen::None));

    let screen_activate = screen.clone();
    let commands_activate = commands.clone();
    app.connect_activate(move |app| {
        match &*screen_activate.borrow() {
            Screen::Login(login) => return login.present(),
            Screen::Devices(devices) => return devices.present(),
            Screen::None => {}
        }
        let login = LoginWindow::new(app, commands_activate.clone());
        login.present();
        screen_activate.replace(Screen::Login(login));
    });

    // Drain core updates on the main loop
    let app_ref = app.clone();
    let screen_ref = screen.clone();
    let commands_ref = commands.clone();
    glib::timeout_add_local(Duration::from_millis(50), move || {
        while let Ok(update) = updates.try_recv() {
            apply_update(&app_ref, &screen_ref, &commands_ref, &ui, update);
        }
        glib::ControlFlow::Continue
    });

    let status = app.run_with_args::<&str>(&[]);
    info!("GTK application exited ({:?})", status);

    let _ = commands.send(AppCommand::Shutdown);
    Ok(())
}
