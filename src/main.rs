//! Collection Sync Frontend Entry Point

mod app;
mod components;
mod context;
mod platform;

use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = platform::init_logging() {
        web_sys::console::warn_1(&format!("[APP] logger already installed: {}", err).into());
    }
    mount_to_body(App);
}
