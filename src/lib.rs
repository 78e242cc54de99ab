/// Tab Activity Tracker - Chrome Extension reporting time spent per site
/// Built with Rust + WASM + Yew

mod backend;
mod chrome;
mod config;
mod domain;
mod error;
pub mod host;
mod identity;
mod registrar;
mod storage;
mod tab_data;
pub mod tracker;
pub mod ui;
mod worker;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Hostname as it would appear in an activity record, for JavaScript callers
#[wasm_bindgen]
pub fn extract_hostname(url: &str) -> String {
    domain::normalize_hostname(url).unwrap_or_else(|_| "invalid".to_string())
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start tracking tab activity in the background service worker
#[wasm_bindgen]
pub fn start_background() {
    chrome::install_background_worker();
}
