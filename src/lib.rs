/// Extension Switch - Chrome Extension for pausing and restoring extensions
/// Built with Rust + WASM + Yew

mod bulk;
mod chrome;
mod controller;
mod directory;
mod error;
mod extension_data;
mod host;
mod reconcile;
mod storage;
mod summary;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
