//! givedesk Web Frontend
//!
//! Leptos-based WASM frontend. The QR widget renders through the server's
//! `/api/qr` endpoint and downloads via plain anchor links.

mod api;
mod app;
mod pages;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
