//! Roamer WASM client: mirrors the shared world into a full-window canvas.
//!
//! The browser only feeds queues (WebSocket frames, arrow keys, window
//! resizes, repeat ticks, image loads); `RoamerClient::poll()` drains them
//! into the `roamer` session once per animation frame and redraws the canvas
//! when something changed.
//!
//! Compile with:
//!
//! ```bash
//! wasm-pack build --target web --release
//! ```
//!
//! Or for development (faster, includes debug info):
//!
//! ```bash
//! wasm-pack build --target web --dev
//! ```

// Improve WASM panic messages in the browser console.
pub use console_error_panic_hook::set_once as set_panic_hook;

pub mod bridge;
pub mod canvas;
pub mod client;
pub mod events;
pub mod images;
pub mod keyboard;
pub mod resize;
pub mod timers;

// Re-export the primary public type so consumers can do:
//   `use roamer_wasm::RoamerClient;`
pub use client::RoamerClient;

use wasm_bindgen::prelude::*;

/// Called automatically by the generated JS glue on `init()`.
///
/// Sets up the panic hook and initialises `console_log` so that Rust
/// `log::info!` / `log::error!` calls appear in the browser DevTools console.
#[wasm_bindgen(start)]
pub fn wasm_main() {
    set_panic_hook();
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("roamer-wasm initialised");
}
