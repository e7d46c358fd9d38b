//! WASM bindings for Lumen
//!
//! This module provides the JavaScript-facing API for mounting Lumen
//! widgets on canvas elements in a browser via WebAssembly.

mod canvas;
mod error;
mod scheduler;
mod storage;
mod widget;

pub use canvas::CanvasRenderer;
pub use error::LumenError;
pub use scheduler::BrowserScheduler;
pub use storage::{current_theme, set_theme, toggle_theme, LocalStorageStore};
pub use widget::{widget_catalog, widgets_for_route, LumenWidget};

// Re-export wasm_bindgen for convenience
pub use wasm_bindgen::prelude::*;

/// Initialize the wasm module. Call this once before mounting any widget.
/// Sets up panic hooks, console logging and the stored theme preference.
#[wasm_bindgen(js_name = lumenInit)]
pub fn lumen_init() -> String {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
    storage::init_theme().as_str().to_string()
}
