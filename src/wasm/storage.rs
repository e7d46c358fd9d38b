//! `localStorage` preference store and the JS theme API

use wasm_bindgen::prelude::*;
use web_sys::Storage;

use crate::theme::{self, PreferenceStore, Theme};
use crate::widget::WidgetError;

fn storage() -> Result<Storage, WidgetError> {
    web_sys::window()
        .ok_or_else(|| WidgetError::Storage("no global window".into()))?
        .local_storage()
        .map_err(|e| WidgetError::Storage(format!("{:?}", e)))?
        .ok_or_else(|| WidgetError::Storage("localStorage unavailable".into()))
}

/// Preference store over `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl PreferenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
        storage()?
            .get_item(key)
            .map_err(|e| WidgetError::Storage(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), WidgetError> {
        storage()?
            .set_item(key, value)
            .map_err(|e| WidgetError::Storage(format!("{:?}", e)))
    }
}

/// Mirror the theme onto `<html data-theme="...">` for stylesheet selectors
fn reflect(theme: Theme) {
    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element());
    if let Some(root) = root {
        root.set_attribute("data-theme", theme.as_str()).ok();
    }
}

/// Load the stored theme (dark when absent) and apply it to the page
pub(crate) fn init_theme() -> Theme {
    let theme = theme::init(Box::new(LocalStorageStore));
    reflect(theme);
    theme
}

/// Active theme name ("dark" or "light")
#[wasm_bindgen(js_name = currentTheme)]
pub fn current_theme() -> String {
    theme::current().as_str().to_string()
}

/// Flip between dark and light, persisting the choice
#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() -> String {
    let theme = theme::toggle();
    reflect(theme);
    theme.as_str().to_string()
}

/// Set the theme by name; unknown names are rejected
#[wasm_bindgen(js_name = setTheme)]
pub fn set_theme(name: &str) -> Result<String, JsValue> {
    let theme = Theme::parse(name).ok_or_else(|| {
        JsValue::from_str(&format!("unknown theme '{}'", name))
    })?;
    theme::set(theme);
    reflect(theme);
    Ok(theme.as_str().to_string())
}
