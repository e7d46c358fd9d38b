//! Error types for WASM bindings

use wasm_bindgen::prelude::*;

use crate::widget::WidgetError;

/// Error type for WASM bindings
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct LumenError {
    message: String,
}

#[wasm_bindgen]
impl LumenError {
    /// Get the error message
    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<WidgetError> for LumenError {
    fn from(e: WidgetError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl From<JsValue> for LumenError {
    fn from(value: JsValue) -> Self {
        Self {
            message: value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        }
    }
}

impl From<serde_wasm_bindgen::Error> for LumenError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl From<String> for LumenError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for LumenError {
    fn from(message: &str) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl LumenError {
    /// Convert to JsValue for use as error return
    pub fn into_js(self) -> JsValue {
        JsValue::from_str(&self.message)
    }
}

impl std::fmt::Display for LumenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
