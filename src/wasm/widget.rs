//! LumenWidget - JS handle for one mounted visualization

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use super::canvas::CanvasRenderer;
use super::error::LumenError;
use super::scheduler::BrowserScheduler;
use crate::animation::FrameScheduler;
use crate::host::{MountedWidget, RedrawHook, WidgetHost};
use crate::registry::{WidgetMetadata, WidgetRegistry};
use crate::scene::Scene;
use crate::theme;

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| LumenError::from(e).into_js())
}

/// A widget drawing onto a canvas until it is unmounted or freed
#[wasm_bindgen]
pub struct LumenWidget {
    mounted: MountedWidget,
    renderer: Rc<RefCell<CanvasRenderer>>,
    metadata: WidgetMetadata,
}

#[wasm_bindgen]
impl LumenWidget {
    /// Instantiate a registered widget and mount it on `canvas`
    #[wasm_bindgen(constructor)]
    pub fn new(type_id: &str, canvas: HtmlCanvasElement) -> Result<LumenWidget, JsValue> {
        let registry = WidgetRegistry::new();
        let metadata = registry
            .get_metadata(type_id)
            .cloned()
            .ok_or_else(|| JsValue::from_str(&format!("Unknown widget type: {}", type_id)))?;
        let widget = registry
            .instantiate(type_id)
            .map_err(|e| LumenError::from(e).into_js())?;

        let mut host = WidgetHost::with_tokens(widget, theme::tokens());
        let renderer = CanvasRenderer::new(canvas).map_err(LumenError::into_js)?;
        let renderer = Rc::new(RefCell::new(renderer));
        renderer.borrow_mut().draw(host.scene());

        let target = Rc::clone(&renderer);
        let hook: RedrawHook = Box::new(move |scene: &Scene| {
            if let Ok(mut renderer) = target.try_borrow_mut() {
                renderer.draw(scene);
            }
        });
        let scheduler: Rc<dyn FrameScheduler> = Rc::new(BrowserScheduler::new());
        let mounted = MountedWidget::mount_with(host, scheduler, Some(hook));

        Ok(Self {
            mounted,
            renderer,
            metadata,
        })
    }

    #[wasm_bindgen(getter, js_name = typeId)]
    pub fn type_id(&self) -> String {
        self.metadata.type_id.clone()
    }

    /// Registry metadata (name, category, route, parameter descriptors)
    pub fn metadata(&self) -> Result<JsValue, JsValue> {
        to_js(&self.metadata)
    }

    /// Live parameter values with display strings
    pub fn params(&self) -> Result<JsValue, JsValue> {
        let host = self.mounted.host();
        let info = host.borrow().widget().param_info();
        to_js(&info)
    }

    fn redraw(&self) {
        let host = self.mounted.host();
        let Ok(mut host) = host.try_borrow_mut() else { return };
        if let Ok(mut renderer) = self.renderer.try_borrow_mut() {
            renderer.draw(host.scene());
        }
    }

    // =========================================================================
    // Parameters and actions
    // =========================================================================

    /// Set a parameter; returns the stored (clamped, snapped) value
    #[wasm_bindgen(js_name = setParam)]
    pub fn set_param(&self, id: &str, value: f64) -> Result<f64, JsValue> {
        let stored = self
            .mounted
            .host()
            .borrow_mut()
            .set_param(id, value)
            .map_err(|e| LumenError::from(e).into_js())?;
        self.redraw();
        Ok(stored)
    }

    /// Choose a select option by label
    pub fn select(&self, id: &str, option: &str) -> Result<f64, JsValue> {
        let stored = self
            .mounted
            .host()
            .borrow_mut()
            .select(id, option)
            .map_err(|e| LumenError::from(e).into_js())?;
        self.redraw();
        Ok(stored)
    }

    pub fn action(&self, name: &str) -> Result<(), JsValue> {
        self.mounted
            .host()
            .borrow_mut()
            .action(name)
            .map_err(|e| LumenError::from(e).into_js())?;
        self.redraw();
        Ok(())
    }

    pub fn reset(&self) {
        self.mounted.host().borrow_mut().reset();
        self.redraw();
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn play(&self) {
        self.mounted.host().borrow_mut().play();
    }

    pub fn pause(&self) {
        self.mounted.host().borrow_mut().pause();
    }

    /// Flip playback; returns true when now running
    pub fn toggle(&self) -> bool {
        self.mounted.host().borrow_mut().toggle() == crate::animation::PlaybackState::Running
    }

    pub fn restart(&self) {
        self.mounted.host().borrow_mut().restart();
    }

    pub fn seek(&self, time: f64) -> f64 {
        let t = self.mounted.host().borrow_mut().seek(time);
        self.redraw();
        t
    }

    #[wasm_bindgen(getter)]
    pub fn time(&self) -> f64 {
        self.mounted.host().borrow().clock().time()
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.mounted.host().borrow().clock().is_running()
    }

    // =========================================================================
    // Readouts and output
    // =========================================================================

    /// Readouts of the most recent frame
    pub fn readouts(&self) -> Result<JsValue, JsValue> {
        let host = self.mounted.host();
        let mut host = host.borrow_mut();
        to_js(&host.last_frame().readouts)
    }

    pub fn subscribe(&self, keys: Vec<String>) {
        self.mounted.host().borrow_mut().subscribe(keys);
    }

    /// Take readouts queued for subscribed keys (including mode hops)
    #[wasm_bindgen(js_name = drainReadouts)]
    pub fn drain_readouts(&self) -> Result<JsValue, JsValue> {
        let pending = self.mounted.host().borrow_mut().drain_readouts();
        to_js(&pending)
    }

    /// Re-read the active theme and redraw with its tokens
    #[wasm_bindgen(js_name = applyTheme)]
    pub fn apply_theme(&self) {
        self.mounted.host().borrow_mut().set_theme(theme::current());
        self.redraw();
    }

    #[wasm_bindgen(js_name = toSvg)]
    pub fn to_svg(&self) -> String {
        self.mounted.host().borrow_mut().scene().to_svg()
    }

    /// Stop the frame loop; the widget keeps its last drawing
    pub fn unmount(&mut self) {
        self.mounted.unmount();
    }
}

/// Full widget catalog in navigation order
#[wasm_bindgen(js_name = widgetCatalog)]
pub fn widget_catalog() -> Result<JsValue, JsValue> {
    let registry = WidgetRegistry::new();
    let catalog: Vec<&WidgetMetadata> = registry.catalog().collect();
    to_js(&catalog)
}

/// Widgets mounted on a page route, in page order
#[wasm_bindgen(js_name = widgetsForRoute)]
pub fn widgets_for_route(route: &str) -> Result<JsValue, JsValue> {
    let registry = WidgetRegistry::new();
    let ids: Vec<&str> = registry.list_by_route(route).map(|m| m.type_id.as_str()).collect();
    to_js(&ids)
}
