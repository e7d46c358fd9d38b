//! `requestAnimationFrame` scheduler

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::animation::{FrameCallback, FrameHandle, FrameScheduler};

/// One self-rescheduling loop
///
/// The closure and the loop reference each other. Stopping only clears
/// `active`; the closure is released by the scheduler once it is not running.
#[derive(Default)]
struct FrameLoop {
    active: Cell<bool>,
    running: Cell<bool>,
    request_id: Cell<i32>,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoop {
    fn request(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let closure = self.closure.borrow();
        let closure = closure
            .as_ref()
            .ok_or_else(|| JsValue::from_str("frame loop already released"))?;
        let id = window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        self.request_id.set(id);
        Ok(())
    }

    fn stop(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(window) = web_sys::window() {
            window.cancel_animation_frame(self.request_id.get()).ok();
        }
    }

    /// Stopped and not executing, so its closure can be dropped
    fn releasable(&self) -> bool {
        !self.active.get() && !self.running.get()
    }
}

/// Display-refresh scheduler backed by the browser
#[derive(Default)]
pub struct BrowserScheduler {
    next_id: Cell<u64>,
    loops: RefCell<HashMap<u64, Rc<FrameLoop>>>,
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.loops.borrow().values().filter(|l| l.active.get()).count()
    }

    /// Drop the closures of stopped loops that are not mid-frame
    fn release_stopped(&self) {
        let mut released = Vec::new();
        self.loops.borrow_mut().retain(|_, l| {
            if !l.releasable() {
                return true;
            }
            released.extend(l.closure.borrow_mut().take());
            false
        });
        // callbacks may own mounts that cancel on drop
        drop(released);
    }
}

impl FrameScheduler for BrowserScheduler {
    fn start(&self, callback: FrameCallback) -> FrameHandle {
        self.release_stopped();

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handle = FrameHandle(id);

        let frame_loop = Rc::new(FrameLoop::default());
        let inner = Rc::clone(&frame_loop);
        let mut callback = callback;
        *frame_loop.closure.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            if !inner.active.get() {
                return;
            }
            inner.running.set(true);
            callback(now);
            if inner.active.get() {
                if let Err(e) = inner.request() {
                    log::error!("requestAnimationFrame failed: {:?}", e);
                    inner.stop();
                }
            }
            inner.running.set(false);
        }) as Box<dyn FnMut(f64)>));

        frame_loop.active.set(true);
        if let Err(e) = frame_loop.request() {
            log::error!("requestAnimationFrame failed: {:?}", e);
            frame_loop.stop();
        }

        self.loops.borrow_mut().insert(handle.0, frame_loop);
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        let frame_loop = self.loops.borrow().get(&handle.0).cloned();
        if let Some(frame_loop) = frame_loop {
            frame_loop.stop();
        }
        self.release_stopped();
    }

    fn is_active(&self, handle: FrameHandle) -> bool {
        self.loops
            .borrow()
            .get(&handle.0)
            .is_some_and(|l| l.active.get())
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        for frame_loop in self.loops.get_mut().values() {
            frame_loop.stop();
        }
        // a loop dropped from inside its own frame keeps its closure alive
        self.release_stopped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_loop_is_not_released() {
        let frame_loop = FrameLoop::default();
        frame_loop.active.set(true);
        assert!(!frame_loop.releasable());

        // stopped from inside its own frame
        frame_loop.running.set(true);
        frame_loop.active.set(false);
        assert!(!frame_loop.releasable());

        frame_loop.running.set(false);
        assert!(frame_loop.releasable());
    }

    #[test]
    fn test_release_skips_loops_mid_frame() {
        let scheduler = BrowserScheduler::new();
        let busy = Rc::new(FrameLoop::default());
        busy.running.set(true);
        scheduler.loops.borrow_mut().insert(0, Rc::clone(&busy));
        scheduler.loops.borrow_mut().insert(1, Rc::new(FrameLoop::default()));

        scheduler.release_stopped();
        let loops = scheduler.loops.borrow();
        assert_eq!(loops.len(), 1);
        assert!(loops.contains_key(&0));
    }
}
