//! Widget Host
//!
//! Owns one widget together with its animation clock, readout observer and the
//! active theme tokens. [`WidgetHost::frame`] is the per-frame entry point: it
//! ticks the clock, lets the widget advance its accumulators, re-evaluates and
//! re-renders. Mounting hands a host to a [`FrameScheduler`]; the returned
//! [`MountedWidget`] cancels the frame loop when unmounted or dropped, after
//! which the widget is never called again.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::animation::{AnimationClock, FrameHandle, FrameScheduler, PlaybackState};
use crate::readout::{Readout, ReadoutObserver};
use crate::scene::Scene;
use crate::theme::{Theme, ThemeTokens};
use crate::widget::{Frame, Widget, WidgetError};

// =============================================================================
// Host
// =============================================================================

/// A widget bound to its runtime state
pub struct WidgetHost {
    widget: Box<dyn Widget>,
    clock: AnimationClock,
    observer: ReadoutObserver,
    tokens: ThemeTokens,
    frame: Frame,
    scene: Scene,
    dirty: bool,
}

impl WidgetHost {
    /// Host with dark tokens; autoplaying widgets start running immediately
    pub fn new(widget: Box<dyn Widget>) -> Self {
        Self::with_tokens(widget, ThemeTokens::default())
    }

    pub fn with_tokens(widget: Box<dyn Widget>, tokens: ThemeTokens) -> Self {
        let clock = widget
            .animation()
            .map(|spec| AnimationClock::from_spec(&spec))
            .unwrap_or_default();
        let frame = widget.evaluate(clock.time());
        let scene = widget.render(&frame, &tokens);
        let mut observer = ReadoutObserver::new();
        observer.collect(&frame.readouts);
        Self {
            widget,
            clock,
            observer,
            tokens,
            frame,
            scene,
            dirty: false,
        }
    }

    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    pub fn type_id(&self) -> &'static str {
        self.widget.type_id()
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn is_animated(&self) -> bool {
        self.widget.is_animated()
    }

    /// Advance one display frame. Returns true when the scene was redrawn.
    pub fn frame(&mut self) -> bool {
        if self.clock.is_running() {
            let step = self.widget.animation().map(|s| s.step).unwrap_or(0.0);
            let tick = self.clock.tick(step);
            if tick.dt > 0.0 {
                self.widget.advance(self.clock.time(), tick.dt);
            }
            self.dirty = true;
        }
        if !self.dirty {
            return false;
        }
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let frame = self.widget.evaluate(self.clock.time());
        self.observer.collect(&frame.readouts);
        self.scene = self.widget.render(&frame, &self.tokens);
        self.frame = frame;
        self.dirty = false;
    }

    /// Current scene, redrawn first if anything changed since the last frame
    pub fn scene(&mut self) -> &Scene {
        if self.dirty {
            self.refresh();
        }
        &self.scene
    }

    /// Most recently evaluated frame
    pub fn last_frame(&mut self) -> &Frame {
        if self.dirty {
            self.refresh();
        }
        &self.frame
    }

    // -------------------------------------------------------------------------
    // Parameters
    // -------------------------------------------------------------------------

    pub fn param(&self, id: &str) -> Option<f64> {
        self.widget.param(id)
    }

    /// Store a parameter and forward any events it raised to the observer
    pub fn set_param(&mut self, id: &str, value: f64) -> Result<f64, WidgetError> {
        let stored = self.widget.set_param(id, value).map_err(|e| {
            log::warn!("{} rejected parameter: {}", self.widget.type_id(), e);
            e
        })?;
        self.collect_events();
        self.dirty = true;
        Ok(stored)
    }

    pub fn select(&mut self, id: &str, option: &str) -> Result<f64, WidgetError> {
        let stored = self.widget.select(id, option).map_err(|e| {
            log::warn!("{} rejected option: {}", self.widget.type_id(), e);
            e
        })?;
        self.collect_events();
        self.dirty = true;
        Ok(stored)
    }

    fn collect_events(&mut self) {
        for event in self.widget.drain_events() {
            self.observer.push(event);
        }
    }

    /// Restore defaults, clear accumulators and rewind the clock
    pub fn reset(&mut self) {
        self.widget.reset();
        self.clock = self
            .widget
            .animation()
            .map(|spec| AnimationClock::from_spec(&spec))
            .unwrap_or_default();
        self.dirty = true;
    }

    /// Run a widget action and apply the clock effects it asks for
    pub fn action(&mut self, name: &str) -> Result<(), WidgetError> {
        let effect = self.widget.action(name)?;
        if effect.restart_clock {
            self.clock.reset();
        }
        if effect.play {
            self.clock.play();
        }
        self.dirty = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Playback
    // -------------------------------------------------------------------------

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn toggle(&mut self) -> PlaybackState {
        self.clock.toggle()
    }

    pub fn restart(&mut self) {
        self.clock.restart();
        self.dirty = true;
    }

    pub fn seek(&mut self, time: f64) -> f64 {
        let t = self.clock.seek(time);
        self.dirty = true;
        t
    }

    // -------------------------------------------------------------------------
    // Theme and readouts
    // -------------------------------------------------------------------------

    pub fn set_theme(&mut self, theme: Theme) {
        self.set_tokens(theme.tokens());
    }

    pub fn set_tokens(&mut self, tokens: ThemeTokens) {
        self.tokens = tokens;
        self.dirty = true;
    }

    pub fn tokens(&self) -> &ThemeTokens {
        &self.tokens
    }

    pub fn subscribe<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observer.subscribe(keys);
    }

    pub fn drain_readouts(&mut self) -> Vec<Readout> {
        self.observer.drain()
    }

    pub fn observer(&self) -> &ReadoutObserver {
        &self.observer
    }

    /// Bind this host to a frame scheduler
    pub fn mount(self, scheduler: Rc<dyn FrameScheduler>) -> MountedWidget {
        MountedWidget::mount(self, scheduler)
    }
}

impl std::fmt::Debug for WidgetHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHost")
            .field("widget", &self.widget.type_id())
            .field("clock", &self.clock)
            .field("dirty", &self.dirty)
            .finish()
    }
}

// =============================================================================
// Mounting
// =============================================================================

/// Receives each scene redrawn by the frame loop
pub type RedrawHook = Box<dyn FnMut(&Scene)>;

/// A host attached to a scheduler's frame loop
///
/// The loop holds only a weak reference to the host. Animated widgets get a
/// loop on mount; static widgets redraw on demand through [`WidgetHost::scene`].
pub struct MountedWidget {
    host: Rc<RefCell<WidgetHost>>,
    scheduler: Rc<dyn FrameScheduler>,
    handle: Option<FrameHandle>,
    type_id: &'static str,
}

impl MountedWidget {
    pub fn mount(host: WidgetHost, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self::mount_with(host, scheduler, None)
    }

    /// Mount, calling `on_redraw` with every scene the frame loop redraws
    pub fn mount_with(
        host: WidgetHost,
        scheduler: Rc<dyn FrameScheduler>,
        on_redraw: Option<RedrawHook>,
    ) -> Self {
        let animated = host.is_animated();
        let type_id = host.type_id();
        let host = Rc::new(RefCell::new(host));

        let handle = if animated {
            let weak: Weak<RefCell<WidgetHost>> = Rc::downgrade(&host);
            let mut on_redraw = on_redraw;
            let handle = scheduler.start(Box::new(move |_now_ms| {
                let Some(host) = weak.upgrade() else { return };
                let Ok(mut host) = host.try_borrow_mut() else { return };
                if host.frame() {
                    if let Some(hook) = on_redraw.as_mut() {
                        hook(host.scene());
                    }
                }
            }));
            Some(handle)
        } else {
            None
        };
        log::debug!("mounted {} (frame loop: {})", type_id, handle.is_some());

        Self {
            host,
            scheduler,
            handle,
            type_id,
        }
    }

    /// Shared handle to the host for UI callbacks
    pub fn host(&self) -> Rc<RefCell<WidgetHost>> {
        Rc::clone(&self.host)
    }

    pub fn handle(&self) -> Option<FrameHandle> {
        self.handle
    }

    /// True while a frame loop is registered
    pub fn is_looping(&self) -> bool {
        self.handle
            .map(|h| self.scheduler.is_active(h))
            .unwrap_or(false)
    }

    /// Cancel the frame loop; safe to call more than once
    pub fn unmount(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
            log::debug!("unmounted {}", self.type_id);
        }
    }
}

impl Drop for MountedWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}
