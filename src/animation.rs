//! Animation Driver
//!
//! An [`AnimationClock`] is a scalar advanced by a fixed step once per displayed
//! frame while its playback state is [`PlaybackState::Running`]. Clocks with a
//! limit stop themselves at the ceiling; `toggle` or `play` from the ceiling
//! restarts from zero.
//!
//! Frames are delivered by a [`FrameScheduler`]: the browser's
//! `requestAnimationFrame` under the `wasm` feature, or [`ManualScheduler`] in
//! native code and tests. Cancelling a handle guarantees no further invocation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

// =============================================================================
// Clock
// =============================================================================

/// How a widget wants its clock driven
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Clock increment per frame
    pub step: f64,
    /// Ceiling at which playback stops
    pub limit: Option<f64>,
    /// Start running as soon as the widget is mounted
    pub autoplay: bool,
}

impl AnimationSpec {
    /// Free-running clock that starts on mount
    pub const fn continuous(step: f64) -> Self {
        Self {
            step,
            limit: None,
            autoplay: true,
        }
    }

    /// User-started clock that stops at `limit`
    pub const fn bounded(step: f64, limit: f64) -> Self {
        Self {
            step,
            limit: Some(limit),
            autoplay: false,
        }
    }
}

/// Playback state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
}

/// Outcome of one clock tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Amount the clock actually moved
    pub dt: f64,
    /// This tick hit the ceiling and stopped playback
    pub reached_limit: bool,
}

/// Monotonic per-widget clock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationClock {
    time: f64,
    limit: Option<f64>,
    state: PlaybackState,
}

impl AnimationClock {
    pub fn new(limit: Option<f64>) -> Self {
        Self {
            time: 0.0,
            limit,
            state: PlaybackState::Idle,
        }
    }

    /// Clock configured from a widget's spec, running if it autoplays
    pub fn from_spec(spec: &AnimationSpec) -> Self {
        let mut clock = Self::new(spec.limit);
        if spec.autoplay {
            clock.state = PlaybackState::Running;
        }
        clock
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn at_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.time >= limit)
    }

    /// Advance by `step` if running
    pub fn tick(&mut self, step: f64) -> Tick {
        if !self.is_running() {
            return Tick {
                dt: 0.0,
                reached_limit: false,
            };
        }
        let before = self.time;
        let mut next = self.time + step.max(0.0);
        let mut reached_limit = false;
        if let Some(limit) = self.limit {
            if next >= limit {
                next = limit;
                self.state = PlaybackState::Idle;
                reached_limit = true;
                log::info!("playback reached ceiling {}", limit);
            }
        }
        self.time = next;
        Tick {
            dt: next - before,
            reached_limit,
        }
    }

    /// Start running; from the ceiling this restarts at zero
    pub fn play(&mut self) {
        if self.at_limit() {
            self.time = 0.0;
        }
        self.state = PlaybackState::Running;
        log::debug!("playback running at t={}", self.time);
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Idle;
        log::debug!("playback paused at t={}", self.time);
    }

    /// Flip playback; from the ceiling this restarts at zero and runs
    pub fn toggle(&mut self) -> PlaybackState {
        if self.at_limit() || !self.is_running() {
            self.play();
        } else {
            self.pause();
        }
        self.state
    }

    /// Zero the clock and run
    pub fn restart(&mut self) {
        self.time = 0.0;
        self.state = PlaybackState::Running;
        log::debug!("playback restarted");
    }

    /// Zero the clock and stop
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.state = PlaybackState::Idle;
    }

    /// Jump to `time` (clamped to `[0, limit]`) and pause
    pub fn seek(&mut self, time: f64) -> f64 {
        let mut t = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if let Some(limit) = self.limit {
            t = t.min(limit);
        }
        self.time = t;
        self.state = PlaybackState::Idle;
        t
    }
}

// =============================================================================
// Frame Scheduling
// =============================================================================

/// Per-frame callback; receives a timestamp in milliseconds
pub type FrameCallback = Box<dyn FnMut(f64)>;

/// Identifies a scheduled frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of display-refresh callbacks
///
/// `start` registers a callback invoked once per frame until the returned
/// handle is cancelled. Methods take `&self` so frame callbacks may start and
/// cancel loops while the scheduler is delivering a frame.
pub trait FrameScheduler {
    fn start(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel(&self, handle: FrameHandle);

    fn is_active(&self, handle: FrameHandle) -> bool;
}

/// One registered loop of a [`ManualScheduler`]
struct ManualLoop {
    handle: FrameHandle,
    active: Cell<bool>,
    callback: RefCell<FrameCallback>,
}

/// Scheduler driven explicitly by [`ManualScheduler::pump`]
#[derive(Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    loops: RefCell<Vec<Rc<ManualLoop>>>,
    now_ms: Cell<f64>,
    invocations: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one frame `dt_ms` after the previous one to every active loop
    ///
    /// Loops started during the frame first run on the next one. A loop
    /// cancelled during the frame is skipped if it has not run yet.
    pub fn pump(&self, dt_ms: f64) -> usize {
        let now = self.now_ms.get() + dt_ms;
        self.now_ms.set(now);

        let snapshot: Vec<Rc<ManualLoop>> = self.loops.borrow().clone();
        let mut invoked = 0;
        for frame_loop in &snapshot {
            if !frame_loop.active.get() {
                continue;
            }
            // a loop pumping the scheduler from its own callback is not re-entered
            let Ok(mut callback) = frame_loop.callback.try_borrow_mut() else {
                continue;
            };
            (*callback)(now);
            invoked += 1;
        }
        self.invocations.set(self.invocations.get() + invoked as u64);
        invoked
    }

    /// Deliver `frames` frames at 60 Hz
    pub fn pump_frames(&self, frames: usize) -> usize {
        (0..frames).map(|_| self.pump(1000.0 / 60.0)).sum()
    }

    pub fn active_count(&self) -> usize {
        self.loops.borrow().len()
    }

    /// Total callback invocations since creation
    pub fn invocations(&self) -> u64 {
        self.invocations.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn start(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = FrameHandle(id);
        self.loops.borrow_mut().push(Rc::new(ManualLoop {
            handle,
            active: Cell::new(true),
            callback: RefCell::new(callback),
        }));
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        let mut loops = self.loops.borrow_mut();
        let position = loops.iter().position(|l| l.handle == handle);
        let removed = position.map(|i| loops.remove(i));
        drop(loops);
        if let Some(frame_loop) = &removed {
            frame_loop.active.set(false);
        }
        // the callback may own other mounts; drop it with no borrow held
        drop(removed);
    }

    fn is_active(&self, handle: FrameHandle) -> bool {
        self.loops.borrow().iter().any(|l| l.handle == handle)
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active", &self.active_count())
            .field("now_ms", &self.now_ms.get())
            .field("invocations", &self.invocations.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_idle_clock_does_not_move() {
        let mut clock = AnimationClock::new(None);
        let tick = clock.tick(0.05);
        assert_eq!(tick.dt, 0.0);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_autoplay_spec_runs() {
        let mut clock = AnimationClock::from_spec(&AnimationSpec::continuous(0.05));
        assert!(clock.is_running());
        for _ in 0..20 {
            clock.tick(0.05);
        }
        assert_relative_eq!(clock.time(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ceiling_returns_to_idle() {
        let mut clock = AnimationClock::new(Some(1.0));
        clock.play();
        let mut ticks = 0;
        while clock.is_running() {
            clock.tick(0.3);
            ticks += 1;
        }
        assert_eq!(ticks, 4);
        assert_eq!(clock.time(), 1.0);
        assert_eq!(clock.state(), PlaybackState::Idle);
        assert!(clock.at_limit());
    }

    #[test]
    fn test_ceiling_tick_reports_limit() {
        let mut clock = AnimationClock::new(Some(0.1));
        clock.play();
        let tick = clock.tick(0.25);
        assert!(tick.reached_limit);
        assert_relative_eq!(tick.dt, 0.1);
    }

    #[test]
    fn test_toggle_from_ceiling_restarts() {
        let mut clock = AnimationClock::new(Some(1.0));
        clock.seek(1.0);
        assert_eq!(clock.toggle(), PlaybackState::Running);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let mut clock = AnimationClock::new(Some(10.0));
        clock.toggle();
        clock.tick(1.0);
        assert_eq!(clock.toggle(), PlaybackState::Idle);
        assert_eq!(clock.time(), 1.0);
        assert_eq!(clock.toggle(), PlaybackState::Running);
        assert_eq!(clock.time(), 1.0);
    }

    #[test]
    fn test_seek_clamps_and_pauses() {
        let mut clock = AnimationClock::new(Some(50.0));
        clock.play();
        assert_eq!(clock.seek(75.0), 50.0);
        assert_eq!(clock.seek(-2.0), 0.0);
        assert_eq!(clock.seek(f64::NAN), 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_restart_and_reset() {
        let mut clock = AnimationClock::new(None);
        clock.seek(3.0);
        clock.restart();
        assert_eq!(clock.time(), 0.0);
        assert!(clock.is_running());
        clock.tick(1.0);
        clock.reset();
        assert_eq!(clock.time(), 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_manual_scheduler_cancel_stops_invocations() {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let handle = scheduler.start(Box::new(move |_| c.set(c.get() + 1)));

        scheduler.pump_frames(3);
        assert_eq!(count.get(), 3);
        assert!(scheduler.is_active(handle));

        scheduler.cancel(handle);
        scheduler.pump_frames(5);
        assert_eq!(count.get(), 3);
        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.invocations(), 3);
    }

    #[test]
    fn test_manual_scheduler_cancel_from_callback() {
        let scheduler = Rc::new(ManualScheduler::new());
        let later = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        // the first loop cancels the second before it runs
        let (s, v) = (Rc::clone(&scheduler), Rc::clone(&victim));
        scheduler.start(Box::new(move |_| {
            if let Some(handle) = v.take() {
                s.cancel(handle);
            }
        }));
        let l = later.clone();
        let handle = scheduler.start(Box::new(move |_| l.set(l.get() + 1)));
        victim.set(Some(handle));

        assert_eq!(scheduler.pump(16.0), 1);
        assert_eq!(later.get(), 0);
        assert!(!scheduler.is_active(handle));
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.pump_frames(3), 3);
        assert_eq!(later.get(), 0);
    }

    #[test]
    fn test_manual_scheduler_start_from_callback() {
        let scheduler = Rc::new(ManualScheduler::new());
        let child_runs = Rc::new(Cell::new(0));

        let (s, c) = (Rc::clone(&scheduler), child_runs.clone());
        let mut spawned = false;
        scheduler.start(Box::new(move |_| {
            if !spawned {
                spawned = true;
                let c = c.clone();
                s.start(Box::new(move |_| c.set(c.get() + 1)));
            }
        }));

        // the new loop first runs on the following frame
        assert_eq!(scheduler.pump(16.0), 1);
        assert_eq!(child_runs.get(), 0);
        assert_eq!(scheduler.active_count(), 2);
        assert_eq!(scheduler.pump(16.0), 2);
        assert_eq!(child_runs.get(), 1);
    }

    #[test]
    fn test_manual_scheduler_timestamps() {
        let scheduler = ManualScheduler::new();
        let last = Rc::new(Cell::new(0.0));
        let l = last.clone();
        scheduler.start(Box::new(move |ts| l.set(ts)));
        scheduler.pump(10.0);
        scheduler.pump(6.0);
        assert_eq!(last.get(), 16.0);
    }
}
