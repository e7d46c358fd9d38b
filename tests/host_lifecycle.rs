//! Mounting, playback and event delivery across hosts and schedulers.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use lumen::prelude::*;

fn manual() -> (Rc<ManualScheduler>, Rc<dyn FrameScheduler>) {
    let concrete = Rc::new(ManualScheduler::new());
    let shared: Rc<dyn FrameScheduler> = concrete.clone();
    (concrete, shared)
}

#[test]
fn test_unmounting_a_page_silences_every_widget() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let mut page: Vec<MountedWidget> = registry
        .list_by_route("#/lasers/modulation/mzm")
        .map(|meta| {
            let widget = registry.instantiate(&meta.type_id).unwrap();
            WidgetHost::new(widget).mount(Rc::clone(&shared))
        })
        .collect();
    assert_eq!(page.len(), 3);

    // only the IQ waveform animates on this page
    assert_eq!(concrete.active_count(), 1);
    concrete.pump(16.0);
    concrete.pump(16.0);
    let before = concrete.invocations();
    assert_eq!(before, 2);

    for mounted in &mut page {
        mounted.unmount();
    }
    assert_eq!(concrete.pump_frames(10), 0);
    assert_eq!(concrete.invocations(), before);
}

#[test]
fn test_dropped_host_is_never_called_back() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let mounted = WidgetHost::new(registry.instantiate("chirp").unwrap()).mount(shared);
    let host = mounted.host();
    concrete.pump_frames(5);
    let phase = host.borrow_mut().last_frame().value("optical_phase").unwrap();

    drop(mounted);
    concrete.pump_frames(5);
    assert_eq!(concrete.invocations(), 5);
    assert_eq!(
        host.borrow_mut().last_frame().value("optical_phase").unwrap(),
        phase
    );
}

#[test]
fn test_widget_dropped_by_another_widgets_redraw_is_silenced() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let chirp = WidgetHost::new(registry.instantiate("chirp").unwrap()).mount(Rc::clone(&shared));
    let chirp_host = chirp.host();
    let slot = Rc::new(RefCell::new(Some(chirp)));

    let victim = Rc::clone(&slot);
    let hook: RedrawHook = Box::new(move |_scene: &Scene| {
        victim.borrow_mut().take();
    });
    let _iq = MountedWidget::mount_with(
        WidgetHost::new(registry.instantiate("iq_waveform").unwrap()),
        Rc::clone(&shared),
        Some(hook),
    );
    assert_eq!(concrete.active_count(), 2);

    concrete.pump(16.0);
    assert!(slot.borrow().is_none());
    assert_eq!(concrete.active_count(), 1);

    let phase = chirp_host.borrow_mut().last_frame().value("optical_phase").unwrap();
    let before = concrete.invocations();
    concrete.pump_frames(10);
    assert_eq!(concrete.invocations(), before + 10);
    assert_eq!(
        chirp_host.borrow_mut().last_frame().value("optical_phase").unwrap(),
        phase
    );
}

#[test]
fn test_widget_can_unmount_itself_from_its_redraw() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let slot: Rc<RefCell<Option<MountedWidget>>> = Rc::new(RefCell::new(None));
    let own = Rc::clone(&slot);
    let hook: RedrawHook = Box::new(move |_scene: &Scene| {
        own.borrow_mut().take();
    });
    let mounted = MountedWidget::mount_with(
        WidgetHost::new(registry.instantiate("cavity_mode").unwrap()),
        shared,
        Some(hook),
    );
    *slot.borrow_mut() = Some(mounted);

    assert_eq!(concrete.pump(16.0), 1);
    assert_eq!(concrete.active_count(), 0);
    assert_eq!(concrete.pump_frames(5), 0);
    assert_eq!(concrete.invocations(), 1);
}

#[test]
fn test_widget_mounted_during_a_frame_joins_the_next_one() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let late: Rc<RefCell<Option<MountedWidget>>> = Rc::new(RefCell::new(None));
    let target = Rc::clone(&late);
    let scheduler = Rc::clone(&shared);
    let hook: RedrawHook = Box::new(move |_scene: &Scene| {
        let mut target = target.borrow_mut();
        if target.is_none() {
            let widget = WidgetRegistry::new().instantiate("chirp").unwrap();
            *target = Some(WidgetHost::new(widget).mount(Rc::clone(&scheduler)));
        }
    });
    let _first = MountedWidget::mount_with(
        WidgetHost::new(registry.instantiate("cavity_mode").unwrap()),
        Rc::clone(&shared),
        Some(hook),
    );

    assert_eq!(concrete.pump(16.0), 1);
    assert!(late.borrow().as_ref().is_some_and(|m| m.is_looping()));
    assert_eq!(concrete.pump(16.0), 2);

    late.borrow_mut().take();
    assert_eq!(concrete.active_count(), 1);
}

#[test]
fn test_round_trip_plays_to_ceiling_under_scheduler() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();

    let mut host = WidgetHost::new(registry.instantiate("round_trip").unwrap());
    host.set_param("speed", 0.1).unwrap();
    host.play();
    let mounted = host.mount(shared);

    concrete.pump_frames(600);
    let host = mounted.host();
    let host = host.borrow();
    assert_eq!(host.clock().state(), PlaybackState::Idle);
    assert_eq!(host.clock().time(), 50.0);
    // the loop keeps running while idle, so playback can resume
    assert!(mounted.is_looping());
}

#[test]
fn test_paused_clock_holds_time() {
    let registry = WidgetRegistry::new();
    let (concrete, shared) = manual();
    let mounted = WidgetHost::new(registry.instantiate("iq_waveform").unwrap()).mount(shared);

    concrete.pump_frames(4);
    mounted.host().borrow_mut().pause();
    concrete.pump_frames(4);
    assert_relative_eq!(mounted.host().borrow().clock().time(), 0.2, epsilon = 1e-9);

    assert_eq!(mounted.host().borrow_mut().toggle(), PlaybackState::Running);
    concrete.pump_frames(2);
    assert_relative_eq!(mounted.host().borrow().clock().time(), 0.3, epsilon = 1e-9);
}

#[test]
fn test_mode_hop_exactly_on_index_change() {
    let mut laser = TunableLaser::new();
    let mut hops = 0;

    let sweep = (0..=100)
        .map(|k| ("phase_ma", k as f64 * 0.1))
        .chain((0..=80).map(|k| ("mirror_b_ma", k as f64 * 0.5)))
        .chain((0..=80).map(|k| ("mirror_a_ma", k as f64 * 0.5)));

    for (id, value) in sweep {
        let before = laser.indices();
        laser.set_param(id, value).unwrap();
        let after = laser.indices();
        let events = laser.drain_events();
        let expected = usize::from(before != after);
        assert_eq!(events.len(), expected, "{} = {}", id, value);
        hops += expected as u64;
    }
    assert!(hops > 0);
    assert_eq!(laser.hop_count(), hops);
}

#[test]
fn test_mode_hops_queue_for_subscribers_only() {
    let registry = WidgetRegistry::new();
    let mut host = WidgetHost::new(registry.instantiate("tunable_laser").unwrap());

    host.set_param("mirror_b_ma", 3.0).unwrap();
    assert!(host.drain_readouts().is_empty());

    host.subscribe([keys::MODE_HOP]);
    host.set_param("mirror_b_ma", 0.0).unwrap();
    let pending = host.drain_readouts();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].is_event());
    assert!(pending[0].display().contains("supermode"));
}

#[test]
fn test_flags_reach_subscribers_on_change() {
    let registry = WidgetRegistry::new();
    let mut host = WidgetHost::new(registry.instantiate("gain_curve").unwrap());
    host.subscribe([keys::LASING]);

    host.set_param("pump", 80.0).unwrap();
    host.frame();
    let pending = host.drain_readouts();
    assert_eq!(pending.len(), 1);
    assert!(matches!(pending[0], Readout::Flag { active: true, .. }));

    // unchanged flag is not queued again
    host.set_param("pump", 90.0).unwrap();
    host.frame();
    assert!(host.drain_readouts().is_empty());
}
