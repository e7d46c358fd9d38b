//! Properties every registered widget must satisfy, checked through the registry.

use approx::assert_relative_eq;
use lumen::prelude::*;

fn boundary_values(def: &ParamDef) -> [f64; 3] {
    [def.min, def.default, def.max]
}

fn assert_frame_sound(type_id: &str, context: &str, frame: &Frame) {
    assert!(frame.is_finite(), "{} {}: non-finite samples", type_id, context);
    assert!(!frame.series.is_empty(), "{} {}: no series", type_id, context);
    for series in &frame.series {
        assert!(
            !series.samples.is_empty(),
            "{} {}: empty series {}",
            type_id,
            context,
            series.id
        );
    }
    for readout in &frame.readouts {
        if let Readout::Value { value, .. } = readout {
            assert!(
                value.is_finite(),
                "{} {}: readout {} = {}",
                type_id,
                context,
                readout.key(),
                value
            );
        }
    }
}

#[test]
fn test_every_widget_finite_at_parameter_extremes() {
    let registry = WidgetRegistry::new();
    let tokens = ThemeTokens::dark();

    for meta in registry.catalog() {
        for def in &meta.params {
            for value in boundary_values(def) {
                let mut widget = registry.instantiate(&meta.type_id).unwrap();
                let stored = widget.set_param(&def.id, value).unwrap();
                assert!(stored >= def.min && stored <= def.max);

                for clock in [0.0, 0.75, 10.0] {
                    let context = format!("{}={} t={}", def.id, value, clock);
                    let frame = widget.evaluate(clock);
                    assert_frame_sound(&meta.type_id, &context, &frame);
                    let scene = widget.render(&frame, &tokens);
                    assert!(!scene.is_empty(), "{} {}: empty scene", meta.type_id, context);
                }
            }
        }
    }
}

#[test]
fn test_evaluate_is_pure() {
    let registry = WidgetRegistry::new();
    let tokens = ThemeTokens::light();

    for meta in registry.catalog() {
        let widget = registry.instantiate(&meta.type_id).unwrap();
        let a = widget.evaluate(2.5);
        let b = widget.evaluate(2.5);
        assert_eq!(a, b, "{}", meta.type_id);
        assert_eq!(widget.render(&a, &tokens), widget.render(&b, &tokens), "{}", meta.type_id);
    }
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let registry = WidgetRegistry::new();
    for meta in registry.catalog() {
        let mut widget = registry.instantiate(&meta.type_id).unwrap();
        for def in &meta.params {
            assert_eq!(widget.set_param(&def.id, def.max + 1e6).unwrap(), def.max);
            assert_eq!(widget.set_param(&def.id, def.min - 1e6).unwrap(), def.min);
        }
    }
}

#[test]
fn test_unknown_param_rejected_everywhere() {
    let registry = WidgetRegistry::new();
    for meta in registry.catalog() {
        let mut widget = registry.instantiate(&meta.type_id).unwrap();
        assert_eq!(
            widget.set_param("no_such_param", 1.0),
            Err(WidgetError::UnknownParam("no_such_param".into()))
        );
    }
}

#[test]
fn test_mzm_transfer_endpoints() {
    let registry = WidgetRegistry::new();
    let mut host = WidgetHost::new(registry.instantiate("mzm_transfer").unwrap());

    assert_relative_eq!(host.last_frame().value("transmission").unwrap(), 1.0, epsilon = 1e-12);

    let v_pi = host.param("v_pi").unwrap();
    host.set_param("bias_v", v_pi).unwrap();
    assert!(host.last_frame().value("transmission").unwrap() < 1e-12);

    host.set_param("bias_v", v_pi / 2.0).unwrap();
    assert_relative_eq!(host.last_frame().value("transmission").unwrap(), 0.5, epsilon = 1e-9);

    let frame = host.last_frame();
    let transfer = frame.series("transfer").unwrap();
    assert!(transfer.ys().all(|t| (0.0..=1.0 + 1e-12).contains(&t)));
}

#[test]
fn test_cavity_markers_at_nodes_and_midpoints() {
    let registry = WidgetRegistry::new();
    let mut widget = registry.instantiate("cavity_mode").unwrap();
    widget.set_param("length", 15.0).unwrap();
    widget.set_param("mode", 5.0).unwrap();
    let frame = widget.evaluate(0.0);

    let nodes: Vec<f64> = frame.markers_of(MarkerKind::Node).map(|m| m.at.x).collect();
    assert_eq!(nodes.len(), 6);
    for (i, x) in nodes.iter().enumerate() {
        assert_relative_eq!(*x, i as f64 * 3.0, epsilon = 1e-12);
    }
    let antinodes: Vec<f64> = frame.markers_of(MarkerKind::Antinode).map(|m| m.at.x).collect();
    assert_eq!(antinodes.len(), 5);
    for (i, x) in antinodes.iter().enumerate() {
        assert_relative_eq!(*x, (i as f64 + 0.5) * 3.0, epsilon = 1e-12);
    }
}

#[test]
fn test_thermal_markers_shift_together() {
    let registry = WidgetRegistry::new();
    let mut widget = registry.instantiate("temperature_tuning").unwrap();
    let before: Vec<f64> = widget
        .evaluate(0.0)
        .markers_of(MarkerKind::VerticalLine)
        .map(|m| m.at.x)
        .collect();

    widget.set_param("temperature", 65.0).unwrap();
    let frame = widget.evaluate(0.0);
    let after: Vec<f64> = frame.markers_of(MarkerKind::VerticalLine).map(|m| m.at.x).collect();

    assert_eq!(before.len(), 7);
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_relative_eq!(a - b, -0.013 * 40.0, epsilon = 1e-9);
    }
    assert_relative_eq!(frame.value("frequency_shift").unwrap(), -0.52, epsilon = 1e-9);
}
