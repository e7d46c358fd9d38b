//! Widget Frame Benchmarks
//!
//! Every widget must evaluate and render within one display frame. At 60 Hz the
//! whole page has 16.7 ms, and a page mounts up to three widgets, so each
//! evaluate + render pass should stay well under a millisecond.
//!
//! | Refresh | Frame budget | Per widget (3 on page) |
//! |---------|--------------|------------------------|
//! | 60 Hz   | 16.7 ms      | 5.6 ms                 |
//! | 120 Hz  | 8.3 ms       | 2.8 ms                 |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lumen::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn dark() -> ThemeTokens {
    ThemeTokens::dark()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let registry = WidgetRegistry::new();
    let mut group = c.benchmark_group("widgets/evaluate");

    for meta in registry.catalog() {
        let widget = match registry.instantiate(&meta.type_id) {
            Ok(w) => w,
            Err(_) => continue,
        };
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("frame", &meta.type_id), &widget, |b, w| {
            b.iter(|| black_box(w.evaluate(black_box(1.25))))
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let registry = WidgetRegistry::new();
    let tokens = dark();
    let mut group = c.benchmark_group("widgets/render");

    for meta in registry.catalog() {
        let widget = match registry.instantiate(&meta.type_id) {
            Ok(w) => w,
            Err(_) => continue,
        };
        let frame = widget.evaluate(1.25);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("scene", &meta.type_id), &frame, |b, f| {
            b.iter(|| black_box(widget.render(black_box(f), &tokens)))
        });
    }

    group.finish();
}

fn bench_host_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("host/frame");

    for type_id in ["cavity_mode", "iq_waveform", "chirp", "tunable_laser"] {
        group.throughput(Throughput::Elements(1));
        group.bench_function(type_id, |b| {
            let registry = WidgetRegistry::new();
            let widget = registry.instantiate(type_id).expect("registered widget");
            let mut host = WidgetHost::new(widget);
            host.play();
            b.iter(|| {
                host.frame();
                black_box(host.scene().len())
            })
        });
    }

    group.finish();
}

fn bench_tunable_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("host/tunable_sweep");

    // dragging the phase slider end to end in 0.05 mA steps
    group.throughput(Throughput::Elements(201));
    group.bench_function("phase_ma", |b| {
        let mut host = WidgetHost::new(Box::new(TunableLaser::new()));
        host.subscribe([keys::MODE_HOP]);
        b.iter(|| {
            for k in 0..=200 {
                let _ = host.set_param("phase_ma", k as f64 * 0.05);
            }
            black_box(host.drain_readouts().len())
        })
    });

    group.finish();
}

fn bench_svg_export(c: &mut Criterion) {
    let mut host = WidgetHost::new(Box::new(Vernier::new()));
    c.bench_function("scene/to_svg/vernier", |b| {
        b.iter(|| black_box(host.scene().to_svg().len()))
    });
}

criterion_group!(
    benches,
    bench_evaluate,
    bench_render,
    bench_host_frame,
    bench_tunable_sweep,
    bench_svg_export
);
criterion_main!(benches);
