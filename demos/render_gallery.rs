//! Render Gallery
//!
//! Renders every registered widget at its defaults to an SVG file, in both
//! themes, and prints the readouts of each frame. Also plays the round-trip
//! animation to its ceiling and sweeps the tunable laser's phase current to
//! show mode hops.
//!
//! Run with: cargo run --example render_gallery [output_dir]

use std::fs;
use std::path::PathBuf;

use lumen::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gallery"));
    fs::create_dir_all(&out_dir)?;

    println!("=== Lumen Render Gallery ===\n");

    let registry = WidgetRegistry::new();

    for category in registry.categories() {
        println!("--- {} ---", category);
        for meta in registry.list_by_category(&category) {
            let widget = registry.instantiate(&meta.type_id)?;
            let mut host = WidgetHost::new(widget);

            for theme in [Theme::Dark, Theme::Light] {
                host.set_theme(theme);
                let path = out_dir.join(format!("{}_{}.svg", meta.type_id, theme.as_str()));
                fs::write(&path, host.scene().to_svg())?;
            }

            println!("{} ({})", meta.name, meta.route);
            for readout in &host.last_frame().readouts {
                println!("  {}", readout.display());
            }
        }
        println!();
    }

    // Playback to the ceiling
    println!("--- Round-trip playback ---");
    let mut host = WidgetHost::new(registry.instantiate("round_trip")?);
    host.set_param("speed", 0.1)?;
    host.play();
    let mut frames = 0;
    while host.clock().is_running() {
        host.frame();
        frames += 1;
    }
    println!(
        "stopped after {} frames at t = {} ({:?})",
        frames,
        host.clock().time(),
        host.clock().state()
    );
    fs::write(out_dir.join("round_trip_ceiling.svg"), host.scene().to_svg())?;

    // Mode hops along a phase sweep
    println!("\n--- Tunable laser phase sweep ---");
    let mut host = WidgetHost::new(registry.instantiate("tunable_laser")?);
    host.subscribe([keys::MODE_HOP]);
    for k in 0..=40 {
        let current = k as f64 * 0.25;
        host.set_param("phase_ma", current)?;
        for hop in host.drain_readouts() {
            println!("  {:>5.2} mA  {}", current, hop.display());
        }
    }

    println!("\nWrote SVGs to {}", out_dir.display());
    Ok(())
}
