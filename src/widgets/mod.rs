//! Concrete Widgets
//!
//! One type per plot on the site, grouped by topic:
//!
//! - [`resonator`]: standing waves, round-trip interference, mode comb
//! - [`gain`]: gain versus loss, threshold, linewidth
//! - [`modulation`]: MZM transfer and interferometer, I/Q, constellation, chirp, response
//! - [`tuning`]: thermal tuning, Vernier combs, tunable laser with mode hops
//! - [`light`]: amplitude/frequency/phase basics

pub mod gain;
pub mod light;
pub mod modulation;
pub mod resonator;
pub mod tuning;

pub use gain::{GainCurve, GainThreshold, Linewidth};
pub use light::LightWave;
pub use modulation::{Chirp, Constellation, IqWaveform, ModulationResponse, MzmInterferometer, MzmTransfer};
pub use resonator::{CavityMode, ModeComb, RoundTrip};
pub use tuning::{TemperatureTuning, TunableLaser, Vernier};

use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{Point, ScreenTransform, Viewport};
use crate::widget::{Marker, MarkerKind};

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Planck constant (J·s)
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Logical size every widget renders into
pub const SCENE_WIDTH: f64 = 600.0;
pub const SCENE_HEIGHT: f64 = 350.0;

/// Plot rectangle inside the scene, leaving room for axis labels
pub(crate) fn plot_area() -> Viewport {
    Viewport::new(64.0, 28.0, 512.0, 270.0)
}

pub(crate) fn blank_scene(tokens: &ThemeTokens) -> Scene {
    Scene::new(SCENE_WIDTH, SCENE_HEIGHT, tokens.background)
}

/// Unit-height Lorentzian line, 1 at `center`, 0.5 at `center ± fwhm/2`
pub(crate) fn lorentzian(x: f64, center: f64, fwhm: f64) -> f64 {
    let half = (fwhm / 2.0).max(f64::EPSILON);
    let d = (x - center) / half;
    1.0 / (1.0 + d * d)
}

/// Status line in the top-right corner, colored by state
pub(crate) fn status(scene: &mut Scene, tokens: &ThemeTokens, text: &str, active: bool) {
    let color = if active { tokens.highlight } else { tokens.muted };
    scene.text(
        Point::new(SCENE_WIDTH - 16.0, 18.0),
        text,
        color,
        12.0,
        TextAnchor::End,
    );
}

/// Draw frame markers in the style their kind calls for
pub(crate) fn draw_markers(scene: &mut Scene, t: &ScreenTransform, markers: &[Marker], tokens: &ThemeTokens) {
    for marker in markers {
        let at = t.map(marker.at);
        match marker.kind {
            MarkerKind::Point => {
                scene.circle(at, 8.0, tokens.accent);
                scene.circle(at, 3.0, tokens.marker);
            }
            MarkerKind::Node => scene.circle(at, 4.0, tokens.marker),
            MarkerKind::Antinode => scene.ring(at, 5.0, Stroke::solid(tokens.trace_alt, 1.5)),
            MarkerKind::VerticalLine => {
                scene.vline(t, marker.at.x, Stroke::dashed(tokens.accent, 1.0, 4.0, 4.0));
            }
            MarkerKind::HorizontalLine => {
                scene.hline(t, marker.at.y, Stroke::dashed(tokens.warning, 1.5, 6.0, 4.0));
            }
        }
    }
}

/// Evenly spaced tick positions with labels
pub(crate) fn ticks(min: f64, max: f64, count: usize, places: usize) -> Vec<(f64, String)> {
    crate::sample::linspace(min, max, count)
        .map(|v| (v, format!("{:.*}", places, v)))
        .collect()
}

/// Tick positions at each decade of a logarithmic axis
pub(crate) fn decade_ticks(min: f64, max: f64) -> Vec<(f64, String)> {
    let lo = libm::floor(libm::log10(min.max(f64::MIN_POSITIVE))) as i32;
    let hi = libm::ceil(libm::log10(max.max(f64::MIN_POSITIVE))) as i32;
    (lo..=hi)
        .map(|e| libm::pow(10.0, e as f64))
        .filter(|v| *v >= min * (1.0 - 1e-9) && *v <= max * (1.0 + 1e-9))
        .map(|v| {
            let label = if v >= 1.0 {
                format!("{}", v)
            } else {
                format!("{:e}", v)
            };
            (v, label)
        })
        .collect()
}
