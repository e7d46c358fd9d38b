//! Resonator Widgets
//!
//! Standing waves between two mirrors, the round-trip build-up that selects
//! them, and the resulting longitudinal mode comb.

use std::f64::consts::PI;

use crate::animation::AnimationSpec;
use crate::config::{CavityModeConfig, ModeCombConfig, RoundTripConfig};
use crate::param::{ParamDef, ParamSet, ValueFormat};
use crate::readout::{keys, Readout};
use crate::sample::{Sample, SampleSequence};
use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{Axis, Point, ScreenTransform};
use crate::widget::{ActionEffect, Frame, Marker, MarkerKind, Widget, WidgetError};

use super::{blank_scene, draw_markers, lorentzian, plot_area, status, ticks, SPEED_OF_LIGHT};

// =============================================================================
// Cavity Mode
// =============================================================================

/// Oscillating standing wave of mode `m` in a cavity of length `L`
///
/// `y(x, t) = A cos(t) sin(mπx / L)` with nodes at `i·L/m`.
#[derive(Debug, Clone)]
pub struct CavityMode {
    params: ParamSet,
    config: CavityModeConfig,
}

impl CavityMode {
    pub const LENGTH: usize = 0;
    pub const MODE: usize = 1;

    pub fn new() -> Self {
        Self::with_config(CavityModeConfig::default())
    }

    pub fn with_config(config: CavityModeConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("length", "Cavity Length (L)", 10.0, 20.0, 1.0, 10.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
                ParamDef::new("mode", "Mode Number (m)", 1.0, 5.0, 1.0, 2.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
            ]),
            config,
        }
    }

    /// Positions of the `m + 1` nodes, mirrors included
    pub fn nodes(&self) -> Vec<f64> {
        let (length, m) = self.geometry();
        (0..=m as usize)
            .map(|i| i as f64 * length / m)
            .collect()
    }

    /// Positions of the `m` antinodes
    pub fn antinodes(&self) -> Vec<f64> {
        let (length, m) = self.geometry();
        (0..m as usize)
            .map(|i| (i as f64 + 0.5) * length / m)
            .collect()
    }

    fn geometry(&self) -> (f64, f64) {
        let length = self.params.at(Self::LENGTH).max(f64::EPSILON);
        let m = self.params.at(Self::MODE).max(1.0);
        (length, m)
    }
}

impl Default for CavityMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for CavityMode {
    fn type_id(&self) -> &'static str {
        "cavity_mode"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn animation(&self) -> Option<AnimationSpec> {
        Some(AnimationSpec::continuous(self.config.clock_step))
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let (length, m) = self.geometry();
        let peak = self.config.amplitude;
        let amplitude = peak * libm::cos(clock);
        let k = m * PI / length;

        let mut frame = Frame::new(clock);
        frame.push_series(
            "standing_wave",
            SampleSequence::from_fn(0.0, length, self.config.samples, |x| {
                amplitude * libm::sin(k * x)
            }),
        );
        frame.push_series(
            "envelope",
            SampleSequence::from_fn(0.0, length, self.config.samples, |x| {
                peak * libm::sin(k * x).abs()
            }),
        );

        for (i, x) in self.nodes().into_iter().enumerate() {
            frame.push_marker(Marker::new(format!("node_{}", i), MarkerKind::Node, x, 0.0));
        }
        for (i, x) in self.antinodes().into_iter().enumerate() {
            let y = amplitude * libm::sin(k * x);
            frame.push_marker(Marker::new(format!("antinode_{}", i), MarkerKind::Antinode, x, y));
        }

        frame.push_readout(Readout::value("wavelength", "Wavelength λ", 2.0 * length / m, None));
        frame.push_readout(Readout::value("mode", "Mode m", m, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let (length, m) = self.geometry();
        let peak = self.config.amplitude * 1.25;
        let t = ScreenTransform::new(
            Axis::linear(0.0, length),
            Axis::linear(-peak, peak),
            plot_area(),
        );
        let vp = t.viewport;
        let mut scene = blank_scene(tokens);

        // mirrors
        scene.rect(Point::new(vp.left - 8.0, vp.top), 8.0, vp.height, Some(tokens.panel), None);
        scene.rect(Point::new(vp.right(), vp.top), 8.0, vp.height, Some(tokens.panel), None);
        scene.hline(&t, 0.0, Stroke::dashed(tokens.grid, 1.0, 5.0, 5.0));

        if let Some(envelope) = frame.series("envelope") {
            scene.trace_styled(&t, envelope, Stroke::dashed(tokens.muted, 1.0, 3.0, 3.0));
            let mirrored: SampleSequence = envelope.iter().map(|s| Sample::new(s.x, -s.y)).collect();
            scene.trace_styled(&t, &mirrored, Stroke::dashed(tokens.muted, 1.0, 3.0, 3.0));
        }
        if let Some(wave) = frame.series("standing_wave") {
            scene.trace_styled(&t, wave, Stroke::solid(tokens.trace, 3.0).with_glow(5.0));
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);

        scene.text(
            Point::new(vp.left + vp.width / 2.0, vp.bottom() + 32.0),
            format!("L = {} · λ/2   (λ = {:.2})", m as u32, 2.0 * length / m),
            tokens.text,
            14.0,
            TextAnchor::Middle,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"L = m \cdot \frac{\lambda}{2}")
    }
}

// =============================================================================
// Round Trip Interference
// =============================================================================

/// Build-up of a standing wave from successive mirror reflections
///
/// The clock counts round trips `N`. The field at `x` sums every forward partial
/// wave (path `2nL + x`) and backward partial wave (path `2(n+1)L − x`, with a π
/// reflection phase) whose path is already covered by the wavefront at `2NL`,
/// each weighted by `Rⁿ`.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    params: ParamSet,
    config: RoundTripConfig,
}

impl RoundTrip {
    pub const WAVELENGTH: usize = 0;
    pub const SPEED: usize = 1;

    pub fn new() -> Self {
        Self::with_config(RoundTripConfig::default())
    }

    pub fn with_config(config: RoundTripConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("wavelength", "Wavelength (λ)", 60.0, 180.0, 0.1, 100.0),
                ParamDef::new("speed", "Simulation Speed", 0.005, 0.1, 0.005, 0.01)
                    .with_format(ValueFormat::Decimal { places: 3 }),
            ]),
            config,
        }
    }

    /// Complex field at position `x` after `round_trips` round trips
    pub fn field(&self, x: f64, round_trips: f64) -> (f64, f64) {
        let length = self.config.cavity_length;
        let wavelength = self.params.at(Self::WAVELENGTH).max(f64::EPSILON);
        let k = 2.0 * PI / wavelength;
        let front = round_trips.max(0.0) * 2.0 * length;
        let max_n = libm::ceil(round_trips.max(0.0)) as usize + 2;

        let mut re = 0.0;
        let mut im = 0.0;
        let mut amplitude = 1.0;
        for n in 0..max_n {
            let forward = 2.0 * n as f64 * length + x;
            if front >= forward {
                let phase = k * forward - k * front;
                re += amplitude * libm::cos(phase);
                im += amplitude * libm::sin(phase);
            }

            let backward = 2.0 * (n as f64 + 1.0) * length - x;
            if front >= backward {
                let phase = k * backward - k * front + PI;
                re += amplitude * libm::cos(phase);
                im += amplitude * libm::sin(phase);
            }
            amplitude *= self.config.reflectivity;
        }
        (re, im)
    }

    /// Mode number `2L/λ` for the current wavelength
    pub fn mode_number(&self) -> f64 {
        2.0 * self.config.cavity_length / self.params.at(Self::WAVELENGTH).max(f64::EPSILON)
    }

    /// Snap the wavelength to the nearest resonance `λ = 2L / round(2L/λ)`
    pub fn find_resonance(&mut self) -> f64 {
        let m = libm::round(self.mode_number()).max(1.0);
        let target = 2.0 * self.config.cavity_length / m;
        let stored = self.params.set_exact_at(Self::WAVELENGTH, target);
        log::debug!("round_trip: snapped wavelength to {:.3} (m = {})", stored, m);
        stored
    }
}

impl Default for RoundTrip {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for RoundTrip {
    fn type_id(&self) -> &'static str {
        "round_trip"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn animation(&self) -> Option<AnimationSpec> {
        Some(AnimationSpec::bounded(
            self.params.at(Self::SPEED),
            self.config.max_round_trips,
        ))
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let length = self.config.cavity_length;
        let mut sum_sq = 0.0;
        let field = SampleSequence::from_fn(0.0, length, self.config.samples, |x| {
            let (re, im) = self.field(x, clock);
            sum_sq += re * re + im * im;
            re
        });
        let mean_intensity = if field.is_empty() {
            0.0
        } else {
            sum_sq / field.len() as f64
        };
        let resonant = mean_intensity > self.config.resonance_threshold;

        let mut frame = Frame::new(clock);
        frame.push_series("field", field);
        frame.push_readout(Readout::flag(keys::RESONANT, "Resonance", resonant));
        frame.push_readout(Readout::value("round_trips", "Round Trips (N)", clock, None));
        frame.push_readout(Readout::value("mean_intensity", "Mean |E|²", mean_intensity, None));
        frame.push_readout(Readout::value("mode_number", "2L/λ", self.mode_number(), None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let length = self.config.cavity_length;
        let reach = 2.0 / (1.0 - self.config.reflectivity).max(0.05);
        let t = ScreenTransform::new(
            Axis::linear(0.0, length),
            Axis::linear(-reach, reach),
            plot_area(),
        );
        let vp = t.viewport;
        let mut scene = blank_scene(tokens);
        let resonant = frame.flag(keys::RESONANT);

        scene.hline(&t, 0.0, Stroke::dashed(tokens.grid, 1.0, 5.0, 5.0));
        let mirror_top = t.map_y(reach * 0.5);
        let mirror_height = t.map_y(-reach * 0.5) - mirror_top;
        scene.rect(Point::new(vp.left - 4.0, mirror_top), 8.0, mirror_height, Some(tokens.marker), None);
        scene.rect(Point::new(vp.right() - 4.0, mirror_top), 8.0, mirror_height, Some(tokens.marker), None);

        if let Some(field) = frame.series("field") {
            let glow = if resonant { 15.0 } else { 2.0 };
            scene.trace_styled(&t, field, Stroke::solid(tokens.trace, 3.0).with_glow(glow));
        }

        scene.text(
            Point::new(vp.left, 18.0),
            format!("N = {:.1} round trips", frame.clock),
            tokens.text,
            12.0,
            TextAnchor::Start,
        );
        status(
            &mut scene,
            tokens,
            if resonant { "RESONANCE DETECTED" } else { "off resonance" },
            resonant,
        );
        scene
    }

    fn action(&mut self, name: &str) -> Result<ActionEffect, WidgetError> {
        match name {
            "find_resonance" => {
                self.find_resonance();
                Ok(ActionEffect {
                    restart_clock: true,
                    play: true,
                })
            }
            _ => Err(WidgetError::UnknownAction(name.to_string())),
        }
    }

    fn actions(&self) -> &'static [&'static str] {
        &["find_resonance"]
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"2L = m\lambda")
    }
}

// =============================================================================
// Mode Comb
// =============================================================================

/// Longitudinal modes of a semiconductor cavity, `Δν = c / (2 n_g L)`
#[derive(Debug, Clone)]
pub struct ModeComb {
    params: ParamSet,
    config: ModeCombConfig,
}

impl ModeComb {
    pub const LENGTH_UM: usize = 0;
    pub const GROUP_INDEX: usize = 1;

    pub fn new() -> Self {
        Self::with_config(ModeCombConfig::default())
    }

    pub fn with_config(config: ModeCombConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("length_um", "Cavity Length", 100.0, 1000.0, 10.0, 300.0)
                    .with_unit("µm")
                    .with_format(ValueFormat::Decimal { places: 0 }),
                ParamDef::new("group_index", "Group Index (n_g)", 3.0, 4.0, 0.01, 3.6)
                    .with_format(ValueFormat::Decimal { places: 2 }),
            ]),
            config,
        }
    }

    /// Free spectral range in GHz
    pub fn spacing_ghz(&self) -> f64 {
        let length_m = self.params.at(Self::LENGTH_UM) * 1e-6;
        let n_g = self.params.at(Self::GROUP_INDEX);
        let denom = 2.0 * n_g * length_m;
        if denom <= 0.0 {
            return 0.0;
        }
        SPEED_OF_LIGHT / denom / 1e9
    }

    /// Mode frequencies (THz) inside the plotted window
    pub fn modes_in_window(&self) -> Vec<f64> {
        let spacing = self.spacing_ghz();
        if spacing <= 0.0 {
            return Vec::new();
        }
        let center = self.config.center_thz * 1000.0;
        let half = self.config.span_ghz / 2.0;
        let first = libm::ceil((center - half) / spacing) as i64;
        let last = libm::floor((center + half) / spacing) as i64;
        (first..=last)
            .map(|m| m as f64 * spacing / 1000.0)
            .collect()
    }

    fn window(&self) -> (f64, f64) {
        let half = self.config.span_ghz / 2000.0;
        (self.config.center_thz - half, self.config.center_thz + half)
    }
}

impl Default for ModeComb {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ModeComb {
    fn type_id(&self) -> &'static str {
        "mode_comb"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let modes = self.modes_in_window();
        let width_thz = self.config.line_width_ghz / 1000.0;
        let (lo, hi) = self.window();

        let comb = SampleSequence::from_fn(lo, hi, self.config.samples, |nu| {
            modes
                .iter()
                .map(|&m| lorentzian(nu, m, width_thz))
                .sum::<f64>()
                .min(1.0)
        });

        let spacing = self.spacing_ghz();
        let center_hz = self.config.center_thz * 1e12;
        let spacing_nm = SPEED_OF_LIGHT * spacing * 1e9 / (center_hz * center_hz) * 1e9;

        let mut frame = Frame::new(clock).with_series("comb", comb);
        for (i, &m) in modes.iter().enumerate() {
            frame.push_marker(Marker::new(format!("mode_{}", i), MarkerKind::Node, m, 1.0));
        }
        frame.push_readout(Readout::value("mode_spacing", "Mode Spacing Δν", spacing, Some("GHz")));
        frame.push_readout(Readout::value("mode_spacing_nm", "Mode Spacing Δλ", spacing_nm, Some("nm")));
        frame.push_readout(Readout::value("modes_in_window", "Modes Shown", modes.len() as f64, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let (lo, hi) = self.window();
        let t = ScreenTransform::new(Axis::linear(lo, hi), Axis::linear(0.0, 1.15), plot_area());
        let mut scene = blank_scene(tokens);

        scene.axes(&t, tokens.axis, Some("Frequency (THz)"), Some("Intensity"));
        scene.x_labels(&t, &ticks(lo, hi, 5, 2), tokens.muted);
        if let Some(comb) = frame.series("comb") {
            scene.area(&t, comb, 0.0, tokens.trace.with_alpha(0.15), Stroke::solid(tokens.trace, 2.0));
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);
        if let Some(spacing) = frame.value("mode_spacing") {
            status(&mut scene, tokens, &format!("Δν = {:.1} GHz", spacing), true);
        }
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\Delta\nu = \frac{c}{2 n_g L}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cavity_nodes_and_antinodes() {
        let mut w = CavityMode::new();
        w.set_param("length", 12.0).unwrap();
        w.set_param("mode", 3.0).unwrap();
        let nodes = w.nodes();
        assert_eq!(nodes.len(), 4);
        for (i, x) in nodes.iter().enumerate() {
            assert_relative_eq!(*x, i as f64 * 4.0);
        }
        let antinodes = w.antinodes();
        assert_eq!(antinodes, vec![2.0, 6.0, 10.0]);
    }

    #[test]
    fn test_cavity_field_vanishes_at_nodes() {
        let w = CavityMode::new();
        let frame = w.evaluate(0.0);
        let wave = frame.series("standing_wave").unwrap();
        assert_eq!(wave.len(), 101);
        for x in w.nodes() {
            let s = wave.nearest(x).unwrap();
            assert_relative_eq!(s.x, x, epsilon = 1e-9);
            assert!(s.y.abs() < 1e-9);
        }
        assert_eq!(frame.markers_of(MarkerKind::Node).count(), 3);
    }

    #[test]
    fn test_cavity_amplitude_follows_clock() {
        let w = CavityMode::new();
        let (_, peak) = w.evaluate(0.0).series("standing_wave").unwrap().y_range().unwrap();
        assert_relative_eq!(peak, 30.0, epsilon = 1e-9);
        let (lo, hi) = w.evaluate(PI / 2.0).series("standing_wave").unwrap().y_range().unwrap();
        assert!(lo.abs() < 1e-9 && hi.abs() < 1e-9);
    }

    #[test]
    fn test_cavity_wavelength_readout() {
        let w = CavityMode::new();
        assert_relative_eq!(w.evaluate(0.0).value("wavelength").unwrap(), 10.0);
    }

    #[test]
    fn test_round_trip_empty_before_light_arrives() {
        let w = RoundTrip::new();
        let frame = w.evaluate(0.0);
        let field = frame.series("field").unwrap();
        assert_eq!(field.len(), 300);
        // only x = 0 is reached at N = 0
        assert!(field.iter().skip(1).all(|s| s.y == 0.0));
        assert!(!frame.flag(keys::RESONANT));
    }

    #[test]
    fn test_round_trip_resonant_after_snapping() {
        let mut w = RoundTrip::new();
        w.set_param("wavelength", 103.0).unwrap();
        let snapped = w.find_resonance();
        assert_relative_eq!(snapped, 1200.0 / 12.0);
        let frame = w.evaluate(50.0);
        assert!(frame.flag(keys::RESONANT));
    }

    #[test]
    fn test_round_trip_off_resonance_stays_low() {
        let mut w = RoundTrip::new();
        // halfway between m = 12 and m = 13
        w.params_mut().set_exact_at(RoundTrip::WAVELENGTH, 1200.0 / 12.5);
        let frame = w.evaluate(50.0);
        assert!(!frame.flag(keys::RESONANT));
        assert!(frame.value("mean_intensity").unwrap() < 80.0);
    }

    #[test]
    fn test_round_trip_action() {
        let mut w = RoundTrip::new();
        let effect = w.action("find_resonance").unwrap();
        assert!(effect.restart_clock && effect.play);
        assert!(w.action("explode").is_err());
    }

    #[test]
    fn test_round_trip_animation_follows_speed() {
        let mut w = RoundTrip::new();
        w.set_param("speed", 0.05).unwrap();
        let spec = w.animation().unwrap();
        assert_relative_eq!(spec.step, 0.05, epsilon = 1e-12);
        assert_eq!(spec.limit, Some(50.0));
        assert!(!spec.autoplay);
    }

    #[test]
    fn test_mode_comb_spacing() {
        let w = ModeComb::new();
        // c / (2 · 3.6 · 300 µm) ≈ 138.8 GHz
        assert_relative_eq!(w.spacing_ghz(), 138.793, epsilon = 1e-2);
        let modes = w.modes_in_window();
        assert!(modes.len() >= 14);
        for pair in modes.windows(2) {
            assert_relative_eq!((pair[1] - pair[0]) * 1000.0, w.spacing_ghz(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mode_comb_longer_cavity_more_modes() {
        let mut w = ModeComb::new();
        let short = w.modes_in_window().len();
        w.set_param("length_um", 1000.0).unwrap();
        assert!(w.modes_in_window().len() > short);
    }
}
