//! Gain and Loss Widgets
//!
//! When does a laser lase, and how narrow is its line.

use crate::config::{GainCurveConfig, GainThresholdConfig, LinewidthConfig};
use crate::param::{ParamDef, ParamScale, ParamSet, ValueFormat};
use crate::readout::{keys, Readout};
use crate::sample::{Sample, SampleSequence};
use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{Axis, Point, ScreenTransform};
use crate::widget::{Frame, Marker, MarkerKind, Widget};

use super::{blank_scene, decade_ticks, draw_markers, plot_area, status, ticks, PLANCK};

// =============================================================================
// Gain Curve
// =============================================================================

/// Gaussian gain spectrum that grows with pump current against a flat loss line
#[derive(Debug, Clone)]
pub struct GainCurve {
    params: ParamSet,
    config: GainCurveConfig,
}

impl GainCurve {
    pub const PUMP: usize = 0;

    pub fn new() -> Self {
        Self::with_config(GainCurveConfig::default())
    }

    pub fn with_config(config: GainCurveConfig) -> Self {
        Self {
            params: ParamSet::new(vec![ParamDef::new("pump", "Pump Current", 0.0, 100.0, 1.0, 50.0)
                .with_format(ValueFormat::Decimal { places: 0 })]),
            config,
        }
    }

    pub fn peak_gain(&self) -> f64 {
        self.params.at(Self::PUMP) / self.config.pump_scale.max(f64::EPSILON)
    }

    pub fn is_lasing(&self) -> bool {
        self.params.at(Self::PUMP) > self.config.lasing_pump
    }
}

impl Default for GainCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for GainCurve {
    fn type_id(&self) -> &'static str {
        "gain_curve"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let n = self.config.samples;
        let center = (n / 2) as f64;
        let width = self.config.gain_width.max(f64::EPSILON);
        let peak = self.peak_gain();

        let gain = SampleSequence::from_indices(n, |i| {
            let u = (i as f64 - center) / width;
            Sample::new(i as f64, peak * libm::exp(-(u * u)))
        });

        let mut frame = Frame::new(clock).with_series("gain", gain);
        frame.push_marker(Marker::new(
            "loss",
            MarkerKind::HorizontalLine,
            0.0,
            self.config.loss_level,
        ));
        frame.push_readout(Readout::flag(keys::LASING, "Lasing", self.is_lasing()));
        frame.push_readout(Readout::value("peak_gain", "Peak Gain", peak, None));
        frame.push_readout(Readout::value(
            "net_gain",
            "Net Gain",
            peak - self.config.loss_level,
            None,
        ));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let top = 100.0 / self.config.pump_scale.max(f64::EPSILON) * 1.2;
        let t = ScreenTransform::new(
            Axis::linear(0.0, self.config.samples.saturating_sub(1) as f64),
            Axis::linear(0.0, top),
            plot_area(),
        );
        let mut scene = blank_scene(tokens);
        scene.axes(&t, tokens.axis, Some("Frequency (ν)"), Some("Gain / Loss"));

        draw_markers(&mut scene, &t, &frame.markers, tokens);
        scene.text(
            Point::new(t.viewport.right() - 4.0, t.map_y(self.config.loss_level) - 6.0),
            "Losses (α)",
            tokens.warning,
            12.0,
            TextAnchor::End,
        );
        if let Some(gain) = frame.series("gain") {
            scene.trace_styled(&t, gain, Stroke::solid(tokens.trace, 3.0).with_glow(10.0));
        }

        let lasing = frame.flag(keys::LASING);
        status(
            &mut scene,
            tokens,
            if lasing { "Lasing State" } else { "Below Threshold" },
            lasing,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"g(\nu) > \alpha")
    }
}

// =============================================================================
// Gain Threshold
// =============================================================================

/// Lorentzian material gain against the cavity threshold
///
/// `g(ν) = g0 / (1 + [2(ν − ν0)/Δν]²)` and
/// `α_total = α_int + (1/2L) ln(1/(R1 R2))` with identical facets.
#[derive(Debug, Clone)]
pub struct GainThreshold {
    params: ParamSet,
    config: GainThresholdConfig,
}

impl GainThreshold {
    pub const PEAK_GAIN: usize = 0;
    pub const LINEWIDTH: usize = 1;
    pub const INTERNAL_LOSS: usize = 2;
    pub const REFLECTIVITY: usize = 3;
    pub const LENGTH_UM: usize = 4;

    pub fn new() -> Self {
        Self::with_config(GainThresholdConfig::default())
    }

    pub fn with_config(config: GainThresholdConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("peak_gain", "Peak Gain (g0)", 0.0, 100.0, 1.0, 40.0).with_unit("cm⁻¹"),
                ParamDef::new("linewidth_thz", "Gain Bandwidth (Δν)", 0.5, 10.0, 0.1, 4.0).with_unit("THz"),
                ParamDef::new("internal_loss", "Internal Loss (α_int)", 0.0, 30.0, 0.5, 10.0).with_unit("cm⁻¹"),
                ParamDef::new("reflectivity", "Facet Reflectivity (R)", 0.05, 0.99, 0.01, 0.31)
                    .with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::new("length_um", "Cavity Length", 100.0, 1000.0, 10.0, 300.0)
                    .with_unit("µm")
                    .with_format(ValueFormat::Decimal { places: 0 }),
            ]),
            config,
        }
    }

    /// Distributed mirror loss in cm⁻¹
    pub fn mirror_loss(&self) -> f64 {
        let length_cm = self.params.at(Self::LENGTH_UM) * 1e-4;
        let r = self.params.at(Self::REFLECTIVITY);
        if length_cm <= 0.0 || r <= 0.0 {
            return 0.0;
        }
        libm::log(1.0 / (r * r)) / (2.0 * length_cm)
    }

    /// Total loss the gain must overcome, in cm⁻¹
    pub fn threshold(&self) -> f64 {
        self.params.at(Self::INTERNAL_LOSS) + self.mirror_loss()
    }

    pub fn gain_at(&self, detuning_thz: f64) -> f64 {
        let g0 = self.params.at(Self::PEAK_GAIN);
        let width = self.params.at(Self::LINEWIDTH).max(f64::EPSILON);
        let d = 2.0 * detuning_thz / width;
        g0 / (1.0 + d * d)
    }

    /// Full width (THz) of the band where gain exceeds threshold
    pub fn lasing_band(&self) -> f64 {
        let g0 = self.params.at(Self::PEAK_GAIN);
        let alpha = self.threshold();
        if alpha <= 0.0 || g0 <= alpha {
            return 0.0;
        }
        self.params.at(Self::LINEWIDTH) * libm::sqrt(g0 / alpha - 1.0)
    }
}

impl Default for GainThreshold {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for GainThreshold {
    fn type_id(&self) -> &'static str {
        "gain_threshold"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let span = self.config.detuning_span_thz;
        let threshold = self.threshold();
        let g0 = self.params.at(Self::PEAK_GAIN);

        let gain = SampleSequence::from_fn(-span, span, self.config.samples, |d| self.gain_at(d));

        let mut frame = Frame::new(clock).with_series("gain", gain);
        frame.push_marker(Marker::new("threshold", MarkerKind::HorizontalLine, 0.0, threshold));
        frame.push_marker(Marker::new("peak", MarkerKind::Point, 0.0, g0));
        frame.push_readout(Readout::flag(keys::LASING, "Lasing", g0 > threshold));
        frame.push_readout(Readout::value("threshold", "Threshold Gain", threshold, Some("cm⁻¹")));
        frame.push_readout(Readout::value("mirror_loss", "Mirror Loss", self.mirror_loss(), Some("cm⁻¹")));
        frame.push_readout(Readout::value("net_gain", "Net Gain at ν0", g0 - threshold, Some("cm⁻¹")));
        frame.push_readout(Readout::value("lasing_band", "Lasing Band", self.lasing_band(), Some("THz")));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let span = self.config.detuning_span_thz;
        let t = ScreenTransform::new(
            Axis::linear(-span, span),
            Axis::linear(0.0, self.config.gain_axis_max),
            plot_area(),
        );
        let mut scene = blank_scene(tokens);

        scene.grid(&t, &[-span / 2.0, 0.0, span / 2.0], &[], tokens.grid);
        scene.axes(&t, tokens.axis, Some("Detuning ν − ν0 (THz)"), Some("Gain (cm⁻¹)"));
        scene.x_labels(&t, &ticks(-span, span, 5, 0), tokens.muted);
        scene.y_labels(&t, &ticks(0.0, self.config.gain_axis_max, 5, 0), tokens.muted);

        if let Some(gain) = frame.series("gain") {
            scene.area(&t, gain, 0.0, tokens.trace.with_alpha(0.12), Stroke::solid(tokens.trace, 2.5));
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);

        let lasing = frame.flag(keys::LASING);
        let threshold = frame.value("threshold").unwrap_or_default();
        status(
            &mut scene,
            tokens,
            &format!(
                "α_total = {:.1} cm⁻¹, {}",
                threshold,
                if lasing { "lasing" } else { "below threshold" }
            ),
            lasing,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"g_{th} = \alpha_{int} + \frac{1}{2L}\ln\frac{1}{R_1 R_2}")
    }
}

// =============================================================================
// Linewidth
// =============================================================================

/// Modified Schawlow–Townes linewidth versus output power
///
/// `Δν = hν (Δν_cav)² / P · (1 + α_H²)`, plotted on log–log axes.
#[derive(Debug, Clone)]
pub struct Linewidth {
    params: ParamSet,
    config: LinewidthConfig,
}

impl Linewidth {
    pub const POWER_MW: usize = 0;
    pub const CAVITY_LINEWIDTH_GHZ: usize = 1;
    pub const ALPHA_H: usize = 2;

    pub fn new() -> Self {
        Self::with_config(LinewidthConfig::default())
    }

    pub fn with_config(config: LinewidthConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("power_mw", "Output Power", 0.1, 100.0, 0.1, 10.0)
                    .with_unit("mW")
                    .with_scale(ParamScale::Logarithmic),
                ParamDef::new("cavity_linewidth_ghz", "Cavity Linewidth", 1.0, 50.0, 0.5, 10.0).with_unit("GHz"),
                ParamDef::new("alpha_h", "Henry Factor (α_H)", 0.0, 6.0, 0.1, 3.0),
            ]),
            config,
        }
    }

    /// Linewidth in kHz at `power_mw`, with or without α enhancement
    pub fn linewidth_khz(&self, power_mw: f64, enhanced: bool) -> f64 {
        let power_w = power_mw.max(f64::MIN_POSITIVE) * 1e-3;
        let h_nu = PLANCK * self.config.optical_thz * 1e12;
        let cavity_hz = self.params.at(Self::CAVITY_LINEWIDTH_GHZ) * 1e9;
        let alpha = self.params.at(Self::ALPHA_H);
        let factor = if enhanced { 1.0 + alpha * alpha } else { 1.0 };
        h_nu * cavity_hz * cavity_hz / power_w * factor / 1e3
    }

    fn power_range(&self) -> (f64, f64) {
        let def = &self.params.defs()[Self::POWER_MW];
        (def.min, def.max)
    }

    fn sweep(&self, enhanced: bool) -> SampleSequence {
        let (lo, hi) = self.power_range();
        let n = self.config.samples;
        let denom = n.saturating_sub(1).max(1) as f64;
        SampleSequence::from_indices(n, |i| {
            let p = lo * libm::pow(hi / lo, i as f64 / denom);
            Sample::new(p, self.linewidth_khz(p, enhanced))
        })
    }
}

impl Default for Linewidth {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Linewidth {
    fn type_id(&self) -> &'static str {
        "linewidth"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let power = self.params.at(Self::POWER_MW);
        let alpha = self.params.at(Self::ALPHA_H);
        let current = self.linewidth_khz(power, true);

        let mut frame = Frame::new(clock)
            .with_series("linewidth", self.sweep(true))
            .with_series("quantum_limit", self.sweep(false));
        frame.push_marker(Marker::new("operating_point", MarkerKind::Point, power, current));
        frame.push_readout(Readout::value("linewidth", "Linewidth", current, Some("kHz")));
        frame.push_readout(Readout::value("enhancement", "Enhancement (1 + α_H²)", 1.0 + alpha * alpha, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let (lo, hi) = self.power_range();
        let t = ScreenTransform::new(
            Axis::log10(lo, hi),
            Axis::log10(self.config.axis_min_khz, self.config.axis_max_khz),
            plot_area(),
        );
        let mut scene = blank_scene(tokens);

        let x_ticks = decade_ticks(lo, hi);
        let y_ticks = decade_ticks(self.config.axis_min_khz, self.config.axis_max_khz);
        let xs: Vec<f64> = x_ticks.iter().map(|(v, _)| *v).collect();
        let ys: Vec<f64> = y_ticks.iter().map(|(v, _)| *v).collect();
        scene.grid(&t, &xs, &ys, tokens.grid);
        scene.axes(&t, tokens.axis, Some("Output Power (mW)"), Some("Linewidth (kHz)"));
        scene.x_labels(&t, &x_ticks, tokens.muted);
        scene.y_labels(&t, &y_ticks, tokens.muted);

        if let Some(limit) = frame.series("quantum_limit") {
            scene.trace_styled(&t, limit, Stroke::dashed(tokens.muted, 1.5, 6.0, 4.0));
        }
        if let Some(line) = frame.series("linewidth") {
            scene.trace_styled(&t, line, Stroke::solid(tokens.trace, 3.0).with_glow(6.0));
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);

        if let Some(width) = frame.value("linewidth") {
            status(&mut scene, tokens, &format!("Δν = {:.2} kHz", width), true);
        }
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\Delta\nu_{ST} = \frac{h\nu (\Delta\nu_{cav})^2}{P}(1 + \alpha_H^2)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gain_curve_shape() {
        let w = GainCurve::new();
        let frame = w.evaluate(0.0);
        let gain = frame.series("gain").unwrap();
        assert_eq!(gain.len(), 100);
        let peak = gain.get(50).unwrap();
        assert_relative_eq!(peak.y, 5.0);
        assert_relative_eq!(gain.get(70).unwrap().y, 5.0 * libm::exp(-1.0));
    }

    #[test]
    fn test_gain_curve_lasing_threshold_is_strict() {
        let mut w = GainCurve::new();
        w.set_param("pump", 50.0).unwrap();
        assert!(!w.evaluate(0.0).flag(keys::LASING));
        w.set_param("pump", 51.0).unwrap();
        assert!(w.evaluate(0.0).flag(keys::LASING));
    }

    #[test]
    fn test_gain_curve_zero_pump_is_flat() {
        let mut w = GainCurve::new();
        w.set_param("pump", 0.0).unwrap();
        let frame = w.evaluate(0.0);
        assert!(frame.series("gain").unwrap().ys().all(|y| y == 0.0));
    }

    #[test]
    fn test_threshold_formula() {
        let w = GainThreshold::new();
        // L = 0.03 cm, R = 0.31
        let expected_mirror = libm::log(1.0 / (0.31 * 0.31)) / 0.06;
        assert_relative_eq!(w.mirror_loss(), expected_mirror, epsilon = 1e-9);
        assert_relative_eq!(w.threshold(), 10.0 + expected_mirror, epsilon = 1e-9);
    }

    #[test]
    fn test_lorentzian_half_width() {
        let w = GainThreshold::new();
        assert_relative_eq!(w.gain_at(0.0), 40.0);
        assert_relative_eq!(w.gain_at(2.0), 20.0);
        assert_relative_eq!(w.gain_at(-2.0), 20.0);
    }

    #[test]
    fn test_threshold_lasing_flag() {
        let mut w = GainThreshold::new();
        assert!(!w.evaluate(0.0).flag(keys::LASING));
        assert_eq!(w.lasing_band(), 0.0);
        w.set_param("peak_gain", 100.0).unwrap();
        let frame = w.evaluate(0.0);
        assert!(frame.flag(keys::LASING));
        assert!(frame.value("lasing_band").unwrap() > 0.0);
    }

    #[test]
    fn test_band_edges_sit_on_threshold() {
        let mut w = GainThreshold::new();
        w.set_param("peak_gain", 90.0).unwrap();
        let half = w.lasing_band() / 2.0;
        assert_relative_eq!(w.gain_at(half), w.threshold(), epsilon = 1e-9);
    }

    #[test]
    fn test_linewidth_scales_inverse_with_power() {
        let w = Linewidth::new();
        let a = w.linewidth_khz(1.0, true);
        let b = w.linewidth_khz(10.0, true);
        assert_relative_eq!(a / b, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linewidth_alpha_enhancement() {
        let w = Linewidth::new();
        let ratio = w.linewidth_khz(10.0, true) / w.linewidth_khz(10.0, false);
        assert_relative_eq!(ratio, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linewidth_sweep_is_log_spaced() {
        let w = Linewidth::new();
        let frame = w.evaluate(0.0);
        let sweep = frame.series("linewidth").unwrap();
        assert_eq!(sweep.len(), 200);
        assert_relative_eq!(sweep.first().unwrap().x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(sweep.last().unwrap().x, 100.0, epsilon = 1e-9);
        // monotonically decreasing with power
        assert!(sweep.as_slice().windows(2).all(|p| p[1].y < p[0].y));
    }
}
