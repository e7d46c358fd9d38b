//! Tunable Laser Widgets
//!
//! Temperature tuning of a mode set, the Vernier effect between two reflection
//! combs, and a sampled-grating laser whose lasing mode hops as the section
//! currents change.

use std::f64::consts::PI;

use crate::config::{ThermalConfig, TunableConfig, VernierConfig};
use crate::param::{ParamDef, ParamSet, ValueFormat};
use crate::readout::{keys, Readout};
use crate::sample::{Sample, SampleSequence};
use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{Axis, Point, ScreenTransform, Viewport};
use crate::widget::{Frame, Marker, MarkerKind, Widget, WidgetError};

use super::{blank_scene, draw_markers, lorentzian, plot_area, status, ticks};

/// `c` in nm·THz, so that `λ[nm] = C_NM_THZ / f[THz]`
const C_NM_THZ: f64 = 299_792.458;

pub fn wavelength_nm(frequency_thz: f64) -> f64 {
    C_NM_THZ / frequency_thz.max(f64::EPSILON)
}

// =============================================================================
// Temperature Tuning
// =============================================================================

/// Spectral axis of the temperature tuning plot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralDomain {
    Frequency,
    Wavelength,
}

/// Seven cavity modes drifting together as the chip heats
///
/// Every mode moves by the same `coefficient × (T − T_ref)` in frequency, and
/// the drawn cavity stretches with temperature.
#[derive(Debug, Clone)]
pub struct TemperatureTuning {
    params: ParamSet,
    config: ThermalConfig,
}

impl TemperatureTuning {
    pub const TEMPERATURE: usize = 0;
    pub const DOMAIN: usize = 1;

    const CAVITY_WAVE: f64 = 15.0;
    const CAVITY_PHASE: f64 = 8.0 * PI;

    pub fn new() -> Self {
        Self::with_config(ThermalConfig::default())
    }

    pub fn with_config(config: ThermalConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("temperature", "Temperature", 0.0, 80.0, 0.1, config.reference_c).with_unit("°C"),
                ParamDef::select("domain", "Domain", &["Frequency", "Wavelength"]),
            ]),
            config,
        }
    }

    pub fn domain(&self) -> SpectralDomain {
        if self.params.at(Self::DOMAIN) >= 0.5 {
            SpectralDomain::Wavelength
        } else {
            SpectralDomain::Frequency
        }
    }

    fn delta_t(&self) -> f64 {
        self.params.at(Self::TEMPERATURE) - self.config.reference_c
    }

    /// Common frequency shift (THz) at the current temperature
    pub fn frequency_shift(&self) -> f64 {
        self.config.coefficient_thz_per_c * self.delta_t()
    }

    /// Mode frequencies (THz) at the current temperature
    pub fn mode_frequencies(&self) -> Vec<f64> {
        let shift = self.frequency_shift();
        self.config
            .base_frequencies_thz
            .iter()
            .map(|f| f + shift)
            .collect()
    }

    pub fn cavity_length(&self) -> f64 {
        self.config.cavity_length + self.config.expansion_per_c * self.delta_t()
    }

    fn spectral_window(&self) -> (f64, f64) {
        let base = &self.config.base_frequencies_thz;
        let lo = base.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = base.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if lo.is_finite() && hi.is_finite() {
            (lo - 1.0, hi + 1.0)
        } else {
            (192.0, 195.0)
        };
        match self.domain() {
            SpectralDomain::Frequency => (lo, hi),
            SpectralDomain::Wavelength => (wavelength_nm(hi), wavelength_nm(lo)),
        }
    }
}

impl Default for TemperatureTuning {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TemperatureTuning {
    fn type_id(&self) -> &'static str {
        "temperature_tuning"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let length = self.cavity_length();
        let n = self.config.samples;
        let denom = n.saturating_sub(1).max(1) as f64;
        let cavity = SampleSequence::from_indices(n, |i| {
            let u = i as f64 / denom;
            Sample::new(u * length, Self::CAVITY_WAVE * libm::sin(u * Self::CAVITY_PHASE))
        });

        let mut frame = Frame::new(clock).with_series("cavity", cavity);
        let domain = self.domain();
        for (i, f) in self.mode_frequencies().into_iter().enumerate() {
            let x = match domain {
                SpectralDomain::Frequency => f,
                SpectralDomain::Wavelength => wavelength_nm(f),
            };
            frame.push_marker(Marker::new(format!("mode_{}", i), MarkerKind::VerticalLine, x, 1.0));
        }

        let base = &self.config.base_frequencies_thz;
        let center_shift = base
            .get(base.len() / 2)
            .map(|f| wavelength_nm(f + self.frequency_shift()) - wavelength_nm(*f))
            .unwrap_or_default();
        frame.push_readout(Readout::value("frequency_shift", "Frequency Shift", self.frequency_shift(), Some("THz")));
        frame.push_readout(Readout::value("wavelength_shift", "Wavelength Shift", center_shift, Some("nm")));
        frame.push_readout(Readout::value("cavity_length", "Cavity Length", length, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let vp = plot_area();
        let cavity_vp = Viewport::new(vp.left, vp.top, vp.width, vp.height * 0.4);
        let spectrum_vp = Viewport::new(vp.left, vp.top + vp.height * 0.5, vp.width, vp.height * 0.5);
        let mut scene = blank_scene(tokens);

        // cavity drawn to scale against the longest it can get
        let reach = self.config.cavity_length + self.config.expansion_per_c * 60.0;
        let length = self.cavity_length();
        let offset = (reach - length) / 2.0;
        let tc = ScreenTransform::new(
            Axis::linear(-offset, reach - offset),
            Axis::linear(-2.0 * Self::CAVITY_WAVE, 2.0 * Self::CAVITY_WAVE),
            cavity_vp,
        );
        let mirror_top = tc.map_y(1.6 * Self::CAVITY_WAVE);
        let mirror_height = tc.map_y(-1.6 * Self::CAVITY_WAVE) - mirror_top;
        scene.rect(Point::new(tc.map_x(0.0) - 6.0, mirror_top), 6.0, mirror_height, Some(tokens.marker), None);
        scene.rect(Point::new(tc.map_x(length), mirror_top), 6.0, mirror_height, Some(tokens.marker), None);
        if let Some(cavity) = frame.series("cavity") {
            scene.trace_styled(&tc, cavity, Stroke::solid(tokens.trace, 2.5).with_glow(6.0));
        }

        let (lo, hi) = self.spectral_window();
        let ts = ScreenTransform::new(Axis::linear(lo, hi), Axis::linear(0.0, 1.2), spectrum_vp);
        let title = match self.domain() {
            SpectralDomain::Frequency => "Frequency (THz)",
            SpectralDomain::Wavelength => "Wavelength (nm)",
        };
        scene.axes(&ts, tokens.axis, Some(title), None);
        scene.x_labels(&ts, &ticks(lo, hi, 5, 1), tokens.muted);
        for marker in frame.markers_of(MarkerKind::VerticalLine) {
            let base = ts.map(Sample::new(marker.at.x, 0.0));
            let top = ts.map(Sample::new(marker.at.x, marker.at.y));
            scene.line(base, top, Stroke::solid(tokens.text, 2.0).with_glow(4.0));
        }

        let shift = frame.value("frequency_shift").unwrap_or_default();
        status(
            &mut scene,
            tokens,
            &format!(
                "T = {:.1} °C, Δf = {:+.3} THz",
                self.params.at(Self::TEMPERATURE),
                shift
            ),
            shift != 0.0,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\Delta f = \frac{df}{dT}\,\Delta T")
    }
}

// =============================================================================
// Vernier
// =============================================================================

/// Two reflection combs of slightly different pitch; shifting either one picks
/// which pair of peaks coincides
#[derive(Debug, Clone)]
pub struct Vernier {
    params: ParamSet,
    config: VernierConfig,
}

impl Vernier {
    pub const SHIFT_A: usize = 0;
    pub const SHIFT_B: usize = 1;

    pub fn new() -> Self {
        Self::with_config(VernierConfig::default())
    }

    pub fn with_config(config: VernierConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("shift_a", "Mirror A Shift (Δλ₁)", -30.0, 30.0, 1.0, 0.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
                ParamDef::new("shift_b", "Mirror B Shift (Δλ₂)", -30.0, 30.0, 1.0, 0.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
            ]),
            config,
        }
    }

    pub fn comb_a(&self) -> Vec<f64> {
        Self::comb(self.config.peaks, self.config.spacing_a, self.params.at(Self::SHIFT_A))
    }

    pub fn comb_b(&self) -> Vec<f64> {
        Self::comb(self.config.peaks, self.config.spacing_b, self.params.at(Self::SHIFT_B))
    }

    fn comb(peaks: usize, spacing: f64, shift: f64) -> Vec<f64> {
        (0..peaks).map(|i| i as f64 * spacing + shift).collect()
    }

    /// First `(i, j)` with `|a_i − b_j| < tolerance` among the checked A peaks
    pub fn alignment(&self) -> Option<(usize, usize)> {
        let a = self.comb_a();
        let b = self.comb_b();
        a.iter()
            .take(self.config.checked_peaks)
            .enumerate()
            .find_map(|(i, x1)| {
                b.iter()
                    .position(|x2| (x1 - x2).abs() < self.config.tolerance)
                    .map(|j| (i, j))
            })
    }

    /// Smallest distance between a checked A peak and any B peak
    pub fn closest_gap(&self) -> f64 {
        let b = self.comb_b();
        self.comb_a()
            .iter()
            .take(self.config.checked_peaks)
            .flat_map(|x1| b.iter().map(move |x2| (x1 - x2).abs()))
            .fold(f64::INFINITY, f64::min)
    }

    fn extent(&self) -> f64 {
        let span = self.config.spacing_a.max(self.config.spacing_b) * self.config.peaks.saturating_sub(1) as f64;
        span + 40.0
    }
}

impl Default for Vernier {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Vernier {
    fn type_id(&self) -> &'static str {
        "vernier"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let a = self.comb_a();
        let b = self.comb_b();
        let alignment = self.alignment();

        let mut frame = Frame::new(clock)
            .with_series("comb_a", a.iter().map(|&x| Sample::new(x, 1.0)).collect())
            .with_series("comb_b", b.iter().map(|&x| Sample::new(x, 1.0)).collect());

        if let Some((i, j)) = alignment {
            frame.push_marker(Marker::new("alignment", MarkerKind::VerticalLine, (a[i] + b[j]) / 2.0, 0.0));
            frame.push_readout(Readout::value("aligned_peak", "Aligned Peak", i as f64, None));
        }
        frame.push_readout(Readout::flag(keys::ALIGNED, "Peaks Aligned", alignment.is_some()));
        let gap = self.closest_gap();
        frame.push_readout(Readout::value(
            "closest_gap",
            "Closest Gap",
            if gap.is_finite() { gap } else { 0.0 },
            None,
        ));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let extent = self.extent();
        let vp = plot_area();
        let t = ScreenTransform::new(Axis::linear(-35.0, extent), Axis::linear(0.0, 2.0), vp);
        let mut scene = blank_scene(tokens);

        if let Some(marker) = frame.marker("alignment") {
            let x = t.map_x(marker.at.x);
            scene.rect(
                Point::new(x - 20.0, vp.top),
                40.0,
                vp.height,
                Some(tokens.accent.with_alpha(0.1)),
                Some(Stroke::solid(tokens.accent, 1.0)),
            );
            scene.line(Point::new(x, vp.top), Point::new(x, vp.bottom()), Stroke::solid(tokens.accent, 4.0));
        }

        // comb A in the upper band, comb B in the lower
        let bands = [
            ("comb_a", 1.0, tokens.trace, "Mirror A Reflectivity"),
            ("comb_b", 0.0, tokens.trace_alt, "Mirror B Reflectivity"),
        ];
        for (id, floor, color, label) in bands {
            scene.hline(&t, floor, Stroke::solid(color.with_alpha(0.2), 1.0));
            scene.text(
                Point::new(vp.left, t.map_y(floor + 0.9)),
                label,
                color,
                10.0,
                TextAnchor::Start,
            );
            if let Some(comb) = frame.series(id) {
                for peak in comb.iter() {
                    let base = t.map(Sample::new(peak.x, floor));
                    let top = t.map(Sample::new(peak.x, floor + 0.7 * peak.y));
                    scene.line(base, top, Stroke::solid(color.with_alpha(0.6), 4.0));
                }
            }
        }

        let aligned = frame.flag(keys::ALIGNED);
        status(
            &mut scene,
            tokens,
            if aligned { "Lasing peak selected" } else { "No coincidence" },
            aligned,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\Delta\lambda_{V} = \frac{\Delta\lambda_1 \Delta\lambda_2}{|\Delta\lambda_1 - \Delta\lambda_2|}")
    }
}

// =============================================================================
// Tunable Laser
// =============================================================================

/// Indices that identify the lasing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeIndices {
    /// Vernier supermode: which pair of mirror peaks coincides
    pub supermode: i64,
    /// Longitudinal cavity mode under the supermode
    pub cavity_mode: i64,
}

/// Sampled-grating DBR laser with two mirror sections and a phase section
///
/// Mirror currents shift the two reflection combs; the supermode is the
/// nearest integer Vernier alignment, the cavity mode is the longitudinal mode
/// nearest the supermode peak. Any index change raises a mode-hop event,
/// collected through [`Widget::drain_events`].
#[derive(Debug, Clone)]
pub struct TunableLaser {
    params: ParamSet,
    config: TunableConfig,
    last: ModeIndices,
    pending: Vec<Readout>,
    hops: u64,
}

impl TunableLaser {
    pub const MIRROR_A_MA: usize = 0;
    pub const MIRROR_B_MA: usize = 1;
    pub const PHASE_MA: usize = 2;

    pub fn new() -> Self {
        Self::with_config(TunableConfig::default())
    }

    pub fn with_config(config: TunableConfig) -> Self {
        let params = ParamSet::new(vec![
            ParamDef::new("mirror_a_ma", "Mirror A Current", 0.0, 40.0, 0.1, 0.0).with_unit("mA"),
            ParamDef::new("mirror_b_ma", "Mirror B Current", 0.0, 40.0, 0.1, 0.0).with_unit("mA"),
            ParamDef::new("phase_ma", "Phase Current", 0.0, 10.0, 0.05, 0.0)
                .with_unit("mA")
                .with_format(ValueFormat::Decimal { places: 2 }),
        ]);
        let mut laser = Self {
            params,
            config,
            last: ModeIndices {
                supermode: 0,
                cavity_mode: 0,
            },
            pending: Vec::new(),
            hops: 0,
        };
        laser.last = laser.indices();
        laser
    }

    fn shift_a(&self) -> f64 {
        self.config.mirror_tuning_ghz_per_ma * self.params.at(Self::MIRROR_A_MA)
    }

    fn shift_b(&self) -> f64 {
        self.config.mirror_tuning_ghz_per_ma * self.params.at(Self::MIRROR_B_MA)
    }

    fn phase_shift(&self) -> f64 {
        self.config.phase_tuning_ghz_per_ma * self.params.at(Self::PHASE_MA)
    }

    /// Continuous Vernier alignment `k` solving `sA + kΔA = sB + kΔB`
    fn alignment(&self) -> f64 {
        let pitch = self.config.spacing_a_ghz - self.config.spacing_b_ghz;
        if pitch.abs() < f64::EPSILON {
            return 0.0;
        }
        (self.shift_b() - self.shift_a()) / pitch
    }

    /// Detuning (GHz from centre) of the selected supermode peak
    pub fn supermode_detuning(&self) -> f64 {
        let k = libm::round(self.alignment());
        let a = self.shift_a() + k * self.config.spacing_a_ghz;
        let b = self.shift_b() + k * self.config.spacing_b_ghz;
        (a + b) / 2.0
    }

    pub fn indices(&self) -> ModeIndices {
        let spacing = self.config.cavity_spacing_ghz.max(f64::EPSILON);
        let position = (self.supermode_detuning() - self.phase_shift()) / spacing;
        ModeIndices {
            supermode: libm::round(self.alignment()) as i64,
            cavity_mode: libm::round(position) as i64,
        }
    }

    /// Detuning (GHz from centre) of the lasing cavity mode
    pub fn lasing_detuning(&self) -> f64 {
        self.phase_shift() + self.indices().cavity_mode as f64 * self.config.cavity_spacing_ghz
    }

    pub fn lasing_frequency_thz(&self) -> f64 {
        self.config.center_thz + self.lasing_detuning() / 1000.0
    }

    pub fn hop_count(&self) -> u64 {
        self.hops
    }

    /// Reflectivity of one comb at `detuning`, from its nearest peak
    fn comb_reflectivity(&self, detuning: f64, shift: f64, spacing: f64) -> f64 {
        let spacing = spacing.max(f64::EPSILON);
        let d = (detuning - shift).rem_euclid(spacing);
        let nearest = if d > spacing / 2.0 { d - spacing } else { d };
        lorentzian(nearest, 0.0, self.config.peak_width_ghz)
    }

    fn detect_hop(&mut self) {
        let now = self.indices();
        if now != self.last {
            let detail = format!(
                "supermode {} → {}, cavity mode {} → {}",
                self.last.supermode, now.supermode, self.last.cavity_mode, now.cavity_mode
            );
            log::info!("mode hop: {}", detail);
            self.pending.push(Readout::event(keys::MODE_HOP, "Mode Hop", detail));
            self.hops += 1;
            self.last = now;
        }
    }
}

impl Default for TunableLaser {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TunableLaser {
    fn type_id(&self) -> &'static str {
        "tunable_laser"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn set_param(&mut self, id: &str, value: f64) -> Result<f64, WidgetError> {
        let stored = self.params.set(id, value)?;
        self.detect_hop();
        Ok(stored)
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let w = self.config.window_ghz;
        let (sa, sb) = (self.shift_a(), self.shift_b());
        let (pa, pb) = (self.config.spacing_a_ghz, self.config.spacing_b_ghz);
        let n = self.config.samples;

        let mirror_a = SampleSequence::from_fn(-w, w, n, |d| self.comb_reflectivity(d, sa, pa));
        let mirror_b = SampleSequence::from_fn(-w, w, n, |d| self.comb_reflectivity(d, sb, pb));
        let product = SampleSequence::from_fn(-w, w, n, |d| {
            self.comb_reflectivity(d, sa, pa) * self.comb_reflectivity(d, sb, pb)
        });

        let indices = self.indices();
        let lasing = self.lasing_detuning();
        let mut frame = Frame::new(clock)
            .with_series("mirror_a", mirror_a)
            .with_series("mirror_b", mirror_b)
            .with_series("product", product);
        frame.push_marker(Marker::new("lasing", MarkerKind::VerticalLine, lasing, 1.0));
        frame.push_readout(Readout::value("supermode", "Supermode", indices.supermode as f64, None));
        frame.push_readout(Readout::value("cavity_mode", "Cavity Mode", indices.cavity_mode as f64, None));
        frame.push_readout(Readout::value(
            "lasing_frequency",
            "Lasing Frequency",
            self.lasing_frequency_thz(),
            Some("THz"),
        ));
        frame.push_readout(Readout::value(
            "lasing_wavelength",
            "Lasing Wavelength",
            wavelength_nm(self.lasing_frequency_thz()),
            Some("nm"),
        ));
        frame.push_readout(Readout::value("hop_count", "Mode Hops", self.hops as f64, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let w = self.config.window_ghz;
        let t = ScreenTransform::new(Axis::linear(-w, w), Axis::linear(0.0, 1.15), plot_area());
        let mut scene = blank_scene(tokens);

        scene.grid(&t, &[-w / 2.0, 0.0, w / 2.0], &[0.5, 1.0], tokens.grid);
        scene.axes(&t, tokens.axis, Some("Detuning (GHz)"), Some("Reflectivity"));
        scene.x_labels(&t, &ticks(-w, w, 5, 0), tokens.muted);

        if let Some(a) = frame.series("mirror_a") {
            scene.trace(&t, a, tokens.trace.with_alpha(0.35), 1.0);
        }
        if let Some(b) = frame.series("mirror_b") {
            scene.trace(&t, b, tokens.trace_alt.with_alpha(0.35), 1.0);
        }
        if let Some(product) = frame.series("product") {
            scene.area(
                &t,
                product,
                0.0,
                tokens.highlight.with_alpha(0.15),
                Stroke::solid(tokens.highlight, 2.0).with_glow(8.0),
            );
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);

        if let Some(wl) = frame.value("lasing_wavelength") {
            status(&mut scene, tokens, &format!("λ = {:.3} nm", wl), true);
        }
        scene
    }

    fn reset(&mut self) {
        self.params.reset();
        self.pending.clear();
        self.hops = 0;
        self.last = self.indices();
    }

    fn drain_events(&mut self) -> Vec<Readout> {
        // catches writes made through params_mut
        self.detect_hop();
        std::mem::take(&mut self.pending)
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\nu_{las} = \nu_0 + \Delta\nu_\phi + q\,\Delta\nu_{cav}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_thermal_uniform_shift() {
        let mut w = TemperatureTuning::new();
        let base = w.mode_frequencies();
        w.set_param("temperature", 45.0).unwrap();
        let shifted = w.mode_frequencies();
        for (b, s) in base.iter().zip(&shifted) {
            assert_relative_eq!(s - b, -0.013 * 20.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_thermal_reference_has_no_shift() {
        let w = TemperatureTuning::new();
        let frame = w.evaluate(0.0);
        assert_relative_eq!(frame.value("frequency_shift").unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(w.cavity_length(), 300.0, epsilon = 1e-9);
        assert_eq!(frame.series("cavity").unwrap().len(), 121);
    }

    #[test]
    fn test_thermal_heating_redshifts_wavelength() {
        let mut w = TemperatureTuning::new();
        w.set_param("temperature", 80.0).unwrap();
        let frame = w.evaluate(0.0);
        assert!(frame.value("wavelength_shift").unwrap() > 0.0);
        assert!(w.cavity_length() > 300.0);
    }

    #[test]
    fn test_thermal_domain_switch() {
        let mut w = TemperatureTuning::new();
        w.select("domain", "Wavelength").unwrap();
        assert_eq!(w.domain(), SpectralDomain::Wavelength);
        let frame = w.evaluate(0.0);
        let first = frame.marker("mode_0").unwrap();
        assert_relative_eq!(first.at.x, 299_792.458 / 192.7, epsilon = 1e-6);
    }

    #[test]
    fn test_wavelength_conversion() {
        assert_relative_eq!(wavelength_nm(193.4), 1550.116, epsilon = 1e-3);
    }

    #[test]
    fn test_vernier_aligned_at_rest() {
        let w = Vernier::new();
        assert_eq!(w.alignment(), Some((0, 0)));
        assert!(w.evaluate(0.0).flag(keys::ALIGNED));
    }

    #[test]
    fn test_vernier_shift_moves_alignment() {
        let mut w = Vernier::new();
        // a_i = 60i + 20, b_j = 65j: closest is i = j = 4 at gap 0
        w.set_param("shift_a", 20.0).unwrap();
        assert_eq!(w.alignment(), Some((4, 4)));
        assert_eq!(w.closest_gap(), 0.0);
    }

    #[test]
    fn test_vernier_tolerance_is_strict() {
        let mut w = Vernier::new();
        // b_j = 65j + 5: |60i - 65j - 5| >= 5 for every i < 7, equal at i = j = 0
        w.set_param("shift_b", 5.0).unwrap();
        let gap = w.closest_gap();
        assert_eq!(gap, 5.0);
        assert!(w.alignment().is_none());
        assert!(!w.evaluate(0.0).flag(keys::ALIGNED));
    }

    #[test]
    fn test_tunable_starts_on_supermode_zero() {
        let w = TunableLaser::new();
        assert_eq!(
            w.indices(),
            ModeIndices {
                supermode: 0,
                cavity_mode: 0
            }
        );
        assert_relative_eq!(w.lasing_frequency_thz(), 193.4);
    }

    #[test]
    fn test_tunable_hop_only_on_index_change() {
        let mut w = TunableLaser::new();
        // small phase change stays on the same cavity mode
        w.set_param("phase_ma", 1.0).unwrap();
        assert!(w.drain_events().is_empty());

        // 9 GHz/mA against a 45 GHz mode spacing: the lasing mode slides with
        // the phase current until the supermode peak is closer to the next one
        w.set_param("phase_ma", 3.0).unwrap();
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_event());
        assert_eq!(events[0].key(), keys::MODE_HOP);
        assert_eq!(w.hop_count(), 1);

        // repeating the same value raises nothing
        w.set_param("phase_ma", 3.0).unwrap();
        assert!(w.drain_events().is_empty());
    }

    #[test]
    fn test_tunable_hop_seen_after_direct_param_write() {
        let mut w = TunableLaser::new();
        w.params_mut().set_at(TunableLaser::MIRROR_B_MA, 3.0);
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key(), keys::MODE_HOP);
        assert_eq!(w.hop_count(), 1);
        assert!(w.drain_events().is_empty());
    }

    #[test]
    fn test_tunable_supermode_hop() {
        let mut w = TunableLaser::new();
        // sB − sA = 30 GHz over ΔA − ΔB = −50 GHz rounds to supermode −1
        w.set_param("mirror_b_ma", 3.0).unwrap();
        assert_eq!(w.indices().supermode, -1);
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        let frame = w.evaluate(0.0);
        assert_eq!(frame.value("supermode"), Some(-1.0));
        assert_eq!(frame.value("hop_count"), Some(1.0));
    }

    #[test]
    fn test_tunable_reset_is_silent() {
        let mut w = TunableLaser::new();
        w.set_param("mirror_b_ma", 3.0).unwrap();
        w.reset();
        assert!(w.drain_events().is_empty());
        assert_eq!(w.hop_count(), 0);
        w.set_param("mirror_b_ma", 0.0).unwrap();
        assert!(w.drain_events().is_empty());
    }

    #[test]
    fn test_tunable_product_peaks_at_supermode() {
        let w = TunableLaser::new();
        let frame = w.evaluate(0.0);
        let product = frame.series("product").unwrap();
        let best = product
            .iter()
            .fold(Sample::new(0.0, f64::NEG_INFINITY), |acc, s| if s.y > acc.y { *s } else { acc });
        assert!(best.x.abs() <= 10.0);
        assert!(frame.is_finite());
    }
}
