//! Modulation Widgets
//!
//! External modulation with a Mach–Zehnder modulator and I/Q drive, plus the
//! direct-modulation side: chirp and small-signal bandwidth.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationSpec;
use crate::config::{ChirpConfig, ConstellationConfig, IqConfig, ModulationResponseConfig, MzmConfig};
use crate::param::{ParamDef, ParamSet, ValueFormat};
use crate::readout::{keys, Readout};
use crate::sample::{Sample, SampleSequence};
use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{to_db, Axis, Point, ScreenTransform, Viewport};
use crate::widget::{Frame, Marker, MarkerKind, Widget};

use super::{blank_scene, decade_ticks, draw_markers, plot_area, status, ticks};

// =============================================================================
// MZM Transfer Curve
// =============================================================================

/// Intensity transfer of a push-pull MZM, `T(V) = cos²(πV / 2V_π)`
#[derive(Debug, Clone)]
pub struct MzmTransfer {
    params: ParamSet,
    config: MzmConfig,
}

impl MzmTransfer {
    pub const BIAS_V: usize = 0;
    pub const V_PI: usize = 1;

    pub fn new() -> Self {
        Self::with_config(MzmConfig::default())
    }

    pub fn with_config(config: MzmConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("bias_v", "Bias Voltage", -20.0, 20.0, 0.01, 0.0)
                    .with_unit("V")
                    .with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::new("v_pi", "Half-wave Voltage (V_π)", 1.0, 10.0, 0.1, 4.0).with_unit("V"),
            ]),
            config,
        }
    }

    pub fn transmission(&self, volts: f64) -> f64 {
        let v_pi = self.params.at(Self::V_PI).max(f64::EPSILON);
        let c = libm::cos(PI * volts / (2.0 * v_pi));
        c * c
    }

    /// Bias folded into the plotted window `[−2V_π, 2V_π]`, preserving `T`
    fn folded_bias(&self) -> f64 {
        let v_pi = self.params.at(Self::V_PI);
        let span = 4.0 * v_pi;
        (self.params.at(Self::BIAS_V) + 2.0 * v_pi).rem_euclid(span) - 2.0 * v_pi
    }
}

impl Default for MzmTransfer {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for MzmTransfer {
    fn type_id(&self) -> &'static str {
        "mzm_transfer"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let v_pi = self.params.at(Self::V_PI);
        let bias = self.params.at(Self::BIAS_V);
        let t_bias = self.transmission(bias);

        let transfer = SampleSequence::from_fn(-2.0 * v_pi, 2.0 * v_pi, self.config.samples, |v| {
            self.transmission(v)
        });

        let mut frame = Frame::new(clock).with_series("transfer", transfer);
        frame.push_marker(Marker::new("bias", MarkerKind::Point, bias, t_bias));
        frame.push_readout(Readout::value("transmission", "Transmission", t_bias, None));
        frame.push_readout(Readout::value(
            "phase_difference",
            "Arm Phase Difference",
            180.0 * bias / v_pi.max(f64::EPSILON),
            Some("°"),
        ));
        frame.push_readout(Readout::flag(
            "extinguished",
            "Output Null",
            t_bias < self.config.null_threshold,
        ));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let v_pi = self.params.at(Self::V_PI);
        let t = ScreenTransform::new(
            Axis::linear(-2.0 * v_pi, 2.0 * v_pi),
            Axis::linear(-0.15, 1.2),
            plot_area(),
        );
        let mut scene = blank_scene(tokens);

        scene.grid(&t, &[-v_pi, 0.0, v_pi], &[0.5, 1.0], tokens.grid);
        scene.axes(&t, tokens.axis, Some("Drive Voltage"), Some("Transmission"));
        let labels = [
            (-2.0 * v_pi, "-2Vπ".to_string()),
            (-v_pi, "-Vπ".to_string()),
            (0.0, "0".to_string()),
            (v_pi, "Vπ".to_string()),
            (2.0 * v_pi, "2Vπ".to_string()),
        ];
        scene.x_labels(&t, &labels, tokens.muted);
        scene.y_labels(&t, &ticks(0.0, 1.0, 3, 1), tokens.muted);

        if let Some(curve) = frame.series("transfer") {
            scene.trace_styled(&t, curve, Stroke::solid(tokens.trace_third, 4.0).with_glow(15.0));
        }

        // the bias may sit outside the window; T is periodic so fold it in
        let folded: Vec<Marker> = frame
            .markers
            .iter()
            .map(|m| Marker::new(m.id.clone(), m.kind, self.folded_bias(), m.at.y))
            .collect();
        draw_markers(&mut scene, &t, &folded, tokens);

        if let Some(tx) = frame.value("transmission") {
            status(
                &mut scene,
                tokens,
                &format!("T = {:.3}", tx),
                !frame.flag("extinguished"),
            );
        }
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"T(V) = \cos^2\left(\frac{\pi V}{2 V_\pi}\right)")
    }
}

// =============================================================================
// MZM Interferometer
// =============================================================================

/// Two-arm interferometer view: the phase shift slides the lower arm's wave
/// and dims the recombined output
#[derive(Debug, Clone)]
pub struct MzmInterferometer {
    params: ParamSet,
    config: MzmConfig,
}

impl MzmInterferometer {
    pub const PHASE_DEG: usize = 0;

    const ARM_WAVE: f64 = 0.4;
    const UPPER: f64 = 1.0;
    const LOWER: f64 = -1.0;

    pub fn new() -> Self {
        Self::with_config(MzmConfig::default())
    }

    pub fn with_config(config: MzmConfig) -> Self {
        Self {
            params: ParamSet::new(vec![ParamDef::new("phase_deg", "Phase Shift", 0.0, 180.0, 1.0, 0.0)
                .with_format(ValueFormat::Degrees)]),
            config,
        }
    }

    /// Output amplitude shown as opacity, linear in phase
    pub fn output_opacity(&self) -> f64 {
        (1.0 - self.params.at(Self::PHASE_DEG) / 180.0).max(0.0)
    }

    /// Horizontal displacement of the lower arm's wave
    pub fn arm_shift(&self) -> f64 {
        self.params.at(Self::PHASE_DEG) / 180.0 * self.config.arm_offset
    }

    /// One wave period spans twice the full-scale shift, so 180° is half a cycle
    fn period(&self) -> f64 {
        (2.0 * self.config.arm_offset).max(f64::EPSILON)
    }

    fn arm_length(&self) -> f64 {
        3.0 * self.period()
    }
}

impl Default for MzmInterferometer {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for MzmInterferometer {
    fn type_id(&self) -> &'static str {
        "mzm_interferometer"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let phase = self.params.at(Self::PHASE_DEG);
        let period = self.period();
        let length = self.arm_length();
        let shift = self.arm_shift();
        let n = self.config.arm_samples;
        let k = 2.0 * PI / period;

        let upper = SampleSequence::from_fn(0.0, length, n, |x| Self::UPPER + Self::ARM_WAVE * libm::sin(k * x));
        let lower = SampleSequence::from_fn(0.0, length, n, |x| {
            Self::LOWER + Self::ARM_WAVE * libm::sin(k * (x - shift))
        });
        let opacity = self.output_opacity();
        let output = SampleSequence::from_fn(length, length + period, n / 2, |x| {
            opacity * Self::ARM_WAVE * libm::sin(k * x)
        });

        let half = libm::cos(phase.to_radians() / 2.0);
        let mut frame = Frame::new(clock)
            .with_series("upper_arm", upper)
            .with_series("lower_arm", lower)
            .with_series("output", output);
        frame.push_readout(Readout::flag(keys::CONSTRUCTIVE, "Constructive Interference", phase < 180.0));
        frame.push_readout(Readout::value("output_opacity", "Output Amplitude", opacity, None));
        frame.push_readout(Readout::value("transmission", "Transmission", half * half, None));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let length = self.arm_length();
        let period = self.period();
        let lead = period / 2.0;
        let t = ScreenTransform::new(
            Axis::linear(-lead, length + period),
            Axis::linear(-2.0, 2.0),
            plot_area(),
        );
        let mut scene = blank_scene(tokens);
        let guide = Stroke::solid(tokens.trace.with_alpha(0.4), 3.0);

        // splitter and combiner
        let split = t.map(Sample::new(-lead, 0.0));
        let merge = t.map(Sample::new(length + lead / 2.0, 0.0));
        for arm in [Self::UPPER, Self::LOWER] {
            scene.line(split, t.map(Sample::new(0.0, arm)), guide.clone());
            scene.line(t.map(Sample::new(length, arm)), merge, guide.clone());
        }

        // electrode over the upper arm
        let top_left = t.map(Sample::new(length * 0.15, Self::UPPER + 0.7));
        let bottom_right = t.map(Sample::new(length * 0.55, Self::UPPER + 0.45));
        scene.rect(
            top_left,
            bottom_right.x - top_left.x,
            bottom_right.y - top_left.y,
            Some(tokens.accent.with_alpha(0.1)),
            Some(Stroke::solid(tokens.accent, 2.0)),
        );
        scene.text(
            Point::new((top_left.x + bottom_right.x) / 2.0, bottom_right.y - 4.0),
            "V(t)",
            tokens.accent,
            10.0,
            TextAnchor::Middle,
        );

        for id in ["upper_arm", "lower_arm"] {
            if let Some(arm) = frame.series(id) {
                scene.trace(&t, arm, tokens.trace, 2.0);
            }
        }
        if let Some(output) = frame.series("output") {
            let opacity = frame.value("output_opacity").unwrap_or(1.0);
            scene.trace(&t, output, tokens.text.with_alpha(opacity), 2.0);
        }

        let constructive = frame.flag(keys::CONSTRUCTIVE);
        let phase = self.params.at(Self::PHASE_DEG);
        status(
            &mut scene,
            tokens,
            &format!(
                "Phase Shift: {:.0}° ({})",
                phase,
                if constructive {
                    "Constructive Interference"
                } else {
                    "Destructive Interference"
                }
            ),
            constructive,
        );
        scene
    }
}

// =============================================================================
// I/Q Waveforms
// =============================================================================

/// In-phase and quadrature drive signals scrolling with the clock
#[derive(Debug, Clone)]
pub struct IqWaveform {
    params: ParamSet,
    config: IqConfig,
}

impl IqWaveform {
    pub const AMP_I: usize = 0;
    pub const AMP_Q: usize = 1;
    pub const FREQ: usize = 2;
    pub const QUADRATURE: usize = 3;

    pub fn new() -> Self {
        Self::with_config(IqConfig::default())
    }

    pub fn with_config(config: IqConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("amp_i", "I Amplitude", 0.0, 1.0, 0.01, 1.0).with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::new("amp_q", "Q Amplitude", 0.0, 1.0, 0.01, 1.0).with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::new("freq", "Frequency", 0.5, 4.0, 0.1, 1.0),
                ParamDef::toggle("quadrature", "π/2 Phase Shift", true),
            ]),
            config,
        }
    }

    fn q_offset(&self) -> f64 {
        if self.params.at(Self::QUADRATURE) >= 0.5 {
            PI / 2.0
        } else {
            0.0
        }
    }

    fn wave(&self, amplitude: f64, offset: f64, clock: f64) -> SampleSequence {
        let freq = self.params.at(Self::FREQ);
        let window = self.config.window;
        SampleSequence::from_fn(0.0, 1.0, self.config.samples, |x| {
            amplitude * libm::sin(window * x * freq + clock + offset)
        })
    }
}

impl Default for IqWaveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for IqWaveform {
    fn type_id(&self) -> &'static str {
        "iq_waveform"
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
        let offset = self.q_offset();
        let mut frame = Frame::new(clock)
            .with_series("i", self.wave(self.params.at(Self::AMP_I), 0.0, clock))
            .with_series("q", self.wave(self.params.at(Self::AMP_Q), offset, clock));
        frame.push_readout(Readout::value("q_offset", "Q Phase Offset", offset.to_degrees(), Some("°")));
        frame.push_readout(Readout::flag("orthogonal", "Orthogonal", offset != 0.0));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let t = ScreenTransform::new(Axis::linear(0.0, 1.0), Axis::linear(-1.5, 1.5), plot_area());
        let vp = t.viewport;
        let mut scene = blank_scene(tokens);

        scene.hline(&t, 0.0, Stroke::solid(tokens.grid, 1.0));
        if let Some(i) = frame.series("i") {
            scene.trace_styled(&t, i, Stroke::solid(tokens.trace_third, 3.0).with_glow(10.0));
        }
        if let Some(q) = frame.series("q") {
            scene.trace_styled(&t, q, Stroke::solid(tokens.accent, 3.0).with_glow(10.0));
        }

        scene.text(Point::new(vp.left + 8.0, 18.0), "In-Phase I(t)", tokens.trace_third, 12.0, TextAnchor::Start);
        scene.text(
            Point::new(vp.left + 108.0, 18.0),
            "Quadrature Q(t)",
            tokens.accent,
            12.0,
            TextAnchor::Start,
        );
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"E(t) = I(t)\cos\omega t + Q(t)\sin\omega t")
    }
}

// =============================================================================
// Constellation
// =============================================================================

/// Symbol alphabets offered by the constellation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulationFormat {
    Nrz,
    Bpsk,
    Qpsk,
    Psk8,
    Qam16,
}

impl ModulationFormat {
    pub const LABELS: [&'static str; 5] = ["NRZ", "BPSK", "QPSK", "8-PSK", "16-QAM"];
    const ALL: [ModulationFormat; 5] = [
        ModulationFormat::Nrz,
        ModulationFormat::Bpsk,
        ModulationFormat::Qpsk,
        ModulationFormat::Psk8,
        ModulationFormat::Qam16,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(ModulationFormat::Nrz)
    }

    pub fn label(&self) -> &'static str {
        Self::LABELS[*self as usize]
    }

    /// Ideal (I, Q) symbol coordinates before any quadrature error
    pub fn symbols(&self, amp_i: f64, amp_q: f64) -> Vec<(f64, f64)> {
        match self {
            // on-off keying: dark and lit
            ModulationFormat::Nrz => vec![(0.0, 0.0), (amp_i, 0.0)],
            ModulationFormat::Bpsk => vec![(amp_i, 0.0), (-amp_i, 0.0)],
            ModulationFormat::Qpsk => vec![(amp_i, amp_q), (-amp_i, amp_q), (-amp_i, -amp_q), (amp_i, -amp_q)],
            ModulationFormat::Psk8 => (0..8)
                .map(|k| {
                    let theta = k as f64 * PI / 4.0;
                    (amp_i * libm::cos(theta), amp_q * libm::sin(theta))
                })
                .collect(),
            ModulationFormat::Qam16 => {
                const LEVELS: [f64; 4] = [-3.0, -1.0, 1.0, 3.0];
                LEVELS
                    .iter()
                    .flat_map(|&i| LEVELS.iter().map(move |&q| (i * amp_i / 3.0, q * amp_q / 3.0)))
                    .collect()
            }
        }
    }
}

/// Place an (I, Q) pair in the complex plane with the Q axis at `π/2 + drift`
pub fn project_symbol(i: f64, q: f64, drift: f64) -> Sample {
    let q_phase = PI / 2.0 + drift;
    Sample::new(i + q * libm::cos(q_phase), q * libm::sin(q_phase))
}

/// IQ-plane symbol map with a tunable quadrature bias error
#[derive(Debug, Clone)]
pub struct Constellation {
    params: ParamSet,
    config: ConstellationConfig,
}

impl Constellation {
    pub const AMP_I: usize = 0;
    pub const AMP_Q: usize = 1;
    pub const FORMAT: usize = 2;
    pub const BIAS_DRIFT: usize = 3;

    pub fn new() -> Self {
        Self::with_config(ConstellationConfig::default())
    }

    pub fn with_config(config: ConstellationConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("amp_i", "I Amplitude", 0.0, 1.5, 0.01, 1.0).with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::new("amp_q", "Q Amplitude", 0.0, 1.5, 0.01, 1.0).with_format(ValueFormat::Decimal { places: 2 }),
                ParamDef::select("format", "Modulation Format", &ModulationFormat::LABELS),
                ParamDef::new("bias_drift", "Quadrature Bias Drift", -0.8, 0.8, 0.01, 0.0)
                    .with_unit("rad")
                    .with_format(ValueFormat::Decimal { places: 2 }),
            ]),
            config,
        }
    }

    pub fn format(&self) -> ModulationFormat {
        ModulationFormat::from_index(self.params.at(Self::FORMAT).round().max(0.0) as usize)
    }

    fn points(&self, drift: f64) -> SampleSequence {
        self.format()
            .symbols(self.params.at(Self::AMP_I), self.params.at(Self::AMP_Q))
            .into_iter()
            .map(|(i, q)| project_symbol(i, q, drift))
            .collect()
    }
}

impl Default for Constellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Constellation {
    fn type_id(&self) -> &'static str {
        "constellation"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let drift = self.params.at(Self::BIAS_DRIFT);
        let symbols = self.points(drift);
        let count = symbols.len();

        let mut frame = Frame::new(clock)
            .with_series("symbols", symbols)
            .with_series("ideal", self.points(0.0));
        frame.push_readout(Readout::value("symbol_count", "Symbols", count as f64, None));
        frame.push_readout(Readout::value(
            "bits_per_symbol",
            "Bits per Symbol",
            libm::log2(count.max(1) as f64),
            None,
        ));
        frame.push_readout(Readout::value("phase_error", "Quadrature Error", drift.to_degrees(), Some("°")));
        frame.push_readout(Readout::flag(
            "drifted",
            "Bias Drifted",
            drift.abs() > self.config.drift_tolerance,
        ));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let extent = self.config.extent;
        let vp = plot_area();
        // square plane centred in the plot area
        let side = vp.width.min(vp.height);
        let square = Viewport::new(vp.left + (vp.width - side) / 2.0, vp.top, side, side);
        let t = ScreenTransform::new(
            Axis::linear(-extent, extent),
            Axis::linear(-extent, extent),
            square,
        );
        let mut scene = blank_scene(tokens);

        scene.grid(&t, &[-1.0, 1.0], &[-1.0, 1.0], tokens.grid);
        scene.hline(&t, 0.0, Stroke::solid(tokens.axis, 1.0));
        scene.vline(&t, 0.0, Stroke::solid(tokens.axis, 1.0));
        scene.text(
            Point::new(square.right() - 4.0, t.map_y(0.0) - 6.0),
            "In-Phase (I)",
            tokens.muted,
            11.0,
            TextAnchor::End,
        );
        scene.text(
            Point::new(t.map_x(0.0) + 6.0, square.top + 12.0),
            "Quadrature (Q)",
            tokens.muted,
            11.0,
            TextAnchor::Start,
        );

        if frame.flag("drifted") {
            if let Some(ideal) = frame.series("ideal") {
                for p in t.map_all(ideal) {
                    scene.ring(p, 6.0, Stroke::dashed(tokens.muted, 1.0, 2.0, 2.0));
                }
            }
        }
        if let Some(symbols) = frame.series("symbols") {
            for p in t.map_all(symbols) {
                scene.circle(p, 15.0, tokens.accent.with_alpha(0.2));
                scene.circle(p, 5.0, tokens.accent);
                scene.circle(p, 2.0, tokens.marker);
            }
        }

        let drifted = frame.flag("drifted");
        status(
            &mut scene,
            tokens,
            &format!(
                "{}{}",
                self.format().label(),
                if drifted { " (quadrature drift)" } else { "" }
            ),
            !drifted,
        );
        scene
    }
}

// =============================================================================
// Chirp
// =============================================================================

/// Frequency chirp of a directly modulated laser
///
/// `Δν(t) = α_H / 4π · (P'/P + κP)` with `P(t) = 1 + m sin ωt`. The optical
/// phase `φ += 2π Δν dt` is the widget's only cross-frame state; it is wrapped
/// to `[0, 2π)` and zeroed on reset.
#[derive(Debug, Clone)]
pub struct Chirp {
    params: ParamSet,
    config: ChirpConfig,
    phase: f64,
}

impl Chirp {
    pub const MOD_DEPTH: usize = 0;
    pub const MOD_FREQ_GHZ: usize = 1;
    pub const ALPHA_H: usize = 2;
    pub const KAPPA: usize = 3;

    pub fn new() -> Self {
        Self::with_config(ChirpConfig::default())
    }

    pub fn with_config(config: ChirpConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("mod_depth", "Modulation Depth (m)", 0.0, 0.9, 0.01, 0.5)
                    .with_format(ValueFormat::Percent),
                ParamDef::new("mod_freq_ghz", "Modulation Frequency", 0.5, 10.0, 0.1, 2.0).with_unit("GHz"),
                ParamDef::new("alpha_h", "Henry Factor (α_H)", 0.0, 6.0, 0.1, 3.0),
                ParamDef::new("kappa", "Adiabatic Coefficient (κ)", 0.0, 2.0, 0.05, 0.5)
                    .with_format(ValueFormat::Decimal { places: 2 }),
            ]),
            config,
            phase: 0.0,
        }
    }

    fn omega(&self) -> f64 {
        2.0 * PI * self.params.at(Self::MOD_FREQ_GHZ)
    }

    /// Normalised optical power at time `t` (ns)
    pub fn power(&self, t: f64) -> f64 {
        1.0 + self.params.at(Self::MOD_DEPTH) * libm::sin(self.omega() * t)
    }

    /// Instantaneous frequency deviation (GHz) at time `t` (ns)
    pub fn frequency_deviation(&self, t: f64) -> f64 {
        let w = self.omega();
        let p = self.power(t).max(f64::EPSILON);
        let dp = self.params.at(Self::MOD_DEPTH) * w * libm::cos(w * t);
        let alpha = self.params.at(Self::ALPHA_H);
        let kappa = self.params.at(Self::KAPPA);
        alpha / (4.0 * PI) * (dp / p + kappa * p)
    }

    /// Accumulated optical phase (radians, wrapped)
    pub fn phase(&self) -> f64 {
        self.phase
    }

    fn window(&self) -> f64 {
        self.config.periods / self.params.at(Self::MOD_FREQ_GHZ).max(f64::EPSILON)
    }
}

impl Default for Chirp {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Chirp {
    fn type_id(&self) -> &'static str {
        "chirp"
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
        let window = self.window();
        let n = self.config.samples;
        let power = SampleSequence::from_fn(0.0, window, n, |tau| self.power(clock + tau));
        let chirp = SampleSequence::from_fn(0.0, window, n, |tau| self.frequency_deviation(clock + tau));
        let carrier_cycles = self.config.carrier_cycles;
        let carrier = SampleSequence::from_fn(0.0, window, self.config.carrier_samples, |tau| {
            self.power(clock + tau) * libm::sin(2.0 * PI * carrier_cycles * tau / window + self.phase)
        });
        let peak = chirp.ys().fold(0.0_f64, |acc, y| acc.max(y.abs()));

        let mut frame = Frame::new(clock)
            .with_series("power", power)
            .with_series("chirp", chirp)
            .with_series("carrier", carrier);
        frame.push_readout(Readout::value(
            "instant_chirp",
            "Δν(t)",
            self.frequency_deviation(clock),
            Some("GHz"),
        ));
        frame.push_readout(Readout::value("peak_chirp", "Peak |Δν|", peak, Some("GHz")));
        frame.push_readout(Readout::value("optical_phase", "Optical Phase φ", self.phase, Some("rad")));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let window = self.window();
        let vp = plot_area();
        let half = vp.height / 2.0;
        let upper = Viewport::new(vp.left, vp.top, vp.width, half - 8.0);
        let lower = Viewport::new(vp.left, vp.top + half + 8.0, vp.width, half - 8.0);

        let reach = frame.value("peak_chirp").unwrap_or(1.0).max(0.5) * 1.2;
        let t_power = ScreenTransform::new(Axis::linear(0.0, window), Axis::linear(-2.0, 2.0), upper);
        let t_chirp = ScreenTransform::new(Axis::linear(0.0, window), Axis::linear(-reach, reach), lower);
        let mut scene = blank_scene(tokens);

        scene.axes(&t_power, tokens.axis, None, Some("P(t)"));
        scene.axes(&t_chirp, tokens.axis, Some("Time (ns)"), Some("Δν (GHz)"));
        scene.hline(&t_chirp, 0.0, Stroke::dashed(tokens.grid, 1.0, 4.0, 4.0));
        scene.x_labels(&t_chirp, &ticks(0.0, window, 5, 2), tokens.muted);

        if let Some(carrier) = frame.series("carrier") {
            scene.trace(&t_power, carrier, tokens.trace.with_alpha(0.6), 1.5);
        }
        if let Some(power) = frame.series("power") {
            scene.trace_styled(&t_power, power, Stroke::solid(tokens.trace, 2.5).with_glow(6.0));
        }
        if let Some(chirp) = frame.series("chirp") {
            scene.trace_styled(&t_chirp, chirp, Stroke::solid(tokens.trace_alt, 2.5).with_glow(6.0));
        }

        if let Some(peak) = frame.value("peak_chirp") {
            status(&mut scene, tokens, &format!("peak |Δν| = {:.2} GHz", peak), peak > 0.0);
        }
        scene
    }

    fn advance(&mut self, clock: f64, dt: f64) {
        let step = 2.0 * PI * self.frequency_deviation(clock) * dt;
        if step.is_finite() {
            self.phase = (self.phase + step).rem_euclid(2.0 * PI);
        }
    }

    fn reset(&mut self) {
        self.params.reset();
        self.phase = 0.0;
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"\Delta\nu(t) = \frac{\alpha_H}{4\pi}\left(\frac{1}{P}\frac{dP}{dt} + \kappa P\right)")
    }
}

// =============================================================================
// Modulation Response
// =============================================================================

/// Small-signal response `|H(f)|² = f_r⁴ / ((f_r² − f²)² + (γ f / 2π)²)`
pub fn response(f: f64, relaxation: f64, damping: f64) -> f64 {
    let fr2 = relaxation * relaxation;
    let g = damping / (2.0 * PI);
    let detune = fr2 - f * f;
    let denom = detune * detune + g * g * f * f;
    if denom <= 0.0 {
        return f64::MAX;
    }
    fr2 * fr2 / denom
}

/// Frequency where the response first falls 3 dB below its DC value.
///
/// Closed form of `(f_r² − f²)² + (γf/2π)² = 2 f_r⁴` for `f²`.
pub fn bandwidth_3db(relaxation: f64, damping: f64) -> f64 {
    let fr2 = relaxation * relaxation;
    let g = damping / (2.0 * PI);
    let b = 2.0 * fr2 - g * g;
    let u = (b + libm::sqrt(b * b + 4.0 * fr2 * fr2)) / 2.0;
    libm::sqrt(u.max(0.0))
}

/// Direct-modulation bandwidth set by the relaxation oscillation
#[derive(Debug, Clone)]
pub struct ModulationResponse {
    params: ParamSet,
    config: ModulationResponseConfig,
}

impl ModulationResponse {
    pub const RELAXATION_GHZ: usize = 0;
    pub const DAMPING_GHZ: usize = 1;

    pub fn new() -> Self {
        Self::with_config(ModulationResponseConfig::default())
    }

    pub fn with_config(config: ModulationResponseConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("relaxation_ghz", "Relaxation Frequency (f_r)", 2.0, 30.0, 0.5, 10.0).with_unit("GHz"),
                ParamDef::new("damping_ghz", "Damping (γ)", 1.0, 60.0, 1.0, 20.0)
                    .with_unit("GHz")
                    .with_format(ValueFormat::Decimal { places: 0 }),
            ]),
            config,
        }
    }

    fn response_db(&self, f: f64) -> f64 {
        to_db(response(
            f,
            self.params.at(Self::RELAXATION_GHZ),
            self.params.at(Self::DAMPING_GHZ),
        ))
    }
}

impl Default for ModulationResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ModulationResponse {
    fn type_id(&self) -> &'static str {
        "modulation_response"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let lo = self.config.min_ghz;
        let hi = self.config.max_ghz;
        let n = self.config.samples;
        let denom = n.saturating_sub(1).max(1) as f64;
        let curve = SampleSequence::from_indices(n, |i| {
            let f = lo * libm::pow(hi / lo, i as f64 / denom);
            Sample::new(f, self.response_db(f))
        });
        let peak_db = curve.ys().fold(f64::NEG_INFINITY, f64::max);
        let bw = bandwidth_3db(
            self.params.at(Self::RELAXATION_GHZ),
            self.params.at(Self::DAMPING_GHZ),
        );

        let mut frame = Frame::new(clock).with_series("response", curve);
        frame.push_marker(Marker::new("bandwidth", MarkerKind::VerticalLine, bw, -3.0));
        frame.push_marker(Marker::new("minus_3db", MarkerKind::HorizontalLine, bw, -3.0));
        frame.push_readout(Readout::value("bandwidth_3db", "−3 dB Bandwidth", bw, Some("GHz")));
        frame.push_readout(Readout::value("peak_db", "Resonance Peak", peak_db, Some("dB")));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let (lo, hi) = (self.config.min_ghz, self.config.max_ghz);
        let (floor, ceiling) = (self.config.floor_db, self.config.ceiling_db);
        let t = ScreenTransform::new(Axis::log10(lo, hi), Axis::linear(floor, ceiling), plot_area());
        let mut scene = blank_scene(tokens);

        let x_ticks = decade_ticks(lo, hi);
        let xs: Vec<f64> = x_ticks.iter().map(|(v, _)| *v).collect();
        let y_ticks = ticks(floor, ceiling, 6, 0);
        let ys: Vec<f64> = y_ticks.iter().map(|(v, _)| *v).collect();
        scene.grid(&t, &xs, &ys, tokens.grid);
        scene.axes(&t, tokens.axis, Some("Modulation Frequency (GHz)"), Some("Response (dB)"));
        scene.x_labels(&t, &x_ticks, tokens.muted);
        scene.y_labels(&t, &y_ticks, tokens.muted);

        if let Some(curve) = frame.series("response") {
            let clipped: SampleSequence = curve
                .iter()
                .map(|s| Sample::new(s.x, s.y.clamp(floor, ceiling)))
                .collect();
            scene.trace_styled(&t, &clipped, Stroke::solid(tokens.trace, 3.0).with_glow(8.0));
        }
        draw_markers(&mut scene, &t, &frame.markers, tokens);

        if let Some(bw) = frame.value("bandwidth_3db") {
            status(&mut scene, tokens, &format!("f₃dB = {:.1} GHz", bw), true);
        }
        scene
    }

    fn caption(&self) -> Option<&'static str> {
        Some(r"|H(f)|^2 = \frac{f_r^4}{(f_r^2 - f^2)^2 + (\gamma f / 2\pi)^2}")
    }
}
