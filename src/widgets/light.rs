//! Light Basics
//!
//! The intro page's three knobs of a wave: how tall, how fast, how shifted.

use std::f64::consts::PI;

use crate::config::LightWaveConfig;
use crate::param::{ParamDef, ParamSet, ValueFormat};
use crate::readout::Readout;
use crate::sample::{Sample, SampleSequence};
use crate::scene::{Scene, Stroke, TextAnchor};
use crate::theme::ThemeTokens;
use crate::transform::{Axis, Point, ScreenTransform, Viewport};
use crate::widget::{Frame, Widget};

use super::{blank_scene, plot_area};

/// Amplitude, frequency and phase traces side by side
#[derive(Debug, Clone)]
pub struct LightWave {
    params: ParamSet,
    config: LightWaveConfig,
}

impl LightWave {
    pub const AMPLITUDE: usize = 0;
    pub const FREQUENCY: usize = 1;
    pub const PHASE_DEG: usize = 2;

    /// Frequency slider maps to a period of `FREQUENCY_SPAN − f` samples
    const FREQUENCY_SPAN: f64 = 110.0;

    pub fn new() -> Self {
        Self::with_config(LightWaveConfig::default())
    }

    pub fn with_config(config: LightWaveConfig) -> Self {
        Self {
            params: ParamSet::new(vec![
                ParamDef::new("amplitude", "Amplitude", 10.0, 80.0, 1.0, 50.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
                ParamDef::new("frequency", "Frequency", 10.0, 100.0, 1.0, 50.0)
                    .with_format(ValueFormat::Decimal { places: 0 }),
                ParamDef::new("phase_deg", "Phase", 0.0, 360.0, 1.0, 0.0).with_format(ValueFormat::Degrees),
            ]),
            config,
        }
    }

    /// Samples per cycle of the frequency trace
    pub fn frequency_period(&self) -> f64 {
        (Self::FREQUENCY_SPAN - self.params.at(Self::FREQUENCY)).max(1.0)
    }

    fn trace(&self, amplitude: f64, period: f64, phase: f64) -> SampleSequence {
        let baseline = self.config.baseline;
        SampleSequence::from_indices(self.config.samples, |i| {
            let x = i as f64;
            Sample::new(x, baseline + amplitude * libm::sin(2.0 * PI * x / period + phase))
        })
    }
}

impl Default for LightWave {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for LightWave {
    fn type_id(&self) -> &'static str {
        "light_wave"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn evaluate(&self, clock: f64) -> Frame {
        let reference = self.config.reference_amplitude;
        let period = self.config.period.max(1.0);
        let phase = self.params.at(Self::PHASE_DEG).to_radians();

        let mut frame = Frame::new(clock)
            .with_series("amplitude", self.trace(self.params.at(Self::AMPLITUDE), period, 0.0))
            .with_series("frequency", self.trace(reference, self.frequency_period(), 0.0))
            .with_series("phase", self.trace(reference, period, phase))
            .with_series("phase_reference", self.trace(reference, period, 0.0));
        frame.push_readout(Readout::value(
            "frequency_period",
            "Period",
            self.frequency_period(),
            Some("samples"),
        ));
        frame
    }

    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
        let vp = plot_area();
        let gap = 16.0;
        let panel = (vp.width - 2.0 * gap) / 3.0;
        let last = self.config.samples.saturating_sub(1).max(1) as f64;
        let baseline = self.config.baseline;
        let mut scene = blank_scene(tokens);

        let panels = [
            ("amplitude", "Amplitude", tokens.trace),
            ("frequency", "Frequency", tokens.trace_alt),
            ("phase", "Phase", tokens.accent),
        ];
        for (k, (id, title, color)) in panels.into_iter().enumerate() {
            let left = vp.left + k as f64 * (panel + gap);
            let t = ScreenTransform::new(
                Axis::linear(0.0, last),
                Axis::linear(baseline - 90.0, baseline + 90.0),
                Viewport::new(left, vp.top + 20.0, panel, vp.height - 20.0),
            );
            scene.rect(
                Point::new(left, vp.top + 20.0),
                panel,
                vp.height - 20.0,
                Some(tokens.panel),
                None,
            );
            scene.hline(&t, baseline, Stroke::dashed(tokens.grid, 1.0, 4.0, 4.0));
            if id == "phase" {
                if let Some(reference) = frame.series("phase_reference") {
                    scene.trace_styled(&t, reference, Stroke::dashed(tokens.muted, 1.0, 3.0, 3.0));
                }
            }
            if let Some(seq) = frame.series(id) {
                scene.trace_styled(&t, seq, Stroke::solid(color, 2.5).with_glow(6.0));
            }
            scene.text(
                Point::new(left + panel / 2.0, vp.top + 10.0),
                title,
                color,
                12.0,
                TextAnchor::Middle,
            );
        }
        scene
    }
}
