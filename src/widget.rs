//! Parametric Visualization Widget
//!
//! The one pattern every plot on the site repeats: a [`ParamSet`] bound to range
//! controls, a pure evaluator from (parameters, clock) to a [`Frame`] of sample
//! sequences, and a renderer from that frame to a [`Scene`].
//!
//! ```text
//! set_param ──► ParamSet ──┐
//!                          ├──► evaluate(clock) ──► Frame ──► render(tokens) ──► Scene
//! AnimationClock ──────────┘
//! ```
//!
//! Evaluation never mutates the widget. The only cross-frame state a widget may
//! carry is an explicit accumulator advanced through [`Widget::advance`].

use serde::{Deserialize, Serialize};

use crate::animation::AnimationSpec;
use crate::param::{ParamInfo, ParamSet};
use crate::readout::Readout;
use crate::sample::{Sample, SampleSequence};
use crate::scene::Scene;
use crate::theme::ThemeTokens;

// =============================================================================
// Errors
// =============================================================================

/// Errors from widget parameter access, registry lookups and configuration
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetError {
    UnknownParam(String),
    UnknownWidget(String),
    UnknownOption { param: String, value: String },
    UnknownAction(String),
    Config(String),
    Storage(String),
}

impl std::fmt::Display for WidgetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetError::UnknownParam(id) => write!(f, "Unknown parameter: {}", id),
            WidgetError::UnknownWidget(id) => write!(f, "Unknown widget type: {}", id),
            WidgetError::UnknownOption { param, value } => {
                write!(f, "Unknown option '{}' for parameter {}", value, param)
            }
            WidgetError::UnknownAction(name) => write!(f, "Unknown action: {}", name),
            WidgetError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            WidgetError::Storage(msg) => write!(f, "Preference storage failed: {}", msg),
        }
    }
}

impl std::error::Error for WidgetError {}

// =============================================================================
// Frame
// =============================================================================

/// A named sample sequence within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub samples: SampleSequence,
}

impl Series {
    pub fn new(id: impl Into<String>, samples: SampleSequence) -> Self {
        Self {
            id: id.into(),
            samples,
        }
    }
}

/// What a marker denotes, which decides how it is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Operating point on a curve (bias point, current power)
    Point,
    /// Zero of a standing wave
    Node,
    /// Maximum of a standing wave
    Antinode,
    /// Full-height vertical line at `at.x`
    VerticalLine,
    /// Full-width horizontal line at `at.y`
    HorizontalLine,
}

/// A discrete annotation in world coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub at: Sample,
    pub kind: MarkerKind,
}

impl Marker {
    pub fn new(id: impl Into<String>, kind: MarkerKind, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            at: Sample::new(x, y),
            kind,
        }
    }
}

/// Everything a widget computed for one clock value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub clock: f64,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
    pub readouts: Vec<Readout>,
}

impl Frame {
    pub fn new(clock: f64) -> Self {
        Self {
            clock,
            ..Default::default()
        }
    }

    pub fn with_series(mut self, id: impl Into<String>, samples: SampleSequence) -> Self {
        self.series.push(Series::new(id, samples));
        self
    }

    pub fn push_series(&mut self, id: impl Into<String>, samples: SampleSequence) {
        self.series.push(Series::new(id, samples));
    }

    pub fn push_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn push_readout(&mut self, readout: Readout) {
        self.readouts.push(readout);
    }

    pub fn series(&self, id: &str) -> Option<&SampleSequence> {
        self.series.iter().find(|s| s.id == id).map(|s| &s.samples)
    }

    pub fn markers_of(&self, kind: MarkerKind) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.kind == kind)
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn readout(&self, key: &str) -> Option<&Readout> {
        self.readouts.iter().find(|r| r.key() == key)
    }

    /// State of a boolean readout; absent flags read as false
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.readout(key), Some(Readout::Flag { active: true, .. }))
    }

    /// Numeric readout value
    pub fn value(&self, key: &str) -> Option<f64> {
        match self.readout(key) {
            Some(Readout::Value { value, .. }) => Some(*value),
            _ => None,
        }
    }

    /// True when every series sample and marker is finite
    pub fn is_finite(&self) -> bool {
        self.series.iter().all(|s| s.samples.is_finite())
            && self.markers.iter().all(|m| m.at.is_finite())
    }
}

/// Side effects a widget action asks of the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionEffect {
    /// Reset the animation clock to zero
    pub restart_clock: bool,
    /// Start playback
    pub play: bool,
}

// =============================================================================
// Widget Trait
// =============================================================================

/// A parametric visualization
///
/// Implementors supply parameter storage, a pure evaluator and a renderer. The
/// remaining methods have defaults that route through the [`ParamSet`].
pub trait Widget {
    /// Registry identifier (e.g. "mzm_transfer")
    fn type_id(&self) -> &'static str;

    fn params(&self) -> &ParamSet;

    fn params_mut(&mut self) -> &mut ParamSet;

    /// Current value of a parameter
    fn param(&self, id: &str) -> Option<f64> {
        self.params().get(id)
    }

    /// Store a parameter, returning the clamped value actually kept
    fn set_param(&mut self, id: &str, value: f64) -> Result<f64, WidgetError> {
        self.params_mut().set(id, value)
    }

    /// Choose a selector option by label
    fn select(&mut self, id: &str, option: &str) -> Result<f64, WidgetError> {
        let index = self.params().option_index(id, option)?;
        self.set_param(id, index as f64)
    }

    /// Parameter descriptors with live values
    fn param_info(&self) -> Vec<ParamInfo> {
        self.params().info()
    }

    /// Clock behaviour for animated widgets; `None` for static plots
    fn animation(&self) -> Option<AnimationSpec> {
        None
    }

    fn is_animated(&self) -> bool {
        self.animation().is_some()
    }

    /// Compute series, markers and readouts for a clock value
    fn evaluate(&self, clock: f64) -> Frame;

    /// Draw a frame with the given color tokens
    fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene;

    /// Per-frame hook for accumulator state, called after the clock moves by `dt`
    fn advance(&mut self, _clock: f64, _dt: f64) {}

    /// Restore defaults and clear any accumulator
    fn reset(&mut self) {
        self.params_mut().reset();
    }

    /// Run a named one-shot command
    fn action(&mut self, name: &str) -> Result<ActionEffect, WidgetError> {
        Err(WidgetError::UnknownAction(name.to_string()))
    }

    /// Take one-shot readouts raised by parameter updates (mode hops)
    fn drain_events(&mut self) -> Vec<Readout> {
        Vec::new()
    }

    /// Names accepted by [`Widget::action`]
    fn actions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Formula shown beside the plot, in TeX notation
    fn caption(&self) -> Option<&'static str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamDef;
    use crate::transform::{Axis, ScreenTransform, Viewport};

    struct Ramp {
        params: ParamSet,
    }

    impl Ramp {
        fn new() -> Self {
            Self {
                params: ParamSet::new(vec![
                    ParamDef::new("slope", "Slope", 0.0, 2.0, 0.5, 1.0),
                    ParamDef::select("shape", "Shape", &["Line", "Square"]),
                ]),
            }
        }
    }

    impl Widget for Ramp {
        fn type_id(&self) -> &'static str {
            "ramp"
        }

        fn params(&self) -> &ParamSet {
            &self.params
        }

        fn params_mut(&mut self) -> &mut ParamSet {
            &mut self.params
        }

        fn evaluate(&self, clock: f64) -> Frame {
            let slope = self.params.at(0);
            Frame::new(clock).with_series(
                "ramp",
                SampleSequence::from_fn(0.0, 1.0, 11, |x| slope * x + clock),
            )
        }

        fn render(&self, frame: &Frame, tokens: &ThemeTokens) -> Scene {
            let t = ScreenTransform::new(
                Axis::linear(0.0, 1.0),
                Axis::linear(0.0, 3.0),
                Viewport::new(0.0, 0.0, 100.0, 100.0),
            );
            let mut scene = Scene::new(100.0, 100.0, tokens.background);
            if let Some(seq) = frame.series("ramp") {
                scene.trace(&t, seq, tokens.trace, 2.0);
            }
            scene
        }
    }

    #[test]
    fn test_default_param_routing() {
        let mut w = Ramp::new();
        assert_eq!(w.param("slope"), Some(1.0));
        assert_eq!(w.set_param("slope", 1.3).unwrap(), 1.5);
        assert!(matches!(
            w.set_param("nope", 0.0),
            Err(WidgetError::UnknownParam(_))
        ));
        w.reset();
        assert_eq!(w.param("slope"), Some(1.0));
    }

    #[test]
    fn test_select_routes_through_set_param() {
        let mut w = Ramp::new();
        assert_eq!(w.select("shape", "square").unwrap(), 1.0);
        assert!(w.select("slope", "x").is_err());
    }

    #[test]
    fn test_default_action_is_unknown() {
        let mut w = Ramp::new();
        assert_eq!(
            w.action("launch"),
            Err(WidgetError::UnknownAction("launch".into()))
        );
        assert!(!w.is_animated());
    }

    #[test]
    fn test_frame_lookup() {
        let w = Ramp::new();
        let frame = w.evaluate(0.5);
        assert_eq!(frame.series("ramp").map(|s| s.len()), Some(11));
        assert!(frame.series("missing").is_none());
        assert!(frame.is_finite());
        assert!(!frame.flag("lasing"));
        assert_eq!(frame, w.evaluate(0.5));
    }

    #[test]
    fn test_render_produces_trace() {
        let w = Ramp::new();
        let frame = w.evaluate(0.0);
        let scene = w.render(&frame, &ThemeTokens::dark());
        assert_eq!(scene.primitives.len(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = WidgetError::UnknownOption {
            param: "format".into(),
            value: "64-QAM".into(),
        };
        assert_eq!(err.to_string(), "Unknown option '64-QAM' for parameter format");
    }
}
