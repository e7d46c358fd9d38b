//! Reactive Parameter Store
//!
//! Every widget owns a [`ParamSet`]: an ordered list of range-bound scalars, each
//! backed by a [`ParamDef`] describing its slider (minimum, maximum, step, default,
//! scale and display format). Values written through the set are clamped to the
//! declared range and snapped to the step, so an evaluator never sees an
//! out-of-range parameter.

use serde::{Deserialize, Serialize};

use crate::widget::WidgetError;

// =============================================================================
// Value Formatting
// =============================================================================

/// How to format parameter values for display next to a slider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ValueFormat {
    /// Decimal number with specified precision
    Decimal { places: u8 },
    /// Angle in degrees
    Degrees,
    /// Ratio shown as 0-100%
    Percent,
    /// Frequency in GHz, switching to THz above 1000 GHz
    Frequency,
    /// Index into the parameter's option labels
    Choice,
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::Decimal { places: 1 }
    }
}

impl ValueFormat {
    /// Format a value according to this format specification
    pub fn format(&self, value: f64, unit: Option<&str>, options: &[String]) -> String {
        let body = match self {
            ValueFormat::Decimal { places } => {
                format!("{:.prec$}", value, prec = *places as usize)
            }
            ValueFormat::Degrees => return format!("{:.0}°", value),
            ValueFormat::Percent => return format!("{:.0}%", value * 100.0),
            ValueFormat::Frequency => {
                if value >= 1000.0 {
                    return format!("{:.2} THz", value / 1000.0);
                }
                return format!("{:.1} GHz", value);
            }
            ValueFormat::Choice => {
                let index = value.round().max(0.0) as usize;
                return options
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", index));
            }
        };
        match unit {
            Some(unit) => format!("{} {}", body, unit),
            None => body,
        }
    }
}

// =============================================================================
// Slider Scale
// =============================================================================

/// How a slider's travel maps onto the parameter range
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case")]
pub enum ParamScale {
    /// Linear interpolation between min and max
    #[default]
    Linear,
    /// Logarithmic travel, for quantities spanning decades (power, frequency)
    Logarithmic,
}

impl ParamScale {
    /// Map a normalized (0-1) slider position to a parameter value
    pub fn apply(&self, normalized: f64, min: f64, max: f64) -> f64 {
        let n = normalized.clamp(0.0, 1.0);
        match self {
            ParamScale::Linear => min + n * (max - min),
            ParamScale::Logarithmic => {
                if min <= 0.0 {
                    // log travel needs a positive floor
                    n * max
                } else {
                    min * libm::pow(max / min, n)
                }
            }
        }
    }

    /// Map a parameter value back to a normalized (0-1) slider position
    pub fn normalize(&self, value: f64, min: f64, max: f64) -> f64 {
        if (max - min).abs() < 1e-12 {
            return 0.0;
        }
        match self {
            ParamScale::Linear => ((value - min) / (max - min)).clamp(0.0, 1.0),
            ParamScale::Logarithmic => {
                if min <= 0.0 || value <= 0.0 {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                } else {
                    (libm::log(value / min) / libm::log(max / min)).clamp(0.0, 1.0)
                }
            }
        }
    }
}

/// Suggested UI control for a parameter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    /// Range input
    #[default]
    Slider,
    /// On/off switch (0 or 1)
    Toggle,
    /// Segmented selector over `options`
    Select,
}

// =============================================================================
// Parameter Definition
// =============================================================================

/// Declaration of one user-adjustable scalar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct ParamDef {
    /// Identifier within the widget (e.g. "length", "bias_v")
    pub id: String,
    /// Display label
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Slider granularity; 0 means continuous
    pub step: f64,
    pub default: f64,
    pub scale: ParamScale,
    pub control: ControlType,
    /// Unit for display (mA, °C, V, ...)
    pub unit: Option<String>,
    pub format: ValueFormat,
    /// Labels for `ControlType::Select`
    pub options: Vec<String>,
}

impl ParamDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min,
            max,
            step,
            default,
            scale: ParamScale::Linear,
            control: ControlType::Slider,
            unit: None,
            format: ValueFormat::default(),
            options: Vec::new(),
        }
    }

    /// On/off parameter stored as 0.0 or 1.0
    pub fn toggle(id: impl Into<String>, name: impl Into<String>, on: bool) -> Self {
        let mut def = Self::new(id, name, 0.0, 1.0, 1.0, if on { 1.0 } else { 0.0 });
        def.control = ControlType::Toggle;
        def.format = ValueFormat::Decimal { places: 0 };
        def
    }

    /// Discrete selector; the value is the index of the chosen option
    pub fn select(id: impl Into<String>, name: impl Into<String>, options: &[&str]) -> Self {
        let max = options.len().saturating_sub(1) as f64;
        let mut def = Self::new(id, name, 0.0, max, 1.0, 0.0);
        def.control = ControlType::Select;
        def.format = ValueFormat::Choice;
        def.options = options.iter().map(|s| s.to_string()).collect();
        def
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = default;
        self
    }

    /// Clamp to `[min, max]` and snap to the nearest step above `min`.
    ///
    /// Non-finite input falls back to the default. The range ends are returned
    /// exactly.
    pub fn constrain(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 || clamped == self.min || clamped == self.max {
            return clamped;
        }
        let steps = libm::round((clamped - self.min) / self.step);
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    /// Clamp only, without step snapping
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }

    /// Slider position (0-1) for a value
    pub fn normalized(&self, value: f64) -> f64 {
        self.scale.normalize(value, self.min, self.max)
    }

    /// Value for a slider position (0-1), constrained to the step grid
    pub fn denormalize(&self, normalized: f64) -> f64 {
        self.constrain(self.scale.apply(normalized, self.min, self.max))
    }

    /// Format a value for display
    pub fn format_value(&self, value: f64) -> String {
        self.format
            .format(value, self.unit.as_deref(), &self.options)
    }
}

/// Snapshot of a parameter for UI binding (definition plus live value)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct ParamInfo {
    #[serde(flatten)]
    pub def: ParamDef,
    pub value: f64,
    pub display: String,
}

// =============================================================================
// Parameter Set
// =============================================================================

/// Per-instance parameter state
///
/// Values are addressed by position (widgets keep `const` indices) or by id
/// (the UI path). Both paths go through [`ParamDef::constrain`].
#[derive(Debug, Clone)]
pub struct ParamSet {
    defs: Vec<ParamDef>,
    values: Vec<f64>,
}

impl ParamSet {
    /// Create a set with every parameter at its default
    pub fn new(defs: Vec<ParamDef>) -> Self {
        let values = defs.iter().map(|d| d.constrain(d.default)).collect();
        Self { defs, values }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defs(&self) -> &[ParamDef] {
        &self.defs
    }

    pub fn def(&self, id: &str) -> Option<&ParamDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.defs.iter().position(|d| d.id == id)
    }

    /// Value at a known position
    pub fn at(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.index_of(id).map(|i| self.values[i])
    }

    /// Set by position, returning the stored (constrained) value
    pub fn set_at(&mut self, index: usize, value: f64) -> f64 {
        let v = self.defs[index].constrain(value);
        self.values[index] = v;
        v
    }

    /// Set by position, clamping to the range but keeping off-grid values.
    ///
    /// Used when a widget computes an exact value (e.g. a resonant wavelength).
    pub fn set_exact_at(&mut self, index: usize, value: f64) -> f64 {
        let v = self.defs[index].clamp(value);
        self.values[index] = v;
        v
    }

    /// Set by id, returning the stored (constrained) value
    pub fn set(&mut self, id: &str, value: f64) -> Result<f64, WidgetError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| WidgetError::UnknownParam(id.to_string()))?;
        Ok(self.set_at(index, value))
    }

    /// Index of a `Select` option by its label, ignoring ASCII case
    pub fn option_index(&self, id: &str, option: &str) -> Result<usize, WidgetError> {
        let def = self
            .def(id)
            .ok_or_else(|| WidgetError::UnknownParam(id.to_string()))?;
        def.options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(option))
            .ok_or_else(|| WidgetError::UnknownOption {
                param: id.to_string(),
                value: option.to_string(),
            })
    }

    /// Restore every parameter to its default
    pub fn reset(&mut self) {
        for (value, def) in self.values.iter_mut().zip(&self.defs) {
            *value = def.constrain(def.default);
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Definitions paired with live values for UI generation
    pub fn info(&self) -> Vec<ParamInfo> {
        self.defs
            .iter()
            .zip(&self.values)
            .map(|(def, &value)| ParamInfo {
                def: def.clone(),
                value,
                display: def.format_value(value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_set() -> ParamSet {
        ParamSet::new(vec![
            ParamDef::new("length", "Cavity Length", 10.0, 20.0, 1.0, 10.0),
            ParamDef::new("temperature", "Temperature", 0.0, 80.0, 0.1, 25.0).with_unit("°C"),
            ParamDef::select("format", "Format", &["NRZ", "BPSK", "QPSK"]),
        ])
    }

    #[test]
    fn test_defaults_on_creation() {
        let set = sample_set();
        assert_eq!(set.len(), 3);
        assert_eq!(set.at(0), 10.0);
        assert_relative_eq!(set.get("temperature").unwrap(), 25.0, epsilon = 1e-9);
        assert_eq!(set.get("format"), Some(0.0));
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut set = sample_set();
        assert_eq!(set.set("length", 50.0).unwrap(), 20.0);
        assert_eq!(set.set("length", -3.0).unwrap(), 10.0);
    }

    #[test]
    fn test_set_snaps_to_step() {
        let mut set = sample_set();
        assert_eq!(set.set("length", 13.4).unwrap(), 13.0);
        assert_eq!(set.set("length", 13.6).unwrap(), 14.0);
        assert_relative_eq!(set.set("temperature", 31.26).unwrap(), 31.3, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_falls_back_to_default() {
        let mut set = sample_set();
        set.set("length", 15.0).unwrap();
        assert_eq!(set.set("length", f64::NAN).unwrap(), 10.0);
        assert_eq!(set.set("length", f64::INFINITY).unwrap(), 10.0);
    }

    #[test]
    fn test_unknown_param_is_error() {
        let mut set = sample_set();
        let err = set.set("bogus", 1.0).unwrap_err();
        assert_eq!(err, WidgetError::UnknownParam("bogus".into()));
    }

    #[test]
    fn test_option_index_by_label() {
        let set = sample_set();
        assert_eq!(set.option_index("format", "qpsk").unwrap(), 2);
        assert!(matches!(
            set.option_index("format", "64-QAM"),
            Err(WidgetError::UnknownOption { .. })
        ));
        assert_eq!(
            set.option_index("modulation", "NRZ"),
            Err(WidgetError::UnknownParam("modulation".into()))
        );
    }

    #[test]
    fn test_set_exact_keeps_off_grid_value() {
        let mut set = sample_set();
        let v = set.set_exact_at(1, 31.2345);
        assert_relative_eq!(v, 31.2345);
        let v = set.set_exact_at(1, 120.0);
        assert_eq!(v, 80.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut set = sample_set();
        set.set("length", 18.0).unwrap();
        set.set("format", 1.0).unwrap();
        set.reset();
        assert_eq!(set.values(), &[10.0, 25.0, 0.0]);
    }

    #[test]
    fn test_scale_linear_roundtrip() {
        let def = ParamDef::new("pump", "Pump", 0.0, 100.0, 1.0, 50.0);
        assert_relative_eq!(def.normalized(25.0), 0.25);
        assert_eq!(def.denormalize(0.25), 25.0);
    }

    #[test]
    fn test_scale_logarithmic() {
        let def = ParamDef::new("power", "Power", 0.1, 100.0, 0.0, 10.0)
            .with_scale(ParamScale::Logarithmic);
        assert_relative_eq!(def.denormalize(0.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(def.denormalize(1.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(def.normalized(10.0), 2.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_format() {
        assert_eq!(ValueFormat::Decimal { places: 2 }.format(1.234, None, &[]), "1.23");
        assert_eq!(
            ValueFormat::Decimal { places: 1 }.format(25.0, Some("°C"), &[]),
            "25.0 °C"
        );
        assert_eq!(ValueFormat::Degrees.format(180.0, None, &[]), "180°");
        assert_eq!(ValueFormat::Percent.format(0.5, None, &[]), "50%");
        assert_eq!(ValueFormat::Frequency.format(12.5, None, &[]), "12.5 GHz");
        assert_eq!(ValueFormat::Frequency.format(193_100.0, None, &[]), "193.10 THz");
    }

    #[test]
    fn test_info_includes_display() {
        let mut set = sample_set();
        set.set("format", 1.0).unwrap();
        let info = set.info();
        assert_eq!(info[2].display, "BPSK");
        assert_eq!(info[1].display, "25.0 °C");
        let json = serde_json::to_string(&info[0]).unwrap();
        assert!(json.contains("\"id\":\"length\""));
        assert!(json.contains("\"value\":10.0"));
    }

    #[test]
    fn test_toggle_def() {
        let def = ParamDef::toggle("quadrature", "π/2 Shift", true);
        assert_eq!(def.default, 1.0);
        assert_eq!(def.control, ControlType::Toggle);
        assert_eq!(def.constrain(0.7), 1.0);
        assert_eq!(def.constrain(0.2), 0.0);
    }
}
