//! Presentation Configuration
//!
//! Every heuristic a widget relies on (resonance and lasing thresholds, alignment
//! tolerances, iteration ceilings, tuning coefficients, clock steps and sample
//! counts) lives here as a named field with a documented default. Thresholds are
//! presentation choices, not derived physics.
//!
//! ```
//! use lumen::config::LumenConfig;
//!
//! let cfg = LumenConfig::from_json(r#"{ "vernier": { "tolerance": 3.0 } }"#).unwrap();
//! assert_eq!(cfg.vernier.tolerance, 3.0);
//! assert_eq!(cfg.vernier.peaks, 8);
//! ```

use serde::{Deserialize, Serialize};

use crate::widget::WidgetError;

/// Complete configuration, one section per widget family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenConfig {
    pub cavity_mode: CavityModeConfig,
    pub round_trip: RoundTripConfig,
    pub mode_comb: ModeCombConfig,
    pub gain_curve: GainCurveConfig,
    pub gain_threshold: GainThresholdConfig,
    pub linewidth: LinewidthConfig,
    pub mzm: MzmConfig,
    pub iq: IqConfig,
    pub constellation: ConstellationConfig,
    pub chirp: ChirpConfig,
    pub modulation_response: ModulationResponseConfig,
    pub thermal: ThermalConfig,
    pub vernier: VernierConfig,
    pub tunable: TunableConfig,
    pub light_wave: LightWaveConfig,
}

impl LumenConfig {
    /// Parse from JSON; absent sections and fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, WidgetError> {
        serde_json::from_str(json).map_err(|e| WidgetError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, WidgetError> {
        serde_json::to_string_pretty(self).map_err(|e| WidgetError::Config(e.to_string()))
    }
}

// =============================================================================
// Resonators
// =============================================================================

/// Standing-wave cavity animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavityModeConfig {
    pub samples: usize,
    /// Clock increment per displayed frame (radians of oscillation)
    pub clock_step: f64,
    /// Peak displacement of the standing wave
    pub amplitude: f64,
}

impl Default for CavityModeConfig {
    fn default() -> Self {
        Self {
            samples: 101,
            clock_step: 0.05,
            amplitude: 30.0,
        }
    }
}

/// Round-trip interference build-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTripConfig {
    /// Mirror separation in the same units as the wavelength slider
    pub cavity_length: f64,
    /// Amplitude kept per reflection
    pub reflectivity: f64,
    /// Playback stops when the round-trip clock reaches this value
    pub max_round_trips: f64,
    /// Mean |E|² above which the cavity is reported resonant
    pub resonance_threshold: f64,
    pub samples: usize,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            cavity_length: 600.0,
            reflectivity: 0.92,
            max_round_trips: 50.0,
            resonance_threshold: 80.0,
            samples: 300,
        }
    }
}

/// Longitudinal mode comb of a semiconductor cavity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeCombConfig {
    /// Centre of the plotted window (THz)
    pub center_thz: f64,
    /// Full width of the plotted window (GHz)
    pub span_ghz: f64,
    /// Drawn FWHM of each mode line (GHz)
    pub line_width_ghz: f64,
    pub samples: usize,
}

impl Default for ModeCombConfig {
    fn default() -> Self {
        Self {
            center_thz: 193.4,
            span_ghz: 2000.0,
            line_width_ghz: 15.0,
            samples: 400,
        }
    }
}

// =============================================================================
// Gain and Loss
// =============================================================================

/// Pump-dependent gain bump against a flat loss line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainCurveConfig {
    pub samples: usize,
    /// Height of the loss line
    pub loss_level: f64,
    /// Pump above which the widget reports lasing
    pub lasing_pump: f64,
    /// Pump units per unit of peak gain
    pub pump_scale: f64,
    /// Gaussian width in sample units
    pub gain_width: f64,
}

impl Default for GainCurveConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            loss_level: 5.0,
            lasing_pump: 50.0,
            pump_scale: 10.0,
            gain_width: 20.0,
        }
    }
}

/// Lorentzian gain versus cavity threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainThresholdConfig {
    pub samples: usize,
    /// Half-width of the detuning axis (THz)
    pub detuning_span_thz: f64,
    /// Top of the gain axis (cm⁻¹)
    pub gain_axis_max: f64,
}

impl Default for GainThresholdConfig {
    fn default() -> Self {
        Self {
            samples: 300,
            detuning_span_thz: 12.0,
            gain_axis_max: 120.0,
        }
    }
}

/// Schawlow–Townes linewidth sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinewidthConfig {
    pub samples: usize,
    /// Optical frequency (THz)
    pub optical_thz: f64,
    /// Log axis limits (kHz)
    pub axis_min_khz: f64,
    pub axis_max_khz: f64,
}

impl Default for LinewidthConfig {
    fn default() -> Self {
        Self {
            samples: 200,
            optical_thz: 193.4,
            axis_min_khz: 1e-3,
            axis_max_khz: 1e6,
        }
    }
}

// =============================================================================
// Modulation
// =============================================================================

/// Mach–Zehnder transfer curve and interferometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MzmConfig {
    pub samples: usize,
    /// Samples per arm in the interferometer view
    pub arm_samples: usize,
    /// Pixel displacement of the lower arm at 180°
    pub arm_offset: f64,
    /// Transmission below which the output reads as destructive
    pub null_threshold: f64,
}

impl Default for MzmConfig {
    fn default() -> Self {
        Self {
            samples: 600,
            arm_samples: 120,
            arm_offset: 40.0,
            null_threshold: 0.01,
        }
    }
}

/// I/Q drive waveforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IqConfig {
    pub samples: usize,
    pub clock_step: f64,
    /// Phase swept across the plot width (radians)
    pub window: f64,
}

impl Default for IqConfig {
    fn default() -> Self {
        Self {
            samples: 400,
            clock_step: 0.05,
            window: 4.0 * core::f64::consts::PI,
        }
    }
}

/// Constellation diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstellationConfig {
    /// Half-width of the plotted I/Q plane
    pub extent: f64,
    /// Phase error (radians) above which the quadrature is reported drifted
    pub drift_tolerance: f64,
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            extent: 2.0,
            drift_tolerance: 0.05,
        }
    }
}

/// Direct-modulation chirp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChirpConfig {
    pub samples: usize,
    /// Clock increment per displayed frame (ns)
    pub clock_step: f64,
    /// Modulation periods shown across the plot
    pub periods: f64,
    /// Samples in the carrier trace
    pub carrier_samples: usize,
    /// Carrier cycles drawn across the carrier trace
    pub carrier_cycles: f64,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            samples: 300,
            clock_step: 0.005,
            periods: 2.0,
            carrier_samples: 240,
            carrier_cycles: 6.0,
        }
    }
}

/// Small-signal modulation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulationResponseConfig {
    pub samples: usize,
    pub min_ghz: f64,
    pub max_ghz: f64,
    /// Floor and ceiling of the response axis (dB)
    pub floor_db: f64,
    pub ceiling_db: f64,
}

impl Default for ModulationResponseConfig {
    fn default() -> Self {
        Self {
            samples: 300,
            min_ghz: 0.1,
            max_ghz: 100.0,
            floor_db: -30.0,
            ceiling_db: 20.0,
        }
    }
}

// =============================================================================
// Tunable Lasers
// =============================================================================

/// Thermal tuning of a mode set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Mode frequencies at the reference temperature (THz)
    pub base_frequencies_thz: Vec<f64>,
    /// Frequency shift per kelvin (THz/°C)
    pub coefficient_thz_per_c: f64,
    pub reference_c: f64,
    /// Drawn cavity growth per kelvin (pixels/°C)
    pub expansion_per_c: f64,
    /// Samples of the cavity standing wave
    pub samples: usize,
    /// Drawn cavity length at the reference temperature
    pub cavity_length: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            base_frequencies_thz: vec![192.7, 192.9, 193.1, 193.3, 193.5, 193.7, 193.9],
            coefficient_thz_per_c: -0.013,
            reference_c: 25.0,
            expansion_per_c: 0.4,
            samples: 121,
            cavity_length: 300.0,
        }
    }
}

/// Two-comb Vernier alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VernierConfig {
    pub peaks: usize,
    pub spacing_a: f64,
    pub spacing_b: f64,
    /// Two peaks closer than this count as aligned
    pub tolerance: f64,
    /// Only the first this-many peaks of comb A are checked
    pub checked_peaks: usize,
}

impl Default for VernierConfig {
    fn default() -> Self {
        Self {
            peaks: 8,
            spacing_a: 60.0,
            spacing_b: 65.0,
            tolerance: 5.0,
            checked_peaks: 7,
        }
    }
}

/// Sampled-grating tunable laser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunableConfig {
    /// Centre of the tuning window (THz)
    pub center_thz: f64,
    /// Reflection comb spacings of the two mirrors (GHz)
    pub spacing_a_ghz: f64,
    pub spacing_b_ghz: f64,
    /// Comb shift per milliamp of mirror current (GHz/mA)
    pub mirror_tuning_ghz_per_ma: f64,
    /// Longitudinal cavity mode spacing (GHz)
    pub cavity_spacing_ghz: f64,
    /// Cavity mode shift per milliamp of phase current (GHz/mA)
    pub phase_tuning_ghz_per_ma: f64,
    /// FWHM of each reflection peak (GHz)
    pub peak_width_ghz: f64,
    /// Half-width of the plotted window (GHz)
    pub window_ghz: f64,
    pub samples: usize,
}

impl Default for TunableConfig {
    fn default() -> Self {
        Self {
            center_thz: 193.4,
            spacing_a_ghz: 700.0,
            spacing_b_ghz: 750.0,
            mirror_tuning_ghz_per_ma: 10.0,
            cavity_spacing_ghz: 45.0,
            phase_tuning_ghz_per_ma: 9.0,
            peak_width_ghz: 30.0,
            window_ghz: 6000.0,
            samples: 1200,
        }
    }
}

// =============================================================================
// Light Basics
// =============================================================================

/// Amplitude/frequency/phase intro traces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightWaveConfig {
    pub samples: usize,
    /// Vertical centre line of each trace
    pub baseline: f64,
    /// Fixed amplitude of the frequency and phase traces
    pub reference_amplitude: f64,
    /// Samples per cycle of the amplitude and phase traces
    pub period: f64,
}

impl Default for LightWaveConfig {
    fn default() -> Self {
        Self {
            samples: 60,
            baseline: 100.0,
            reference_amplitude: 40.0,
            period: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_hold_named_constants() {
        let cfg = LumenConfig::default();
        assert_eq!(cfg.round_trip.resonance_threshold, 80.0);
        assert_eq!(cfg.round_trip.reflectivity, 0.92);
        assert_eq!(cfg.round_trip.max_round_trips, 50.0);
        assert_eq!(cfg.vernier.tolerance, 5.0);
        assert_eq!(cfg.gain_curve.lasing_pump, 50.0);
        assert_eq!(cfg.thermal.coefficient_thz_per_c, -0.013);
        assert_eq!(cfg.thermal.base_frequencies_thz.len(), 7);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = LumenConfig::from_json(
            r#"{ "round_trip": { "resonance_threshold": 60.0 }, "mzm": { "samples": 200 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.round_trip.resonance_threshold, 60.0);
        assert_eq!(cfg.round_trip.cavity_length, 600.0);
        assert_eq!(cfg.mzm.samples, 200);
        assert_eq!(cfg.gain_curve, GainCurveConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = LumenConfig::default();
        let json = cfg.to_json().unwrap();
        assert_eq!(LumenConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = LumenConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, WidgetError::Config(_)));
    }
}
