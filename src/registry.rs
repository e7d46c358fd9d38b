//! Widget Registry
//!
//! Maps type ids to factories so a page can mount a widget by name, and
//! exposes a serialisable catalog (name, category, route, parameters) for
//! building navigation and control panels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::LumenConfig;
use crate::param::ParamDef;
use crate::widget::{Widget, WidgetError};
use crate::widgets::{
    CavityMode, Chirp, Constellation, GainCurve, GainThreshold, IqWaveform, LightWave, Linewidth,
    ModeComb, ModulationResponse, MzmInterferometer, MzmTransfer, RoundTrip, TemperatureTuning,
    TunableLaser, Vernier,
};

/// Section headings of the site, in navigation order
pub mod categories {
    pub const BASICS: &str = "Basics";
    pub const RESONATORS: &str = "Resonators";
    pub const GAIN_LOSS: &str = "Gain & Loss";
    pub const MODULATION: &str = "Modulation";
    pub const TUNABLE: &str = "Tunable Lasers";
}

/// Widget factory function type
pub type WidgetFactory = Box<dyn Fn(&LumenConfig) -> Box<dyn Widget>>;

/// Metadata about a registered widget type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
pub struct WidgetMetadata {
    pub type_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Hash route of the page the widget is mounted on
    pub route: String,
    pub animated: bool,
    pub params: Vec<ParamDef>,
    pub actions: Vec<String>,
    pub caption: Option<String>,
}

/// Registry of available widget types for instantiation
pub struct WidgetRegistry {
    factories: HashMap<String, WidgetFactory>,
    metadata: HashMap<String, WidgetMetadata>,
    order: Vec<String>,
    config: LumenConfig,
}

impl WidgetRegistry {
    /// Registry with every built-in widget and default configuration
    pub fn new() -> Self {
        Self::with_config(LumenConfig::default())
    }

    pub fn with_config(config: LumenConfig) -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            metadata: HashMap::new(),
            order: Vec::new(),
            config,
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        use self::categories::*;

        self.register_factory(
            "light_wave",
            "Properties of Light",
            BASICS,
            "Amplitude, frequency and phase of a wave",
            "#/lasers/intro",
            |c| Box::new(LightWave::with_config(c.light_wave.clone())),
        );

        // Resonators
        self.register_factory(
            "cavity_mode",
            "Standing Wave Modes",
            RESONATORS,
            "Oscillating standing wave with nodes pinned at the mirrors",
            "#/lasers/resonators/modes",
            |c| Box::new(CavityMode::with_config(c.cavity_mode.clone())),
        );
        self.register_factory(
            "round_trip",
            "Round-Trip Interference",
            RESONATORS,
            "Partial waves building up, or cancelling, between two mirrors",
            "#/lasers/resonators/why-standing-waves",
            |c| Box::new(RoundTrip::with_config(c.round_trip.clone())),
        );
        self.register_factory(
            "mode_comb",
            "Longitudinal Mode Comb",
            RESONATORS,
            "Mode spacing of a semiconductor cavity",
            "#/lasers/resonators/semiconductor-cavities",
            |c| Box::new(ModeComb::with_config(c.mode_comb.clone())),
        );

        // Gain and loss
        self.register_factory(
            "gain_curve",
            "Gain vs Loss",
            GAIN_LOSS,
            "Pump-dependent gain spectrum against the cavity loss line",
            "#/lasers/gain-loss/frequency-gain",
            |c| Box::new(GainCurve::with_config(c.gain_curve.clone())),
        );
        self.register_factory(
            "gain_threshold",
            "Threshold Condition",
            GAIN_LOSS,
            "Lorentzian material gain against internal and mirror losses",
            "#/lasers/gain-loss/sources-of-loss",
            |c| Box::new(GainThreshold::with_config(c.gain_threshold.clone())),
        );
        self.register_factory(
            "linewidth",
            "Schawlow–Townes Linewidth",
            GAIN_LOSS,
            "Linewidth narrowing with output power and α-factor broadening",
            "#/lasers/gain-loss/schawlow-townes",
            |c| Box::new(Linewidth::with_config(c.linewidth.clone())),
        );

        // Modulation
        self.register_factory(
            "mzm_transfer",
            "MZM Transfer Curve",
            MODULATION,
            "cos² intensity transfer with a movable bias point",
            "#/lasers/modulation/mzm",
            |c| Box::new(MzmTransfer::with_config(c.mzm.clone())),
        );
        self.register_factory(
            "mzm_interferometer",
            "Mach–Zehnder Interferometer",
            MODULATION,
            "Arm phase difference turning the output on and off",
            "#/lasers/modulation/external",
            |c| Box::new(MzmInterferometer::with_config(c.mzm.clone())),
        );
        self.register_factory(
            "iq_waveform",
            "I/Q Waveforms",
            MODULATION,
            "In-phase and quadrature drive signals",
            "#/lasers/modulation/mzm",
            |c| Box::new(IqWaveform::with_config(c.iq.clone())),
        );
        self.register_factory(
            "constellation",
            "Constellation Diagram",
            MODULATION,
            "Symbol maps for common formats with quadrature bias drift",
            "#/lasers/modulation/mzm",
            |c| Box::new(Constellation::with_config(c.constellation.clone())),
        );
        self.register_factory(
            "chirp",
            "Frequency Chirp",
            MODULATION,
            "Transient and adiabatic chirp of a directly modulated laser",
            "#/lasers/modulation/chirp",
            |c| Box::new(Chirp::with_config(c.chirp.clone())),
        );
        self.register_factory(
            "modulation_response",
            "Modulation Bandwidth",
            MODULATION,
            "Small-signal response shaped by the relaxation oscillation",
            "#/lasers/modulation/bandwidth",
            |c| Box::new(ModulationResponse::with_config(c.modulation_response.clone())),
        );

        // Tunable lasers
        self.register_factory(
            "temperature_tuning",
            "Temperature Tuning",
            TUNABLE,
            "Mode set drifting with chip temperature",
            "#/lasers/tunable/thermal",
            |c| Box::new(TemperatureTuning::with_config(c.thermal.clone())),
        );
        self.register_factory(
            "vernier",
            "Vernier Effect",
            TUNABLE,
            "Two reflection combs selecting a single coincidence",
            "#/lasers/tunable/vernier",
            |c| Box::new(Vernier::with_config(c.vernier.clone())),
        );
        self.register_factory(
            "tunable_laser",
            "Sampled-Grating Tunable Laser",
            TUNABLE,
            "Mirror and phase currents with mode-hop detection",
            "#/lasers/tunable/cma-dma",
            |c| Box::new(TunableLaser::with_config(c.tunable.clone())),
        );
    }

    /// Register a widget factory with metadata
    pub fn register_factory<F>(
        &mut self,
        type_id: &str,
        name: &str,
        category: &str,
        description: &str,
        route: &str,
        factory: F,
    ) where
        F: Fn(&LumenConfig) -> Box<dyn Widget> + 'static,
    {
        // Parameter list and capabilities come from a temporary instance
        let template = factory(&self.config);
        let metadata = WidgetMetadata {
            type_id: type_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            route: route.to_string(),
            animated: template.is_animated(),
            params: template.params().defs().to_vec(),
            actions: template.actions().iter().map(|a| a.to_string()).collect(),
            caption: template.caption().map(str::to_string),
        };

        if self.factories.insert(type_id.to_string(), Box::new(factory)).is_none() {
            self.order.push(type_id.to_string());
        }
        self.metadata.insert(type_id.to_string(), metadata);
    }

    /// Instantiate a widget by type id
    pub fn instantiate(&self, type_id: &str) -> Result<Box<dyn Widget>, WidgetError> {
        self.factories
            .get(type_id)
            .map(|f| f(&self.config))
            .ok_or_else(|| WidgetError::UnknownWidget(type_id.to_string()))
    }

    /// All registered widget types, in registration order
    pub fn catalog(&self) -> impl Iterator<Item = &WidgetMetadata> {
        self.order.iter().filter_map(|id| self.metadata.get(id))
    }

    pub fn get_metadata(&self, type_id: &str) -> Option<&WidgetMetadata> {
        self.metadata.get(type_id)
    }

    /// Widgets in one category
    pub fn list_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a WidgetMetadata> {
        self.catalog().filter(move |m| m.category == category)
    }

    /// Widgets mounted on a route
    pub fn list_by_route<'a>(&'a self, route: &'a str) -> impl Iterator<Item = &'a WidgetMetadata> {
        self.catalog().filter(move |m| m.route == route)
    }

    /// Unique categories in navigation order
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = Vec::new();
        for meta in self.catalog() {
            if !cats.contains(&meta.category) {
                cats.push(meta.category.clone());
            }
        }
        cats
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn config(&self) -> &LumenConfig {
        &self.config
    }

    /// Catalog as JSON for a navigation builder
    pub fn catalog_json(&self) -> Result<String, WidgetError> {
        let catalog: Vec<&WidgetMetadata> = self.catalog().collect();
        serde_json::to_string(&catalog).map_err(|e| WidgetError::Config(e.to_string()))
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_every_widget() {
        let registry = WidgetRegistry::new();
        assert_eq!(registry.len(), 16);
        assert!(registry.get_metadata("tunable_laser").is_some());
    }

    #[test]
    fn test_registry_instantiate_all() {
        let registry = WidgetRegistry::new();
        for meta in registry.catalog() {
            let widget = registry.instantiate(&meta.type_id).unwrap();
            assert_eq!(widget.type_id(), meta.type_id);
        }
    }

    #[test]
    fn test_unknown_widget_is_error() {
        let registry = WidgetRegistry::new();
        assert_eq!(
            registry.instantiate("laser_cannon").err(),
            Some(WidgetError::UnknownWidget("laser_cannon".into()))
        );
    }

    #[test]
    fn test_categories_in_navigation_order() {
        let registry = WidgetRegistry::new();
        assert_eq!(
            registry.categories(),
            vec![
                categories::BASICS,
                categories::RESONATORS,
                categories::GAIN_LOSS,
                categories::MODULATION,
                categories::TUNABLE
            ]
        );
        assert_eq!(registry.list_by_category(categories::MODULATION).count(), 6);
    }

    #[test]
    fn test_metadata_reflects_capabilities() {
        let registry = WidgetRegistry::new();
        let round_trip = registry.get_metadata("round_trip").unwrap();
        assert!(round_trip.animated);
        assert_eq!(round_trip.actions, vec!["find_resonance".to_string()]);
        assert_eq!(round_trip.params.len(), 2);

        let vernier = registry.get_metadata("vernier").unwrap();
        assert!(!vernier.animated);
        assert!(vernier.route.starts_with("#/lasers/"));
    }

    #[test]
    fn test_routes_group_widgets() {
        let registry = WidgetRegistry::new();
        let mzm: Vec<_> = registry
            .list_by_route("#/lasers/modulation/mzm")
            .map(|m| m.type_id.as_str())
            .collect();
        assert_eq!(mzm, vec!["mzm_transfer", "iq_waveform", "constellation"]);
    }

    #[test]
    fn test_config_flows_into_instances() {
        let config = LumenConfig::from_json(r#"{ "mzm": { "samples": 50 } }"#).unwrap();
        let registry = WidgetRegistry::with_config(config);
        let widget = registry.instantiate("mzm_transfer").unwrap();
        assert_eq!(widget.evaluate(0.0).series("transfer").unwrap().len(), 50);
    }

    #[test]
    fn test_catalog_json() {
        let json = WidgetRegistry::new().catalog_json().unwrap();
        assert!(json.contains("\"type_id\":\"light_wave\""));
        assert!(json.contains("\"route\":\"#/lasers/tunable/vernier\""));
    }
}
