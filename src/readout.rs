//! Readouts and Observer
//!
//! Discrete annotations derived from a frame: numeric values (threshold gain,
//! −3 dB bandwidth), boolean flags (lasing, resonant, aligned) and one-shot
//! events (mode hops). The [`ReadoutObserver`] collects them for a UI that polls,
//! keeping only the latest value per key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known readout keys
pub mod keys {
    pub const LASING: &str = "lasing";
    pub const RESONANT: &str = "resonant";
    pub const ALIGNED: &str = "aligned";
    pub const CONSTRUCTIVE: &str = "constructive";
    pub const MODE_HOP: &str = "mode_hop";
}

// =============================================================================
// Readout Values
// =============================================================================

/// One derived annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[cfg_attr(feature = "wasm", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Readout {
    /// Numeric quantity shown next to the plot
    Value {
        key: String,
        label: String,
        value: f64,
        unit: Option<String>,
    },

    /// On/off state (lasing, resonant, locked)
    Flag {
        key: String,
        label: String,
        active: bool,
    },

    /// Something that happened once, such as a mode hop
    Event {
        key: String,
        label: String,
        detail: String,
    },
}

impl Readout {
    pub fn value(key: &str, label: &str, value: f64, unit: Option<&str>) -> Self {
        Readout::Value {
            key: key.to_string(),
            label: label.to_string(),
            value,
            unit: unit.map(str::to_string),
        }
    }

    pub fn flag(key: &str, label: &str, active: bool) -> Self {
        Readout::Flag {
            key: key.to_string(),
            label: label.to_string(),
            active,
        }
    }

    pub fn event(key: &str, label: &str, detail: impl Into<String>) -> Self {
        Readout::Event {
            key: key.to_string(),
            label: label.to_string(),
            detail: detail.into(),
        }
    }

    /// Key used for deduplication
    pub fn key(&self) -> &str {
        match self {
            Readout::Value { key, .. } | Readout::Flag { key, .. } | Readout::Event { key, .. } => {
                key
            }
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Readout::Event { .. })
    }

    /// Short human-readable form
    pub fn display(&self) -> String {
        match self {
            Readout::Value {
                label, value, unit, ..
            } => match unit {
                Some(unit) => format!("{}: {:.3} {}", label, value, unit),
                None => format!("{}: {:.3}", label, value),
            },
            Readout::Flag { label, active, .. } => {
                format!("{}: {}", label, if *active { "yes" } else { "no" })
            }
            Readout::Event { label, detail, .. } => format!("{}: {}", label, detail),
        }
    }
}

// =============================================================================
// Observer
// =============================================================================

/// Configuration for the readout observer
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Maximum pending readouts before the oldest are dropped (default: 256)
    pub max_pending: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self { max_pending: 256 }
    }
}

/// Collects readouts for subscribed keys
///
/// Values and flags replace any pending entry with the same key; events queue
/// up so that every hop is delivered.
#[derive(Debug, Default)]
pub struct ReadoutObserver {
    subscriptions: Vec<String>,
    pending: Vec<Readout>,
    latest: HashMap<String, Readout>,
    config: ObserverConfig,
}

impl ReadoutObserver {
    pub fn new() -> Self {
        Self::with_config(ObserverConfig::default())
    }

    pub fn with_config(config: ObserverConfig) -> Self {
        Self {
            subscriptions: Vec::new(),
            pending: Vec::new(),
            latest: HashMap::new(),
            config,
        }
    }

    /// Add subscriptions by key
    pub fn subscribe<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.subscriptions.contains(&key) {
                self.subscriptions.push(key);
            }
        }
    }

    pub fn unsubscribe(&mut self, keys: &[&str]) {
        self.subscriptions.retain(|s| !keys.contains(&s.as_str()));
    }

    pub fn clear_subscriptions(&mut self) {
        self.subscriptions.clear();
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn is_subscribed(&self, key: &str) -> bool {
        self.subscriptions.iter().any(|s| s == key)
    }

    /// Record a readout; returns true when it differs from the last one seen for its key
    pub fn push(&mut self, readout: Readout) -> bool {
        let key = readout.key().to_string();
        let changed = readout.is_event() || self.latest.get(&key) != Some(&readout);

        if self.is_subscribed(&key) && changed {
            if !readout.is_event() {
                self.pending.retain(|r| r.key() != key);
            }
            self.pending.push(readout.clone());

            while self.pending.len() > self.config.max_pending {
                self.pending.remove(0);
            }
        }

        self.latest.insert(key, readout);
        changed
    }

    /// Record every readout of a frame, returning the keys that changed
    pub fn collect(&mut self, readouts: &[Readout]) -> Vec<String> {
        readouts
            .iter()
            .filter(|r| self.push((*r).clone()))
            .map(|r| r.key().to_string())
            .collect()
    }

    /// Take all pending readouts
    pub fn drain(&mut self) -> Vec<Readout> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Readout] {
        &self.pending
    }

    /// Last readout seen for a key, subscribed or not
    pub fn latest(&self, key: &str) -> Option<&Readout> {
        self.latest.get(key)
    }

    /// Forget everything seen, keeping subscriptions
    pub fn reset(&mut self) {
        self.pending.clear();
        self.latest.clear();
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readout_key() {
        assert_eq!(Readout::flag(keys::LASING, "Lasing", true).key(), "lasing");
        assert_eq!(
            Readout::value("threshold", "Threshold", 49.0, Some("cm⁻¹")).key(),
            "threshold"
        );
    }

    #[test]
    fn test_unsubscribed_not_queued() {
        let mut obs = ReadoutObserver::new();
        obs.push(Readout::flag(keys::LASING, "Lasing", true));
        assert!(obs.pending().is_empty());
        assert!(obs.latest(keys::LASING).is_some());
    }

    #[test]
    fn test_dedup_keeps_latest() {
        let mut obs = ReadoutObserver::new();
        obs.subscribe([keys::LASING]);
        obs.push(Readout::flag(keys::LASING, "Lasing", false));
        obs.push(Readout::flag(keys::LASING, "Lasing", true));
        let drained = obs.drain();
        assert_eq!(drained, vec![Readout::flag(keys::LASING, "Lasing", true)]);
        assert!(obs.pending().is_empty());
    }

    #[test]
    fn test_unchanged_value_not_requeued() {
        let mut obs = ReadoutObserver::new();
        obs.subscribe([keys::RESONANT]);
        assert!(obs.push(Readout::flag(keys::RESONANT, "Resonant", true)));
        obs.drain();
        assert!(!obs.push(Readout::flag(keys::RESONANT, "Resonant", true)));
        assert!(obs.pending().is_empty());
    }

    #[test]
    fn test_events_accumulate() {
        let mut obs = ReadoutObserver::new();
        obs.subscribe([keys::MODE_HOP]);
        obs.push(Readout::event(keys::MODE_HOP, "Mode hop", "supermode 0 → 1"));
        obs.push(Readout::event(keys::MODE_HOP, "Mode hop", "supermode 1 → 2"));
        assert_eq!(obs.pending().len(), 2);
    }

    #[test]
    fn test_max_pending_drops_oldest() {
        let mut obs = ReadoutObserver::with_config(ObserverConfig { max_pending: 2 });
        obs.subscribe([keys::MODE_HOP]);
        for i in 0..4 {
            obs.push(Readout::event(keys::MODE_HOP, "Mode hop", format!("{}", i)));
        }
        let drained = obs.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Readout::event(keys::MODE_HOP, "Mode hop", "2"));
    }

    #[test]
    fn test_collect_reports_changes() {
        let mut obs = ReadoutObserver::new();
        let frame = vec![
            Readout::flag(keys::LASING, "Lasing", true),
            Readout::value("gain", "Gain", 3.0, None),
        ];
        assert_eq!(obs.collect(&frame).len(), 2);
        assert!(obs.collect(&frame).is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut obs = ReadoutObserver::new();
        obs.subscribe(["a", "b"]);
        obs.unsubscribe(&["a"]);
        assert!(!obs.is_subscribed("a"));
        assert!(obs.is_subscribed("b"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Readout::flag(keys::ALIGNED, "Aligned", false).display(),
            "Aligned: no"
        );
        assert_eq!(
            Readout::value("bw", "Bandwidth", 15.5, Some("GHz")).display(),
            "Bandwidth: 15.500 GHz"
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&Readout::flag("lasing", "Lasing", true)).unwrap();
        assert!(json.contains("\"type\":\"flag\""));
    }
}
