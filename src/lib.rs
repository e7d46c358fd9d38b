//! # Lumen: Parametric Laser-Physics Visualizations
//!
//! `lumen` builds the interactive plots of a laser-physics course: standing waves in
//! a resonator, gain against loss, modulator transfer curves, chirp, and the
//! Vernier tuning of a widely tunable laser. Every plot follows one pattern:
//!
//! - **Parameters** - a [`ParamSet`] of range-bound, step-snapped sliders
//! - **Evaluator** - a pure function from parameters and a clock to a [`Frame`]
//!   of sample sequences, markers and readouts
//! - **Renderer** - a function from a frame and [`ThemeTokens`] to a vector [`Scene`]
//! - **Animation** - an optional [`AnimationClock`] driven by a [`FrameScheduler`]
//!   that is cancelled when the widget unmounts
//!
//! ## Architecture
//!
//! - **Core** - parameters, samples, coordinate transforms and the scene graph
//! - **Widgets** - fifteen visualizations in four families (resonators, gain and
//!   loss, modulation, tunable lasers) plus the intro wave
//! - **Runtime** - the [`WidgetHost`], theme preference and readout observer
//! - **Browser** - with the `wasm` feature, canvas rendering, `requestAnimationFrame`
//!   scheduling and `localStorage`-backed theme persistence
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen::prelude::*;
//!
//! let registry = WidgetRegistry::new();
//! let mut host = WidgetHost::new(registry.instantiate("mzm_transfer").unwrap());
//!
//! // Quadrature bias: half the light gets through
//! host.set_param("bias_v", 2.0).unwrap();
//! let transmission = host.last_frame().value("transmission");
//!
//! // Draw it
//! let svg = host.scene().to_svg();
//! ```

pub mod animation;
pub mod config;
pub mod host;
pub mod param;
pub mod readout;
pub mod registry;
pub mod sample;
pub mod scene;
pub mod theme;
pub mod transform;
pub mod widget;
pub mod widgets;

#[cfg(feature = "wasm")]
pub mod wasm;

/// Prelude module for convenient imports
pub mod prelude {
    // Core
    pub use crate::param::{ControlType, ParamDef, ParamInfo, ParamScale, ParamSet, ValueFormat};
    pub use crate::sample::{linspace, Sample, SampleSequence};
    pub use crate::scene::{Color, Primitive, Scene, Stroke, TextAnchor};
    pub use crate::transform::{to_db, Axis, AxisScale, Point, ScreenTransform, Viewport};

    // Widget contract
    pub use crate::widget::{ActionEffect, Frame, Marker, MarkerKind, Series, Widget, WidgetError};

    // Runtime
    pub use crate::animation::{
        AnimationClock, AnimationSpec, FrameHandle, FrameScheduler, ManualScheduler, PlaybackState,
    };
    pub use crate::config::LumenConfig;
    pub use crate::host::{MountedWidget, RedrawHook, WidgetHost};
    pub use crate::readout::{keys, ObserverConfig, Readout, ReadoutObserver};
    pub use crate::registry::{WidgetMetadata, WidgetRegistry};
    pub use crate::theme::{MemoryStore, PreferenceStore, Theme, ThemePreference, ThemeTokens};

    // Widgets
    pub use crate::widgets::{
        CavityMode, Chirp, Constellation, GainCurve, GainThreshold, IqWaveform, LightWave,
        Linewidth, ModeComb, ModulationResponse, MzmInterferometer, MzmTransfer, RoundTrip,
        TemperatureTuning, TunableLaser, Vernier,
    };
}

// Re-export key types at crate root for convenience
pub use prelude::*;
