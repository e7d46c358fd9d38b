//! Theme Tokens and Preference
//!
//! Widgets never hard-code colors; they read a [`ThemeTokens`] palette at render
//! time. The active [`Theme`] is a user preference persisted under the key
//! `"theme"` with the values `"dark"` or `"light"`, defaulting to dark.
//!
//! The preference is the only process-wide state in the crate. It is held in a
//! thread-local slot: the frame loop is single-threaded and browser storage
//! handles cannot cross threads. Call [`init`] once at startup, [`toggle`] from
//! the UI, and [`shutdown`] on teardown.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scene::Color;
use crate::widget::WidgetError;

/// Storage key of the persisted preference
pub const THEME_KEY: &str = "theme";

// =============================================================================
// Theme
// =============================================================================

/// Color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "wasm", derive(tsify::Tsify))]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a stored value; anything other than `"dark"`/`"light"` is `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_dark(&self) -> bool {
        *self == Theme::Dark
    }

    pub fn tokens(&self) -> ThemeTokens {
        ThemeTokens::for_theme(*self)
    }
}

/// Named colors widgets draw with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThemeTokens {
    pub background: Color,
    /// Cavity walls, mirrors and other static scenery
    pub panel: Color,
    pub grid: Color,
    pub axis: Color,
    pub text: Color,
    /// Secondary labels and reference curves
    pub muted: Color,
    /// Main plotted quantity
    pub trace: Color,
    /// Second plotted quantity (Q channel, comb B, backward wave)
    pub trace_alt: Color,
    /// Third plotted quantity
    pub trace_third: Color,
    /// Operating points and nodes
    pub marker: Color,
    pub accent: Color,
    /// Positive state (lasing, resonant, locked)
    pub highlight: Color,
    /// Loss lines and negative state
    pub warning: Color,
}

impl ThemeTokens {
    pub fn dark() -> Self {
        Self {
            background: Color::rgb(0x05, 0x05, 0x05),
            panel: Color::rgb(0x47, 0x55, 0x69),
            grid: Color::rgb(0x33, 0x33, 0x33),
            axis: Color::rgb(0x94, 0xa3, 0xb8),
            text: Color::rgb(0xd1, 0xd5, 0xdb),
            muted: Color::rgb(0x6b, 0x72, 0x80),
            trace: Color::rgb(0x74, 0xc0, 0xe3),
            trace_alt: Color::rgb(0xf9, 0x73, 0x16),
            trace_third: Color::rgb(0x3b, 0x82, 0xf6),
            marker: Color::rgb(0xff, 0xff, 0xff),
            accent: Color::rgb(0xf4, 0x3f, 0x5e),
            highlight: Color::rgb(0x10, 0xb9, 0x81),
            warning: Color::rgb(0xef, 0x44, 0x44),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::rgb(0xff, 0xff, 0xff),
            panel: Color::rgb(0x94, 0xa3, 0xb8),
            grid: Color::rgb(0xe5, 0xe7, 0xeb),
            axis: Color::rgb(0x47, 0x55, 0x69),
            text: Color::rgb(0x1f, 0x29, 0x37),
            muted: Color::rgb(0x9c, 0xa3, 0xaf),
            trace: Color::rgb(0x02, 0x84, 0xc7),
            trace_alt: Color::rgb(0xea, 0x58, 0x0c),
            trace_third: Color::rgb(0x25, 0x63, 0xeb),
            marker: Color::rgb(0x11, 0x18, 0x27),
            accent: Color::rgb(0xe1, 0x1d, 0x48),
            highlight: Color::rgb(0x05, 0x96, 0x69),
            warning: Color::rgb(0xdc, 0x26, 0x26),
        }
    }

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

impl Default for ThemeTokens {
    fn default() -> Self {
        Self::dark()
    }
}

// =============================================================================
// Preference Storage
// =============================================================================

/// Key/value persistence backing the theme preference
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, WidgetError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), WidgetError>;
}

/// In-memory store for native use and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), WidgetError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The active theme bound to its backing store
pub struct ThemePreference {
    theme: Theme,
    store: Box<dyn PreferenceStore>,
}

impl ThemePreference {
    /// Read the stored preference, falling back to dark, and write it back
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
                log::warn!("ignoring stored theme {:?}, using dark", value);
                Theme::Dark
            }),
            Ok(None) => Theme::Dark,
            Err(e) => {
                log::warn!("theme preference unreadable ({}), using dark", e);
                Theme::Dark
            }
        };
        let mut pref = Self { theme, store };
        pref.persist();
        pref
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch theme and persist; returns the new theme
    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled())
    }

    pub fn set(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        log::debug!("theme set to {}", theme.as_str());
        self.persist();
        theme
    }

    /// Read back what the store currently holds
    pub fn stored(&self) -> Option<String> {
        self.store.get(THEME_KEY).ok().flatten()
    }

    fn persist(&mut self) {
        // the in-memory theme stays authoritative when the store refuses a write
        if let Err(e) = self.store.set(THEME_KEY, self.theme.as_str()) {
            log::warn!("could not persist theme: {}", e);
        }
    }
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Process-wide Preference
// =============================================================================

thread_local! {
    static PREFERENCE: RefCell<Option<ThemePreference>> = const { RefCell::new(None) };
}

/// Load the preference from `store` and make it current
pub fn init(store: Box<dyn PreferenceStore>) -> Theme {
    let pref = ThemePreference::load(store);
    let theme = pref.theme();
    PREFERENCE.with(|slot| *slot.borrow_mut() = Some(pref));
    log::debug!("theme preference initialised: {}", theme.as_str());
    theme
}

/// Active theme; dark before [`init`]
pub fn current() -> Theme {
    PREFERENCE.with(|slot| slot.borrow().as_ref().map(ThemePreference::theme))
        .unwrap_or_default()
}

/// Palette for the active theme
pub fn tokens() -> ThemeTokens {
    current().tokens()
}

/// Flip the active theme, persisting it. Before [`init`] an in-memory store is used.
pub fn toggle() -> Theme {
    PREFERENCE.with(|slot| {
        let mut slot = slot.borrow_mut();
        let pref = slot.get_or_insert_with(|| ThemePreference::load(Box::new(MemoryStore::new())));
        pref.toggle()
    })
}

/// Set the active theme explicitly
pub fn set(theme: Theme) -> Theme {
    PREFERENCE.with(|slot| {
        let mut slot = slot.borrow_mut();
        let pref = slot.get_or_insert_with(|| ThemePreference::load(Box::new(MemoryStore::new())));
        pref.set(theme)
    })
}

/// Drop the process-wide preference and its store
pub fn shutdown() {
    PREFERENCE.with(|slot| slot.borrow_mut().take());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Store that shares its map so tests can observe writes
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<HashMap<String, String>>>);

    impl PreferenceStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
            Ok(self.0.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), WidgetError> {
            self.0.borrow_mut().insert(key.into(), value.into());
            Ok(())
        }
    }

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, WidgetError> {
            Err(WidgetError::Storage("denied".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), WidgetError> {
            Err(WidgetError::Storage("denied".into()))
        }
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("solarized"), None);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_default_is_dark() {
        let pref = ThemePreference::load(Box::new(MemoryStore::new()));
        assert_eq!(pref.theme(), Theme::Dark);
        assert_eq!(pref.stored().as_deref(), Some("dark"));
    }

    #[test]
    fn test_load_stored_light() {
        let store = MemoryStore::new().with_value(THEME_KEY, "light");
        let pref = ThemePreference::load(Box::new(store));
        assert_eq!(pref.theme(), Theme::Light);
    }

    #[test]
    fn test_unknown_value_falls_back_to_dark() {
        let store = MemoryStore::new().with_value(THEME_KEY, "sepia");
        let pref = ThemePreference::load(Box::new(store));
        assert_eq!(pref.theme(), Theme::Dark);
        assert_eq!(pref.stored().as_deref(), Some("dark"));
    }

    #[test]
    fn test_unreadable_store_falls_back_to_dark() {
        let mut pref = ThemePreference::load(Box::new(BrokenStore));
        assert_eq!(pref.theme(), Theme::Dark);
        assert_eq!(pref.toggle(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let shared = SharedStore::default();
        let mut pref = ThemePreference::load(Box::new(shared.clone()));
        pref.toggle();
        assert_eq!(shared.0.borrow().get(THEME_KEY).map(String::as_str), Some("light"));
        pref.toggle();
        assert_eq!(shared.0.borrow().get(THEME_KEY).map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_process_wide_lifecycle() {
        shutdown();
        assert_eq!(current(), Theme::Dark);

        let shared = SharedStore::default();
        shared.0.borrow_mut().insert(THEME_KEY.into(), "light".into());
        assert_eq!(init(Box::new(shared.clone())), Theme::Light);
        assert_eq!(tokens(), ThemeTokens::light());

        assert_eq!(toggle(), Theme::Dark);
        assert_eq!(shared.0.borrow().get(THEME_KEY).map(String::as_str), Some("dark"));

        shutdown();
        assert_eq!(current(), Theme::Dark);
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(ThemeTokens::dark().background, ThemeTokens::light().background);
        assert_eq!(ThemeTokens::for_theme(Theme::Dark), ThemeTokens::dark());
    }
}
