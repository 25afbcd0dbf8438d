//! User preferences persisted between sessions.

use serde::{Deserialize, Serialize};

use crate::store::{StateStore, SETTINGS_KEY, THEME_KEY};

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Session preferences.
///
/// Serialized with camelCase keys to stay compatible with previously
/// written snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the chat backend.
    pub api_url: String,
    /// Play a notification sound when a reply completes.
    pub sound_enabled: bool,
    /// Keep the transcript scrolled to the newest message.
    pub auto_scroll: bool,
    /// Color theme.
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            sound_enabled: true,
            auto_scroll: true,
            theme: Theme::default(),
        }
    }
}

impl Settings {
    /// Load settings from the store, falling back to defaults.
    ///
    /// A standalone theme preference written by [`save_theme`] overrides
    /// the theme inside the settings object.
    ///
    /// [`save_theme`]: Settings::save_theme
    pub fn load(store: &StateStore) -> Self {
        let mut settings: Settings = store.load(SETTINGS_KEY, Settings::default());
        if let Some(theme) = store.load::<Option<Theme>>(THEME_KEY, None) {
            settings.theme = theme;
        }
        settings
    }

    /// Persist the full settings object.
    pub fn save(&self, store: &StateStore) {
        store.save(SETTINGS_KEY, self);
    }

    /// Persist only the theme preference.
    pub fn save_theme(store: &StateStore, theme: Theme) {
        store.save(THEME_KEY, &theme);
    }
}
