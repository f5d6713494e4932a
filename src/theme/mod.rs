//! Light/dark theme selection, persistence, and root marker.
//!
//! DESIGN
//! ======
//! `ThemeController` ties two capabilities together: a [`KeyValueStore`]
//! holding the persisted mode under [`THEME_STORAGE_KEY`], and an optional
//! [`ThemeSurface`] that reports the color-scheme preference and carries the
//! root `dark` marker. A controller without a surface is a non-interactive
//! context: it still reads the store, but `apply` does nothing.
//!
//! Storage failures are logged and treated as "nothing stored".

#[cfg(feature = "browser")]
pub mod browser;
mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Exact match on the persisted literals; anything else is `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Mode after a toggle from `current`; unset toggles to dark.
    #[must_use]
    pub fn toggled(current: Option<Self>) -> Self {
        match current {
            Some(Self::Dark) => Self::Light,
            Some(Self::Light) | None => Self::Dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown theme mode `{0}` (expected `light` or `dark`)")]
pub struct ParseThemeModeError(String);

impl FromStr for ThemeMode {
    type Err = ParseThemeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseThemeModeError(s.to_owned()))
    }
}

/// Display host the theme is reflected onto.
pub trait ThemeSurface {
    /// Whether the host signals a dark color-scheme preference.
    fn prefers_dark(&self) -> bool;

    /// Add (`true`) or remove (`false`) the root `dark` marker.
    fn set_dark_marker(&self, dark: bool);
}

/// In-process surface for terminals and tests.
#[derive(Debug, Default)]
pub struct MemorySurface {
    prefers_dark: bool,
    dark: AtomicBool,
}

impl MemorySurface {
    #[must_use]
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            prefers_dark,
            dark: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.dark.load(Ordering::Relaxed)
    }
}

impl ThemeSurface for MemorySurface {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn set_dark_marker(&self, dark: bool) {
        self.dark.store(dark, Ordering::Relaxed);
    }
}

pub struct ThemeController<S, D> {
    store: S,
    surface: Option<D>,
}

impl<S: KeyValueStore, D: ThemeSurface> ThemeController<S, D> {
    pub fn new(store: S, surface: Option<D>) -> Self {
        Self { store, surface }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surface(&self) -> Option<&D> {
        self.surface.as_ref()
    }

    /// Persisted mode, if it is exactly `"light"` or `"dark"`.
    pub fn get_stored(&self) -> Option<ThemeMode> {
        match self.store.get_item(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => ThemeMode::parse(&raw),
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, "failed to read stored theme");
                None
            }
        }
    }

    pub fn get_preferred(&self) -> ThemeMode {
        if self.surface.as_ref().is_some_and(|surface| surface.prefers_dark()) {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    /// Set the root marker for `mode` and persist it. No-op without a surface.
    pub fn apply(&self, mode: ThemeMode) {
        let Some(surface) = &self.surface else {
            return;
        };
        surface.set_dark_marker(mode == ThemeMode::Dark);
        if let Err(error) = self.store.set_item(THEME_STORAGE_KEY, mode.as_str()) {
            tracing::warn!(%error, %mode, "failed to persist theme");
        }
        tracing::debug!(%mode, "theme applied");
    }

    /// Apply the stored mode, or the preferred one when nothing is stored.
    pub fn init(&self) -> ThemeMode {
        let mode = self.get_stored().unwrap_or_else(|| self.get_preferred());
        self.apply(mode);
        mode
    }

    pub fn toggle(&self, current: Option<ThemeMode>) -> ThemeMode {
        let next = ThemeMode::toggled(current);
        self.apply(next);
        next
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
