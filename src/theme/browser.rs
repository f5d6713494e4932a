//! Browser theme host: `localStorage` plus the `<html>` element.
//!
//! Reads the color-scheme preference through `matchMedia` and toggles the
//! `dark` class on the document element. Requires a browser environment.

use super::{KeyValueStore, StorageError, ThemeSurface};

const DARK_CLASS: &str = "dark";
const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

/// The window's `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| StorageError::Unavailable("localStorage".to_owned()))
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable(format!("localStorage read of `{key}`")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|_| StorageError::Unavailable(format!("localStorage write of `{key}`")))
    }
}

/// The current document. Only constructible when a document exists.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSurface {
    _private: (),
}

impl DocumentSurface {
    /// `None` outside a browser (workers, server rendering, tests).
    #[must_use]
    pub fn detect() -> Option<Self> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(|_| Self { _private: () })
    }
}

impl ThemeSurface for DocumentSurface {
    fn prefers_dark(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.match_media(DARK_QUERY).ok().flatten())
            .map_or(false, |mq| mq.matches())
    }

    fn set_dark_marker(&self, dark: bool) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|doc| doc.document_element())
        {
            let class_list = el.class_list();
            if dark {
                let _ = class_list.add_1(DARK_CLASS);
            } else {
                let _ = class_list.remove_1(DARK_CLASS);
            }
        }
    }
}

/// Controller wired to the browser, or to no surface outside one.
#[must_use]
pub fn browser_controller() -> super::ThemeController<LocalStorage, DocumentSurface> {
    super::ThemeController::new(LocalStorage, DocumentSurface::detect())
}
