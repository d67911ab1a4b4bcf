//! Key-value persistence seam.
//!
//! The shell backs this with `localStorage`; native tests inject
//! [`MemoryStore`]. Exactly two entries exist, both independent string keys,
//! and both read paths default gracefully when the entry is absent or
//! malformed.

use std::collections::HashMap;

/// Key for the persisted theme preference.
pub const THEME_KEY: &str = "theme";
/// Key for the persisted best index reached in game mode.
pub const HIGH_SCORE_KEY: &str = "highScore";

/// Minimal string-keyed store contract: `get` tolerates missing keys, `set`
/// overwrites unconditionally.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and non-browser embedders.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }
}

/// Read the persisted high score, treating a missing or non-numeric entry as 0.
pub fn load_high_score(store: &impl KvStore) -> usize {
    store
        .get(HIGH_SCORE_KEY)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// UI theme preference. Dark wherever a stored value is absent or unrecognized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn load(store: &impl KvStore) -> Self {
        Self::from_stored(store.get(THEME_KEY).as_deref())
    }

    /// Stored representation; round-trips through [`Theme::from_stored`].
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}
