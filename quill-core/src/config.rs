//! # Quill Configuration
//!
//! A minimal string key/value store, the same shape as Feathers'
//! `app.set()` / `app.get()`. Applications layer defaults, then
//! environment overrides on top:
//!
//! ```rust
//! use quill_core::QuillConfig;
//!
//! let mut config = QuillConfig::new();
//! config.set("http.port", "3036");
//! config.set("blob.backend", "memory");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_usize("http.port"), Some(3036));
//! assert_eq!(snapshot.get_or("blob.folder", "blog"), "blog");
//! ```
//!
//! Environment variables use a prefix and double underscores as the
//! separator: `QUILL__BLOB__BUCKET=photos` becomes `blob.bucket`.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct QuillConfig {
    values: HashMap<String, String>,
}

impl QuillConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only when it has no value yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Overlay variables from the process environment.
    ///
    /// `QUILL__HTTP__PORT` with prefix `QUILL__` sets `http.port`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Overlay an explicit set of variables (same rules as `load_env`).
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if !normalized.is_empty() {
                    self.values.insert(normalized, value);
                }
            }
        }
    }

    pub fn snapshot(&self) -> QuillConfigSnapshot {
        QuillConfigSnapshot::new(self.values.clone())
    }
}

/// Immutable view of the configuration, handed to components at startup.
#[derive(Debug, Clone, Default)]
pub struct QuillConfigSnapshot {
    map: HashMap<String, String>,
}

impl QuillConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }
}
