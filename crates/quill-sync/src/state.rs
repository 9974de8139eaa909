use std::sync::Arc;

use parking_lot::RwLock;
use quill_core::config::AppConfig;
use serde_json::{Map, Value};

use crate::extensions::ExtensionSet;
use crate::registry::SessionRegistry;

/// Process-wide client state, threaded explicitly through the dispatcher and
/// the boot sequencer. Locks are only held for synchronous mutations, never
/// across an await point.
#[derive(Debug, Default)]
pub struct AppState {
    pub config: RwLock<AppConfig>,
    pub sessions: RwLock<SessionRegistry>,
    pub extensions: RwLock<ExtensionSet>,
    /// In-memory mirror of the persistent key/value store.
    pub storage: RwLock<Map<String, Value>>,
    /// Locale strings for the configured language.
    pub languages: RwLock<Map<String, Value>>,
    pub emojis: RwLock<Vec<Value>>,
    pub user: RwLock<Option<Value>>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Cheap copy of the loaded extensions for emitting outside the lock.
    pub fn extensions_snapshot(&self) -> ExtensionSet {
        self.extensions.read().clone()
    }

    /// Look up a locale string.
    pub fn text(&self, key: &str) -> Option<String> {
        self.languages
            .read()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}
