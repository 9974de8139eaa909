use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use quill_core::errors::ExtensionError;
use quill_core::ids::ExtensionId;
use tracing::{info, warn};

/// Event every extension receives for each raw channel message.
pub const WS_MAIN_EVENT: &str = "ws-main";

/// Handle to a loaded extension.
pub trait Extension: Send + Sync {
    fn id(&self) -> &ExtensionId;
    /// Deliver an event on the extension's event bus.
    fn emit(&self, event: &str, detail: &serde_json::Value);
}

/// Loads extension code and returns live handles.
#[async_trait]
pub trait ExtensionLoader: Send + Sync {
    /// Extensions enabled for this workspace.
    async fn enabled(&self) -> Result<Vec<ExtensionId>, ExtensionError>;
    async fn load(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError>;
    async fn reload(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError>;
}

/// Loaded extensions by id.
#[derive(Clone, Default)]
pub struct ExtensionSet {
    entries: HashMap<ExtensionId, Arc<dyn Extension>>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an extension. Returns the handle it replaced.
    pub fn insert(&mut self, extension: Arc<dyn Extension>) -> Option<Arc<dyn Extension>> {
        self.entries.insert(extension.id().clone(), extension)
    }

    pub fn get(&self, id: &ExtensionId) -> Option<Arc<dyn Extension>> {
        self.entries.get(id).map(Arc::clone)
    }

    /// Loaded extension ids, sorted.
    pub fn names(&self) -> Vec<ExtensionId> {
        let mut names: Vec<ExtensionId> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit `event` on every loaded extension.
    pub fn broadcast(&self, event: &str, detail: &serde_json::Value) {
        for extension in self.entries.values() {
            extension.emit(event, detail);
        }
    }
}

impl std::fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Load every enabled extension concurrently. A failing extension is logged
/// and left out; the rest still load.
pub async fn load_all(loader: &dyn ExtensionLoader) -> ExtensionSet {
    let ids = match loader.enabled().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "could not list enabled extensions");
            return ExtensionSet::new();
        }
    };

    let results = join_all(ids.iter().map(|id| loader.load(id))).await;

    let mut set = ExtensionSet::new();
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(extension) => {
                set.insert(extension);
            }
            Err(e) => warn!(extension = %id, error = %e, "extension failed to load"),
        }
    }
    info!(loaded = set.len(), enabled = ids.len(), "extensions loaded");
    set
}
