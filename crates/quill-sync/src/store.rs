use quill_store::{LocalStore, StoreError};
use serde_json::{Map, Value};

/// Persistent key/value seam used by the dispatcher and the boot restore.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Map<String, Value>, StoreError>;
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        LocalStore::get(self, key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        LocalStore::set(self, key, value)
    }

    fn load_all(&self) -> Result<Map<String, Value>, StoreError> {
        LocalStore::load_all(self)
    }
}
