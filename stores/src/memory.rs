//! In-process key/value store.

use async_trait::async_trait;
use errors::StoreError;
use parking_lot::RwLock;
use resolver::{Store, WriteStatus};
use std::collections::HashMap;

/// Map-backed store. Writable unless built with [`MemoryStore::read_only`].
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    values: RwLock<HashMap<String, String>>,
    writable: bool,
}

impl MemoryStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: RwLock::new(HashMap::new()),
            writable: true,
        }
    }

    pub fn read_only(name: &str) -> Self {
        Self {
            writable: false,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .write()
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn insert(&self, key: &str, raw: &str) -> Option<String> {
        self.values.write().insert(key.to_string(), raw.to_string())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_write(&self) -> bool {
        self.writable
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, raw: &str) -> Result<WriteStatus, StoreError> {
        if !self.writable {
            return Ok(WriteStatus::Unsupported);
        }
        self.insert(key, raw);
        Ok(WriteStatus::Written)
    }
}
