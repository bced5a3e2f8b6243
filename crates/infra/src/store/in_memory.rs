use std::sync::RwLock;

use printworks_core::Entity;

use super::r#trait::{Collection, StoreError};

/// In-memory collection.
///
/// Intended for tests/dev and for running without a data directory.
#[derive(Debug)]
pub struct InMemoryCollection<V> {
    name: String,
    records: RwLock<Vec<V>>,
}

impl<V> InMemoryCollection<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_records(name, Vec::new())
    }

    pub fn with_records(name: impl Into<String>, records: Vec<V>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }
}

impl<V> Collection<V> for InMemoryCollection<V>
where
    V: Entity + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Result<Vec<V>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned(self.name.clone()))?;
        Ok(records.clone())
    }

    fn modify(&self, apply: &mut dyn FnMut(&mut Vec<V>) -> bool) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned(self.name.clone()))?;

        let mut working = records.clone();
        if apply(&mut working) {
            *records = working;
        }
        Ok(())
    }
}
