use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use printworks_core::Entity;

/// Storage-layer failure.
///
/// These are infrastructure errors (disk, encoding, locking) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collection file exists but does not parse.
    #[error("collection '{collection}' is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("failed to serialize collection '{collection}': {reason}")]
    Serialize { collection: String, reason: String },

    #[error("lock poisoned for collection '{0}'")]
    LockPoisoned(String),
}

/// An ordered collection of entities, read and written as a whole.
///
/// Records keep insertion order; services rely on it for tie-breaking (pricing
/// rules) and stable listings.
///
/// ## Write semantics
///
/// `modify` hands the closure a copy of the records. The copy is persisted and
/// swapped in only when the closure returns `true`; returning `false` discards
/// it. A failed write leaves the previous state in place. Each call is
/// therefore all-or-nothing, however many records it touches.
pub trait Collection<V>: Send + Sync
where
    V: Entity + Clone,
{
    /// Collection name (also the file stem for file-backed stores).
    fn name(&self) -> &str;

    /// All records in insertion order.
    fn snapshot(&self) -> Result<Vec<V>, StoreError>;

    /// Read-modify-write under the collection's write lock.
    fn modify(&self, apply: &mut dyn FnMut(&mut Vec<V>) -> bool) -> Result<(), StoreError>;

    fn get(&self, id: &V::Id) -> Result<Option<V>, StoreError> {
        Ok(self.snapshot()?.into_iter().find(|v| v.id() == id))
    }

    fn insert(&self, value: V) -> Result<(), StoreError> {
        let mut value = Some(value);
        self.modify(&mut |records| match value.take() {
            Some(v) => {
                records.push(v);
                true
            }
            None => false,
        })
    }

    /// Replace the record with the same id in place, or append it.
    fn upsert(&self, value: V) -> Result<(), StoreError> {
        let mut value = Some(value);
        self.modify(&mut |records| {
            let Some(v) = value.take() else {
                return false;
            };
            match records.iter_mut().find(|r| r.id() == v.id()) {
                Some(slot) => *slot = v,
                None => records.push(v),
            }
            true
        })
    }

    /// Remove by id, returning the removed record.
    fn remove(&self, id: &V::Id) -> Result<Option<V>, StoreError> {
        let mut removed = None;
        self.modify(&mut |records| match records.iter().position(|r| r.id() == id) {
            Some(idx) => {
                removed = Some(records.remove(idx));
                true
            }
            None => false,
        })?;
        Ok(removed)
    }
}

impl<V, S> Collection<V> for Arc<S>
where
    V: Entity + Clone,
    S: Collection<V> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn snapshot(&self) -> Result<Vec<V>, StoreError> {
        (**self).snapshot()
    }

    fn modify(&self, apply: &mut dyn FnMut(&mut Vec<V>) -> bool) -> Result<(), StoreError> {
        (**self).modify(apply)
    }
}
