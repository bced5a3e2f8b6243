use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use printworks_core::Entity;

use super::r#trait::{Collection, StoreError};

/// Collection persisted as a JSON array at `<dir>/<name>.json`.
///
/// Records are cached in memory; every accepted modification rewrites the whole
/// file through a temporary file and a rename.
#[derive(Debug)]
pub struct JsonFileCollection<V> {
    name: String,
    path: PathBuf,
    records: RwLock<Vec<V>>,
}

impl<V> JsonFileCollection<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open (or start) the collection. A missing file is an empty collection;
    /// a file that does not parse is [`StoreError::Corrupt`].
    pub fn open(dir: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{name}.json"));

        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                collection: name.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(collection = %name, path = %path.display(), "opened json collection");
        Ok(Self {
            name,
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[V]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(records).map_err(|e| StoreError::Serialize {
            collection: self.name.clone(),
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl<V> Collection<V> for JsonFileCollection<V>
where
    V: Entity + Clone + Serialize + DeserializeOwned + Send + Sync,
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
        if !apply(&mut working) {
            return Ok(());
        }
        self.persist(&working)?;
        *records = working;
        Ok(())
    }
}
