//! Configuration loading and representation.

use std::path::PathBuf;

use printworks_orders::{CatalogSeed, InMemoryCatalog};

use crate::store::StoreError;

pub const DATA_DIR_VAR: &str = "PRINTWORKS_DATA_DIR";
pub const BIND_ADDR_VAR: &str = "PRINTWORKS_BIND_ADDR";
pub const CATALOG_FILE_VAR: &str = "PRINTWORKS_CATALOG_FILE";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the JSON collection files; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub bind_addr: String,
    /// JSON [`CatalogSeed`] with presets and factory fabrics; `None` starts the catalog empty.
    pub catalog_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            catalog_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            data_dir: get(DATA_DIR_VAR).map(PathBuf::from),
            bind_addr: get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            catalog_file: get(CATALOG_FILE_VAR).map(PathBuf::from),
        }
    }

    /// Catalog seeded from `catalog_file`, or an empty one when none is configured.
    pub fn load_catalog(&self) -> Result<InMemoryCatalog, StoreError> {
        let Some(path) = &self.catalog_file else {
            tracing::warn!("no catalog file configured; presets and factory fabrics will not resolve");
            return Ok(InMemoryCatalog::new());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let seed: CatalogSeed = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            collection: "catalog".to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            presets = seed.presets.len(),
            factory_fabrics = seed.factory_fabrics.len(),
            "catalog loaded"
        );
        Ok(seed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), AppConfig::default());
    }

    #[test]
    fn reads_data_dir_and_bind_addr() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/var/lib/printworks"),
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
        ]));

        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/printworks")));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn blank_data_dir_means_in_memory() {
        let cfg = AppConfig::from_lookup(lookup(&[(DATA_DIR_VAR, "  ")]));
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn catalog_file_seeds_presets() {
        use printworks_orders::Catalog;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"presets": {"p-1": {"name": "Paisley", "base_price": "90"}}}"#,
        )
        .unwrap();
        let cfg = AppConfig::from_lookup(lookup(&[(CATALOG_FILE_VAR, path.to_str().unwrap())]));

        let catalog = cfg.load_catalog().unwrap();
        assert_eq!(catalog.preset("p-1").unwrap().name, "Paisley");
        assert!(catalog.factory_fabric("f-1").is_none());
    }

    #[test]
    fn without_catalog_file_the_catalog_is_empty() {
        use printworks_orders::Catalog;

        let catalog = AppConfig::default().load_catalog().unwrap();
        assert!(catalog.preset("p-1").is_none());
    }

    #[test]
    fn unreadable_or_malformed_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppConfig {
            catalog_file: Some(dir.path().join("absent.json")),
            ..AppConfig::default()
        };
        assert!(matches!(missing.load_catalog(), Err(StoreError::Io { .. })));

        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();
        let malformed = AppConfig {
            catalog_file: Some(path),
            ..AppConfig::default()
        };
        assert!(matches!(malformed.load_catalog(), Err(StoreError::Corrupt { .. })));
    }
}
