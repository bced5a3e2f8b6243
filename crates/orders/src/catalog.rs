//! Collaborator interfaces consumed by the order engine.
//!
//! The catalog (presets, factory fabrics), the per-user design library, and the
//! user directory are owned by other parts of the system. In-memory versions are
//! provided for tests and local runs.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryFabric {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDesign {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub name: String,
    pub email: String,
}

/// Read-only catalog lookups.
pub trait Catalog: Send + Sync {
    fn preset(&self, preset_id: &str) -> Option<Preset>;
    fn factory_fabric(&self, fabric_id: &str) -> Option<FactoryFabric>;
    fn library_design(&self, user_id: UserId, design_id: &str) -> Option<LibraryDesign>;
}

/// Read-only user account lookups (used for notifications only).
pub trait UserDirectory: Send + Sync {
    fn user(&self, user_id: UserId) -> Option<UserContact>;
}

/// Catalog contents loaded at startup, keyed by preset and fabric id.
///
/// Library designs belong to individual users and are not seeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub presets: HashMap<String, Preset>,
    #[serde(default)]
    pub factory_fabrics: HashMap<String, FactoryFabric>,
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    presets: HashMap<String, Preset>,
    fabrics: HashMap<String, FactoryFabric>,
    designs: HashMap<(UserId, String), LibraryDesign>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preset(mut self, id: impl Into<String>, name: impl Into<String>, base_price: Decimal) -> Self {
        self.presets.insert(
            id.into(),
            Preset {
                name: name.into(),
                base_price,
            },
        );
        self
    }

    pub fn with_factory_fabric(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.fabrics.insert(id.into(), FactoryFabric { name: name.into() });
        self
    }

    pub fn with_library_design(mut self, user_id: UserId, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.designs
            .insert((user_id, id.into()), LibraryDesign { name: name.into() });
        self
    }
}

impl From<CatalogSeed> for InMemoryCatalog {
    fn from(seed: CatalogSeed) -> Self {
        Self {
            presets: seed.presets,
            fabrics: seed.factory_fabrics,
            designs: HashMap::new(),
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn preset(&self, preset_id: &str) -> Option<Preset> {
        self.presets.get(preset_id).cloned()
    }

    fn factory_fabric(&self, fabric_id: &str) -> Option<FactoryFabric> {
        self.fabrics.get(fabric_id).cloned()
    }

    fn library_design(&self, user_id: UserId, design_id: &str) -> Option<LibraryDesign> {
        self.designs.get(&(user_id, design_id.to_string())).cloned()
    }
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<UserId, UserContact>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.users.insert(
            user_id,
            UserContact {
                name: name.into(),
                email: email.into(),
            },
        );
        self
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn user(&self, user_id: UserId) -> Option<UserContact> {
        self.users.get(&user_id).cloned()
    }
}
