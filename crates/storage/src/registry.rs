//! Column family registry
//!
//! Column families are registered by name and receive dense ids in
//! creation order. Id 0 is always the `default` family.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = ColumnFamilyRegistry::new();
//! let documents = registry.create("documents");
//! assert_eq!(registry.get("documents"), Some(documents.clone()));
//! assert!(registry.contains(&documents));
//! ```

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use strata_core::ColumnFamily;

/// Name of the column family every engine starts with
pub const DEFAULT_COLUMN_FAMILY: &str = "default";

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: FxHashMap<String, ColumnFamily>,
    by_id: Vec<ColumnFamily>,
}

/// Registry of column families
#[derive(Debug)]
pub struct ColumnFamilyRegistry {
    inner: RwLock<RegistryInner>,
}

impl ColumnFamilyRegistry {
    /// Create a registry holding only the default column family
    pub fn new() -> Self {
        let registry = ColumnFamilyRegistry {
            inner: RwLock::new(RegistryInner::default()),
        };
        registry.create(DEFAULT_COLUMN_FAMILY);
        registry
    }

    /// Register `name`, returning the existing handle if already present
    pub fn create(&self, name: &str) -> ColumnFamily {
        let mut inner = self.inner.write();
        if let Some(cf) = inner.by_name.get(name) {
            return cf.clone();
        }
        let cf = ColumnFamily::new(inner.by_id.len() as u32, name);
        inner.by_name.insert(name.to_string(), cf.clone());
        inner.by_id.push(cf.clone());
        cf
    }

    /// Look a column family up by name
    pub fn get(&self, name: &str) -> Option<ColumnFamily> {
        self.inner.read().by_name.get(name).cloned()
    }

    /// Whether `cf` was issued by this registry
    pub fn contains(&self, cf: &ColumnFamily) -> bool {
        self.inner
            .read()
            .by_id
            .get(cf.id() as usize)
            .map_or(false, |known| known.name() == cf.name())
    }

    /// The default column family
    pub fn default_family(&self) -> ColumnFamily {
        self.inner.read().by_id[0].clone()
    }

    /// All registered column families in id order
    pub fn list(&self) -> Vec<ColumnFamily> {
        self.inner.read().by_id.clone()
    }
}

impl Default for ColumnFamilyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
