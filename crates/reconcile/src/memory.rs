//! In-memory catalog
//!
//! Holds a whole catalog project as a serializable snapshot and implements
//! every collaborator trait on top of it. Updates go through local replay,
//! so an action list the platform would refuse is refused here as well.

use crate::action::UpdateAction;
use crate::context::{ReferenceResolver, ResourceCreator, ResourceFetcher, ResourceUpdater};
use crate::error::CatalogError;
use crate::kinds::{
    CartDiscount, CartDiscounts, Categories, Category, Inventories, InventoryEntry, Product,
    Products,
};
use crate::reference::{ReferenceKind, ResolvedReferences};
use crate::replay::ApplyActions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A referenceable resource that is not itself synchronised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
    pub key: String,
}

impl ReferenceEntry {
    pub fn new(id: &str, key: &str) -> Self {
        Self {
            id: id.to_string(),
            key: key.to_string(),
        }
    }
}

/// Everything a catalog project holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub cart_discounts: Vec<CartDiscount>,
    pub inventory_entries: Vec<InventoryEntry>,
    pub product_types: Vec<ReferenceEntry>,
    pub tax_categories: Vec<ReferenceEntry>,
    pub channels: Vec<ReferenceEntry>,
    pub customer_groups: Vec<ReferenceEntry>,
    pub types: Vec<ReferenceEntry>,
    /// Last id counter handed out
    pub next_id: u64,
}

impl CatalogSnapshot {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Reference table for kinds that are not synchronised resources
    fn table(&self, kind: ReferenceKind) -> Option<&Vec<ReferenceEntry>> {
        match kind {
            ReferenceKind::ProductType => Some(&self.product_types),
            ReferenceKind::TaxCategory => Some(&self.tax_categories),
            ReferenceKind::Channel => Some(&self.channels),
            ReferenceKind::CustomerGroup => Some(&self.customer_groups),
            ReferenceKind::Type => Some(&self.types),
            ReferenceKind::Category => None,
        }
    }

    /// Number of resources of all kinds
    pub fn resource_count(&self) -> usize {
        self.products.len()
            + self.categories.len()
            + self.cart_discounts.len()
            + self.inventory_entries.len()
    }
}

/// Resource kinds stored in a `CatalogSnapshot`
pub trait StoredKind: ApplyActions {
    const ID_PREFIX: &'static str;

    fn collection(snapshot: &CatalogSnapshot) -> &Vec<Self::Resource>;

    fn collection_mut(snapshot: &mut CatalogSnapshot) -> &mut Vec<Self::Resource>;
}

impl StoredKind for Products {
    const ID_PREFIX: &'static str = "product";

    fn collection(snapshot: &CatalogSnapshot) -> &Vec<Product> {
        &snapshot.products
    }

    fn collection_mut(snapshot: &mut CatalogSnapshot) -> &mut Vec<Product> {
        &mut snapshot.products
    }
}

impl StoredKind for Categories {
    const ID_PREFIX: &'static str = "category";

    fn collection(snapshot: &CatalogSnapshot) -> &Vec<Category> {
        &snapshot.categories
    }

    fn collection_mut(snapshot: &mut CatalogSnapshot) -> &mut Vec<Category> {
        &mut snapshot.categories
    }
}

impl StoredKind for CartDiscounts {
    const ID_PREFIX: &'static str = "cart-discount";

    fn collection(snapshot: &CatalogSnapshot) -> &Vec<CartDiscount> {
        &snapshot.cart_discounts
    }

    fn collection_mut(snapshot: &mut CatalogSnapshot) -> &mut Vec<CartDiscount> {
        &mut snapshot.cart_discounts
    }
}

impl StoredKind for Inventories {
    const ID_PREFIX: &'static str = "inventory";

    fn collection(snapshot: &CatalogSnapshot) -> &Vec<InventoryEntry> {
        &snapshot.inventory_entries
    }

    fn collection_mut(snapshot: &mut CatalogSnapshot) -> &mut Vec<InventoryEntry> {
        &mut snapshot.inventory_entries
    }
}

/// Catalog held in memory behind a mutex
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    snapshot: Mutex<CatalogSnapshot>,
}

impl MemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.lock().clone()
    }

    pub fn into_snapshot(self) -> CatalogSnapshot {
        self.snapshot
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a stored resource by key
    pub fn get<K: StoredKind>(&self, key: &str) -> Option<K::Resource> {
        K::collection(&self.lock())
            .iter()
            .find(|r| K::resource_key(r) == key)
            .cloned()
    }
}

impl ReferenceResolver for MemoryCatalog {
    fn resolve(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, String>, CatalogError> {
        let snapshot = self.lock();
        let pairs: Vec<(&str, &str)> = match snapshot.table(kind) {
            Some(table) => table
                .iter()
                .map(|e| (e.key.as_str(), e.id.as_str()))
                .collect(),
            None => snapshot
                .categories
                .iter()
                .map(|c| (c.key.as_str(), c.id.as_str()))
                .collect(),
        };
        Ok(pairs
            .into_iter()
            .filter(|(key, _)| keys.iter().any(|k| k == key))
            .map(|(key, id)| (key.to_string(), id.to_string()))
            .collect())
    }

    fn create(&self, kind: ReferenceKind, key: &str) -> Result<String, CatalogError> {
        if !kind.supports_creation() {
            return Err(CatalogError::CreationUnsupported(kind.to_string()));
        }
        let mut snapshot = self.lock();
        if let Some(existing) = snapshot.channels.iter().find(|c| c.key == key) {
            return Ok(existing.id.clone());
        }
        let id = snapshot.allocate_id("channel");
        snapshot.channels.push(ReferenceEntry::new(&id, key));
        Ok(id)
    }
}

impl<K: StoredKind> ResourceFetcher<K> for MemoryCatalog {
    fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<K::Resource>, CatalogError> {
        Ok(K::collection(&self.lock())
            .iter()
            .filter(|r| keys.iter().any(|k| k == K::resource_key(r)))
            .cloned()
            .collect())
    }
}

impl<K: StoredKind> ResourceCreator<K> for MemoryCatalog {
    fn create(
        &self,
        draft: &K::Draft,
        references: &ResolvedReferences,
    ) -> Result<K::Resource, CatalogError> {
        let mut snapshot = self.lock();
        let key = K::draft_key(draft).unwrap_or_default();
        if K::collection(&snapshot)
            .iter()
            .any(|r| K::resource_key(r) == key)
        {
            return Err(CatalogError::Rejected(format!(
                "a resource with key '{key}' already exists"
            )));
        }

        let id = snapshot.allocate_id(K::ID_PREFIX);
        let resource = K::materialize(draft, references, id)
            .map_err(|e| CatalogError::Rejected(e.to_string()))?;
        K::collection_mut(&mut snapshot).push(resource.clone());
        Ok(resource)
    }
}

impl<K: StoredKind> ResourceUpdater<K> for MemoryCatalog {
    fn update(
        &self,
        id: &str,
        version: u64,
        actions: &[UpdateAction],
    ) -> Result<K::Resource, CatalogError> {
        let mut snapshot = self.lock();
        let stored = K::collection_mut(&mut snapshot)
            .iter_mut()
            .find(|r| K::resource_id(r) == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let actual = K::resource_version(stored);
        if actual != version {
            return Err(CatalogError::Conflict {
                expected: version,
                actual,
            });
        }

        let updated =
            K::replay(stored, actions).map_err(|e| CatalogError::Rejected(e.to_string()))?;
        *stored = updated.clone();
        Ok(updated)
    }
}
