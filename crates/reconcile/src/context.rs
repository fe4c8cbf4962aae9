//! Collaborator and callback traits
//!
//! These traits keep the engine independent of how the catalog is reached.
//! The engine only ever talks to a catalog through them; an HTTP client,
//! a file-backed snapshot and the in-memory catalog all plug in the same way.

use crate::action::UpdateAction;
use crate::error::CatalogError;
use crate::kind::ResourceKind;
use crate::reference::{ReferenceKind, ResolvedReferences};
use crate::statistics::SyncOutcome;
use std::collections::HashMap;

/// Resolves reference keys to platform ids
pub trait ReferenceResolver: Send + Sync {
    /// Look up many keys of one kind in a single call.
    ///
    /// Keys with no match are absent from the returned map.
    fn resolve(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, String>, CatalogError>;

    /// Create a referenced resource and return its id
    fn create(&self, kind: ReferenceKind, key: &str) -> Result<String, CatalogError>;
}

/// Fetches existing resources by business key
pub trait ResourceFetcher<K: ResourceKind>: Send + Sync {
    fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<K::Resource>, CatalogError>;
}

/// Creates a resource from a draft
pub trait ResourceCreator<K: ResourceKind>: Send + Sync {
    fn create(
        &self,
        draft: &K::Draft,
        references: &ResolvedReferences,
    ) -> Result<K::Resource, CatalogError>;
}

/// Applies an ordered action list to an existing resource
pub trait ResourceUpdater<K: ResourceKind>: Send + Sync {
    /// `version` must equal the stored version or the update fails with
    /// `CatalogError::Conflict`
    fn update(
        &self,
        id: &str,
        version: u64,
        actions: &[UpdateAction],
    ) -> Result<K::Resource, CatalogError>;
}

/// Everything the engine needs from a catalog for one resource kind
pub trait Catalog<K: ResourceKind>:
    ReferenceResolver + ResourceFetcher<K> + ResourceCreator<K> + ResourceUpdater<K>
{
}

impl<K, T> Catalog<K> for T
where
    K: ResourceKind,
    T: ReferenceResolver + ResourceFetcher<K> + ResourceCreator<K> + ResourceUpdater<K>,
{
}

/// Progress callback for sync runs
///
/// Called from worker threads; implementations must be cheap and must not
/// block.
pub trait ProgressCallback: Send + Sync {
    /// Called when a batch starts
    fn on_batch_start(&self, index: usize, size: usize);

    /// Called once per draft with its final outcome
    fn on_resource_complete(&self, key: &str, outcome: &SyncOutcome);

    /// Called when every draft of a batch has an outcome
    fn on_batch_complete(&self, index: usize);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&self, _index: usize, _size: usize) {}
    fn on_resource_complete(&self, _key: &str, _outcome: &SyncOutcome) {}
    fn on_batch_complete(&self, _index: usize) {}
}
