//! The seam between the engine and a concrete resource kind

use crate::action::UpdateAction;
use crate::diff::{DiffContext, DiffError};
use crate::reference::{ReferenceKey, ReferenceKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A kind of catalog resource the engine can reconcile
///
/// Implementors are marker types; drafts and resources are the associated
/// types. Everything here is a pure function so the engine can run it on
/// any worker thread.
pub trait ResourceKind: Send + Sync + 'static {
    type Draft: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;
    type Resource: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// Plural name used in reports, e.g. "cart discounts"
    const NAME: &'static str;

    /// Reference kind through which drafts of this kind point at each
    /// other, like a category's parent
    const SELF_REFERENCE: Option<ReferenceKind> = None;

    fn draft_key(draft: &Self::Draft) -> Option<&str>;

    fn resource_key(resource: &Self::Resource) -> &str;

    fn resource_id(resource: &Self::Resource) -> &str;

    fn resource_version(resource: &Self::Resource) -> u64;

    /// Every reference the draft makes by key
    fn references(draft: &Self::Draft) -> Vec<ReferenceKey>;

    /// Compute the ordered actions that turn `old` into `new`
    fn build_actions(
        old: &Self::Resource,
        new: &Self::Draft,
        ctx: &mut DiffContext<'_>,
    ) -> Result<Vec<UpdateAction>, DiffError>;
}
