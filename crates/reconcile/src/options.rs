//! Sync options and caller callbacks

use crate::action::UpdateAction;
use crate::diff::RemovalPolicy;
use crate::error::SyncError;
use crate::kind::ResourceKind;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 30;
pub const DEFAULT_PARALLELISM: usize = 4;

/// Receives every per-resource failure with a rendered message
pub type ErrorCallback = Arc<dyn Fn(&str, &SyncError) + Send + Sync>;

/// Receives non-fatal problems, e.g. a variant without a key
pub type WarningCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// May rewrite a draft before creation; `None` skips the draft
pub type BeforeCreateCallback<D> = Arc<dyn Fn(&D) -> Option<D> + Send + Sync>;

/// May rewrite the ordered actions before an update; an empty list skips it
pub type BeforeUpdateCallback<D, R> =
    Arc<dyn Fn(Vec<UpdateAction>, &D, &R) -> Vec<UpdateAction> + Send + Sync>;

/// Immutable configuration of one sync run.
///
/// Callbacks run on worker threads. They must not panic and must not
/// block for long: a slow callback holds a worker for its whole duration.
pub struct SyncOptions<K: ResourceKind> {
    batch_size: usize,
    parallelism: usize,
    ensure_channels: bool,
    policy: RemovalPolicy,
    error_callback: ErrorCallback,
    warning_callback: WarningCallback,
    before_create: Option<BeforeCreateCallback<K::Draft>>,
    before_update: Option<BeforeUpdateCallback<K::Draft, K::Resource>>,
}

impl<K: ResourceKind> SyncOptions<K> {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallelism: DEFAULT_PARALLELISM,
            ensure_channels: false,
            policy: RemovalPolicy::default(),
            error_callback: Arc::new(|message: &str, _: &SyncError| log::error!("{message}")),
            warning_callback: Arc::new(|message: &str| log::warn!("{message}")),
            before_create: None,
            before_update: None,
        }
    }

    /// Set the batch size; zero is ignored and the previous value kept
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    /// Set the worker count; zero is ignored and the previous value kept
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        if parallelism > 0 {
            self.parallelism = parallelism;
        }
        self
    }

    /// Create channels that drafts reference but the catalog lacks
    pub fn with_ensure_channels(mut self, ensure_channels: bool) -> Self {
        self.ensure_channels = ensure_channels;
        self
    }

    pub fn with_policy(mut self, policy: RemovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_remove_other_locales(mut self, remove: bool) -> Self {
        self.policy.remove_other_locales = remove;
        self
    }

    pub fn with_remove_other_set_entries(mut self, remove: bool) -> Self {
        self.policy.remove_other_set_entries = remove;
        self
    }

    pub fn with_remove_other_collection_entries(mut self, remove: bool) -> Self {
        self.policy.remove_other_collection_entries = remove;
        self
    }

    pub fn with_remove_other_properties(mut self, remove: bool) -> Self {
        self.policy.remove_other_properties = remove;
        self
    }

    pub fn with_error_callback(
        mut self,
        callback: impl Fn(&str, &SyncError) + Send + Sync + 'static,
    ) -> Self {
        self.error_callback = Arc::new(callback);
        self
    }

    pub fn with_warning_callback(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.warning_callback = Arc::new(callback);
        self
    }

    pub fn with_before_create(
        mut self,
        callback: impl Fn(&K::Draft) -> Option<K::Draft> + Send + Sync + 'static,
    ) -> Self {
        self.before_create = Some(Arc::new(callback));
        self
    }

    pub fn with_before_update(
        mut self,
        callback: impl Fn(Vec<UpdateAction>, &K::Draft, &K::Resource) -> Vec<UpdateAction>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.before_update = Some(Arc::new(callback));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn ensure_channels(&self) -> bool {
        self.ensure_channels
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    pub(crate) fn report_error(&self, error: &SyncError) {
        (self.error_callback)(&error.to_string(), error);
    }

    pub(crate) fn report_warning(&self, message: &str) {
        (self.warning_callback)(message);
    }

    /// Run the before-create hook; drafts pass through unchanged without one
    pub(crate) fn before_create(&self, draft: &K::Draft) -> Option<K::Draft> {
        match &self.before_create {
            Some(callback) => callback(draft),
            None => Some(draft.clone()),
        }
    }

    pub(crate) fn before_update(
        &self,
        actions: Vec<UpdateAction>,
        draft: &K::Draft,
        existing: &K::Resource,
    ) -> Vec<UpdateAction> {
        match &self.before_update {
            Some(callback) => callback(actions, draft, existing),
            None => actions,
        }
    }
}

impl<K: ResourceKind> Default for SyncOptions<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> Clone for SyncOptions<K> {
    fn clone(&self) -> Self {
        Self {
            batch_size: self.batch_size,
            parallelism: self.parallelism,
            ensure_channels: self.ensure_channels,
            policy: self.policy,
            error_callback: Arc::clone(&self.error_callback),
            warning_callback: Arc::clone(&self.warning_callback),
            before_create: self.before_create.clone(),
            before_update: self.before_update.clone(),
        }
    }
}

impl<K: ResourceKind> fmt::Debug for SyncOptions<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("resource_kind", &K::NAME)
            .field("batch_size", &self.batch_size)
            .field("parallelism", &self.parallelism)
            .field("ensure_channels", &self.ensure_channels)
            .field("policy", &self.policy)
            .field("before_create", &self.before_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::Inventories;

    #[test]
    fn test_defaults() {
        let opts = SyncOptions::<Inventories>::default();
        assert_eq!(opts.batch_size(), 30);
        assert_eq!(opts.parallelism(), 4);
        assert!(!opts.ensure_channels());
        assert_eq!(opts.policy(), RemovalPolicy::default());
    }

    #[test]
    fn test_zero_values_are_ignored() {
        let opts = SyncOptions::<Inventories>::new()
            .with_batch_size(10)
            .with_batch_size(0)
            .with_parallelism(0);
        assert_eq!(opts.batch_size(), 10);
        assert_eq!(opts.parallelism(), 4);
    }

    #[test]
    fn test_removal_flags() {
        let opts = SyncOptions::<Inventories>::new()
            .with_remove_other_locales(false)
            .with_remove_other_properties(false);
        let policy = opts.policy();
        assert!(!policy.remove_other_locales);
        assert!(!policy.remove_other_properties);
        assert!(policy.remove_other_set_entries);
        assert!(policy.remove_other_collection_entries);
    }
}
