//! Batch orchestration - validate, resolve, fetch, diff and apply
//!
//! Drafts are cut into batches of `batch_size` and batches run one after
//! another. Each batch resolves its references with one lookup per
//! reference kind and fetches its existing resources with one query, then
//! every draft of the batch is matched, diffed and applied on a rayon pool
//! of `parallelism` threads, so no more than that many collaborator calls
//! are ever in flight.
//!
//! Drafts that refer to other drafts of the same kind (category parents)
//! are moved behind them, and a batch holding both runs in levels: the
//! parents are created before the children resolve their references.

use crate::action::UpdateAction;
use crate::context::{
    Catalog, NoProgress, ProgressCallback, ReferenceResolver, ResourceCreator,
};
use crate::diff::{DiffContext, DiffError};
use crate::error::{CatalogError, SyncError, ValidationError};
use crate::kind::ResourceKind;
use crate::matcher::{self, Match};
use crate::options::SyncOptions;
use crate::reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
use crate::statistics::{SyncOutcome, SyncStatistics};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stops a running sync before its next batch
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a sync would do with one draft
pub enum PlanAction<K: ResourceKind> {
    Create(K::Draft),
    Update {
        existing: K::Resource,
        actions: Vec<UpdateAction>,
    },
    Unchanged,
    Fail(SyncError),
}

/// One entry of a dry run
pub struct PlannedChange<K: ResourceKind> {
    pub key: Option<String>,
    pub action: PlanAction<K>,
    pub warnings: Vec<String>,
}

impl<K: ResourceKind> PlannedChange<K> {
    fn failed(error: SyncError) -> Self {
        Self {
            key: error.key().map(str::to_string),
            action: PlanAction::Fail(error),
            warnings: Vec::new(),
        }
    }
}

/// Id recorded for a reference a dry run would create
fn placeholder_id(key: &str) -> String {
    format!("new:{key}")
}

/// References of one level of a batch
struct LevelReferences {
    resolved: ResolvedReferences,
    /// References `ensure_channels` tried and failed to create
    failed: BTreeMap<ReferenceKey, CatalogError>,
}

/// Reconciles drafts of one resource kind against a catalog
pub struct Syncer<'a, K: ResourceKind, C: Catalog<K>> {
    catalog: &'a C,
    options: SyncOptions<K>,
    progress: &'a dyn ProgressCallback,
    cancel: CancelHandle,
}

impl<'a, K: ResourceKind, C: Catalog<K>> Syncer<'a, K, C> {
    pub fn new(catalog: &'a C, options: SyncOptions<K>) -> Self {
        Self {
            catalog,
            options,
            progress: &NoProgress,
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Share an existing handle, e.g. one owned by a signal handler
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels this syncer's runs between batches
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn options(&self) -> &SyncOptions<K> {
        &self.options
    }

    /// Synchronise all drafts and return the run statistics.
    ///
    /// Never fails: every per-draft problem is recorded as a failure and
    /// reported through the error callback. Blocks until all started
    /// batches are done; batches not started before cancellation are not
    /// counted.
    pub fn sync(&self, drafts: Vec<K::Draft>) -> SyncStatistics {
        let stats = SyncStatistics::new(K::NAME);
        let (valid, failures) = matcher::validate::<K>(drafts);
        for failure in failures {
            let key = failure.key().unwrap_or_default().to_string();
            self.finish(&key, SyncOutcome::Failed(failure), &stats);
        }
        if valid.is_empty() {
            return stats;
        }

        let valid = matcher::parents_first::<K>(valid);
        let threads = self.options.parallelism().min(valid.len()).max(1);
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool,
            Err(e) => {
                let message = format!("failed to create thread pool: {e}");
                self.fail_all(&valid.iter().collect::<Vec<_>>(), &message, &stats);
                return stats;
            }
        };

        let batch_size = self.options.batch_size();
        log::debug!(
            "syncing {} {} in {} batches on {threads} threads",
            valid.len(),
            K::NAME,
            valid.len().div_ceil(batch_size)
        );

        pool.install(|| {
            for (index, batch) in valid.chunks(batch_size).enumerate() {
                if self.cancel.is_cancelled() {
                    log::debug!("run cancelled before batch {index}");
                    break;
                }
                self.sync_batch(index, batch, &stats);
            }
        });

        log::info!("{}", stats.report_message());
        stats
    }

    fn sync_batch(&self, index: usize, batch: &[K::Draft], stats: &SyncStatistics) {
        self.progress.on_batch_start(index, batch.len());
        log::debug!("batch {index}: {} drafts", batch.len());

        for level in matcher::dependency_levels::<K>(batch) {
            let drafts: Vec<&K::Draft> = level.into_iter().map(|i| &batch[i]).collect();
            self.sync_level(&drafts, stats);
        }

        self.progress.on_batch_complete(index);
    }

    /// Resolve, fetch and apply drafts that do not refer to each other
    fn sync_level(&self, drafts: &[&K::Draft], stats: &SyncStatistics) {
        let prepared = self
            .resolve_references(drafts, false)
            .and_then(|references| Ok((references, self.fetch_existing(drafts)?)));

        match prepared {
            Ok((references, existing)) => {
                drafts.par_iter().for_each(|draft| {
                    let key = K::draft_key(draft).unwrap_or_default();
                    let outcome = self.process(key, draft, &existing, &references);
                    self.finish(key, outcome, stats);
                });
            }
            Err(e) => {
                log::debug!("{} drafts failed before diffing: {e}", drafts.len());
                self.fail_all(drafts, &e.to_string(), stats);
            }
        }
    }

    /// Resolve every reference of the drafts, one lookup per reference kind.
    ///
    /// With `ensure_channels`, missing channels are created, or given a
    /// placeholder id when `dry_run` is set. A failed creation is kept so
    /// the drafts needing it fail with the catalog's error.
    fn resolve_references(
        &self,
        drafts: &[&K::Draft],
        dry_run: bool,
    ) -> Result<LevelReferences, CatalogError> {
        let mut wanted: BTreeMap<ReferenceKind, BTreeSet<String>> = BTreeMap::new();
        for reference in drafts.iter().flat_map(|d| K::references(d)) {
            wanted.entry(reference.kind).or_default().insert(reference.key);
        }

        let mut references = ResolvedReferences::new();
        let mut failed = BTreeMap::new();
        for (kind, keys) in wanted {
            let keys: Vec<String> = keys.into_iter().collect();
            let found = self.catalog.resolve(kind, &keys)?;
            for key in &keys {
                match found.get(key) {
                    Some(id) => references.insert(kind, key, id),
                    None if kind.supports_creation() && self.options.ensure_channels() => {
                        if dry_run {
                            references.insert(kind, key, &placeholder_id(key));
                            continue;
                        }
                        match ReferenceResolver::create(self.catalog, kind, key) {
                            Ok(id) => {
                                log::debug!("created missing {kind} '{key}'");
                                references.insert(kind, key, &id);
                            }
                            Err(e) => {
                                self.options
                                    .report_warning(&format!("failed to create {kind} '{key}': {e}"));
                                failed.insert(ReferenceKey::new(kind, key), e);
                            }
                        }
                    }
                    None => {}
                }
            }
        }
        Ok(LevelReferences {
            resolved: references,
            failed,
        })
    }

    /// Fetch the existing resources; the map is never mutated after
    fn fetch_existing(
        &self,
        drafts: &[&K::Draft],
    ) -> Result<HashMap<String, K::Resource>, CatalogError> {
        let keys: Vec<String> = drafts
            .iter()
            .filter_map(|d| K::draft_key(d))
            .map(str::to_string)
            .collect();
        let resources = self.catalog.fetch_by_keys(&keys)?;
        Ok(resources
            .into_iter()
            .map(|r| (K::resource_key(&r).to_string(), r))
            .collect())
    }

    fn process(
        &self,
        key: &str,
        draft: &K::Draft,
        existing: &HashMap<String, K::Resource>,
        references: &LevelReferences,
    ) -> SyncOutcome {
        if let Some(error) = K::references(draft)
            .iter()
            .find_map(|r| references.failed.get(r))
        {
            return SyncOutcome::Failed(SyncError::from_catalog(key, error.clone()));
        }

        let references = &references.resolved;
        match matcher::classify::<K>(draft, existing, references) {
            Match::Unresolvable(missing) => SyncOutcome::Failed(SyncError::Resolution {
                key: key.to_string(),
                missing,
            }),
            Match::New => self.create(key, draft, references),
            Match::Matched(resource) => self.update(key, draft, resource, references),
        }
    }

    fn create(&self, key: &str, draft: &K::Draft, references: &ResolvedReferences) -> SyncOutcome {
        let Some(draft) = self.options.before_create(draft) else {
            return SyncOutcome::Vetoed;
        };
        match ResourceCreator::<K>::create(self.catalog, &draft, references) {
            Ok(_) => SyncOutcome::Created,
            Err(e) => SyncOutcome::Failed(SyncError::from_catalog(key, e)),
        }
    }

    fn update(
        &self,
        key: &str,
        draft: &K::Draft,
        resource: &K::Resource,
        references: &ResolvedReferences,
    ) -> SyncOutcome {
        let actions = match self.diff(key, draft, resource, references) {
            Ok((actions, warnings)) => {
                for warning in warnings {
                    self.options.report_warning(&format!("{key}: {warning}"));
                }
                actions
            }
            Err(e) => return SyncOutcome::Failed(e),
        };
        if actions.is_empty() {
            return SyncOutcome::Unchanged;
        }

        let actions = self.options.before_update(actions, draft, resource);
        if actions.is_empty() {
            return SyncOutcome::Vetoed;
        }

        match self.catalog.update(
            K::resource_id(resource),
            K::resource_version(resource),
            &actions,
        ) {
            Ok(_) => SyncOutcome::Updated {
                actions: actions.len(),
            },
            Err(e) => SyncOutcome::Failed(SyncError::from_catalog(key, e)),
        }
    }

    fn diff(
        &self,
        key: &str,
        draft: &K::Draft,
        resource: &K::Resource,
        references: &ResolvedReferences,
    ) -> Result<(Vec<UpdateAction>, Vec<String>), SyncError> {
        let mut ctx = DiffContext::new(references, self.options.policy());
        match K::build_actions(resource, draft, &mut ctx) {
            Ok(actions) => Ok((actions, ctx.take_warnings())),
            Err(DiffError::UnresolvedReference { kind, key: missing }) => {
                Err(SyncError::Resolution {
                    key: key.to_string(),
                    missing: vec![ReferenceKey { kind, key: missing }],
                })
            }
            Err(DiffError::MasterVariantWithoutKey) => Err(SyncError::Validation {
                key: Some(key.to_string()),
                reason: ValidationError::MasterVariantWithoutKey,
            }),
        }
    }

    fn finish(&self, key: &str, outcome: SyncOutcome, stats: &SyncStatistics) {
        if let SyncOutcome::Failed(error) = &outcome {
            self.options.report_error(error);
        }
        log::trace!("{} '{key}': {outcome:?}", K::NAME);
        stats.record((!key.is_empty()).then_some(key), &outcome);
        self.progress.on_resource_complete(key, &outcome);
    }

    fn fail_all(&self, drafts: &[&K::Draft], message: &str, stats: &SyncStatistics) {
        for draft in drafts {
            let key = K::draft_key(draft).unwrap_or_default();
            let error = SyncError::Transport {
                key: key.to_string(),
                message: message.to_string(),
            };
            self.finish(key, SyncOutcome::Failed(error), stats);
        }
    }

    /// Compute what `sync` would do without writing anything.
    ///
    /// Channels that `ensure_channels` would create, and parents planned for
    /// creation earlier in the same run, get placeholder ids. Callbacks are
    /// not invoked.
    pub fn plan(&self, drafts: Vec<K::Draft>) -> Vec<PlannedChange<K>> {
        let (valid, failures) = matcher::validate::<K>(drafts);
        let mut planned: Vec<PlannedChange<K>> =
            failures.into_iter().map(PlannedChange::failed).collect();

        let valid = matcher::parents_first::<K>(valid);
        let mut creating: HashSet<String> = HashSet::new();
        for batch in valid.chunks(self.options.batch_size()) {
            for level in matcher::dependency_levels::<K>(batch) {
                let drafts: Vec<&K::Draft> = level.into_iter().map(|i| &batch[i]).collect();
                self.plan_level(&drafts, &mut creating, &mut planned);
            }
        }
        planned
    }

    fn plan_level(
        &self,
        drafts: &[&K::Draft],
        creating: &mut HashSet<String>,
        planned: &mut Vec<PlannedChange<K>>,
    ) {
        let prepared = self
            .resolve_references(drafts, true)
            .and_then(|references| Ok((references, self.fetch_existing(drafts)?)));
        let (mut references, existing) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                planned.extend(drafts.iter().map(|draft| {
                    PlannedChange::failed(SyncError::Transport {
                        key: K::draft_key(draft).unwrap_or_default().to_string(),
                        message: e.to_string(),
                    })
                }));
                return;
            }
        };

        // parents planned for creation in an earlier level
        if let Some(own) = K::SELF_REFERENCE {
            for reference in drafts.iter().flat_map(|d| K::references(d)) {
                if reference.kind == own
                    && creating.contains(&reference.key)
                    && !references.resolved.contains(&reference)
                {
                    let id = placeholder_id(&reference.key);
                    references.resolved.insert(own, &reference.key, &id);
                }
            }
        }
        let references = &references.resolved;

        for draft in drafts {
            let key = K::draft_key(draft).unwrap_or_default();
            let change = match matcher::classify::<K>(draft, &existing, references) {
                Match::Unresolvable(missing) => PlannedChange::failed(SyncError::Resolution {
                    key: key.to_string(),
                    missing,
                }),
                Match::New => {
                    creating.insert(key.to_string());
                    PlannedChange {
                        key: Some(key.to_string()),
                        action: PlanAction::Create((*draft).clone()),
                        warnings: Vec::new(),
                    }
                }
                Match::Matched(resource) => match self.diff(key, draft, resource, references) {
                    Ok((actions, warnings)) => PlannedChange {
                        key: Some(key.to_string()),
                        action: if actions.is_empty() {
                            PlanAction::Unchanged
                        } else {
                            PlanAction::Update {
                                existing: resource.clone(),
                                actions,
                            }
                        },
                        warnings,
                    },
                    Err(e) => PlannedChange::failed(e),
                },
            };
            planned.push(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::default();
        let clone = handle.clone();
        assert!(!handle.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_placeholder_id() {
        assert_eq!(placeholder_id("store-1"), "new:store-1");
    }
}
