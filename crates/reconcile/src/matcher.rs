//! Draft validation and draft -> resource matching

use crate::error::{SyncError, ValidationError};
use crate::kind::ResourceKind;
use crate::model::validate_key;
use crate::reference::{ReferenceKey, ResolvedReferences};
use std::collections::{BTreeSet, HashMap, HashSet};

/// How a validated draft relates to the catalog
#[derive(Debug)]
pub enum Match<'a, R> {
    /// No resource has the draft's key
    New,
    /// The resource with the draft's key
    Matched(&'a R),
    /// Reference keys that did not resolve
    Unresolvable(Vec<ReferenceKey>),
}

/// Split drafts into valid ones and validation failures.
///
/// A key seen earlier in the input fails every later occurrence, so no two
/// in-flight operations can target the same resource.
pub fn validate<K: ResourceKind>(drafts: Vec<K::Draft>) -> (Vec<K::Draft>, Vec<SyncError>) {
    let mut valid = Vec::with_capacity(drafts.len());
    let mut failures = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for draft in drafts {
        let key = K::draft_key(&draft).unwrap_or_default();
        let checked = validate_key(key).and_then(|()| {
            if seen.insert(key.to_string()) {
                Ok(())
            } else {
                Err(ValidationError::DuplicateKey(key.to_string()))
            }
        });
        match checked {
            Ok(()) => valid.push(draft),
            Err(reason) => failures.push(SyncError::Validation {
                key: (!key.is_empty()).then(|| key.to_string()),
                reason,
            }),
        }
    }
    (valid, failures)
}

/// Group drafts into levels by their references to drafts of the same kind.
///
/// A draft lands in a later level than every draft in the input it refers
/// to through `K::SELF_REFERENCE`, so its parent exists by the time it is
/// resolved. Drafts caught in a cycle share the last level. Returns indices
/// into `drafts`; input order is kept inside a level.
pub fn dependency_levels<K: ResourceKind>(drafts: &[K::Draft]) -> Vec<Vec<usize>> {
    let Some(own) = K::SELF_REFERENCE else {
        return vec![(0..drafts.len()).collect()];
    };

    let mut pending: Vec<usize> = (0..drafts.len()).collect();
    let mut levels = Vec::new();
    while !pending.is_empty() {
        let waiting: HashSet<&str> = pending
            .iter()
            .filter_map(|&i| K::draft_key(&drafts[i]))
            .collect();
        let (ready, blocked): (Vec<usize>, Vec<usize>) = pending.iter().partition(|&&i| {
            let draft = &drafts[i];
            let key = K::draft_key(draft);
            K::references(draft).iter().all(|r| {
                r.kind != own || Some(r.key.as_str()) == key || !waiting.contains(r.key.as_str())
            })
        });
        if ready.is_empty() {
            levels.push(blocked);
            break;
        }
        levels.push(ready);
        pending = blocked;
    }
    levels
}

/// Reorder drafts so every draft follows the drafts it refers to
pub fn parents_first<K: ResourceKind>(drafts: Vec<K::Draft>) -> Vec<K::Draft> {
    if K::SELF_REFERENCE.is_none() {
        return drafts;
    }
    let levels = dependency_levels::<K>(&drafts);
    let mut slots: Vec<Option<K::Draft>> = drafts.into_iter().map(Some).collect();
    levels
        .into_iter()
        .flatten()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// References of `draft` missing from `references`, sorted and deduplicated
pub fn unresolved<K: ResourceKind>(
    draft: &K::Draft,
    references: &ResolvedReferences,
) -> Vec<ReferenceKey> {
    K::references(draft)
        .into_iter()
        .filter(|r| !references.contains(r))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Classify a validated draft against the frozen batch of existing resources
pub fn classify<'a, K: ResourceKind>(
    draft: &K::Draft,
    existing: &'a HashMap<String, K::Resource>,
    references: &ResolvedReferences,
) -> Match<'a, K::Resource> {
    let missing = unresolved::<K>(draft, references);
    if !missing.is_empty() {
        return Match::Unresolvable(missing);
    }
    match K::draft_key(draft).and_then(|key| existing.get(key)) {
        Some(resource) => Match::Matched(resource),
        None => Match::New,
    }
}
