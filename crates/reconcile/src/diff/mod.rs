//! Diff builders - compare an existing facet with its draft counterpart
//!
//! Every builder is a pure function of (existing facet, draft facet,
//! resolved references, removal policy) and returns the unordered actions
//! for its facet. Ordering is the orderer's job.

pub mod assets;
pub mod attributes;
pub mod custom;
pub mod images;
pub mod prices;
pub mod variants;

use crate::action::UpdateAction;
use crate::model::{LocalizedString, to_json};
use crate::reference::{ReferenceKind, ResolvedReferences};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors a diff builder can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("unresolved {kind} reference '{key}'")]
    UnresolvedReference { kind: ReferenceKind, key: String },

    /// Variants are matched by key, so a keyless master cannot be placed
    #[error("master variant has no key")]
    MasterVariantWithoutKey,
}

/// Which data present on the platform but absent from a draft gets removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalPolicy {
    pub remove_other_locales: bool,
    pub remove_other_set_entries: bool,
    pub remove_other_collection_entries: bool,
    pub remove_other_properties: bool,
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            remove_other_locales: true,
            remove_other_set_entries: true,
            remove_other_collection_entries: true,
            remove_other_properties: true,
        }
    }
}

impl RemovalPolicy {
    /// Never remove anything the draft does not mention
    pub fn keep_all() -> Self {
        Self {
            remove_other_locales: false,
            remove_other_set_entries: false,
            remove_other_collection_entries: false,
            remove_other_properties: false,
        }
    }
}

/// Inputs shared by all builders of one resource, plus collected warnings
pub struct DiffContext<'a> {
    pub references: &'a ResolvedReferences,
    pub policy: RemovalPolicy,
    warnings: Vec<String>,
}

impl<'a> DiffContext<'a> {
    pub fn new(references: &'a ResolvedReferences, policy: RemovalPolicy) -> Self {
        Self {
            references,
            policy,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

/// Optional scalar field.
///
/// A field the draft omits is unset only under `remove_other_properties`.
pub fn build_set_field<T>(
    field: &str,
    old: &Option<T>,
    new: &Option<T>,
    policy: &RemovalPolicy,
) -> Option<UpdateAction>
where
    T: PartialEq + Serialize,
{
    match (old, new) {
        (_, Some(n)) if old.as_ref() != Some(n) => Some(UpdateAction::SetField {
            field: field.to_string(),
            value: Some(to_json(n)),
        }),
        (Some(_), None) if policy.remove_other_properties => Some(UpdateAction::SetField {
            field: field.to_string(),
            value: None,
        }),
        _ => None,
    }
}

/// Field that always has a value on both sides
pub fn build_required_field<T>(field: &str, old: &T, new: &T) -> Option<UpdateAction>
where
    T: PartialEq + Serialize,
{
    (old != new).then(|| UpdateAction::SetField {
        field: field.to_string(),
        value: Some(to_json(new)),
    })
}

/// Optional localized field, compared per locale
pub fn build_localized_field(
    field: &str,
    old: &Option<LocalizedString>,
    new: &Option<LocalizedString>,
    policy: &RemovalPolicy,
) -> Option<UpdateAction> {
    match (old, new) {
        (Some(o), Some(n)) => build_required_localized_field(field, o, n, policy),
        (None, Some(n)) if !n.is_empty() => Some(UpdateAction::SetField {
            field: field.to_string(),
            value: Some(to_json(n)),
        }),
        (Some(_), None) if policy.remove_other_properties => Some(UpdateAction::SetField {
            field: field.to_string(),
            value: None,
        }),
        _ => None,
    }
}

/// Localized field present on both sides; emits the merged value
pub fn build_required_localized_field(
    field: &str,
    old: &LocalizedString,
    new: &LocalizedString,
    policy: &RemovalPolicy,
) -> Option<UpdateAction> {
    let merged = old.merged_with(new, policy.remove_other_locales);
    (merged != *old).then(|| UpdateAction::SetField {
        field: field.to_string(),
        value: Some(to_json(&merged)),
    })
}

/// Merge a set of strings; entries only in `old` survive unless removal is on
pub fn merge_set(old: &BTreeSet<String>, new: &BTreeSet<String>, remove_others: bool) -> BTreeSet<String> {
    if remove_others {
        return new.clone();
    }
    old.union(new).cloned().collect()
}

/// Set-of-string field, e.g. category references
pub fn build_set_of_strings(
    field: &str,
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
    policy: &RemovalPolicy,
) -> Option<UpdateAction> {
    let merged = merge_set(old, new, policy.remove_other_set_entries);
    (merged != *old).then(|| UpdateAction::SetField {
        field: field.to_string(),
        value: Some(to_json(&merged)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_field_unchanged() {
        let policy = RemovalPolicy::default();
        assert_eq!(
            build_set_field("orderHint", &Some("0.1"), &Some("0.1"), &policy),
            None
        );
    }

    #[test]
    fn test_set_field_unset_respects_policy() {
        let unset = build_set_field("orderHint", &Some("0.1"), &None::<&str>, &RemovalPolicy::default());
        assert_eq!(
            unset,
            Some(UpdateAction::SetField {
                field: "orderHint".into(),
                value: None
            })
        );

        let kept = build_set_field("orderHint", &Some("0.1"), &None::<&str>, &RemovalPolicy::keep_all());
        assert_eq!(kept, None);
    }

    #[test]
    fn test_localized_field_keeps_other_locales() {
        let old = LocalizedString::of("en", "Shirt").with("de", "Hemd");
        let new = LocalizedString::of("en", "Shirt");

        let policy = RemovalPolicy {
            remove_other_locales: false,
            ..RemovalPolicy::default()
        };
        assert_eq!(
            build_required_localized_field("name", &old, &new, &policy),
            None
        );

        let action = build_required_localized_field("name", &old, &new, &RemovalPolicy::default());
        assert_eq!(
            action,
            Some(UpdateAction::SetField {
                field: "name".into(),
                value: Some(json!({"en": "Shirt"})),
            })
        );
    }

    #[test]
    fn test_set_of_strings() {
        let old: BTreeSet<String> = ["a", "b"].iter().map(|s| (*s).to_string()).collect();
        let new: BTreeSet<String> = ["b", "c"].iter().map(|s| (*s).to_string()).collect();

        let replaced = build_set_of_strings("categories", &old, &new, &RemovalPolicy::default());
        assert_eq!(
            replaced,
            Some(UpdateAction::SetField {
                field: "categories".into(),
                value: Some(json!(["b", "c"])),
            })
        );

        let merged = build_set_of_strings("categories", &old, &new, &RemovalPolicy::keep_all());
        assert_eq!(
            merged,
            Some(UpdateAction::SetField {
                field: "categories".into(),
                value: Some(json!(["a", "b", "c"])),
            })
        );
    }
}
