//! Custom type and custom field diffing
//!
//! Resources, prices and assets all carry custom fields; only the action
//! used to address them differs, so callers pass the two constructors.

use super::{DiffContext, DiffError};
use crate::action::UpdateAction;
use crate::model::{CustomFields, CustomFieldsDraft};
use crate::reference::{ReferenceKind, ResolvedReferences};
use serde_json::Value;

/// Resolve a draft's custom type key to the stored form
pub fn resolve_custom(
    draft: &CustomFieldsDraft,
    references: &ResolvedReferences,
) -> Result<CustomFields, DiffError> {
    Ok(CustomFields {
        type_id: references.require(ReferenceKind::Type, &draft.type_key)?,
        fields: draft
            .fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    })
}

pub fn resolve_custom_opt(
    draft: Option<&CustomFieldsDraft>,
    references: &ResolvedReferences,
) -> Result<Option<CustomFields>, DiffError> {
    draft.map(|d| resolve_custom(d, references)).transpose()
}

/// Diff custom data.
///
/// A changed type replaces everything with one `set_type`. With the same
/// type, fields are set one by one and fields the draft drops are unset
/// under `remove_other_properties`. A `null` field in the draft is dropped
/// on resolution, so it always unsets.
pub fn build_custom_actions<T, F>(
    old: Option<&CustomFields>,
    new: Option<&CustomFieldsDraft>,
    ctx: &DiffContext<'_>,
    set_type: T,
    set_field: F,
) -> Result<Vec<UpdateAction>, DiffError>
where
    T: Fn(Option<CustomFields>) -> UpdateAction,
    F: Fn(String, Option<Value>) -> UpdateAction,
{
    let explicit_nulls: Vec<&String> = new
        .map(|d| d.fields.iter().filter(|(_, v)| v.is_null()).map(|(k, _)| k).collect())
        .unwrap_or_default();
    let new = resolve_custom_opt(new, ctx.references)?;

    let actions = match (old, new) {
        (None, None) => Vec::new(),
        (Some(_), None) => vec![set_type(None)],
        (None, Some(new)) => vec![set_type(Some(new))],
        (Some(old), Some(new)) if old.type_id != new.type_id => vec![set_type(Some(new))],
        (Some(old), Some(new)) => {
            let mut actions: Vec<UpdateAction> = new
                .fields
                .iter()
                .filter(|(name, value)| old.fields.get(*name) != Some(*value))
                .map(|(name, value)| set_field(name.clone(), Some(value.clone())))
                .collect();

            actions.extend(
                old.fields
                    .keys()
                    .filter(|name| {
                        !new.fields.contains_key(*name)
                            && (ctx.policy.remove_other_properties
                                || explicit_nulls.contains(name))
                    })
                    .map(|name| set_field(name.clone(), None)),
            );
            actions
        }
    };
    Ok(actions)
}

/// Custom data on the resource itself
pub fn build_resource_custom_actions(
    old: Option<&CustomFields>,
    new: Option<&CustomFieldsDraft>,
    ctx: &DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    build_custom_actions(
        old,
        new,
        ctx,
        |custom| UpdateAction::SetCustomType { custom },
        |name, value| UpdateAction::SetCustomField { name, value },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::RemovalPolicy;
    use serde_json::json;

    fn refs() -> ResolvedReferences {
        let mut refs = ResolvedReferences::new();
        refs.insert(ReferenceKind::Type, "promo", "type-1");
        refs.insert(ReferenceKind::Type, "season", "type-2");
        refs
    }

    fn stored(type_id: &str, fields: &[(&str, Value)]) -> CustomFields {
        CustomFields {
            type_id: type_id.into(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_changed_type_replaces_all_fields() {
        let refs = refs();
        let ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let old = stored("type-1", &[("a", json!(1))]);
        let new = CustomFieldsDraft::new("season").with_field("b", json!(2));

        let actions = build_resource_custom_actions(Some(&old), Some(&new), &ctx).unwrap();
        assert_eq!(
            actions,
            vec![UpdateAction::SetCustomType {
                custom: Some(stored("type-2", &[("b", json!(2))]))
            }]
        );
    }

    #[test]
    fn test_same_type_sets_changed_fields() {
        let refs = refs();
        let ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let old = stored("type-1", &[("a", json!(1)), ("b", json!("x")), ("gone", json!(true))]);
        let new = CustomFieldsDraft::new("promo")
            .with_field("a", json!(1))
            .with_field("b", json!("y"));

        let actions = build_resource_custom_actions(Some(&old), Some(&new), &ctx).unwrap();
        assert_eq!(
            actions,
            vec![
                UpdateAction::SetCustomField {
                    name: "b".into(),
                    value: Some(json!("y"))
                },
                UpdateAction::SetCustomField {
                    name: "gone".into(),
                    value: None
                },
            ]
        );

        let keep = DiffContext::new(&refs, RemovalPolicy::keep_all());
        let actions = build_resource_custom_actions(Some(&old), Some(&new), &keep).unwrap();
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_missing_draft_custom_removes() {
        let refs = refs();
        let ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let old = stored("type-1", &[]);
        let actions = build_resource_custom_actions(Some(&old), None, &ctx).unwrap();
        assert_eq!(actions, vec![UpdateAction::SetCustomType { custom: None }]);
    }

    #[test]
    fn test_unknown_type_fails() {
        let refs = refs();
        let ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let new = CustomFieldsDraft::new("nope");
        let err = build_resource_custom_actions(None, Some(&new), &ctx).unwrap_err();
        assert_eq!(
            err,
            DiffError::UnresolvedReference {
                kind: ReferenceKind::Type,
                key: "nope".into()
            }
        );
    }

    #[test]
    fn test_null_field_unsets_even_when_keeping_others() {
        let refs = refs();
        let ctx = DiffContext::new(&refs, RemovalPolicy::keep_all());
        let old = stored("type-1", &[("a", json!(1)), ("b", json!(2))]);
        let new = CustomFieldsDraft::new("promo")
            .with_field("a", Value::Null)
            .with_field("c", Value::Null);

        let actions = build_resource_custom_actions(Some(&old), Some(&new), &ctx).unwrap();
        assert_eq!(
            actions,
            vec![UpdateAction::SetCustomField {
                name: "a".into(),
                value: None
            }]
        );

        let created = build_resource_custom_actions(None, Some(&new), &ctx).unwrap();
        assert_eq!(
            created,
            vec![UpdateAction::SetCustomType {
                custom: Some(stored("type-1", &[]))
            }]
        );
    }
}
