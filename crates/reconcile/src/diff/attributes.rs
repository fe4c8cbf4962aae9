//! Variant attribute diffing

use super::RemovalPolicy;
use crate::action::UpdateAction;
use crate::model::Attribute;
use serde_json::Value;
use std::collections::BTreeMap;

fn by_name(attributes: &[Attribute]) -> BTreeMap<&str, &Value> {
    attributes
        .iter()
        .map(|a| (a.name.as_str(), &a.value))
        .collect()
}

/// Diff the attributes of one variant.
///
/// Attributes are keyed by name, so every name yields at most one action.
/// A repeated name in the draft resolves to its last value. A `null` value
/// in the draft unsets the attribute whatever the removal policy says.
pub fn build_attribute_actions(
    variant_id: u32,
    old: &[Attribute],
    new: &[Attribute],
    policy: &RemovalPolicy,
) -> Vec<UpdateAction> {
    let old = by_name(old);
    let new = by_name(new);

    let mut actions: Vec<UpdateAction> = new
        .iter()
        .filter(|(name, value)| !value.is_null() && old.get(*name) != Some(*value))
        .map(|(name, value)| UpdateAction::SetAttribute {
            variant_id,
            name: (*name).to_string(),
            value: Some((*value).clone()),
        })
        .collect();

    actions.extend(
        old.keys()
            .filter(|name| match new.get(*name) {
                Some(value) => value.is_null(),
                None => policy.remove_other_properties,
            })
            .map(|name| UpdateAction::SetAttribute {
                variant_id,
                name: (*name).to_string(),
                value: None,
            }),
    );
    actions
}
