//! Product variant diffing; variants are matched by key

use super::assets::{build_asset_actions, resolve_asset};
use super::attributes::build_attribute_actions;
use super::images::build_image_actions;
use super::prices::{build_price_actions, resolve_price};
use super::{DiffContext, DiffError};
use crate::action::UpdateAction;
use crate::kinds::product::{Variant, VariantDraft};
use crate::orderer::{
    order_asset_actions, order_attribute_actions, order_image_actions, order_price_actions,
    order_variant_actions,
};
use std::collections::HashSet;

/// Diff all variants of a product, master included, and return them in
/// variant-level order.
pub fn build_variant_actions(
    old_master: &Variant,
    old_variants: &[Variant],
    new_master: &VariantDraft,
    new_variants: &[VariantDraft],
    ctx: &mut DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    if new_master.key.is_none() {
        return Err(DiffError::MasterVariantWithoutKey);
    }
    let old_all: Vec<&Variant> = std::iter::once(old_master).chain(old_variants).collect();

    let mut wanted: Vec<(&str, &VariantDraft)> = Vec::new();
    let mut keys: HashSet<&str> = HashSet::new();
    for (index, draft) in std::iter::once(new_master).chain(new_variants).enumerate() {
        match draft.key.as_deref() {
            None => ctx.warn(format!("variant at position {index} has no key and is ignored")),
            Some(key) if !keys.insert(key) => {
                ctx.warn(format!("variant key '{key}' appears more than once; only the first is used"));
            }
            Some(key) => wanted.push((key, draft)),
        }
    }

    let mut actions = Vec::new();

    for variant in &old_all {
        let keep = variant.key.as_deref().is_some_and(|k| keys.contains(k));
        if !keep {
            actions.push(UpdateAction::RemoveVariant { id: variant.id });
        }
    }

    for (key, draft) in &wanted {
        match old_all.iter().find(|v| v.key.as_deref() == Some(*key)) {
            Some(existing) => actions.extend(build_variant_content_actions(existing, draft, ctx)?),
            None => actions.push(build_add_variant(key, draft, ctx)?),
        }
    }

    if let Some(master_key) = new_master.key.as_deref()
        && old_master.key.as_deref() != Some(master_key)
    {
        actions.push(UpdateAction::ChangeMasterVariant {
            variant_key: master_key.to_string(),
        });
    }

    order_variant_actions(&mut actions, old_master.id);
    Ok(actions)
}

/// Content changes of a matched variant, each facet ordered by its own table
fn build_variant_content_actions(
    old: &Variant,
    new: &VariantDraft,
    ctx: &mut DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    let id = old.id;

    let mut attributes = build_attribute_actions(id, &old.attributes, &new.attributes, &ctx.policy);
    order_attribute_actions(&mut attributes);

    let mut images = build_image_actions(id, &old.images, &new.images, ctx);
    order_image_actions(&mut images);

    let mut prices = build_price_actions(id, &old.prices, &new.prices, ctx)?;
    order_price_actions(&mut prices);

    let mut assets = build_asset_actions(Some(id), &old.assets, &new.assets, ctx)?;
    order_asset_actions(&mut assets);

    let mut actions = attributes;
    actions.append(&mut images);
    actions.append(&mut prices);
    actions.append(&mut assets);

    let sku_changed = match (&old.sku, &new.sku) {
        (_, Some(sku)) => old.sku.as_ref() != Some(sku),
        (Some(_), None) => ctx.policy.remove_other_properties,
        (None, None) => false,
    };
    if sku_changed {
        actions.push(UpdateAction::SetSku {
            variant_id: id,
            sku: new.sku.clone(),
        });
    }
    Ok(actions)
}

fn build_add_variant(
    key: &str,
    draft: &VariantDraft,
    ctx: &DiffContext<'_>,
) -> Result<UpdateAction, DiffError> {
    Ok(UpdateAction::AddVariant {
        key: key.to_string(),
        sku: draft.sku.clone(),
        attributes: draft.attributes.clone(),
        prices: draft
            .prices
            .iter()
            .map(|p| resolve_price(p, ctx.references))
            .collect::<Result<_, _>>()?,
        images: draft.images.clone(),
        assets: draft
            .assets
            .iter()
            .map(|a| resolve_asset(a, ctx.references))
            .collect::<Result<_, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionClass;
    use crate::diff::RemovalPolicy;
    use crate::model::Attribute;
    use crate::reference::ResolvedReferences;
    use serde_json::json;

    fn existing(id: u32, key: &str) -> Variant {
        Variant {
            id,
            key: Some(key.into()),
            sku: Some(format!("sku-{key}")),
            ..Variant::default()
        }
    }

    fn draft(key: &str) -> VariantDraft {
        VariantDraft {
            key: Some(key.into()),
            sku: Some(format!("sku-{key}")),
            ..VariantDraft::default()
        }
    }

    #[test]
    fn test_master_swap_is_ordered() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());

        // v1 is master and disappears; v3 is new and becomes master
        let mut kept = draft("v2");
        kept.attributes.push(Attribute::new("size", json!("L")));
        let actions = build_variant_actions(
            &existing(1, "v1"),
            &[existing(2, "v2"), existing(4, "v4")],
            &draft("v3"),
            &[kept],
            &mut ctx,
        )
        .unwrap();

        let classes: Vec<_> = actions.iter().map(UpdateAction::class).collect();
        assert_eq!(
            classes,
            vec![
                ActionClass::RemoveVariant { id: 4 },
                ActionClass::SetAttribute,
                ActionClass::AddVariant,
                ActionClass::ChangeMasterVariant,
                ActionClass::RemoveVariant { id: 1 },
            ]
        );
    }

    #[test]
    fn test_keyless_and_duplicate_variants_warn() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let keyless = VariantDraft::default();

        let actions = build_variant_actions(
            &existing(1, "v1"),
            &[],
            &draft("v1"),
            &[keyless, draft("v1")],
            &mut ctx,
        )
        .unwrap();

        assert!(actions.is_empty());
        assert_eq!(ctx.take_warnings().len(), 2);
    }

    #[test]
    fn test_sku_unset_respects_policy() {
        let refs = ResolvedReferences::new();
        let mut no_sku = draft("v1");
        no_sku.sku = None;

        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let actions = build_variant_actions(&existing(1, "v1"), &[], &no_sku, &[], &mut ctx).unwrap();
        assert_eq!(
            actions,
            vec![UpdateAction::SetSku {
                variant_id: 1,
                sku: None
            }]
        );

        let mut keep = DiffContext::new(&refs, RemovalPolicy::keep_all());
        let actions = build_variant_actions(&existing(1, "v1"), &[], &no_sku, &[], &mut keep).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_keyless_master_is_refused() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let err = build_variant_actions(
            &existing(1, "v1"),
            &[existing(2, "v2")],
            &VariantDraft::default(),
            &[draft("v2")],
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(err, DiffError::MasterVariantWithoutKey);
    }
}
