//! Asset diffing for product variants and categories; assets are matched by key

use super::custom::{build_custom_actions, resolve_custom_opt};
use super::{DiffContext, DiffError, merge_set};
use crate::action::UpdateAction;
use crate::model::{Asset, AssetDraft, NewAsset};
use crate::reference::ResolvedReferences;
use std::collections::HashSet;

pub fn resolve_asset(
    draft: &AssetDraft,
    references: &ResolvedReferences,
) -> Result<NewAsset, DiffError> {
    Ok(NewAsset {
        key: draft.key.clone(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        tags: draft.tags.clone(),
        sources: draft.sources.clone(),
        custom: resolve_custom_opt(draft.custom.as_ref(), references)?,
    })
}

/// Diff an asset list.
///
/// `variant_id` addresses a product variant; `None` addresses the resource.
pub fn build_asset_actions(
    variant_id: Option<u32>,
    old: &[Asset],
    new: &[AssetDraft],
    ctx: &mut DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    let mut wanted: Vec<&AssetDraft> = Vec::with_capacity(new.len());
    let mut keys: HashSet<&str> = HashSet::new();
    for asset in new {
        if keys.insert(asset.key.as_str()) {
            wanted.push(asset);
        } else {
            ctx.warn(format!("ignoring duplicate asset key '{}'", asset.key));
        }
    }

    let mut actions = Vec::new();
    let mut kept: Vec<&Asset> = Vec::with_capacity(old.len());
    for asset in old {
        if keys.contains(asset.key.as_str()) || !ctx.policy.remove_other_collection_entries {
            kept.push(asset);
        } else {
            actions.push(UpdateAction::RemoveAsset {
                variant_id,
                asset_key: asset.key.clone(),
            });
        }
    }

    let mut additions = Vec::new();
    for (position, draft) in wanted.iter().enumerate() {
        match old.iter().find(|a| a.key == draft.key) {
            Some(existing) => actions.extend(build_asset_content_actions(variant_id, existing, draft, ctx)?),
            None => additions.push(UpdateAction::AddAsset {
                variant_id,
                asset: resolve_asset(draft, ctx.references)?,
                position: Some(position),
            }),
        }
    }

    let current: Vec<&str> = kept.iter().map(|a| a.id.as_str()).collect();
    let mut target: Vec<&str> = wanted
        .iter()
        .filter_map(|d| kept.iter().find(|a| a.key == d.key))
        .map(|a| a.id.as_str())
        .collect();
    target.extend(
        kept.iter()
            .filter(|a| !keys.contains(a.key.as_str()))
            .map(|a| a.id.as_str()),
    );
    if current != target {
        actions.push(UpdateAction::ChangeAssetOrder {
            variant_id,
            asset_order: target.into_iter().map(str::to_string).collect(),
        });
    }

    actions.extend(additions);
    Ok(actions)
}

fn build_asset_content_actions(
    variant_id: Option<u32>,
    old: &Asset,
    new: &AssetDraft,
    ctx: &DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    let policy = &ctx.policy;
    let asset_key = &new.key;
    let mut actions = Vec::new();

    let name = old.name.merged_with(&new.name, policy.remove_other_locales);
    if name != old.name {
        actions.push(UpdateAction::ChangeAssetName {
            variant_id,
            asset_key: asset_key.clone(),
            name,
        });
    }

    let description = match (&old.description, &new.description) {
        (Some(o), Some(n)) => Some(o.merged_with(n, policy.remove_other_locales)),
        (Some(o), None) if !policy.remove_other_properties => Some(o.clone()),
        (_, n) => n.clone(),
    };
    if description != old.description {
        actions.push(UpdateAction::SetAssetDescription {
            variant_id,
            asset_key: asset_key.clone(),
            description,
        });
    }

    let tags = merge_set(&old.tags, &new.tags, policy.remove_other_set_entries);
    if tags != old.tags {
        actions.push(UpdateAction::SetAssetTags {
            variant_id,
            asset_key: asset_key.clone(),
            tags,
        });
    }

    if old.sources != new.sources {
        actions.push(UpdateAction::SetAssetSources {
            variant_id,
            asset_key: asset_key.clone(),
            sources: new.sources.clone(),
        });
    }

    actions.extend(build_custom_actions(
        old.custom.as_ref(),
        new.custom.as_ref(),
        ctx,
        |custom| UpdateAction::SetAssetCustomType {
            variant_id,
            asset_key: asset_key.clone(),
            custom,
        },
        |name, value| UpdateAction::SetAssetCustomField {
            variant_id,
            asset_key: asset_key.clone(),
            name,
            value,
        },
    )?);
    Ok(actions)
}
