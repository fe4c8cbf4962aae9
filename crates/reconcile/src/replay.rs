//! Local replay of update actions
//!
//! Applies an action list to a resource with the same checks the platform
//! performs, so a file-backed catalog and the tests can tell a valid action
//! sequence from one that would be refused.

use crate::action::UpdateAction;
use crate::diff::DiffError;
use crate::kind::ResourceKind;
use crate::model::{Asset, CustomFields};
use crate::reference::ResolvedReferences;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why the platform would refuse a single action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedAction {
    #[error("action does not apply to {0}")]
    Unsupported(&'static str),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("field '{0}' is required and cannot be unset")]
    RequiredField(String),

    #[error("variant {0} does not exist")]
    UnknownVariant(u32),

    #[error("no variant with key '{0}'")]
    UnknownVariantKey(String),

    #[error("a variant with key '{0}' already exists")]
    DuplicateVariantKey(String),

    #[error("sku '{0}' is already used by another variant")]
    DuplicateSku(String),

    #[error("variant {0} is the master variant and cannot be removed")]
    RemoveMasterVariant(u32),

    #[error("price {0} does not exist")]
    UnknownPrice(String),

    #[error("variant {0} already has a price with the same scope")]
    DuplicatePriceScope(u32),

    #[error("currency of price {0} cannot change")]
    PriceCurrencyMismatch(String),

    #[error("image '{url}' does not exist on variant {variant_id}")]
    UnknownImage { variant_id: u32, url: String },

    #[error("image '{url}' already exists on variant {variant_id}")]
    DuplicateImage { variant_id: u32, url: String },

    #[error("position {position} is out of range for {len} entries")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("asset '{0}' does not exist")]
    UnknownAsset(String),

    #[error("an asset with key '{0}' already exists")]
    DuplicateAsset(String),

    #[error("asset order must list every current asset id exactly once")]
    AssetOrderMismatch,

    #[error("no custom type is set")]
    NoCustomType,
}

/// A rejected action together with its position in the list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action {index} ({action}) rejected: {reason}")]
pub struct ReplayError {
    pub index: usize,
    pub action: &'static str,
    #[source]
    pub reason: RejectedAction,
}

/// Resource kinds whose actions can be replayed locally
pub trait ApplyActions: ResourceKind {
    /// Build the resource the platform would store for a new draft
    fn materialize(
        draft: &Self::Draft,
        references: &ResolvedReferences,
        id: String,
    ) -> Result<Self::Resource, DiffError>;

    fn apply_action(
        resource: &mut Self::Resource,
        action: &UpdateAction,
    ) -> Result<(), RejectedAction>;

    fn bump_version(resource: &mut Self::Resource);

    /// Apply a whole update; all actions succeed or the resource is untouched
    fn replay(
        resource: &Self::Resource,
        actions: &[UpdateAction],
    ) -> Result<Self::Resource, ReplayError> {
        let mut next = resource.clone();
        for (index, action) in actions.iter().enumerate() {
            Self::apply_action(&mut next, action).map_err(|reason| ReplayError {
                index,
                action: action.name(),
                reason,
            })?;
        }
        Self::bump_version(&mut next);
        Ok(next)
    }
}

/// Decode a `SetField` payload; `None` stays `None`
pub(crate) fn field_value<T: DeserializeOwned>(
    field: &str,
    value: &Option<Value>,
) -> Result<Option<T>, RejectedAction> {
    value
        .as_ref()
        .map(|v| {
            serde_json::from_value(v.clone()).map_err(|e| RejectedAction::InvalidValue {
                field: field.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Decode a `SetField` payload for a field that cannot be unset
pub(crate) fn required_field_value<T: DeserializeOwned>(
    field: &str,
    value: &Option<Value>,
) -> Result<T, RejectedAction> {
    field_value(field, value)?.ok_or_else(|| RejectedAction::RequiredField(field.to_string()))
}

/// Next id of the form `{prefix}{n}` not yet in `existing`
pub(crate) fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let max = existing
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{}", max + 1)
}

pub(crate) fn apply_custom_type(custom: &mut Option<CustomFields>, new: Option<CustomFields>) {
    *custom = new;
}

pub(crate) fn apply_custom_field(
    custom: &mut Option<CustomFields>,
    name: &str,
    value: Option<Value>,
) -> Result<(), RejectedAction> {
    let custom = custom.as_mut().ok_or(RejectedAction::NoCustomType)?;
    match value.filter(|v| !v.is_null()) {
        Some(v) => {
            custom.fields.insert(name.to_string(), v);
        }
        None => {
            custom.fields.remove(name);
        }
    }
    Ok(())
}

fn asset_mut<'a>(assets: &'a mut [Asset], key: &str) -> Result<&'a mut Asset, RejectedAction> {
    assets
        .iter_mut()
        .find(|a| a.key == key)
        .ok_or_else(|| RejectedAction::UnknownAsset(key.to_string()))
}

/// Apply an asset action to an asset list.
///
/// `id_prefix` scopes generated asset ids to their owner.
pub(crate) fn apply_asset_action(
    assets: &mut Vec<Asset>,
    action: &UpdateAction,
    id_prefix: &str,
) -> Result<(), RejectedAction> {
    match action {
        UpdateAction::AddAsset {
            asset, position, ..
        } => {
            if assets.iter().any(|a| a.key == asset.key) {
                return Err(RejectedAction::DuplicateAsset(asset.key.clone()));
            }
            let id = next_id(id_prefix, assets.iter().map(|a| a.id.as_str()));
            let position = position.unwrap_or(assets.len());
            if position > assets.len() {
                return Err(RejectedAction::PositionOutOfRange {
                    position,
                    len: assets.len(),
                });
            }
            assets.insert(position, Asset::from_new(id, asset.clone()));
        }
        UpdateAction::RemoveAsset { asset_key, .. } => {
            let index = assets
                .iter()
                .position(|a| &a.key == asset_key)
                .ok_or_else(|| RejectedAction::UnknownAsset(asset_key.clone()))?;
            assets.remove(index);
        }
        UpdateAction::ChangeAssetOrder { asset_order, .. } => {
            let mut reordered = Vec::with_capacity(assets.len());
            for id in asset_order {
                let index = assets
                    .iter()
                    .position(|a| &a.id == id)
                    .ok_or(RejectedAction::AssetOrderMismatch)?;
                reordered.push(assets.remove(index));
            }
            if !assets.is_empty() {
                return Err(RejectedAction::AssetOrderMismatch);
            }
            *assets = reordered;
        }
        UpdateAction::ChangeAssetName {
            asset_key, name, ..
        } => asset_mut(assets, asset_key)?.name = name.clone(),
        UpdateAction::SetAssetDescription {
            asset_key,
            description,
            ..
        } => asset_mut(assets, asset_key)?.description = description.clone(),
        UpdateAction::SetAssetTags {
            asset_key, tags, ..
        } => asset_mut(assets, asset_key)?.tags = tags.clone(),
        UpdateAction::SetAssetSources {
            asset_key, sources, ..
        } => asset_mut(assets, asset_key)?.sources = sources.clone(),
        UpdateAction::SetAssetCustomType {
            asset_key, custom, ..
        } => apply_custom_type(&mut asset_mut(assets, asset_key)?.custom, custom.clone()),
        UpdateAction::SetAssetCustomField {
            asset_key,
            name,
            value,
            ..
        } => apply_custom_field(&mut asset_mut(assets, asset_key)?.custom, name, value.clone())?,
        _ => return Err(RejectedAction::Unsupported("assets")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalizedString, NewAsset};

    fn new_asset(key: &str) -> NewAsset {
        NewAsset {
            key: key.into(),
            name: LocalizedString::of("en", key),
            description: None,
            tags: Default::default(),
            sources: vec![],
            custom: None,
        }
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id("p-", std::iter::empty()), "p-1");
        assert_eq!(next_id("p-", ["p-1", "p-7", "x-9"].into_iter()), "p-8");
    }

    #[test]
    fn test_asset_order_must_be_complete() {
        let mut assets = Vec::new();
        for key in ["a", "b"] {
            apply_asset_action(
                &mut assets,
                &UpdateAction::AddAsset {
                    variant_id: None,
                    asset: new_asset(key),
                    position: None,
                },
                "asset-",
            )
            .unwrap();
        }
        let ids: Vec<String> = assets.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["asset-1", "asset-2"]);

        let partial = UpdateAction::ChangeAssetOrder {
            variant_id: None,
            asset_order: vec!["asset-2".into()],
        };
        assert_eq!(
            apply_asset_action(&mut assets.clone(), &partial, "asset-"),
            Err(RejectedAction::AssetOrderMismatch)
        );

        let full = UpdateAction::ChangeAssetOrder {
            variant_id: None,
            asset_order: vec!["asset-2".into(), "asset-1".into()],
        };
        apply_asset_action(&mut assets, &full, "asset-").unwrap();
        assert_eq!(assets[0].key, "b");
    }

    #[test]
    fn test_add_asset_at_position() {
        let mut assets = Vec::new();
        let add = |key: &str, position| UpdateAction::AddAsset {
            variant_id: None,
            asset: new_asset(key),
            position,
        };
        apply_asset_action(&mut assets, &add("b", None), "a-").unwrap();
        apply_asset_action(&mut assets, &add("a", Some(0)), "a-").unwrap();
        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        assert_eq!(
            apply_asset_action(&mut assets, &add("c", Some(5)), "a-"),
            Err(RejectedAction::PositionOutOfRange { position: 5, len: 2 })
        );
        assert_eq!(
            apply_asset_action(&mut assets, &add("a", None), "a-"),
            Err(RejectedAction::DuplicateAsset("a".into()))
        );
    }

    #[test]
    fn test_custom_field_requires_type() {
        let mut custom = None;
        assert_eq!(
            apply_custom_field(&mut custom, "x", Some(Value::Bool(true))),
            Err(RejectedAction::NoCustomType)
        );
    }
}
