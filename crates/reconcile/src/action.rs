//! The closed set of update actions a resource can receive
//!
//! Actions serialize as JSON objects tagged by an `action` field, the way the
//! platform's update endpoint accepts them.

use crate::kinds::cart_discount::{CartDiscountTarget, CartDiscountValue};
use crate::model::{
    Attribute, AssetSource, CustomFields, Image, LocalizedString, Money, NewAsset, NewPrice,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UpdateAction {
    /// Set or unset a resource-level field
    SetField {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// Replace the custom type and all its fields; `None` removes custom data
    SetCustomType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom: Option<CustomFields>,
    },
    SetCustomField {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },

    AddVariant {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sku: Option<String>,
        #[serde(default)]
        attributes: Vec<Attribute>,
        #[serde(default)]
        prices: Vec<NewPrice>,
        #[serde(default)]
        images: Vec<Image>,
        #[serde(default)]
        assets: Vec<NewAsset>,
    },
    RemoveVariant {
        id: u32,
    },
    ChangeMasterVariant {
        variant_key: String,
    },
    SetSku {
        variant_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sku: Option<String>,
    },
    /// Set an attribute; `None` unsets it
    SetAttribute {
        variant_id: u32,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },

    AddPrice {
        variant_id: u32,
        price: NewPrice,
    },
    RemovePrice {
        price_id: String,
    },
    ChangePrice {
        price_id: String,
        value: Money,
    },
    SetPriceCustomType {
        price_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom: Option<CustomFields>,
    },
    SetPriceCustomField {
        price_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },

    AddExternalImage {
        variant_id: u32,
        image: Image,
    },
    RemoveImage {
        variant_id: u32,
        image_url: String,
    },
    MoveImageToPosition {
        variant_id: u32,
        image_url: String,
        position: usize,
    },
    SetImageLabel {
        variant_id: u32,
        image_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Asset actions address product variants when `variant_id` is set and
    /// the resource itself (categories) otherwise
    AddAsset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset: NewAsset,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    RemoveAsset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
    },
    ChangeAssetOrder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_order: Vec<String>,
    },
    ChangeAssetName {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        name: LocalizedString,
    },
    SetAssetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    SetAssetTags {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        tags: BTreeSet<String>,
    },
    SetAssetSources {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        sources: Vec<AssetSource>,
    },
    SetAssetCustomType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom: Option<CustomFields>,
    },
    SetAssetCustomField {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<u32>,
        asset_key: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },

    ChangeValue {
        value: CartDiscountValue,
    },
    ChangeCartPredicate {
        cart_predicate: String,
    },
    ChangeTarget {
        target: CartDiscountTarget,
    },
}

/// Coarse classification used by the orderer's priority tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Field,
    Custom,
    AddVariant,
    RemoveVariant { id: u32 },
    ChangeMasterVariant,
    Sku,
    SetAttribute,
    UnsetAttribute,
    AddPrice,
    RemovePrice,
    ChangePrice,
    AddImage,
    RemoveImage,
    MoveImage,
    ChangeImage,
    AddAsset,
    RemoveAsset,
    ReorderAssets,
    ChangeAsset,
}

impl ActionClass {
    /// Changes to the content of an existing variant
    pub fn is_variant_content_change(&self) -> bool {
        matches!(
            self,
            Self::Sku
                | Self::SetAttribute
                | Self::UnsetAttribute
                | Self::AddPrice
                | Self::RemovePrice
                | Self::ChangePrice
                | Self::AddImage
                | Self::RemoveImage
                | Self::MoveImage
                | Self::ChangeImage
                | Self::AddAsset
                | Self::RemoveAsset
                | Self::ReorderAssets
                | Self::ChangeAsset
        )
    }
}

impl UpdateAction {
    pub fn class(&self) -> ActionClass {
        match self {
            Self::SetField { .. }
            | Self::ChangeValue { .. }
            | Self::ChangeCartPredicate { .. }
            | Self::ChangeTarget { .. } => ActionClass::Field,
            Self::SetCustomType { .. } | Self::SetCustomField { .. } => ActionClass::Custom,
            Self::AddVariant { .. } => ActionClass::AddVariant,
            Self::RemoveVariant { id } => ActionClass::RemoveVariant { id: *id },
            Self::ChangeMasterVariant { .. } => ActionClass::ChangeMasterVariant,
            Self::SetSku { .. } => ActionClass::Sku,
            Self::SetAttribute { value: Some(v), .. } if !v.is_null() => ActionClass::SetAttribute,
            Self::SetAttribute { .. } => ActionClass::UnsetAttribute,
            Self::AddPrice { .. } => ActionClass::AddPrice,
            Self::RemovePrice { .. } => ActionClass::RemovePrice,
            Self::ChangePrice { .. }
            | Self::SetPriceCustomType { .. }
            | Self::SetPriceCustomField { .. } => ActionClass::ChangePrice,
            Self::AddExternalImage { .. } => ActionClass::AddImage,
            Self::RemoveImage { .. } => ActionClass::RemoveImage,
            Self::MoveImageToPosition { .. } => ActionClass::MoveImage,
            Self::SetImageLabel { .. } => ActionClass::ChangeImage,
            Self::AddAsset { .. } => ActionClass::AddAsset,
            Self::RemoveAsset { .. } => ActionClass::RemoveAsset,
            Self::ChangeAssetOrder { .. } => ActionClass::ReorderAssets,
            Self::ChangeAssetName { .. }
            | Self::SetAssetDescription { .. }
            | Self::SetAssetTags { .. }
            | Self::SetAssetSources { .. }
            | Self::SetAssetCustomType { .. }
            | Self::SetAssetCustomField { .. } => ActionClass::ChangeAsset,
        }
    }

    /// The action's wire name, e.g. `changeMasterVariant`
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetField { .. } => "setField",
            Self::SetCustomType { .. } => "setCustomType",
            Self::SetCustomField { .. } => "setCustomField",
            Self::AddVariant { .. } => "addVariant",
            Self::RemoveVariant { .. } => "removeVariant",
            Self::ChangeMasterVariant { .. } => "changeMasterVariant",
            Self::SetSku { .. } => "setSku",
            Self::SetAttribute { .. } => "setAttribute",
            Self::AddPrice { .. } => "addPrice",
            Self::RemovePrice { .. } => "removePrice",
            Self::ChangePrice { .. } => "changePrice",
            Self::SetPriceCustomType { .. } => "setPriceCustomType",
            Self::SetPriceCustomField { .. } => "setPriceCustomField",
            Self::AddExternalImage { .. } => "addExternalImage",
            Self::RemoveImage { .. } => "removeImage",
            Self::MoveImageToPosition { .. } => "moveImageToPosition",
            Self::SetImageLabel { .. } => "setImageLabel",
            Self::AddAsset { .. } => "addAsset",
            Self::RemoveAsset { .. } => "removeAsset",
            Self::ChangeAssetOrder { .. } => "changeAssetOrder",
            Self::ChangeAssetName { .. } => "changeAssetName",
            Self::SetAssetDescription { .. } => "setAssetDescription",
            Self::SetAssetTags { .. } => "setAssetTags",
            Self::SetAssetSources { .. } => "setAssetSources",
            Self::SetAssetCustomType { .. } => "setAssetCustomType",
            Self::SetAssetCustomField { .. } => "setAssetCustomField",
            Self::ChangeValue { .. } => "changeValue",
            Self::ChangeCartPredicate { .. } => "changeCartPredicate",
            Self::ChangeTarget { .. } => "changeTarget",
        }
    }

    /// Short one-line description for plan output
    pub fn summary(&self) -> String {
        match self {
            Self::SetField { field, value } => match value {
                Some(_) => format!("set {field}"),
                None => format!("unset {field}"),
            },
            Self::SetCustomType { custom } => match custom {
                Some(c) => format!("set custom type {}", c.type_id),
                None => "remove custom type".to_string(),
            },
            Self::SetCustomField { name, .. } => format!("set custom field {name}"),
            Self::AddVariant { key, .. } => format!("add variant {key}"),
            Self::RemoveVariant { id } => format!("remove variant {id}"),
            Self::ChangeMasterVariant { variant_key } => {
                format!("change master variant to {variant_key}")
            }
            Self::SetSku { variant_id, .. } => format!("set sku of variant {variant_id}"),
            Self::SetAttribute {
                variant_id,
                name,
                value,
            } => match value {
                Some(_) => format!("set attribute {name} on variant {variant_id}"),
                None => format!("unset attribute {name} on variant {variant_id}"),
            },
            Self::AddPrice { variant_id, price } => format!(
                "add {} price to variant {variant_id}",
                price.value.currency_code
            ),
            Self::RemovePrice { price_id } => format!("remove price {price_id}"),
            Self::ChangePrice { price_id, value } => format!(
                "change price {price_id} to {} {}",
                value.cent_amount, value.currency_code
            ),
            Self::SetPriceCustomType { price_id, .. } => {
                format!("set custom type of price {price_id}")
            }
            Self::SetPriceCustomField { price_id, name, .. } => {
                format!("set custom field {name} of price {price_id}")
            }
            Self::AddExternalImage { variant_id, image } => {
                format!("add image {} to variant {variant_id}", image.url)
            }
            Self::RemoveImage {
                variant_id,
                image_url,
            } => format!("remove image {image_url} from variant {variant_id}"),
            Self::MoveImageToPosition {
                image_url,
                position,
                ..
            } => format!("move image {image_url} to position {position}"),
            Self::SetImageLabel { image_url, .. } => format!("set label of image {image_url}"),
            Self::AddAsset { asset, .. } => format!("add asset {}", asset.key),
            Self::RemoveAsset { asset_key, .. } => format!("remove asset {asset_key}"),
            Self::ChangeAssetOrder { asset_order, .. } => {
                format!("reorder {} assets", asset_order.len())
            }
            Self::ChangeAssetName { asset_key, .. } => format!("rename asset {asset_key}"),
            Self::SetAssetDescription { asset_key, .. } => {
                format!("set description of asset {asset_key}")
            }
            Self::SetAssetTags { asset_key, .. } => format!("set tags of asset {asset_key}"),
            Self::SetAssetSources { asset_key, .. } => {
                format!("set sources of asset {asset_key}")
            }
            Self::SetAssetCustomType { asset_key, .. } => {
                format!("set custom type of asset {asset_key}")
            }
            Self::SetAssetCustomField {
                asset_key, name, ..
            } => format!("set custom field {name} of asset {asset_key}"),
            Self::ChangeValue { .. } => "change value".to_string(),
            Self::ChangeCartPredicate { cart_predicate } => {
                format!("change cart predicate to '{cart_predicate}'")
            }
            Self::ChangeTarget { .. } => "change target".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_tagged_camel_case() {
        let action = UpdateAction::ChangeMasterVariant {
            variant_key: "v2".into(),
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({ "action": "changeMasterVariant", "variantKey": "v2" })
        );

        let unset = UpdateAction::SetAttribute {
            variant_id: 1,
            name: "color".into(),
            value: None,
        };
        assert_eq!(
            serde_json::to_value(&unset).unwrap(),
            json!({ "action": "setAttribute", "variantId": 1, "name": "color" })
        );
    }

    #[test]
    fn test_wire_name_matches_tag() {
        let action = UpdateAction::RemoveImage {
            variant_id: 3,
            image_url: "https://img/1.png".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], action.name());
    }

    #[test]
    fn test_attribute_set_and_unset_classes() {
        let set = UpdateAction::SetAttribute {
            variant_id: 1,
            name: "size".into(),
            value: Some(json!("M")),
        };
        let unset = UpdateAction::SetAttribute {
            variant_id: 1,
            name: "size".into(),
            value: None,
        };
        assert_eq!(set.class(), ActionClass::SetAttribute);
        assert_eq!(unset.class(), ActionClass::UnsetAttribute);
        assert!(unset.class().is_variant_content_change());
        assert!(!ActionClass::AddVariant.is_variant_content_change());
    }
}
