//! Products and their variants

use crate::action::UpdateAction;
use crate::diff::assets::resolve_asset;
use crate::diff::prices::resolve_price;
use crate::diff::variants::build_variant_actions;
use crate::diff::{
    DiffContext, DiffError, build_localized_field, build_required_localized_field,
    build_set_field, build_set_of_strings,
};
use crate::kind::ResourceKind;
use crate::model::{
    Asset, AssetDraft, Attribute, Image, LocalizedString, Price, PriceDraft,
};
use crate::reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
use crate::replay::{
    ApplyActions, RejectedAction, apply_asset_action, field_value, next_id, required_field_value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDraft {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub prices: Vec<PriceDraft>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub assets: Vec<AssetDraft>,
}

impl VariantDraft {
    pub fn new(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Self::default()
        }
    }

    fn collect_references(&self, out: &mut Vec<ReferenceKey>) {
        for price in &self.prices {
            if let Some(key) = &price.channel_key {
                out.push(ReferenceKey::new(ReferenceKind::Channel, key));
            }
            if let Some(key) = &price.customer_group_key {
                out.push(ReferenceKey::new(ReferenceKind::CustomerGroup, key));
            }
            if let Some(custom) = &price.custom {
                out.push(ReferenceKey::new(ReferenceKind::Type, &custom.type_key));
            }
        }
        for asset in &self.assets {
            if let Some(custom) = &asset.custom {
                out.push(ReferenceKey::new(ReferenceKind::Type, &custom.type_key));
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub prices: Vec<Price>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default)]
    pub key: Option<String>,
    pub product_type_key: String,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub meta_title: Option<LocalizedString>,
    #[serde(default)]
    pub meta_description: Option<LocalizedString>,
    #[serde(default)]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default)]
    pub category_keys: BTreeSet<String>,
    #[serde(default)]
    pub tax_category_key: Option<String>,
    pub master_variant: VariantDraft,
    #[serde(default)]
    pub variants: Vec<VariantDraft>,
}

impl ProductDraft {
    pub fn new(key: &str, product_type_key: &str, name: LocalizedString, slug: LocalizedString) -> Self {
        Self {
            key: Some(key.to_string()),
            product_type_key: product_type_key.to_string(),
            name,
            slug,
            description: None,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            category_keys: BTreeSet::new(),
            tax_category_key: None,
            master_variant: VariantDraft::default(),
            variants: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub version: u64,
    pub key: String,
    pub product_type_id: String,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default)]
    pub category_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_category_id: Option<String>,
    pub master_variant: Variant,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    fn all_variants(&self) -> impl Iterator<Item = &Variant> {
        std::iter::once(&self.master_variant).chain(&self.variants)
    }

    fn all_variants_mut(&mut self) -> impl Iterator<Item = &mut Variant> {
        std::iter::once(&mut self.master_variant).chain(&mut self.variants)
    }

    fn variant_mut(&mut self, id: u32) -> Result<&mut Variant, RejectedAction> {
        self.all_variants_mut()
            .find(|v| v.id == id)
            .ok_or(RejectedAction::UnknownVariant(id))
    }

    fn price_mut(&mut self, price_id: &str) -> Result<&mut Price, RejectedAction> {
        self.all_variants_mut()
            .flat_map(|v| v.prices.iter_mut())
            .find(|p| p.id == price_id)
            .ok_or_else(|| RejectedAction::UnknownPrice(price_id.to_string()))
    }

    fn check_sku_free(&self, sku: &str, except: Option<u32>) -> Result<(), RejectedAction> {
        let taken = self
            .all_variants()
            .any(|v| Some(v.id) != except && v.sku.as_deref() == Some(sku));
        if taken {
            return Err(RejectedAction::DuplicateSku(sku.to_string()));
        }
        Ok(())
    }

    fn price_prefix(&self, variant_id: u32) -> String {
        format!("{}-v{variant_id}-price-", self.id)
    }

    fn asset_prefix(&self, variant_id: u32) -> String {
        format!("{}-v{variant_id}-asset-", self.id)
    }
}

/// Products reconciled by key, variants matched by variant key
pub struct Products;

fn resolve_category_ids(
    keys: &BTreeSet<String>,
    references: &ResolvedReferences,
) -> Result<BTreeSet<String>, DiffError> {
    keys.iter()
        .map(|k| references.require(ReferenceKind::Category, k))
        .collect()
}

impl ResourceKind for Products {
    type Draft = ProductDraft;
    type Resource = Product;

    const NAME: &'static str = "products";

    fn draft_key(draft: &ProductDraft) -> Option<&str> {
        draft.key.as_deref()
    }

    fn resource_key(resource: &Product) -> &str {
        &resource.key
    }

    fn resource_id(resource: &Product) -> &str {
        &resource.id
    }

    fn resource_version(resource: &Product) -> u64 {
        resource.version
    }

    fn references(draft: &ProductDraft) -> Vec<ReferenceKey> {
        let mut out = vec![ReferenceKey::new(
            ReferenceKind::ProductType,
            &draft.product_type_key,
        )];
        out.extend(
            draft
                .category_keys
                .iter()
                .map(|k| ReferenceKey::new(ReferenceKind::Category, k)),
        );
        if let Some(key) = &draft.tax_category_key {
            out.push(ReferenceKey::new(ReferenceKind::TaxCategory, key));
        }
        draft.master_variant.collect_references(&mut out);
        for variant in &draft.variants {
            variant.collect_references(&mut out);
        }
        out
    }

    /// Product fields first, then the variant-ordered variant actions.
    /// The product type is fixed at creation and never diffed.
    fn build_actions(
        old: &Product,
        new: &ProductDraft,
        ctx: &mut DiffContext<'_>,
    ) -> Result<Vec<UpdateAction>, DiffError> {
        let policy = ctx.policy;
        let category_ids = resolve_category_ids(&new.category_keys, ctx.references)?;
        let tax_category_id = ctx
            .references
            .require_opt(ReferenceKind::TaxCategory, new.tax_category_key.as_deref())?;

        let mut actions: Vec<UpdateAction> = [
            build_required_localized_field("name", &old.name, &new.name, &policy),
            build_required_localized_field("slug", &old.slug, &new.slug, &policy),
            build_localized_field("description", &old.description, &new.description, &policy),
            build_localized_field("metaTitle", &old.meta_title, &new.meta_title, &policy),
            build_localized_field(
                "metaDescription",
                &old.meta_description,
                &new.meta_description,
                &policy,
            ),
            build_localized_field("metaKeywords", &old.meta_keywords, &new.meta_keywords, &policy),
            build_set_of_strings("categories", &old.category_ids, &category_ids, &policy),
            build_set_field("taxCategory", &old.tax_category_id, &tax_category_id, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        actions.extend(build_variant_actions(
            &old.master_variant,
            &old.variants,
            &new.master_variant,
            &new.variants,
            ctx,
        )?);
        Ok(actions)
    }
}

fn materialize_variant(
    id: u32,
    draft: &VariantDraft,
    references: &ResolvedReferences,
    product_id: &str,
) -> Result<Variant, DiffError> {
    let prices = draft
        .prices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            resolve_price(p, references)
                .map(|price| Price::from_new(format!("{product_id}-v{id}-price-{}", i + 1), price))
        })
        .collect::<Result<_, _>>()?;
    let assets = draft
        .assets
        .iter()
        .enumerate()
        .map(|(i, a)| {
            resolve_asset(a, references)
                .map(|asset| Asset::from_new(format!("{product_id}-v{id}-asset-{}", i + 1), asset))
        })
        .collect::<Result<_, _>>()?;
    Ok(Variant {
        id,
        key: draft.key.clone(),
        sku: draft.sku.clone(),
        attributes: draft
            .attributes
            .iter()
            .filter(|a| !a.value.is_null())
            .cloned()
            .collect(),
        prices,
        images: draft.images.clone(),
        assets,
    })
}

fn apply_product_field(
    product: &mut Product,
    field: &str,
    value: &Option<serde_json::Value>,
) -> Result<(), RejectedAction> {
    match field {
        "name" => product.name = required_field_value(field, value)?,
        "slug" => product.slug = required_field_value(field, value)?,
        "description" => product.description = field_value(field, value)?,
        "metaTitle" => product.meta_title = field_value(field, value)?,
        "metaDescription" => product.meta_description = field_value(field, value)?,
        "metaKeywords" => product.meta_keywords = field_value(field, value)?,
        "categories" => product.category_ids = field_value(field, value)?.unwrap_or_default(),
        "taxCategory" => product.tax_category_id = field_value(field, value)?,
        other => return Err(RejectedAction::UnknownField(other.to_string())),
    }
    Ok(())
}

fn apply_variant_action(
    product: &mut Product,
    action: &UpdateAction,
) -> Result<(), RejectedAction> {
    match action {
        UpdateAction::AddVariant {
            key,
            sku,
            attributes,
            prices,
            images,
            assets,
        } => {
            if product.all_variants().any(|v| v.key.as_deref() == Some(key.as_str())) {
                return Err(RejectedAction::DuplicateVariantKey(key.clone()));
            }
            if let Some(sku) = sku {
                product.check_sku_free(sku, None)?;
            }
            let id = product.all_variants().map(|v| v.id).max().unwrap_or(0) + 1;
            let variant = Variant {
                id,
                key: Some(key.clone()),
                sku: sku.clone(),
                attributes: attributes.clone(),
                prices: prices
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        Price::from_new(format!("{}{}", product.price_prefix(id), i + 1), p.clone())
                    })
                    .collect(),
                images: images.clone(),
                assets: assets
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        Asset::from_new(format!("{}{}", product.asset_prefix(id), i + 1), a.clone())
                    })
                    .collect(),
            };
            product.variants.push(variant);
        }
        UpdateAction::RemoveVariant { id } => {
            if product.master_variant.id == *id {
                return Err(RejectedAction::RemoveMasterVariant(*id));
            }
            let index = product
                .variants
                .iter()
                .position(|v| v.id == *id)
                .ok_or(RejectedAction::UnknownVariant(*id))?;
            product.variants.remove(index);
        }
        UpdateAction::ChangeMasterVariant { variant_key } => {
            if product.master_variant.key.as_deref() == Some(variant_key.as_str()) {
                return Ok(());
            }
            let index = product
                .variants
                .iter()
                .position(|v| v.key.as_deref() == Some(variant_key.as_str()))
                .ok_or_else(|| RejectedAction::UnknownVariantKey(variant_key.clone()))?;
            let promoted = product.variants.remove(index);
            let demoted = std::mem::replace(&mut product.master_variant, promoted);
            product.variants.push(demoted);
        }
        UpdateAction::SetSku { variant_id, sku } => {
            if let Some(sku) = sku {
                product.check_sku_free(sku, Some(*variant_id))?;
            }
            product.variant_mut(*variant_id)?.sku = sku.clone();
        }
        UpdateAction::SetAttribute {
            variant_id,
            name,
            value,
        } => {
            let variant = product.variant_mut(*variant_id)?;
            variant.attributes.retain(|a| &a.name != name);
            if let Some(value) = value.as_ref().filter(|v| !v.is_null()) {
                variant.attributes.push(Attribute::new(name, value.clone()));
            }
        }
        _ => return Err(RejectedAction::Unsupported("product variants")),
    }
    Ok(())
}

fn apply_price_action(product: &mut Product, action: &UpdateAction) -> Result<(), RejectedAction> {
    match action {
        UpdateAction::AddPrice { variant_id, price } => {
            let prefix = product.price_prefix(*variant_id);
            let variant = product.variant_mut(*variant_id)?;
            if variant.prices.iter().any(|p| p.scope() == price.scope()) {
                return Err(RejectedAction::DuplicatePriceScope(*variant_id));
            }
            let id = next_id(&prefix, variant.prices.iter().map(|p| p.id.as_str()));
            variant.prices.push(Price::from_new(id, price.clone()));
        }
        UpdateAction::RemovePrice { price_id } => {
            let variant = product
                .all_variants_mut()
                .find(|v| v.prices.iter().any(|p| &p.id == price_id))
                .ok_or_else(|| RejectedAction::UnknownPrice(price_id.clone()))?;
            variant.prices.retain(|p| &p.id != price_id);
        }
        UpdateAction::ChangePrice { price_id, value } => {
            let price = product.price_mut(price_id)?;
            if price.value.currency_code != value.currency_code {
                return Err(RejectedAction::PriceCurrencyMismatch(price_id.clone()));
            }
            price.value = value.clone();
        }
        UpdateAction::SetPriceCustomType { price_id, custom } => {
            product.price_mut(price_id)?.custom = custom.clone();
        }
        UpdateAction::SetPriceCustomField {
            price_id,
            name,
            value,
        } => crate::replay::apply_custom_field(
            &mut product.price_mut(price_id)?.custom,
            name,
            value.clone(),
        )?,
        _ => return Err(RejectedAction::Unsupported("prices")),
    }
    Ok(())
}

fn apply_image_action(product: &mut Product, action: &UpdateAction) -> Result<(), RejectedAction> {
    let (variant_id, url) = match action {
        UpdateAction::AddExternalImage { variant_id, image } => (*variant_id, &image.url),
        UpdateAction::RemoveImage {
            variant_id,
            image_url,
        }
        | UpdateAction::MoveImageToPosition {
            variant_id,
            image_url,
            ..
        }
        | UpdateAction::SetImageLabel {
            variant_id,
            image_url,
            ..
        } => (*variant_id, image_url),
        _ => return Err(RejectedAction::Unsupported("images")),
    };
    let images = &mut product.variant_mut(variant_id)?.images;
    let index = images.iter().position(|i| &i.url == url);

    match (action, index) {
        (UpdateAction::AddExternalImage { .. }, Some(_)) => {
            return Err(RejectedAction::DuplicateImage {
                variant_id,
                url: url.clone(),
            });
        }
        (UpdateAction::AddExternalImage { image, .. }, None) => images.push(image.clone()),
        (_, None) => {
            return Err(RejectedAction::UnknownImage {
                variant_id,
                url: url.clone(),
            });
        }
        (UpdateAction::RemoveImage { .. }, Some(i)) => {
            images.remove(i);
        }
        (UpdateAction::MoveImageToPosition { position, .. }, Some(i)) => {
            if *position >= images.len() {
                return Err(RejectedAction::PositionOutOfRange {
                    position: *position,
                    len: images.len(),
                });
            }
            let image = images.remove(i);
            images.insert(*position, image);
        }
        (UpdateAction::SetImageLabel { label, .. }, Some(i)) => images[i].label = label.clone(),
        _ => return Err(RejectedAction::Unsupported("images")),
    }
    Ok(())
}

impl ApplyActions for Products {
    fn materialize(
        draft: &ProductDraft,
        references: &ResolvedReferences,
        id: String,
    ) -> Result<Product, DiffError> {
        let master_variant = materialize_variant(1, &draft.master_variant, references, &id)?;
        let variants = draft
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| materialize_variant(i as u32 + 2, v, references, &id))
            .collect::<Result<_, _>>()?;

        Ok(Product {
            product_type_id: references.require(ReferenceKind::ProductType, &draft.product_type_key)?,
            key: draft.key.clone().unwrap_or_default(),
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            description: draft.description.clone(),
            meta_title: draft.meta_title.clone(),
            meta_description: draft.meta_description.clone(),
            meta_keywords: draft.meta_keywords.clone(),
            category_ids: resolve_category_ids(&draft.category_keys, references)?,
            tax_category_id: references
                .require_opt(ReferenceKind::TaxCategory, draft.tax_category_key.as_deref())?,
            master_variant,
            variants,
            version: 1,
            id,
        })
    }

    fn apply_action(product: &mut Product, action: &UpdateAction) -> Result<(), RejectedAction> {
        match action {
            UpdateAction::SetField { field, value } => apply_product_field(product, field, value),
            UpdateAction::AddVariant { .. }
            | UpdateAction::RemoveVariant { .. }
            | UpdateAction::ChangeMasterVariant { .. }
            | UpdateAction::SetSku { .. }
            | UpdateAction::SetAttribute { .. } => apply_variant_action(product, action),
            UpdateAction::AddPrice { .. }
            | UpdateAction::RemovePrice { .. }
            | UpdateAction::ChangePrice { .. }
            | UpdateAction::SetPriceCustomType { .. }
            | UpdateAction::SetPriceCustomField { .. } => apply_price_action(product, action),
            UpdateAction::AddExternalImage { .. }
            | UpdateAction::RemoveImage { .. }
            | UpdateAction::MoveImageToPosition { .. }
            | UpdateAction::SetImageLabel { .. } => apply_image_action(product, action),
            UpdateAction::AddAsset { variant_id, .. }
            | UpdateAction::RemoveAsset { variant_id, .. }
            | UpdateAction::ChangeAssetOrder { variant_id, .. }
            | UpdateAction::ChangeAssetName { variant_id, .. }
            | UpdateAction::SetAssetDescription { variant_id, .. }
            | UpdateAction::SetAssetTags { variant_id, .. }
            | UpdateAction::SetAssetSources { variant_id, .. }
            | UpdateAction::SetAssetCustomType { variant_id, .. }
            | UpdateAction::SetAssetCustomField { variant_id, .. } => {
                let variant_id = variant_id.ok_or(RejectedAction::Unsupported("products"))?;
                let prefix = product.asset_prefix(variant_id);
                apply_asset_action(&mut product.variant_mut(variant_id)?.assets, action, &prefix)
            }
            UpdateAction::SetCustomType { .. }
            | UpdateAction::SetCustomField { .. }
            | UpdateAction::ChangeValue { .. }
            | UpdateAction::ChangeCartPredicate { .. }
            | UpdateAction::ChangeTarget { .. } => Err(RejectedAction::Unsupported("products")),
        }
    }

    fn bump_version(product: &mut Product) {
        product.version += 1;
    }
}
