//! Categories

use crate::action::UpdateAction;
use crate::diff::assets::{build_asset_actions, resolve_asset};
use crate::diff::custom::{build_resource_custom_actions, resolve_custom_opt};
use crate::diff::{
    DiffContext, DiffError, build_localized_field, build_required_localized_field,
    build_set_field,
};
use crate::kind::ResourceKind;
use crate::model::{Asset, AssetDraft, CustomFields, CustomFieldsDraft, LocalizedString};
use crate::orderer::order_asset_actions;
use crate::reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
use crate::replay::{
    ApplyActions, RejectedAction, apply_asset_action, apply_custom_field, apply_custom_type,
    field_value, required_field_value,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    #[serde(default)]
    pub key: Option<String>,
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
    pub parent_key: Option<String>,
    #[serde(default)]
    pub order_hint: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetDraft>,
    #[serde(default)]
    pub custom: Option<CustomFieldsDraft>,
}

impl CategoryDraft {
    pub fn new(key: &str, name: LocalizedString, slug: LocalizedString) -> Self {
        Self {
            key: Some(key.to_string()),
            name,
            slug,
            description: None,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            parent_key: None,
            order_hint: None,
            external_id: None,
            assets: Vec::new(),
            custom: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub version: u64,
    pub key: String,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

pub struct Categories;

impl ResourceKind for Categories {
    type Draft = CategoryDraft;
    type Resource = Category;

    const NAME: &'static str = "categories";
    const SELF_REFERENCE: Option<ReferenceKind> = Some(ReferenceKind::Category);

    fn draft_key(draft: &CategoryDraft) -> Option<&str> {
        draft.key.as_deref()
    }

    fn resource_key(resource: &Category) -> &str {
        &resource.key
    }

    fn resource_id(resource: &Category) -> &str {
        &resource.id
    }

    fn resource_version(resource: &Category) -> u64 {
        resource.version
    }

    fn references(draft: &CategoryDraft) -> Vec<ReferenceKey> {
        let mut out = Vec::new();
        if let Some(parent) = &draft.parent_key {
            out.push(ReferenceKey::new(ReferenceKind::Category, parent));
        }
        if let Some(custom) = &draft.custom {
            out.push(ReferenceKey::new(ReferenceKind::Type, &custom.type_key));
        }
        out.extend(
            draft
                .assets
                .iter()
                .filter_map(|a| a.custom.as_ref())
                .map(|c| ReferenceKey::new(ReferenceKind::Type, &c.type_key)),
        );
        out
    }

    fn build_actions(
        old: &Category,
        new: &CategoryDraft,
        ctx: &mut DiffContext<'_>,
    ) -> Result<Vec<UpdateAction>, DiffError> {
        let policy = ctx.policy;
        let parent_id = ctx
            .references
            .require_opt(ReferenceKind::Category, new.parent_key.as_deref())?;

        let mut actions: Vec<UpdateAction> = [
            build_required_localized_field("name", &old.name, &new.name, &policy),
            build_required_localized_field("slug", &old.slug, &new.slug, &policy),
            build_localized_field("description", &old.description, &new.description, &policy),
            build_set_field("parent", &old.parent_id, &parent_id, &policy),
            build_set_field("orderHint", &old.order_hint, &new.order_hint, &policy),
            build_set_field("externalId", &old.external_id, &new.external_id, &policy),
            build_localized_field("metaTitle", &old.meta_title, &new.meta_title, &policy),
            build_localized_field(
                "metaDescription",
                &old.meta_description,
                &new.meta_description,
                &policy,
            ),
            build_localized_field("metaKeywords", &old.meta_keywords, &new.meta_keywords, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut assets = build_asset_actions(None, &old.assets, &new.assets, ctx)?;
        order_asset_actions(&mut assets);
        actions.append(&mut assets);

        actions.extend(build_resource_custom_actions(
            old.custom.as_ref(),
            new.custom.as_ref(),
            ctx,
        )?);
        Ok(actions)
    }
}

fn apply_category_field(
    category: &mut Category,
    field: &str,
    value: &Option<Value>,
) -> Result<(), RejectedAction> {
    match field {
        "name" => category.name = required_field_value(field, value)?,
        "slug" => category.slug = required_field_value(field, value)?,
        "description" => category.description = field_value(field, value)?,
        "parent" => category.parent_id = field_value(field, value)?,
        "orderHint" => category.order_hint = field_value(field, value)?,
        "externalId" => category.external_id = field_value(field, value)?,
        "metaTitle" => category.meta_title = field_value(field, value)?,
        "metaDescription" => category.meta_description = field_value(field, value)?,
        "metaKeywords" => category.meta_keywords = field_value(field, value)?,
        other => return Err(RejectedAction::UnknownField(other.to_string())),
    }
    Ok(())
}

impl ApplyActions for Categories {
    fn materialize(
        draft: &CategoryDraft,
        references: &ResolvedReferences,
        id: String,
    ) -> Result<Category, DiffError> {
        let assets = draft
            .assets
            .iter()
            .enumerate()
            .map(|(i, a)| {
                resolve_asset(a, references).map(|asset| Asset::from_new(format!("{id}-asset-{}", i + 1), asset))
            })
            .collect::<Result<_, _>>()?;

        Ok(Category {
            key: draft.key.clone().unwrap_or_default(),
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            description: draft.description.clone(),
            meta_title: draft.meta_title.clone(),
            meta_description: draft.meta_description.clone(),
            meta_keywords: draft.meta_keywords.clone(),
            parent_id: references.require_opt(ReferenceKind::Category, draft.parent_key.as_deref())?,
            order_hint: draft.order_hint.clone(),
            external_id: draft.external_id.clone(),
            assets,
            custom: resolve_custom_opt(draft.custom.as_ref(), references)?,
            version: 1,
            id,
        })
    }

    fn apply_action(category: &mut Category, action: &UpdateAction) -> Result<(), RejectedAction> {
        match action {
            UpdateAction::SetField { field, value } => apply_category_field(category, field, value),
            UpdateAction::SetCustomType { custom } => {
                apply_custom_type(&mut category.custom, custom.clone());
                Ok(())
            }
            UpdateAction::SetCustomField { name, value } => {
                apply_custom_field(&mut category.custom, name, value.clone())
            }
            UpdateAction::AddAsset { variant_id: None, .. }
            | UpdateAction::RemoveAsset { variant_id: None, .. }
            | UpdateAction::ChangeAssetOrder { variant_id: None, .. }
            | UpdateAction::ChangeAssetName { variant_id: None, .. }
            | UpdateAction::SetAssetDescription { variant_id: None, .. }
            | UpdateAction::SetAssetTags { variant_id: None, .. }
            | UpdateAction::SetAssetSources { variant_id: None, .. }
            | UpdateAction::SetAssetCustomType { variant_id: None, .. }
            | UpdateAction::SetAssetCustomField { variant_id: None, .. } => {
                let prefix = format!("{}-asset-", category.id);
                apply_asset_action(&mut category.assets, action, &prefix)
            }
            _ => Err(RejectedAction::Unsupported("categories")),
        }
    }

    fn bump_version(category: &mut Category) {
        category.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::RemovalPolicy;
    use serde_json::json;

    fn refs() -> ResolvedReferences {
        let mut refs = ResolvedReferences::new();
        refs.insert(ReferenceKind::Category, "root", "cat-root");
        refs.insert(ReferenceKind::Type, "cat-fields", "type-1");
        refs
    }

    fn draft() -> CategoryDraft {
        let mut draft = CategoryDraft::new(
            "shoes",
            LocalizedString::of("en", "Shoes"),
            LocalizedString::of("en", "shoes"),
        );
        draft.parent_key = Some("root".into());
        draft.order_hint = Some("0.5".into());
        draft.assets = vec![
            AssetDraft::new("banner", LocalizedString::of("en", "Banner")),
            AssetDraft::new("icon", LocalizedString::of("en", "Icon")),
        ];
        draft
    }

    #[test]
    fn test_round_trip_through_replay() {
        let refs = refs();
        let category = Categories::materialize(&draft(), &refs, "c1".into()).unwrap();
        assert_eq!(category.parent_id.as_deref(), Some("cat-root"));

        let mut changed = draft();
        changed.order_hint = None;
        changed.assets.reverse();
        changed.custom = Some(CustomFieldsDraft::new("cat-fields").with_field("badge", json!("new")));

        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let actions = Categories::build_actions(&category, &changed, &mut ctx).unwrap();
        let names: Vec<_> = actions.iter().map(UpdateAction::name).collect();
        assert_eq!(names, vec!["setField", "changeAssetOrder", "setCustomType"]);

        let updated = Categories::replay(&category, &actions).unwrap();
        assert_eq!(updated.order_hint, None);
        assert_eq!(updated.assets[0].key, "icon");

        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let again = Categories::build_actions(&updated, &changed, &mut ctx).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_variant_asset_actions_rejected() {
        let mut category = Categories::materialize(&draft(), &refs(), "c1".into()).unwrap();
        let err = Categories::apply_action(
            &mut category,
            &UpdateAction::RemoveAsset {
                variant_id: Some(1),
                asset_key: "banner".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err, RejectedAction::Unsupported("categories"));
    }
}
