//! Inventory entries

use crate::action::UpdateAction;
use crate::diff::custom::{build_resource_custom_actions, resolve_custom_opt};
use crate::diff::{DiffContext, DiffError, build_required_field, build_set_field};
use crate::kind::ResourceKind;
use crate::model::{CustomFields, CustomFieldsDraft};
use crate::reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
use crate::replay::{
    ApplyActions, RejectedAction, apply_custom_field, apply_custom_type, field_value,
    required_field_value,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntryDraft {
    #[serde(default)]
    pub key: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub supply_channel_key: Option<String>,
    pub quantity_on_stock: i64,
    #[serde(default)]
    pub restockable_in_days: Option<u32>,
    #[serde(default)]
    pub expected_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom: Option<CustomFieldsDraft>,
}

impl InventoryEntryDraft {
    pub fn new(key: &str, sku: &str, quantity_on_stock: i64) -> Self {
        Self {
            key: Some(key.to_string()),
            sku: sku.to_string(),
            supply_channel_key: None,
            quantity_on_stock,
            restockable_in_days: None,
            expected_delivery: None,
            custom: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: String,
    pub version: u64,
    pub key: String,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_channel_id: Option<String>,
    pub quantity_on_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restockable_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

pub struct Inventories;

impl ResourceKind for Inventories {
    type Draft = InventoryEntryDraft;
    type Resource = InventoryEntry;

    const NAME: &'static str = "inventory entries";

    fn draft_key(draft: &InventoryEntryDraft) -> Option<&str> {
        draft.key.as_deref()
    }

    fn resource_key(resource: &InventoryEntry) -> &str {
        &resource.key
    }

    fn resource_id(resource: &InventoryEntry) -> &str {
        &resource.id
    }

    fn resource_version(resource: &InventoryEntry) -> u64 {
        resource.version
    }

    fn references(draft: &InventoryEntryDraft) -> Vec<ReferenceKey> {
        let mut out = Vec::new();
        if let Some(channel) = &draft.supply_channel_key {
            out.push(ReferenceKey::new(ReferenceKind::Channel, channel));
        }
        if let Some(custom) = &draft.custom {
            out.push(ReferenceKey::new(ReferenceKind::Type, &custom.type_key));
        }
        out
    }

    /// The sku of an entry is fixed once created; a differing sku is
    /// reported as a warning.
    fn build_actions(
        old: &InventoryEntry,
        new: &InventoryEntryDraft,
        ctx: &mut DiffContext<'_>,
    ) -> Result<Vec<UpdateAction>, DiffError> {
        let policy = ctx.policy;
        let supply_channel_id = ctx
            .references
            .require_opt(ReferenceKind::Channel, new.supply_channel_key.as_deref())?;

        if old.sku != new.sku {
            ctx.warn(format!(
                "inventory entry '{}': sku cannot change from '{}' to '{}'",
                old.key, old.sku, new.sku
            ));
        }

        let mut actions: Vec<UpdateAction> = [
            build_required_field("quantityOnStock", &old.quantity_on_stock, &new.quantity_on_stock),
            build_set_field(
                "restockableInDays",
                &old.restockable_in_days,
                &new.restockable_in_days,
                &policy,
            ),
            build_set_field(
                "expectedDelivery",
                &old.expected_delivery,
                &new.expected_delivery,
                &policy,
            ),
            build_set_field("supplyChannel", &old.supply_channel_id, &supply_channel_id, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        actions.extend(build_resource_custom_actions(
            old.custom.as_ref(),
            new.custom.as_ref(),
            ctx,
        )?);
        Ok(actions)
    }
}

impl ApplyActions for Inventories {
    fn materialize(
        draft: &InventoryEntryDraft,
        references: &ResolvedReferences,
        id: String,
    ) -> Result<InventoryEntry, DiffError> {
        Ok(InventoryEntry {
            key: draft.key.clone().unwrap_or_default(),
            sku: draft.sku.clone(),
            supply_channel_id: references
                .require_opt(ReferenceKind::Channel, draft.supply_channel_key.as_deref())?,
            quantity_on_stock: draft.quantity_on_stock,
            restockable_in_days: draft.restockable_in_days,
            expected_delivery: draft.expected_delivery,
            custom: resolve_custom_opt(draft.custom.as_ref(), references)?,
            version: 1,
            id,
        })
    }

    fn apply_action(
        entry: &mut InventoryEntry,
        action: &UpdateAction,
    ) -> Result<(), RejectedAction> {
        match action {
            UpdateAction::SetField { field, value } => match field.as_str() {
                "quantityOnStock" => entry.quantity_on_stock = required_field_value(field, value)?,
                "restockableInDays" => entry.restockable_in_days = field_value(field, value)?,
                "expectedDelivery" => entry.expected_delivery = field_value(field, value)?,
                "supplyChannel" => entry.supply_channel_id = field_value(field, value)?,
                other => return Err(RejectedAction::UnknownField(other.to_string())),
            },
            UpdateAction::SetCustomType { custom } => {
                apply_custom_type(&mut entry.custom, custom.clone());
            }
            UpdateAction::SetCustomField { name, value } => {
                apply_custom_field(&mut entry.custom, name, value.clone())?;
            }
            _ => return Err(RejectedAction::Unsupported("inventory entries")),
        }
        Ok(())
    }

    fn bump_version(entry: &mut InventoryEntry) {
        entry.version += 1;
    }
}
