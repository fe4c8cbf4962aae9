//! Cart discounts

use crate::action::UpdateAction;
use crate::diff::custom::{build_resource_custom_actions, resolve_custom_opt};
use crate::diff::{
    DiffContext, DiffError, build_localized_field, build_required_field,
    build_required_localized_field, build_set_field,
};
use crate::kind::ResourceKind;
use crate::model::{CustomFields, CustomFieldsDraft, LocalizedString, Money};
use crate::reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
use crate::replay::{
    ApplyActions, RejectedAction, apply_custom_field, apply_custom_type, field_value,
    required_field_value,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much a cart discount takes off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CartDiscountValue {
    /// Percentage in hundredths of a percent
    Relative { permyriad: u32 },
    /// Fixed amount, one entry per currency
    Absolute { money: Vec<Money> },
}

/// What part of the cart the discount applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CartDiscountTarget {
    LineItems { predicate: String },
    CustomLineItems { predicate: String },
    Shipping,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackingMode {
    #[default]
    Stacking,
    StopAfterThisDiscount,
}

const fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscountDraft {
    #[serde(default)]
    pub key: Option<String>,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    pub value: CartDiscountValue,
    pub cart_predicate: String,
    pub target: CartDiscountTarget,
    pub sort_order: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requires_discount_code: bool,
    #[serde(default)]
    pub stacking_mode: StackingMode,
    #[serde(default)]
    pub custom: Option<CustomFieldsDraft>,
}

impl CartDiscountDraft {
    pub fn new(
        key: &str,
        name: LocalizedString,
        value: CartDiscountValue,
        cart_predicate: &str,
        target: CartDiscountTarget,
        sort_order: &str,
    ) -> Self {
        Self {
            key: Some(key.to_string()),
            name,
            description: None,
            value,
            cart_predicate: cart_predicate.to_string(),
            target,
            sort_order: sort_order.to_string(),
            is_active: true,
            valid_from: None,
            valid_until: None,
            requires_discount_code: false,
            stacking_mode: StackingMode::default(),
            custom: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscount {
    pub id: String,
    pub version: u64,
    pub key: String,
    pub name: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub value: CartDiscountValue,
    pub cart_predicate: String,
    pub target: CartDiscountTarget,
    pub sort_order: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub requires_discount_code: bool,
    pub stacking_mode: StackingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
}

pub struct CartDiscounts;

impl ResourceKind for CartDiscounts {
    type Draft = CartDiscountDraft;
    type Resource = CartDiscount;

    const NAME: &'static str = "cart discounts";

    fn draft_key(draft: &CartDiscountDraft) -> Option<&str> {
        draft.key.as_deref()
    }

    fn resource_key(resource: &CartDiscount) -> &str {
        &resource.key
    }

    fn resource_id(resource: &CartDiscount) -> &str {
        &resource.id
    }

    fn resource_version(resource: &CartDiscount) -> u64 {
        resource.version
    }

    fn references(draft: &CartDiscountDraft) -> Vec<ReferenceKey> {
        draft
            .custom
            .iter()
            .map(|c| ReferenceKey::new(ReferenceKind::Type, &c.type_key))
            .collect()
    }

    fn build_actions(
        old: &CartDiscount,
        new: &CartDiscountDraft,
        ctx: &mut DiffContext<'_>,
    ) -> Result<Vec<UpdateAction>, DiffError> {
        let policy = ctx.policy;
        let mut actions = Vec::new();

        if old.value != new.value {
            actions.push(UpdateAction::ChangeValue {
                value: new.value.clone(),
            });
        }
        if old.cart_predicate != new.cart_predicate {
            actions.push(UpdateAction::ChangeCartPredicate {
                cart_predicate: new.cart_predicate.clone(),
            });
        }
        if old.target != new.target {
            actions.push(UpdateAction::ChangeTarget {
                target: new.target.clone(),
            });
        }

        actions.extend(
            [
                build_required_field("isActive", &old.is_active, &new.is_active),
                build_required_localized_field("name", &old.name, &new.name, &policy),
                build_localized_field("description", &old.description, &new.description, &policy),
                build_required_field("sortOrder", &old.sort_order, &new.sort_order),
                build_required_field(
                    "requiresDiscountCode",
                    &old.requires_discount_code,
                    &new.requires_discount_code,
                ),
                build_set_field("validFrom", &old.valid_from, &new.valid_from, &policy),
                build_set_field("validUntil", &old.valid_until, &new.valid_until, &policy),
                build_required_field("stackingMode", &old.stacking_mode, &new.stacking_mode),
            ]
            .into_iter()
            .flatten(),
        );

        actions.extend(build_resource_custom_actions(
            old.custom.as_ref(),
            new.custom.as_ref(),
            ctx,
        )?);
        Ok(actions)
    }
}

fn apply_cart_discount_field(
    discount: &mut CartDiscount,
    field: &str,
    value: &Option<Value>,
) -> Result<(), RejectedAction> {
    match field {
        "isActive" => discount.is_active = required_field_value(field, value)?,
        "name" => discount.name = required_field_value(field, value)?,
        "description" => discount.description = field_value(field, value)?,
        "sortOrder" => discount.sort_order = required_field_value(field, value)?,
        "requiresDiscountCode" => {
            discount.requires_discount_code = required_field_value(field, value)?;
        }
        "validFrom" => discount.valid_from = field_value(field, value)?,
        "validUntil" => discount.valid_until = field_value(field, value)?,
        "stackingMode" => discount.stacking_mode = required_field_value(field, value)?,
        other => return Err(RejectedAction::UnknownField(other.to_string())),
    }
    Ok(())
}

impl ApplyActions for CartDiscounts {
    fn materialize(
        draft: &CartDiscountDraft,
        references: &ResolvedReferences,
        id: String,
    ) -> Result<CartDiscount, DiffError> {
        Ok(CartDiscount {
            key: draft.key.clone().unwrap_or_default(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            value: draft.value.clone(),
            cart_predicate: draft.cart_predicate.clone(),
            target: draft.target.clone(),
            sort_order: draft.sort_order.clone(),
            is_active: draft.is_active,
            valid_from: draft.valid_from,
            valid_until: draft.valid_until,
            requires_discount_code: draft.requires_discount_code,
            stacking_mode: draft.stacking_mode,
            custom: resolve_custom_opt(draft.custom.as_ref(), references)?,
            version: 1,
            id,
        })
    }

    fn apply_action(
        discount: &mut CartDiscount,
        action: &UpdateAction,
    ) -> Result<(), RejectedAction> {
        match action {
            UpdateAction::SetField { field, value } => {
                apply_cart_discount_field(discount, field, value)?;
            }
            UpdateAction::ChangeValue { value } => discount.value = value.clone(),
            UpdateAction::ChangeCartPredicate { cart_predicate } => {
                discount.cart_predicate = cart_predicate.clone();
            }
            UpdateAction::ChangeTarget { target } => discount.target = target.clone(),
            UpdateAction::SetCustomType { custom } => {
                apply_custom_type(&mut discount.custom, custom.clone());
            }
            UpdateAction::SetCustomField { name, value } => {
                apply_custom_field(&mut discount.custom, name, value.clone())?;
            }
            _ => return Err(RejectedAction::Unsupported("cart discounts")),
        }
        Ok(())
    }

    fn bump_version(discount: &mut CartDiscount) {
        discount.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::RemovalPolicy;
    use serde_json::json;

    #[test]
    fn test_value_serializes_with_type_tag() {
        let value = CartDiscountValue::Relative { permyriad: 1000 };
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({ "type": "relative", "permyriad": 1000 })
        );
        let target: CartDiscountTarget = serde_json::from_value(json!({ "type": "shipping" })).unwrap();
        assert_eq!(target, CartDiscountTarget::Shipping);
    }

    #[test]
    fn test_builder_order() {
        let mut refs = ResolvedReferences::new();
        refs.insert(ReferenceKind::Type, "promo", "type-1");

        let draft = CartDiscountDraft::new(
            "summer",
            LocalizedString::of("en", "Summer"),
            CartDiscountValue::Relative { permyriad: 1000 },
            "totalPrice > \"10.00 EUR\"",
            CartDiscountTarget::Shipping,
            "0.3",
        );
        let existing = CartDiscounts::materialize(&draft, &refs, "cd-1".into()).unwrap();

        let mut changed = draft.clone();
        changed.is_active = false;
        changed.custom = Some(CustomFieldsDraft::new("promo"));
        changed.value = CartDiscountValue::Absolute {
            money: vec![Money::new("EUR", 500)],
        };

        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let actions = CartDiscounts::build_actions(&existing, &changed, &mut ctx).unwrap();
        let names: Vec<_> = actions.iter().map(UpdateAction::name).collect();
        assert_eq!(names, vec!["changeValue", "setField", "setCustomType"]);

        let updated = CartDiscounts::replay(&existing, &actions).unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.custom.map(|c| c.type_id), Some("type-1".to_string()));
    }
}
