//! Variant price diffing; prices are matched by scope

use super::custom::{build_custom_actions, resolve_custom_opt};
use super::{DiffContext, DiffError};
use crate::action::UpdateAction;
use crate::model::{NewPrice, Price, PriceDraft, PriceScope};
use crate::reference::{ReferenceKind, ResolvedReferences};
use std::collections::HashSet;

/// Resolve the keys of a draft price
pub fn resolve_price(
    draft: &PriceDraft,
    references: &ResolvedReferences,
) -> Result<NewPrice, DiffError> {
    Ok(NewPrice {
        value: draft.value.clone(),
        country: draft.country.clone(),
        channel_id: references.require_opt(ReferenceKind::Channel, draft.channel_key.as_deref())?,
        customer_group_id: references
            .require_opt(ReferenceKind::CustomerGroup, draft.customer_group_key.as_deref())?,
        valid_from: draft.valid_from,
        valid_until: draft.valid_until,
        custom: resolve_custom_opt(draft.custom.as_ref(), references)?,
    })
}

pub fn build_price_actions(
    variant_id: u32,
    old: &[Price],
    new: &[PriceDraft],
    ctx: &mut DiffContext<'_>,
) -> Result<Vec<UpdateAction>, DiffError> {
    let mut actions = Vec::new();
    let mut seen: HashSet<PriceScope> = HashSet::new();
    let mut matched_ids: HashSet<&str> = HashSet::new();

    for draft in new {
        let price = resolve_price(draft, ctx.references)?;
        let scope = price.scope();
        if !seen.insert(scope.clone()) {
            ctx.warn(format!(
                "variant {variant_id}: ignoring duplicate {} price for the same scope",
                price.value.currency_code
            ));
            continue;
        }

        match old.iter().find(|p| p.scope() == scope) {
            Some(existing) => {
                matched_ids.insert(existing.id.as_str());
                if existing.value != price.value {
                    actions.push(UpdateAction::ChangePrice {
                        price_id: existing.id.clone(),
                        value: price.value.clone(),
                    });
                }
                let price_id = existing.id.clone();
                actions.extend(build_custom_actions(
                    existing.custom.as_ref(),
                    draft.custom.as_ref(),
                    ctx,
                    |custom| UpdateAction::SetPriceCustomType {
                        price_id: price_id.clone(),
                        custom,
                    },
                    |name, value| UpdateAction::SetPriceCustomField {
                        price_id: price_id.clone(),
                        name,
                        value,
                    },
                )?);
            }
            None => actions.push(UpdateAction::AddPrice { variant_id, price }),
        }
    }

    if ctx.policy.remove_other_collection_entries {
        actions.extend(
            old.iter()
                .filter(|p| !matched_ids.contains(p.id.as_str()))
                .map(|p| UpdateAction::RemovePrice {
                    price_id: p.id.clone(),
                }),
        );
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::RemovalPolicy;
    use crate::model::Money;

    fn stored(id: &str, currency: &str, amount: i64, country: Option<&str>) -> Price {
        Price {
            id: id.into(),
            value: Money::new(currency, amount),
            country: country.map(str::to_string),
            channel_id: None,
            customer_group_id: None,
            valid_from: None,
            valid_until: None,
            custom: None,
        }
    }

    fn draft(currency: &str, amount: i64, country: Option<&str>) -> PriceDraft {
        PriceDraft {
            country: country.map(str::to_string),
            ..PriceDraft::new(Money::new(currency, amount))
        }
    }

    #[test]
    fn test_change_add_remove() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let old = vec![
            stored("p1", "EUR", 100, Some("DE")),
            stored("p2", "USD", 120, None),
        ];
        let new = vec![draft("EUR", 90, Some("DE")), draft("GBP", 80, None)];

        let actions = build_price_actions(1, &old, &new, &mut ctx).unwrap();
        let names: Vec<_> = actions.iter().map(UpdateAction::name).collect();
        assert_eq!(names, vec!["changePrice", "addPrice", "removePrice"]);
        assert_eq!(
            actions[2],
            UpdateAction::RemovePrice {
                price_id: "p2".into()
            }
        );
    }

    #[test]
    fn test_channel_key_must_resolve() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let new = vec![PriceDraft {
            channel_key: Some("store-1".into()),
            ..PriceDraft::new(Money::new("EUR", 1))
        }];
        let err = build_price_actions(1, &[], &new, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            DiffError::UnresolvedReference {
                kind: ReferenceKind::Channel,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_scope_warns() {
        let refs = ResolvedReferences::new();
        let mut ctx = DiffContext::new(&refs, RemovalPolicy::default());
        let new = vec![draft("EUR", 1, None), draft("EUR", 2, None)];
        let actions = build_price_actions(1, &[], &new, &mut ctx).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(ctx.take_warnings().len(), 1);
    }
}
