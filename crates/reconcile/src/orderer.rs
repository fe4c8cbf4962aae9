//! Action ordering - priority tables applied with a stable sort
//!
//! The platform applies an update's actions one after the other and rejects
//! the whole update when any intermediate state is invalid: a variant cannot
//! be removed while it is the master, an image cannot be moved before it was
//! added, two prices cannot share a scope. Each table below assigns a
//! priority class; actions keep their relative order within a class.

use crate::action::{ActionClass, UpdateAction};

/// Stable sort of `actions` by the priority `rank` assigns
fn order_by(actions: &mut [UpdateAction], rank: impl Fn(ActionClass) -> u8) {
    actions.sort_by_key(|action| rank(action.class()));
}

/// Order the full variant-level action list of a product.
///
/// `master_id` is the id of the existing master variant. Removing it must
/// wait until another variant has been promoted.
pub fn order_variant_actions(actions: &mut [UpdateAction], master_id: u32) {
    order_by(actions, |class| match class {
        ActionClass::RemoveVariant { id } if id == master_id => 5,
        ActionClass::RemoveVariant { .. } => 0,
        ActionClass::ChangeMasterVariant => 4,
        ActionClass::AddVariant => 3,
        c if c.is_variant_content_change() => 1,
        _ => 2,
    });
}

/// Unsets first, so a later set on the same attribute is the final value
pub fn order_attribute_actions(actions: &mut [UpdateAction]) {
    order_by(actions, |class| match class {
        ActionClass::UnsetAttribute => 0,
        _ => 1,
    });
}

pub fn order_image_actions(actions: &mut [UpdateAction]) {
    order_by(actions, |class| match class {
        ActionClass::RemoveImage => 0,
        ActionClass::MoveImage => 2,
        _ => 1,
    });
}

/// Removes first so an added price never collides with the scope of a
/// price that is going away
pub fn order_price_actions(actions: &mut [UpdateAction]) {
    order_by(actions, |class| match class {
        ActionClass::RemovePrice => 0,
        ActionClass::AddPrice => 2,
        _ => 1,
    });
}

/// Reorder runs over the assets that remain, before new ones are inserted
/// at their positions
pub fn order_asset_actions(actions: &mut [UpdateAction]) {
    order_by(actions, |class| match class {
        ActionClass::RemoveAsset => 0,
        ActionClass::ReorderAssets => 2,
        ActionClass::AddAsset => 3,
        _ => 1,
    });
}
