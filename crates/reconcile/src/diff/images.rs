//! Variant image diffing; images are matched by url

use super::DiffContext;
use crate::action::UpdateAction;
use crate::model::Image;
use std::collections::HashSet;

/// Diff the images of one variant.
///
/// New images are appended by the platform, so the final order is reached
/// with `MoveImageToPosition` actions computed against the list as it
/// stands after removals and additions.
pub fn build_image_actions(
    variant_id: u32,
    old: &[Image],
    new: &[Image],
    ctx: &mut DiffContext<'_>,
) -> Vec<UpdateAction> {
    let mut wanted: Vec<&Image> = Vec::with_capacity(new.len());
    let mut urls: HashSet<&str> = HashSet::new();
    for image in new {
        if urls.insert(image.url.as_str()) {
            wanted.push(image);
        } else {
            ctx.warn(format!(
                "variant {variant_id}: ignoring duplicate image {}",
                image.url
            ));
        }
    }

    let remove_others = ctx.policy.remove_other_collection_entries;
    let mut actions = Vec::new();
    let mut current: Vec<&str> = Vec::with_capacity(old.len() + wanted.len());

    for image in old {
        if urls.contains(image.url.as_str()) || !remove_others {
            current.push(image.url.as_str());
        } else {
            actions.push(UpdateAction::RemoveImage {
                variant_id,
                image_url: image.url.clone(),
            });
        }
    }

    for image in &wanted {
        match old.iter().find(|o| o.url == image.url) {
            Some(existing) if existing.label != image.label => {
                actions.push(UpdateAction::SetImageLabel {
                    variant_id,
                    image_url: image.url.clone(),
                    label: image.label.clone(),
                });
            }
            Some(_) => {}
            None => {
                actions.push(UpdateAction::AddExternalImage {
                    variant_id,
                    image: (*image).clone(),
                });
                current.push(image.url.as_str());
            }
        }
    }

    // Images the draft does not mention but that stay keep their relative
    // order behind the drafted ones
    let mut target: Vec<&str> = wanted.iter().map(|i| i.url.as_str()).collect();
    target.extend(current.iter().filter(|url| !urls.contains(**url)));

    for (position, url) in target.iter().enumerate() {
        if current[position] == *url {
            continue;
        }
        if let Some(from) = current.iter().position(|c| c == url) {
            let moved = current.remove(from);
            current.insert(position, moved);
            actions.push(UpdateAction::MoveImageToPosition {
                variant_id,
                image_url: (*url).to_string(),
                position,
            });
        }
    }
    actions
}
