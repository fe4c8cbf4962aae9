mod common;

use common::{category, names, product, seeded_catalog};
use pretty_assertions::assert_eq;
use reconcile::orderer::{order_attribute_actions, order_image_actions, order_variant_actions};
use reconcile::{
    ApplyActions, AssetDraft, Attribute, Categories, Image, LocalizedString, MemoryCatalog,
    PlanAction, Products, RejectedAction, RemovalPolicy, SyncOptions, Syncer, UpdateAction,
    VariantDraft,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Sync `drafts` and return the action lists handed to the catalog
fn sync_capturing(
    catalog: &MemoryCatalog,
    drafts: Vec<reconcile::ProductDraft>,
) -> (reconcile::SyncStatistics, Vec<Vec<UpdateAction>>) {
    let captured: Arc<Mutex<Vec<Vec<UpdateAction>>>> = Arc::default();
    let sink = Arc::clone(&captured);
    let options = SyncOptions::<Products>::new().with_before_update(move |actions, _, _| {
        sink.lock().unwrap().push(actions.clone());
        actions
    });
    let stats = Syncer::new(catalog, options).sync(drafts);
    let captured = captured.lock().unwrap().clone();
    (stats, captured)
}

#[test]
fn test_master_swap_removes_old_master_last() {
    let catalog = seeded_catalog();
    let mut original = product("shirt-1");
    original.variants.push(VariantDraft {
        sku: Some("shirt-1-s".into()),
        ..VariantDraft::new("s")
    });
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![original]);

    // "l" becomes master, "m" and "s" go away, "xl" is new
    let mut draft = product("shirt-1");
    draft.master_variant = draft.variants.remove(0);
    draft.variants = vec![VariantDraft {
        sku: Some("shirt-1-xl".into()),
        ..VariantDraft::new("xl")
    }];

    let (stats, captured) = sync_capturing(&catalog, vec![draft.clone()]);
    assert_eq!(stats.updated(), 1, "{}", stats.report_message());
    assert_eq!(
        captured[0],
        vec![
            UpdateAction::RemoveVariant { id: 3 },
            UpdateAction::AddVariant {
                key: "xl".into(),
                sku: Some("shirt-1-xl".into()),
                attributes: vec![],
                prices: vec![],
                images: vec![],
                assets: vec![],
            },
            UpdateAction::ChangeMasterVariant {
                variant_key: "l".into(),
            },
            UpdateAction::RemoveVariant { id: 1 },
        ]
    );

    let stored = catalog.get::<Products>("shirt-1").unwrap();
    assert_eq!(stored.master_variant.key.as_deref(), Some("l"));
    assert_eq!(stored.variants.len(), 1);
    assert_eq!(stored.variants[0].key.as_deref(), Some("xl"));

    let (again, captured) = sync_capturing(&catalog, vec![draft]);
    assert_eq!(again.unchanged(), 1);
    assert!(captured.is_empty());
}

#[test]
fn test_unordered_master_removal_is_rejected() {
    let catalog = seeded_catalog();
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![product("shirt-1")]);
    let stored = catalog.get::<Products>("shirt-1").unwrap();

    let mut actions = vec![
        UpdateAction::RemoveVariant { id: 1 },
        UpdateAction::ChangeMasterVariant {
            variant_key: "l".into(),
        },
    ];
    let err = Products::replay(&stored, &actions).unwrap_err();
    assert_eq!(err.reason, RejectedAction::RemoveMasterVariant(1));

    order_variant_actions(&mut actions, stored.master_variant.id);
    let replayed = Products::replay(&stored, &actions).unwrap();
    assert_eq!(replayed.master_variant.key.as_deref(), Some("l"));
    assert!(replayed.variants.is_empty());
}

#[test]
fn test_attribute_unset_precedes_set() {
    let catalog = seeded_catalog();
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![product("shirt-1")]);

    let mut draft = product("shirt-1");
    draft.variants[0].attributes = vec![Attribute::new("color", json!("blue"))];

    let (_, captured) = sync_capturing(&catalog, vec![draft]);
    assert_eq!(
        captured[0],
        vec![
            UpdateAction::SetAttribute {
                variant_id: 2,
                name: "size".into(),
                value: None,
            },
            UpdateAction::SetAttribute {
                variant_id: 2,
                name: "color".into(),
                value: Some(json!("blue")),
            },
        ]
    );
}

#[test]
fn test_null_attribute_is_an_unset_ordered_first() {
    let catalog = seeded_catalog();
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![product("shirt-1")]);

    let mut draft = product("shirt-1");
    draft.variants[0].attributes = vec![
        Attribute::new("color", json!("blue")),
        Attribute::new("size", serde_json::Value::Null),
    ];

    let captured: Arc<Mutex<Vec<Vec<UpdateAction>>>> = Arc::default();
    let sink = Arc::clone(&captured);
    let options = SyncOptions::<Products>::new()
        .with_policy(RemovalPolicy::keep_all())
        .with_before_update(move |actions, _, _| {
            sink.lock().unwrap().push(actions.clone());
            actions
        });
    let stats = Syncer::new(&catalog, options).sync(vec![draft.clone()]);

    assert_eq!(stats.updated(), 1);
    let actions = captured.lock().unwrap()[0].clone();
    assert_eq!(
        actions,
        vec![
            UpdateAction::SetAttribute {
                variant_id: 2,
                name: "size".into(),
                value: None,
            },
            UpdateAction::SetAttribute {
                variant_id: 2,
                name: "color".into(),
                value: Some(json!("blue")),
            },
        ]
    );

    let stored = catalog.get::<Products>("shirt-1").unwrap();
    assert_eq!(
        stored.variants[0].attributes,
        vec![Attribute::new("color", json!("blue"))]
    );
    let rerun = Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![draft]);
    assert_eq!(rerun.unchanged(), 1);
}

#[test]
fn test_null_valued_set_is_classified_as_unset() {
    let mut actions = vec![
        UpdateAction::SetAttribute {
            variant_id: 1,
            name: "color".into(),
            value: Some(json!("blue")),
        },
        UpdateAction::SetAttribute {
            variant_id: 1,
            name: "size".into(),
            value: Some(serde_json::Value::Null),
        },
    ];
    order_attribute_actions(&mut actions);
    assert_eq!(names_of_attributes(&actions), vec!["size", "color"]);
}

fn names_of_attributes(actions: &[UpdateAction]) -> Vec<&str> {
    actions
        .iter()
        .filter_map(|a| match a {
            UpdateAction::SetAttribute { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_image_actions_run_remove_add_move() {
    let catalog = seeded_catalog();
    let mut original = product("shirt-1");
    original.master_variant.images = vec![Image::new("a.png"), Image::new("b.png")];
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![original]);

    let mut draft = product("shirt-1");
    draft.master_variant.images = vec![Image::new("c.png"), Image::new("b.png")];
    let (stats, captured) = sync_capturing(&catalog, vec![draft]);

    assert_eq!(stats.updated(), 1);
    assert_eq!(
        names(&captured[0]),
        vec!["removeImage", "addExternalImage", "moveImageToPosition"]
    );
    let urls: Vec<_> = catalog
        .get::<Products>("shirt-1")
        .unwrap()
        .master_variant
        .images
        .into_iter()
        .map(|i| i.url)
        .collect();
    assert_eq!(urls, vec!["c.png", "b.png"]);
}

#[test]
fn test_image_orderer_is_stable() {
    let image = |url: &str| UpdateAction::AddExternalImage {
        variant_id: 1,
        image: Image::new(url),
    };
    let mut actions = vec![
        UpdateAction::MoveImageToPosition {
            variant_id: 1,
            image_url: "x".into(),
            position: 0,
        },
        image("x"),
        UpdateAction::RemoveImage {
            variant_id: 1,
            image_url: "y".into(),
        },
        image("z"),
    ];
    order_image_actions(&mut actions);
    assert_eq!(
        names(&actions),
        vec![
            "removeImage",
            "addExternalImage",
            "addExternalImage",
            "moveImageToPosition"
        ]
    );
    assert_eq!(actions[1], image("x"));
    assert_eq!(actions[2], image("z"));
}

#[test]
fn test_price_removal_precedes_add_in_same_scope() {
    let catalog = seeded_catalog();
    Syncer::new(&catalog, SyncOptions::<Products>::new()).sync(vec![product("shirt-1")]);

    let mut draft = product("shirt-1");
    draft.master_variant.prices.remove(1);
    draft.master_variant.prices[0].value = reconcile::Money::new("EUR", 2499);
    draft.variants[0]
        .prices
        .push(reconcile::PriceDraft::new(reconcile::Money::new("EUR", 999)));

    let (stats, captured) = sync_capturing(&catalog, vec![draft]);
    assert_eq!(stats.updated(), 1);
    assert_eq!(
        names(&captured[0]),
        vec!["removePrice", "changePrice", "addPrice"]
    );
}

#[test]
fn test_category_assets_reorder_before_add() {
    let catalog = seeded_catalog();
    let asset = |key: &str| AssetDraft::new(key, LocalizedString::of("en", key));

    let mut original = category("shoes");
    original.assets = vec![asset("a"), asset("b"), asset("gone")];
    Syncer::new(&catalog, SyncOptions::<Categories>::new()).sync(vec![original]);

    let mut draft = category("shoes");
    draft.assets = vec![asset("b"), asset("new"), asset("a")];
    let plan = Syncer::new(&catalog, SyncOptions::<Categories>::new()).plan(vec![draft.clone()]);
    match &plan[0].action {
        PlanAction::Update { actions, .. } => assert_eq!(
            names(actions),
            vec!["removeAsset", "changeAssetOrder", "addAsset"]
        ),
        _ => panic!("expected an asset update"),
    }

    let stats = Syncer::new(&catalog, SyncOptions::<Categories>::new()).sync(vec![draft]);
    assert_eq!(stats.updated(), 1);
    let keys: Vec<_> = catalog
        .get::<Categories>("shoes")
        .unwrap()
        .assets
        .into_iter()
        .map(|a| a.key)
        .collect();
    assert_eq!(keys, vec!["b", "new", "a"]);
}
