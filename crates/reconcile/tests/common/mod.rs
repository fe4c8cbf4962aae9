//! Fixtures shared by the integration tests

#![allow(dead_code)]

use reconcile::{
    CartDiscountDraft, CartDiscountTarget, CartDiscountValue, CatalogError, CatalogSnapshot,
    CategoryDraft, LocalizedString, MemoryCatalog, Money, PriceDraft, ProductDraft,
    ProgressCallback, ReferenceEntry, ReferenceKind, ReferenceResolver, ResolvedReferences,
    ResourceCreator, ResourceFetcher, ResourceUpdater, StoredKind, SyncError,
    SyncOutcome, UpdateAction, VariantDraft,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Catalog pre-populated with the reference data the fixtures use
pub fn seeded_catalog() -> MemoryCatalog {
    MemoryCatalog::new(CatalogSnapshot {
        product_types: vec![ReferenceEntry::new("pt-shirt", "shirt")],
        tax_categories: vec![ReferenceEntry::new("tax-std", "standard")],
        channels: vec![ReferenceEntry::new("ch-wh", "warehouse")],
        customer_groups: vec![ReferenceEntry::new("cg-b2b", "b2b")],
        types: vec![
            ReferenceEntry::new("type-discount", "discount-fields"),
            ReferenceEntry::new("type-price", "price-fields"),
        ],
        ..CatalogSnapshot::default()
    })
}

pub fn discount(key: &str) -> CartDiscountDraft {
    CartDiscountDraft::new(
        key,
        LocalizedString::of("en", "Ten percent"),
        CartDiscountValue::Relative { permyriad: 1000 },
        "country = \"DE\"",
        CartDiscountTarget::LineItems {
            predicate: "true".into(),
        },
        "0.5",
    )
}

pub fn product(key: &str) -> ProductDraft {
    let mut draft = ProductDraft::new(
        key,
        "shirt",
        LocalizedString::of("en", "Shirt").with("de", "Hemd"),
        LocalizedString::of("en", key),
    );
    draft.tax_category_key = Some("standard".into());
    draft.master_variant = VariantDraft {
        sku: Some(format!("{key}-m")),
        prices: vec![
            PriceDraft::new(Money::new("EUR", 1999)),
            PriceDraft {
                channel_key: Some("warehouse".into()),
                ..PriceDraft::new(Money::new("EUR", 1799))
            },
        ],
        images: vec![reconcile::Image::new("https://img/front.png")],
        ..VariantDraft::new("m")
    };
    draft.variants.push(VariantDraft {
        sku: Some(format!("{key}-l")),
        attributes: vec![reconcile::Attribute::new("size", serde_json::json!("L"))],
        ..VariantDraft::new("l")
    });
    draft
}

pub fn category(key: &str) -> CategoryDraft {
    CategoryDraft::new(
        key,
        LocalizedString::of("en", key),
        LocalizedString::of("en", key),
    )
}

/// Error and warning callback sink
#[derive(Clone, Default)]
pub struct Recorder {
    pub errors: Arc<Mutex<Vec<(String, SyncError)>>>,
    pub warnings: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn error_callback(&self) -> impl Fn(&str, &SyncError) + Send + Sync + 'static {
        let errors = Arc::clone(&self.errors);
        move |message: &str, error: &SyncError| {
            errors
                .lock()
                .unwrap()
                .push((message.to_string(), error.clone()));
        }
    }

    pub fn warning_callback(&self) -> impl Fn(&str) + Send + Sync + 'static {
        let warnings = Arc::clone(&self.warnings);
        move |message: &str| warnings.lock().unwrap().push(message.to_string())
    }

    pub fn errors(&self) -> Vec<(String, SyncError)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

/// Counts progress events and optionally cancels after the first batch
#[derive(Default)]
pub struct CountingProgress {
    pub batches_started: AtomicUsize,
    pub batches_completed: AtomicUsize,
    pub resources: AtomicUsize,
    pub cancel: reconcile::CancelHandle,
    pub cancel_after_first_batch: bool,
}

impl ProgressCallback for CountingProgress {
    fn on_batch_start(&self, _index: usize, _size: usize) {
        self.batches_started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_resource_complete(&self, _key: &str, _outcome: &SyncOutcome) {
        self.resources.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _index: usize) {
        self.batches_completed.fetch_add(1, Ordering::SeqCst);
        if self.cancel_after_first_batch {
            self.cancel.cancel();
        }
    }
}

/// Wraps a `MemoryCatalog` and injects failures
#[derive(Default)]
pub struct FaultyCatalog {
    pub inner: MemoryCatalog,
    /// Fetching a batch containing this key fails with a transport error
    pub fail_fetch_for: Option<String>,
    /// Another writer bumps the resource just before each update
    pub concurrent_writer: AtomicBool,
    /// Creating a missing reference fails with a transport error
    pub fail_reference_create: bool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl FaultyCatalog {
    pub fn new(inner: MemoryCatalog) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

impl ReferenceResolver for FaultyCatalog {
    fn resolve(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, String>, CatalogError> {
        self.inner.resolve(kind, keys)
    }

    fn create(&self, kind: ReferenceKind, key: &str) -> Result<String, CatalogError> {
        if self.fail_reference_create {
            return Err(CatalogError::Transport("503 service unavailable".into()));
        }
        ReferenceResolver::create(&self.inner, kind, key)
    }
}

impl<K: StoredKind> ResourceFetcher<K> for FaultyCatalog {
    fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<K::Resource>, CatalogError> {
        if let Some(bad) = &self.fail_fetch_for
            && keys.contains(bad)
        {
            return Err(CatalogError::Transport("connection reset".into()));
        }
        ResourceFetcher::<K>::fetch_by_keys(&self.inner, keys)
    }
}

impl<K: StoredKind> ResourceCreator<K> for FaultyCatalog {
    fn create(
        &self,
        draft: &K::Draft,
        references: &ResolvedReferences,
    ) -> Result<K::Resource, CatalogError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        ResourceCreator::<K>::create(&self.inner, draft, references)
    }
}

impl<K: StoredKind> ResourceUpdater<K> for FaultyCatalog {
    fn update(
        &self,
        id: &str,
        version: u64,
        actions: &[UpdateAction],
    ) -> Result<K::Resource, CatalogError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.concurrent_writer.load(Ordering::SeqCst) {
            ResourceUpdater::<K>::update(&self.inner, id, version, &[])?;
        }
        ResourceUpdater::<K>::update(&self.inner, id, version, actions)
    }
}

/// Wire names of an action list
pub fn names(actions: &[UpdateAction]) -> Vec<&'static str> {
    actions.iter().map(UpdateAction::name).collect()
}

/// Keys of every stored resource of kind `K`
pub fn stored_keys<K: StoredKind>(catalog: &MemoryCatalog) -> Vec<String> {
    K::collection(&catalog.snapshot())
        .iter()
        .map(|r| K::resource_key(r).to_string())
        .collect()
}
