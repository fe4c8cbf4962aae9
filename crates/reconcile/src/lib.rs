//! # Reconcile
//!
//! Catalog reconciliation: bring a remote commerce catalog in line with a
//! list of desired resource drafts.
//!
//! Each draft is matched to an existing resource by its business key. A new
//! key creates a resource; a known key is diffed against the stored state
//! and the catalog receives the ordered list of update actions that makes
//! the two equal. A draft that already matches produces no request at all.
//!
//! ## Core Concepts
//!
//! - **ResourceKind**: Draft type, resource type and action builder of one
//!   kind (products, categories, cart discounts, inventory entries)
//! - **UpdateAction**: One atomic change, serialized as the platform expects
//! - **Orderer**: Stable ordering rules that make an action list valid when
//!   applied in sequence
//! - **Syncer**: Batches drafts, resolves references, fetches existing
//!   resources and fans work out to a bounded worker pool
//! - **SyncStatistics**: Concurrently updated counters plus the summary line
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     CatalogSnapshot, InventoryEntryDraft, Inventories, MemoryCatalog, SyncOptions, Syncer,
//! };
//!
//! let catalog = MemoryCatalog::new(CatalogSnapshot::default());
//! let options = SyncOptions::<Inventories>::new().with_batch_size(50);
//! let stats = Syncer::new(&catalog, options)
//!     .sync(vec![InventoryEntryDraft::new("inv-1", "SKU-1", 10)]);
//!
//! assert_eq!(stats.created(), 1);
//! println!("{stats}");
//! ```
//!
//! ## Collaborator Traits
//!
//! The engine talks to the catalog only through traits:
//!
//! - [`ReferenceResolver`]: Resolves reference keys to ids, creates channels
//! - [`ResourceFetcher`]: Fetches existing resources by key
//! - [`ResourceCreator`] / [`ResourceUpdater`]: Write to the catalog
//! - [`ProgressCallback`]: Receives per-batch and per-resource progress
//!
//! [`MemoryCatalog`] implements all of them over a serializable snapshot and
//! replays update actions locally, rejecting lists a real catalog would
//! reject.

pub mod action;
pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod kind;
pub mod kinds;
pub mod matcher;
pub mod memory;
pub mod model;
pub mod options;
pub mod orderer;
pub mod reference;
pub mod replay;
pub mod statistics;

// Re-export main types at crate root
pub use action::{ActionClass, UpdateAction};
pub use context::{
    Catalog, NoProgress, ProgressCallback, ReferenceResolver, ResourceCreator, ResourceFetcher,
    ResourceUpdater,
};
pub use diff::{DiffContext, DiffError, RemovalPolicy};
pub use engine::{CancelHandle, PlanAction, PlannedChange, Syncer};
pub use error::{CatalogError, ErrorCategory, SyncError, ValidationError};
pub use kind::ResourceKind;
pub use kinds::{
    CartDiscount, CartDiscountDraft, CartDiscountTarget, CartDiscountValue, CartDiscounts,
    Categories, Category, CategoryDraft, Inventories, InventoryEntry, InventoryEntryDraft,
    Product, ProductDraft, Products, StackingMode, Variant, VariantDraft,
};
pub use memory::{CatalogSnapshot, MemoryCatalog, ReferenceEntry, StoredKind};
pub use model::{
    Asset, AssetDraft, AssetSource, Attribute, CustomFields, CustomFieldsDraft, Image,
    ImageDimensions, LocalizedString, Money, Price, PriceDraft,
};
pub use options::{DEFAULT_BATCH_SIZE, DEFAULT_PARALLELISM, SyncOptions};
pub use reference::{ReferenceKey, ReferenceKind, ResolvedReferences};
pub use replay::{ApplyActions, RejectedAction, ReplayError};
pub use statistics::{StatisticsSnapshot, SyncOutcome, SyncStatistics};
