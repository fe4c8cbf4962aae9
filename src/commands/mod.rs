pub mod config;
pub mod plan;
pub mod sync;

use anyhow::Result;
use reconcile::{RemovalPolicy, StoredKind, SyncOptions};

use crate::Context;
use crate::catalog::{FileCatalog, load_drafts};
use crate::cli::SourceArgs;

/// Drafts, catalog and engine options for one command run
pub struct Source<K: StoredKind> {
    pub file: FileCatalog,
    pub drafts: Vec<K::Draft>,
    pub options: SyncOptions<K>,
}

/// Load drafts and catalog; CLI flags override config file settings
pub fn open_source<K: StoredKind>(ctx: &Context, args: &SourceArgs) -> Result<Source<K>> {
    let drafts = load_drafts::<K::Draft>(&args.drafts)?;
    let catalog_path = ctx.config.catalog_path(args.catalog.as_deref())?;
    let file = FileCatalog::open(&catalog_path)?;

    let mut options = ctx.config.sync_options::<K>();
    if args.ensure_channels {
        options = options.with_ensure_channels(true);
    }
    if args.keep_unmentioned {
        options = options.with_policy(RemovalPolicy::keep_all());
    }
    if let Some(batch_size) = args.batch_size {
        options = options.with_batch_size(batch_size);
    }
    log::debug!("{options:?}");

    Ok(Source {
        file,
        drafts,
        options,
    })
}
